//! Error handling for the comorbidity engine.
//!
//! Structural errors (bad ranges, mismatched coding systems, inconsistent
//! category state) are fatal and surfaced immediately. Data-quality problems
//! in large batches are not errors at all: batch operations drop the
//! offending codes and report them alongside the result.

use std::path::PathBuf;

/// Specialized error type for all core operations
#[derive(Debug, thiserror::Error)]
pub enum ComorbidError {
    /// A code string is syntactically malformed for its declared system
    #[error("invalid code {code:?}: {reason}")]
    InvalidCode {
        /// The offending code, as supplied
        code: String,
        /// What made it invalid
        reason: String,
    },

    /// A bare code string whose coding system cannot be determined
    #[error("cannot infer the coding system of {code:?}; declare it explicitly")]
    AmbiguousInput {
        /// The offending code
        code: String,
    },

    /// A single code was not found in the canonical list
    #[error("code {code:?} is not in the canonical list")]
    CodeNotFound {
        /// The missing code, in short form
        code: String,
    },

    /// A range boundary was not found in the canonical list
    #[error("range boundary {code:?} is not in the canonical list")]
    RangeNotFound {
        /// The missing boundary code, in short form
        code: String,
    },

    /// The end of a range precedes its start in canonical order
    #[error("range end {end:?} precedes start {start:?}")]
    RangeOrder {
        /// Start boundary
        start: String,
        /// End boundary
        end: String,
    },

    /// Two codes that must share a coding system do not
    #[error("codes {start:?} and {end:?} belong to different coding systems")]
    VersionMismatch {
        /// First code
        start: String,
        /// Second code
        end: String,
    },

    /// Range boundaries from separate numbering spaces (numeric vs. V vs. E)
    #[error("codes {start:?} and {end:?} belong to different code categories and cannot span a range")]
    CategoryMismatch {
        /// Start boundary
        start: String,
        /// End boundary
        end: String,
    },

    /// The requested operation is deliberately not implemented
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Mutually exclusive categories are both set while hierarchy collapsing is off
    #[error(
        "visit {visit:?} has mutually exclusive categories {specific:?} and {general:?} both set"
    )]
    InconsistentCategories {
        /// The visit whose row is inconsistent
        visit: String,
        /// The more specific category of the pair
        specific: String,
        /// The more general category of the pair
        general: String,
    },

    /// The supplied canonical list violates the descendant-contiguity invariant
    #[error("canonical list is not in hierarchical order: {0}")]
    InvalidIndex(String),

    /// Two comorbidity map categories share a name
    #[error("duplicate comorbidity category {name:?}")]
    DuplicateCategory {
        /// The repeated category name
        name: String,
    },

    /// A matrix column has no weight in the supplied weighting scheme
    #[error("no weight defined for category {category:?}")]
    UnknownCategory {
        /// The unweighted category name
        category: String,
    },

    /// Error reading reference data from disk
    #[error("failed to read {path:?}: {source}")]
    Io {
        /// The file that failed
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Error deserializing reference data
    #[error("failed to parse {path:?}: {source}")]
    Json {
        /// The file that failed
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, ComorbidError>;
