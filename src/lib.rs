//! A Rust library for classifying ICD-9/ICD-10 clinical codes against
//! canonical hierarchies, expanding codes and code ranges into concrete code
//! sets, and computing weighted comorbidity scores over patient visits.
//!
//! The core pipeline: parse codes ([`code`]), index a canonical list
//! ([`hierarchy`]), expand codes and ranges against it ([`expand`]), match
//! batches of visit diagnoses to comorbidity categories and score them
//! ([`comorbidity`]). Canonical lists and map definitions are read-only
//! reference data, loaded once and shared by reference.

pub mod code;
pub mod comorbidity;
pub mod error;
pub mod expand;
pub mod hierarchy;

// Re-export the most common types for easier use
// Core types
pub use code::{Code, CodeSystem, Icd9Category, Representation};
pub use error::{ComorbidError, Result};
pub use hierarchy::{CanonicalEntry, HierarchyIndex, catalog::IndexCatalog, loader::load_index};

// Expansion
pub use expand::{
    ExpandMode, Expansion, RangeOptions, SkippedCode, children, children_batch,
    expand_major_range, expand_range, possible_children,
};

// Comorbidity matching and scoring
pub use comorbidity::{
    ComorbidityMap, ComorbidityMatrix, HierarchyRule, MapDefinition, ScoreWeights, VisitRow,
    apply_hierarchy, load_definition, match_comorbidities, score, wide_to_long,
};
