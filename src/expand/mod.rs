//! Code expansion algorithms
//!
//! Two related operations over a canonical hierarchy: expanding a code into
//! its descendant set ([`children`]) and expanding a start/end pair into the
//! inclusive set of codes spanning them ([`range`]), with the
//! ambiguous-boundary policy described on [`range::RangeOptions`].

pub mod children;
pub mod range;

pub use children::{ExpandMode, Expansion, SkippedCode, children, children_batch, possible_children};
pub use range::{RangeOptions, expand_major_range, expand_range};
