//! Comorbidity maps, matching and scoring
//!
//! A [`ComorbidityMap`] associates clinical category names with the explicit
//! sets of short codes indicating them; ranges in a map definition are
//! pre-expanded at construction, so matching itself is pure set lookup.
//! [`matcher`] turns a batch of (visit, code) pairs into a boolean
//! [`ComorbidityMatrix`]; [`score`] collapses hierarchies and computes
//! weighted per-visit scores.

pub mod maps;
pub mod matcher;
pub mod matrix;
pub mod score;

pub use matcher::{VisitRow, apply_hierarchy, match_comorbidities, wide_to_long};
pub use matrix::ComorbidityMatrix;
pub use score::{ScoreWeights, score};

use crate::code::{Code, CodeSystem, Representation};
use crate::error::{ComorbidError, Result};
use crate::expand::children::{ExpandMode, children_batch, possible_children};
use crate::expand::range::{RangeOptions, expand_range, possible_range};
use crate::hierarchy::HierarchyIndex;
use log::{info, warn};
use rustc_hash::FxHashSet;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A mutually exclusive category pair: when the specific form is present the
/// general form is suppressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyRule {
    /// The more specific (more severe) category
    pub specific: String,
    /// The general category it suppresses
    pub general: String,
}

impl HierarchyRule {
    /// Convenience constructor
    #[must_use]
    pub fn new(specific: &str, general: &str) -> Self {
        Self {
            specific: specific.to_string(),
            general: general.to_string(),
        }
    }
}

/// One named category and its indicating codes, in short form
#[derive(Debug, Clone)]
pub struct MapCategory {
    name: String,
    codes: FxHashSet<String>,
}

impl MapCategory {
    /// The category name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a short-form code indicates this category
    #[must_use]
    pub fn contains(&self, short_code: &str) -> bool {
        self.codes.contains(short_code)
    }

    /// Number of codes in the category
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// True if the category holds no codes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Ordered mapping from category name to indicating code set.
///
/// Category order is preserved: it fixes the column order of every matrix
/// produced from the map. Categories need not be disjoint, but names must be
/// unique. Immutable once built; share by reference across threads.
#[derive(Debug, Clone, Default)]
pub struct ComorbidityMap {
    categories: Vec<MapCategory>,
}

impl ComorbidityMap {
    /// Create an empty map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a category with an explicit code set.
    ///
    /// Codes are stored in short form. Fails with
    /// [`ComorbidError::DuplicateCategory`] on a repeated name.
    pub fn push_category(
        &mut self,
        name: &str,
        codes: impl IntoIterator<Item = Code>,
    ) -> Result<()> {
        if self.categories.iter().any(|c| c.name == name) {
            return Err(ComorbidError::DuplicateCategory {
                name: name.to_string(),
            });
        }
        self.categories.push(MapCategory {
            name: name.to_string(),
            codes: codes.into_iter().map(|c| c.short_value()).collect(),
        });
        Ok(())
    }

    /// The categories, in map order
    #[must_use]
    pub fn categories(&self) -> &[MapCategory] {
        &self.categories
    }

    /// Category names, in map order
    #[must_use]
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of categories
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// True if the map has no categories
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Build a map from a user-supplied definition, pre-expanding every code
    /// and range into an explicit code set.
    ///
    /// With a canonical index, expansion is defined-mode and definition codes
    /// absent from the list are dropped with a warning; without one, all
    /// syntactically possible descendants are generated instead.
    pub fn from_definition(
        definition: &MapDefinition,
        index: Option<&HierarchyIndex>,
    ) -> Result<Self> {
        let mut map = Self::new();
        for category in &definition.categories {
            let mut codes: Vec<Code> = Vec::new();
            let parsed: Vec<Code> = category
                .codes
                .iter()
                .map(|raw| parse_definition_code(raw, definition.system))
                .collect::<Result<_>>()?;

            match index {
                Some(index) => {
                    let expansion =
                        children_batch(&parsed, index, ExpandMode::Defined, false)?;
                    if !expansion.skipped.is_empty() {
                        warn!(
                            "category {:?}: {} definition codes are not in the canonical list",
                            category.name,
                            expansion.skipped.len()
                        );
                    }
                    codes.extend(expansion.codes);
                }
                None => {
                    for code in &parsed {
                        codes.extend(possible_children(code));
                    }
                }
            }

            for range in &category.ranges {
                let start = parse_definition_code(&range.start, definition.system)?;
                let end = parse_definition_code(&range.end, definition.system)?;
                let expanded = match index {
                    Some(index) => {
                        expand_range(&start, &end, index, &RangeOptions::default())?
                    }
                    None => possible_range(&start, &end, &RangeOptions::default())?,
                };
                codes.extend(expanded);
            }

            map.push_category(&category.name, codes)?;
        }
        Ok(map)
    }
}

/// On-disk shape of a comorbidity map definition
#[derive(Debug, Deserialize)]
pub struct MapDefinition {
    /// Scheme name, e.g. `charlson`
    pub name: String,
    /// The coding system all codes in the definition belong to
    pub system: CodeSystem,
    /// Categories, in the column order matrices should use
    pub categories: Vec<CategoryDefinition>,
}

/// One category of a map definition
#[derive(Debug, Deserialize)]
pub struct CategoryDefinition {
    /// Category name, unique within the definition
    pub name: String,
    /// Individual codes, short or decimal
    #[serde(default)]
    pub codes: Vec<String>,
    /// Inclusive code ranges
    #[serde(default)]
    pub ranges: Vec<RangeDefinition>,
}

/// An inclusive start/end code pair in a map definition
#[derive(Debug, Deserialize)]
pub struct RangeDefinition {
    /// Range start, short or decimal
    pub start: String,
    /// Range end, short or decimal
    pub end: String,
}

/// Load a comorbidity map definition from a JSON file
pub fn load_definition(path: &Path) -> Result<MapDefinition> {
    let content = fs::read_to_string(path).map_err(|source| ComorbidError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let definition: MapDefinition =
        serde_json::from_str(&content).map_err(|source| ComorbidError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    info!(
        "loaded map definition {:?} with {} categories from {}",
        definition.name,
        definition.categories.len(),
        path.display()
    );
    Ok(definition)
}

/// Definition files may mix short and decimal forms; the separator decides,
/// once, at this boundary.
fn parse_definition_code(raw: &str, system: CodeSystem) -> Result<Code> {
    let representation = if raw.contains('.') {
        Representation::Decimal
    } else {
        Representation::Short
    };
    Code::parse(raw, system, representation)
}
