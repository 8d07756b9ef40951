//! Weighted comorbidity scores
//!
//! A score is the dot product of a visit's boolean category row with a
//! weight vector, after hierarchy collapsing. Two published weighting
//! schemes ship as presets; custom weights pair with custom maps.

use crate::comorbidity::{HierarchyRule, matcher::apply_hierarchy, matrix::ComorbidityMatrix};
use crate::error::{ComorbidError, Result};
use rayon::prelude::*;

/// A named weighting scheme: per-category weights plus the mutually
/// exclusive pairs its hierarchy collapsing uses
#[derive(Debug, Clone)]
pub struct ScoreWeights {
    name: String,
    weights: Vec<(String, f64)>,
    rules: Vec<HierarchyRule>,
}

impl ScoreWeights {
    /// The original Charlson (1987) weights, for matrices built from the
    /// Charlson map
    #[must_use]
    pub fn charlson() -> Self {
        let weights = [
            ("MI", 1.0),
            ("CHF", 1.0),
            ("PVD", 1.0),
            ("Stroke", 1.0),
            ("Dementia", 1.0),
            ("Pulmonary", 1.0),
            ("Rheumatic", 1.0),
            ("PUD", 1.0),
            ("LiverMild", 1.0),
            ("DM", 1.0),
            ("DMcx", 2.0),
            ("Paralysis", 2.0),
            ("Renal", 2.0),
            ("Cancer", 2.0),
            ("LiverSevere", 3.0),
            ("Mets", 6.0),
            ("HIV", 6.0),
        ];
        Self {
            name: "charlson".to_string(),
            weights: weights
                .into_iter()
                .map(|(n, w)| (n.to_string(), w))
                .collect(),
            rules: super::maps::charlson_rules(),
        }
    }

    /// The van Walraven (2009) weights for the Elixhauser categories
    #[must_use]
    pub fn van_walraven() -> Self {
        let weights = [
            ("CHF", 7.0),
            ("Arrhythmia", 5.0),
            ("Valvular", -1.0),
            ("PHTN", 4.0),
            ("PVD", 2.0),
            ("HTN", 0.0),
            ("HTNcx", 0.0),
            ("Paralysis", 7.0),
            ("NeuroOther", 6.0),
            ("Pulmonary", 3.0),
            ("DM", 0.0),
            ("DMcx", 0.0),
            ("Hypothyroid", 0.0),
            ("Renal", 5.0),
            ("Liver", 11.0),
            ("PUD", 0.0),
            ("HIV", 0.0),
            ("Lymphoma", 9.0),
            ("Mets", 12.0),
            ("Tumor", 4.0),
            ("Rheumatic", 0.0),
            ("Coagulopathy", 3.0),
            ("Obesity", -4.0),
            ("WeightLoss", 6.0),
            ("FluidsLytes", 5.0),
            ("BloodLoss", -2.0),
            ("Anemia", -2.0),
            ("Alcohol", 0.0),
            ("Drugs", -7.0),
            ("Psychoses", 0.0),
            ("Depression", -3.0),
        ];
        Self {
            name: "van_walraven".to_string(),
            weights: weights
                .into_iter()
                .map(|(n, w)| (n.to_string(), w))
                .collect(),
            rules: super::maps::elixhauser_rules(),
        }
    }

    /// A caller-supplied weighting scheme
    #[must_use]
    pub fn custom(
        name: &str,
        weights: Vec<(String, f64)>,
        rules: Vec<HierarchyRule>,
    ) -> Self {
        Self {
            name: name.to_string(),
            weights,
            rules,
        }
    }

    /// Scheme name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The weight for a category, if defined
    #[must_use]
    pub fn weight_of(&self, category: &str) -> Option<f64> {
        self.weights
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, weight)| *weight)
    }

    /// The exclusive pairs this scheme collapses
    #[must_use]
    pub fn rules(&self) -> &[HierarchyRule] {
        &self.rules
    }
}

/// Compute one weighted score per visit row.
///
/// With `hierarchy` set, the exclusion pass runs first, so a visit never
/// counts both members of an exclusive pair. With it unset, a jointly-set
/// pair is a hard precondition violation
/// ([`ComorbidError::InconsistentCategories`]): it means upstream mapping
/// produced an invalid matrix, and scoring it would silently understate or
/// overstate the result.
pub fn score(
    matrix: &ComorbidityMatrix,
    weights: &ScoreWeights,
    hierarchy: bool,
) -> Result<Vec<f64>> {
    let column_weights: Vec<f64> = matrix
        .category_names()
        .iter()
        .map(|category| {
            weights
                .weight_of(category)
                .ok_or_else(|| ComorbidError::UnknownCategory {
                    category: category.clone(),
                })
        })
        .collect::<Result<_>>()?;

    let collapsed;
    let matrix = if hierarchy {
        collapsed = {
            let mut m = matrix.clone();
            apply_hierarchy(&mut m, weights.rules());
            m
        };
        &collapsed
    } else {
        assert_consistent(matrix, weights.rules())?;
        matrix
    };

    Ok((0..matrix.n_visits())
        .into_par_iter()
        .map(|row| {
            matrix
                .row(row)
                .iter()
                .zip(&column_weights)
                .filter(|&(&set, _)| set)
                .map(|(_, weight)| weight)
                .sum()
        })
        .collect())
}

fn assert_consistent(matrix: &ComorbidityMatrix, rules: &[HierarchyRule]) -> Result<()> {
    for rule in rules {
        let (Some(specific), Some(general)) = (
            matrix.column_of(&rule.specific),
            matrix.column_of(&rule.general),
        ) else {
            continue;
        };
        for row in 0..matrix.n_visits() {
            if matrix.get(row, specific) && matrix.get(row, general) {
                return Err(ComorbidError::InconsistentCategories {
                    visit: matrix.visit_ids()[row].clone(),
                    specific: rule.specific.clone(),
                    general: rule.general.clone(),
                });
            }
        }
    }
    Ok(())
}
