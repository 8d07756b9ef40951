//! Bulk comorbidity matching
//!
//! The naive formulation is a visits x codes x categories nested scan. The
//! matcher instead deduplicates the distinct codes in the batch, joins them
//! once against the map to get a per-code category list, and then takes the
//! per-visit union of those lists. Visits are independent, so the second
//! join is sharded across worker threads for large batches.

use crate::comorbidity::{ComorbidityMap, HierarchyRule, matrix::ComorbidityMatrix};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Wide-format input: one row per visit carrying several code columns
#[derive(Debug, Clone)]
pub struct VisitRow {
    /// Visit identifier
    pub visit: String,
    /// The codes recorded for the visit; empty cells simply omitted
    pub codes: Vec<String>,
}

/// Normalize wide-format input to long-format (visit, code) pairs
#[must_use]
pub fn wide_to_long(rows: &[VisitRow]) -> Vec<(String, String)> {
    rows.iter()
        .flat_map(|row| {
            row.codes
                .iter()
                .map(|code| (row.visit.clone(), code.clone()))
        })
        .collect()
}

/// Build the visit x category boolean matrix for a batch of (visit, code)
/// pairs.
///
/// Codes are normalized (trimmed, uppercased, separator stripped) once at
/// this boundary, so short and decimal forms may be mixed. Codes recognized
/// by no category drop out of the product silently; they are data, not
/// errors. Rows follow the first-seen order of visit identifiers, columns
/// the category order of the map. The same input and map always produce an
/// identical matrix.
#[must_use]
pub fn match_comorbidities(
    pairs: &[(String, String)],
    map: &ComorbidityMap,
) -> ComorbidityMatrix {
    let n_categories = map.len();

    // First-seen visit order, and each visit's distinct code ids.
    let mut visit_ids: FxHashMap<&str, usize> = FxHashMap::default();
    let mut visits: Vec<String> = Vec::new();
    let mut code_ids: FxHashMap<String, usize> = FxHashMap::default();
    let mut distinct_codes: Vec<String> = Vec::new();
    let mut visit_codes: Vec<SmallVec<[usize; 8]>> = Vec::new();

    for (visit, code) in pairs {
        let row = *visit_ids.entry(visit.as_str()).or_insert_with(|| {
            visits.push(visit.clone());
            visit_codes.push(SmallVec::new());
            visits.len() - 1
        });
        let normalized = normalize(code);
        let code_id = *code_ids.entry(normalized).or_insert_with_key(|key| {
            distinct_codes.push(key.clone());
            distinct_codes.len() - 1
        });
        if !visit_codes[row].contains(&code_id) {
            visit_codes[row].push(code_id);
        }
    }

    // Join 1: distinct code -> categories it indicates.
    let code_categories: Vec<SmallVec<[usize; 4]>> = distinct_codes
        .iter()
        .map(|code| {
            map.categories()
                .iter()
                .enumerate()
                .filter(|(_, category)| category.contains(code))
                .map(|(i, _)| i)
                .collect()
        })
        .collect();

    // Join 2: visit -> union of its codes' categories, one row each.
    let rows: Vec<Vec<bool>> = visit_codes
        .par_iter()
        .map(|codes| {
            let mut row = vec![false; n_categories];
            for &code_id in codes {
                for &category in &code_categories[code_id] {
                    row[category] = true;
                }
            }
            row
        })
        .collect();

    let values = rows.into_iter().flatten().collect();
    let categories = map.category_names().iter().map(ToString::to_string).collect();
    ComorbidityMatrix::new(visits, categories, values)
}

/// Apply mutually-exclusive category pairs to a raw matrix: for each
/// (specific, general) pair, clear the general flag wherever the specific
/// one is set. Rules naming categories absent from the matrix are ignored.
pub fn apply_hierarchy(matrix: &mut ComorbidityMatrix, rules: &[HierarchyRule]) {
    for rule in rules {
        let (Some(specific), Some(general)) = (
            matrix.column_of(&rule.specific),
            matrix.column_of(&rule.general),
        ) else {
            continue;
        };
        for row in 0..matrix.n_visits() {
            if matrix.get(row, specific) {
                matrix.set(row, general, false);
            }
        }
    }
}

fn normalize(code: &str) -> String {
    code.trim()
        .chars()
        .filter(|&c| c != '.')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Code, CodeSystem, Representation};
    use crate::comorbidity::ComorbidityMap;

    fn map() -> ComorbidityMap {
        let parse = |raw: &str| {
            Code::parse(raw, CodeSystem::Icd9, Representation::Short).unwrap()
        };
        let mut map = ComorbidityMap::new();
        map.push_category("DM", vec![parse("2500"), parse("2501")])
            .unwrap();
        map.push_category("DMcx", vec![parse("2504"), parse("2505")])
            .unwrap();
        map
    }

    fn pairs(input: &[(&str, &str)]) -> Vec<(String, String)> {
        input
            .iter()
            .map(|(v, c)| ((*v).to_string(), (*c).to_string()))
            .collect()
    }

    #[test]
    fn matches_codes_to_categories() {
        let matrix = match_comorbidities(
            &pairs(&[("v1", "2500"), ("v2", "2504"), ("v3", "4019")]),
            &map(),
        );
        assert_eq!(matrix.visit_ids(), ["v1", "v2", "v3"]);
        assert_eq!(matrix.category_names(), ["DM", "DMcx"]);
        assert_eq!(matrix.row(0), [true, false]);
        assert_eq!(matrix.row(1), [false, true]);
        // Unrecognized codes drop out silently.
        assert_eq!(matrix.row(2), [false, false]);
    }

    #[test]
    fn mixed_representations_are_normalized_once() {
        let matrix = match_comorbidities(&pairs(&[("v1", " 250.0 ")]), &map());
        assert_eq!(matrix.row(0), [true, false]);
    }

    #[test]
    fn wide_rows_normalize_to_long_pairs() {
        let rows = vec![
            VisitRow {
                visit: "v1".to_string(),
                codes: vec!["2500".to_string(), "2504".to_string()],
            },
            VisitRow {
                visit: "v2".to_string(),
                codes: vec!["2501".to_string()],
            },
        ];
        let long = wide_to_long(&rows);
        assert_eq!(long.len(), 3);

        let matrix = match_comorbidities(&long, &map());
        assert_eq!(matrix.row(0), [true, true]);
        assert_eq!(matrix.row(1), [true, false]);
    }

    #[test]
    fn hierarchy_pass_clears_the_general_flag() {
        let mut matrix = match_comorbidities(
            &pairs(&[("v1", "2500"), ("v1", "2504"), ("v2", "2500")]),
            &map(),
        );
        apply_hierarchy(&mut matrix, &[HierarchyRule::new("DMcx", "DM")]);
        assert_eq!(matrix.row(0), [false, true]);
        assert_eq!(matrix.row(1), [true, false]);
    }

    #[test]
    fn matching_is_idempotent() {
        let input = pairs(&[("v1", "2500"), ("v2", "2504"), ("v1", "2505")]);
        let map = map();
        assert_eq!(
            match_comorbidities(&input, &map),
            match_comorbidities(&input, &map)
        );
    }
}
