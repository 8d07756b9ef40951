//! Integration tests for comorbidity matching against the bundled maps

use comorbid::comorbidity::maps;
use comorbid::{apply_hierarchy, match_comorbidities, wide_to_long, VisitRow};

fn pairs(input: &[(&str, &str)]) -> Vec<(String, String)> {
    input
        .iter()
        .map(|(v, c)| ((*v).to_string(), (*c).to_string()))
        .collect()
}

#[test]
fn charlson_matching_flags_the_right_categories() {
    let map = maps::charlson_icd9();
    let matrix = match_comorbidities(
        &pairs(&[("v1", "441"), ("v2", "412.93"), ("v3", "042")]),
        &map,
    );

    assert_eq!(matrix.visit_ids(), ["v1", "v2", "v3"]);
    let pvd = matrix.column_of("PVD").unwrap();
    let mi = matrix.column_of("MI").unwrap();
    let hiv = matrix.column_of("HIV").unwrap();

    assert!(matrix.get(0, pvd));
    assert!(matrix.get(1, mi));
    assert!(matrix.get(2, hiv));
    // One category per visit in this batch.
    for row in 0..3 {
        assert_eq!(matrix.row(row).iter().filter(|&&v| v).count(), 1);
    }
}

#[test]
fn unrecognized_codes_are_excluded_silently() {
    let map = maps::charlson_icd9();
    let matrix = match_comorbidities(
        &pairs(&[("v1", "V700"), ("v1", "410"), ("v2", "NOTACODE")]),
        &map,
    );
    assert_eq!(matrix.n_visits(), 2);
    assert!(matrix.get(0, matrix.column_of("MI").unwrap()));
    assert!(matrix.row(1).iter().all(|&v| !v));
}

#[test]
fn matching_is_idempotent_on_identical_input() {
    let map = maps::charlson_icd9();
    let input = pairs(&[("v1", "441"), ("v2", "2504"), ("v2", "2500"), ("v1", "042")]);
    let first = match_comorbidities(&input, &map);
    let second = match_comorbidities(&input, &map);
    assert_eq!(first, second);
}

#[test]
fn wide_input_matches_like_long_input() {
    let map = maps::charlson_icd9();
    let wide = vec![
        VisitRow {
            visit: "v1".to_string(),
            codes: vec!["441".to_string(), "410".to_string()],
        },
        VisitRow {
            visit: "v2".to_string(),
            codes: vec!["042".to_string()],
        },
    ];
    let from_wide = match_comorbidities(&wide_to_long(&wide), &map);
    let from_long = match_comorbidities(
        &pairs(&[("v1", "441"), ("v1", "410"), ("v2", "042")]),
        &map,
    );
    assert_eq!(from_wide, from_long);
}

#[test]
fn hierarchy_collapsing_leaves_no_exclusive_pair_jointly_set() {
    let map = maps::charlson_icd9();
    let mut matrix = match_comorbidities(
        &pairs(&[("v1", "2500"), ("v1", "2504"), ("v2", "196"), ("v2", "153")]),
        &map,
    );
    apply_hierarchy(&mut matrix, &maps::charlson_rules());

    for rule in maps::charlson_rules() {
        let specific = matrix.column_of(&rule.specific).unwrap();
        let general = matrix.column_of(&rule.general).unwrap();
        for row in 0..matrix.n_visits() {
            assert!(
                !(matrix.get(row, specific) && matrix.get(row, general)),
                "visit {row} has both {} and {}",
                rule.specific,
                rule.general
            );
        }
    }

    // The specific flags survive.
    assert!(matrix.get(0, matrix.column_of("DMcx").unwrap()));
    assert!(!matrix.get(0, matrix.column_of("DM").unwrap()));
    assert!(matrix.get(1, matrix.column_of("Mets").unwrap()));
    assert!(!matrix.get(1, matrix.column_of("Cancer").unwrap()));
}

#[test]
fn labeled_rows_are_a_presentation_of_the_same_values() {
    let map = maps::charlson_icd9();
    let matrix = match_comorbidities(&pairs(&[("v1", "410")]), &map);
    let labeled = matrix.labeled_rows();
    assert_eq!(labeled.len(), 1);
    assert_eq!(labeled[0].0, "v1");
    assert_eq!(labeled[0].1, matrix.row(0));
}
