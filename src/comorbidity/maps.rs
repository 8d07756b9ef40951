//! Bundled comorbidity mappings
//!
//! The Quan revisions of the Charlson and Elixhauser ICD-9-CM mappings,
//! hardcoded as compact tables of codes and inclusive ranges and pre-expanded
//! into explicit code sets at construction. Expansion is possible-mode
//! (syntactic), so the bundled maps need no canonical index and match any
//! annual revision's codes.

use crate::code::{Code, CodeSystem, Representation};
use crate::comorbidity::{ComorbidityMap, HierarchyRule};
use crate::expand::children::possible_children;
use crate::expand::range::{RangeOptions, possible_range};

/// Quan's ICD-9-CM revision of the 17 Charlson categories.
/// Entries are single short codes or inclusive `start-end` ranges.
const CHARLSON_ICD9: &[(&str, &[&str])] = &[
    ("MI", &["410", "412"]),
    (
        "CHF",
        &[
            "39891", "40201", "40211", "40291", "40401", "40403", "40411", "40413", "40491",
            "40493", "4254-4259", "428",
        ],
    ),
    (
        "PVD",
        &[
            "0930", "4373", "440", "441", "4431-4439", "4471", "5571", "5579", "V434",
        ],
    ),
    ("Stroke", &["36234", "430-438"]),
    ("Dementia", &["290", "2941", "3312"]),
    (
        "Pulmonary",
        &["4168", "4169", "490-505", "5064", "5081", "5088"],
    ),
    (
        "Rheumatic",
        &["4465", "7100-7104", "7140-7142", "7148", "725"],
    ),
    ("PUD", &["531-534"]),
    (
        "LiverMild",
        &[
            "07022", "07023", "07032", "07033", "07044", "07054", "0706", "0709", "570", "571",
            "5733", "5734", "5738", "5739", "V427",
        ],
    ),
    ("DM", &["2500-2503", "2508", "2509"]),
    ("DMcx", &["2504-2507"]),
    ("Paralysis", &["3341", "342", "343", "3440-3446", "3449"]),
    (
        "Renal",
        &[
            "40301", "40311", "40391", "40402", "40403", "40412", "40413", "40492", "40493",
            "582", "5830-5837", "585", "586", "5880", "V420", "V451", "V56",
        ],
    ),
    ("Cancer", &["140-172", "174-195", "200-208", "2386"]),
    ("LiverSevere", &["4560-4562", "5722-5728"]),
    ("Mets", &["196-199"]),
    ("HIV", &["042-044"]),
];

/// Quan's ICD-9-CM revision of the Elixhauser categories.
const ELIXHAUSER_ICD9: &[(&str, &[&str])] = &[
    (
        "CHF",
        &[
            "39891", "40201", "40211", "40291", "40401", "40403", "40411", "40413", "40491",
            "40493", "4254-4259", "428",
        ],
    ),
    (
        "Arrhythmia",
        &[
            "4260", "42613", "4267", "4269", "42610", "42612", "4270-4274", "4276-4279", "7850",
            "99601", "99604", "V450", "V533",
        ],
    ),
    (
        "Valvular",
        &["0932", "394-397", "424", "7463-7466", "V422", "V433"],
    ),
    ("PHTN", &["4150", "4151", "416", "4170", "4178", "4179"]),
    (
        "PVD",
        &[
            "0930", "4373", "440", "441", "4431-4439", "4471", "5571", "5579", "V434",
        ],
    ),
    ("HTN", &["401"]),
    ("HTNcx", &["402-405"]),
    ("Paralysis", &["3341", "342", "343", "3440-3446", "3449"]),
    (
        "NeuroOther",
        &[
            "3319", "3320", "3321", "3334", "3335", "33392", "334", "335", "3362", "340", "341",
            "345", "3481", "3483", "7803", "7843",
        ],
    ),
    (
        "Pulmonary",
        &["4168", "4169", "490-505", "5064", "5081", "5088"],
    ),
    ("DM", &["2500-2503"]),
    ("DMcx", &["2504-2509"]),
    ("Hypothyroid", &["2409", "243", "244", "2461", "2468"]),
    (
        "Renal",
        &[
            "40301", "40311", "40391", "40402", "40403", "40412", "40413", "40492", "40493",
            "585", "586", "5880", "V420", "V451", "V56",
        ],
    ),
    (
        "Liver",
        &[
            "07022", "07023", "07032", "07033", "07044", "07054", "0706", "0709", "4560-4562",
            "570", "571", "5722-5724", "5728", "5733", "5734", "5738", "5739", "V427",
        ],
    ),
    (
        "PUD",
        &["5317", "5319", "5327", "5329", "5337", "5339", "5347", "5349"],
    ),
    ("HIV", &["042-044"]),
    ("Lymphoma", &["200-202", "2030", "2386"]),
    ("Mets", &["196-199"]),
    ("Tumor", &["140-172", "174-195"]),
    (
        "Rheumatic",
        &[
            "446", "7010", "7100-7104", "7108", "7109", "7112", "714", "7193", "720", "725",
        ],
    ),
    ("Coagulopathy", &["286", "2871", "2873-2875"]),
    ("Obesity", &["2780"]),
    ("WeightLoss", &["260-263", "7832", "7994"]),
    ("FluidsLytes", &["2536", "276"]),
    ("BloodLoss", &["2800"]),
    ("Anemia", &["2801-2809", "281"]),
    (
        "Alcohol",
        &[
            "2652", "2911-2913", "2915-2919", "30300", "30390", "30500", "3575", "4255",
            "5710-5713", "980", "V113",
        ],
    ),
    ("Drugs", &["292", "304", "30520-30529", "3576"]),
    (
        "Psychoses",
        &["2938", "295", "29604", "29614", "29644", "29654", "297", "298"],
    ),
    ("Depression", &["2962", "2963", "2965", "3004", "309", "311"]),
];

/// The bundled Charlson ICD-9 map, pre-expanded
#[must_use]
pub fn charlson_icd9() -> ComorbidityMap {
    build(CHARLSON_ICD9)
}

/// The bundled Elixhauser ICD-9 map, pre-expanded
#[must_use]
pub fn elixhauser_icd9() -> ComorbidityMap {
    build(ELIXHAUSER_ICD9)
}

/// The Charlson exclusive pairs: a complicated form suppresses its
/// uncomplicated counterpart
#[must_use]
pub fn charlson_rules() -> Vec<HierarchyRule> {
    vec![
        HierarchyRule::new("DMcx", "DM"),
        HierarchyRule::new("Mets", "Cancer"),
        HierarchyRule::new("LiverSevere", "LiverMild"),
    ]
}

/// The Elixhauser exclusive pairs
#[must_use]
pub fn elixhauser_rules() -> Vec<HierarchyRule> {
    vec![
        HierarchyRule::new("DMcx", "DM"),
        HierarchyRule::new("Mets", "Tumor"),
        HierarchyRule::new("HTNcx", "HTN"),
    ]
}

fn build(table: &[(&str, &[&str])]) -> ComorbidityMap {
    let mut map = ComorbidityMap::new();
    for (name, entries) in table {
        let mut codes = Vec::new();
        for entry in *entries {
            codes.extend(expand_entry(entry));
        }
        map.push_category(name, codes)
            .expect("bundled mapping categories are unique");
    }
    map
}

fn expand_entry(entry: &str) -> Vec<Code> {
    if let Some((start, end)) = entry.split_once('-') {
        let start = parse_entry(start);
        let end = parse_entry(end);
        possible_range(&start, &end, &RangeOptions::default())
            .expect("bundled mapping ranges are well-formed")
    } else {
        possible_children(&parse_entry(entry))
    }
}

fn parse_entry(raw: &str) -> Code {
    Code::parse(raw, CodeSystem::Icd9, Representation::Short)
        .expect("bundled mapping codes are well-formed")
}
