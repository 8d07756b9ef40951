//! Shared fixtures for integration tests

use comorbid::{CanonicalEntry, CodeSystem, HierarchyIndex};

fn entry(code: &str, leaf: bool) -> CanonicalEntry {
    CanonicalEntry {
        code: code.to_string(),
        leaf,
        chapter: None,
        sub_chapter: None,
    }
}

/// A small ICD-9 canonical list: majors 100-102, each fully subdivided into
/// ten one-digit minors.
#[must_use]
pub fn icd9_index() -> HierarchyIndex {
    let mut entries = Vec::new();
    for major in ["100", "101", "102"] {
        entries.push(entry(major, false));
        for minor in 0..10 {
            entries.push(entry(&format!("{major}{minor}"), true));
        }
    }
    HierarchyIndex::build(CodeSystem::Icd9, 2015, entries).unwrap()
}
