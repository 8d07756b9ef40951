//! Loading canonical code lists from reference data files
//!
//! Canonical lists arrive as JSON produced from the official annual
//! publications, already sorted into canonical order. The loader only
//! deserializes and hands off to [`HierarchyIndex::build`], which verifies
//! the ordering invariant.

use crate::code::CodeSystem;
use crate::error::{ComorbidError, Result};
use crate::hierarchy::{CanonicalEntry, HierarchyIndex};
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// On-disk shape of a canonical code list
#[derive(Debug, Deserialize)]
struct CanonicalFile {
    system: CodeSystem,
    year: u16,
    entries: Vec<CanonicalEntry>,
}

/// Load and verify a canonical code list from a JSON file
pub fn load_index(path: &Path) -> Result<HierarchyIndex> {
    let content = fs::read_to_string(path).map_err(|source| ComorbidError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: CanonicalFile =
        serde_json::from_str(&content).map_err(|source| ComorbidError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    info!(
        "loaded {} canonical entries for {} {} from {}",
        file.entries.len(),
        file.system,
        file.year,
        path.display()
    );
    HierarchyIndex::build(file.system, file.year, file.entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_canonical_list_from_json() {
        let dir = std::env::temp_dir().join("comorbid_loader_test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("icd9_2015.json");
        fs::write(
            &path,
            r#"{
                "system": "icd9",
                "year": 2015,
                "entries": [
                    {"code": "410", "chapter": "Circulatory"},
                    {"code": "4100", "leaf": false},
                    {"code": "41000", "leaf": true},
                    {"code": "411", "leaf": true}
                ]
            }"#,
        )
        .unwrap();

        let index = load_index(&path).unwrap();
        assert_eq!(index.system(), CodeSystem::Icd9);
        assert_eq!(index.year(), 2015);
        assert_eq!(index.len(), 4);
        assert_eq!(index.entry_at(0).chapter.as_deref(), Some("Circulatory"));
        assert_eq!(index.is_leaf("41000"), Some(true));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_index(Path::new("/nonexistent/canonical.json")).unwrap_err();
        assert!(matches!(err, ComorbidError::Io { .. }));
    }
}
