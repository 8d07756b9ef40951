//! Canonical code hierarchy index
//!
//! A [`HierarchyIndex`] is the ordered canonical list of defined codes for
//! one (system, year) revision, plus an O(1) code-to-position lookup. It is
//! built once from external reference data and shared read-only thereafter;
//! every expansion algorithm in this crate depends on its ordering invariant:
//! all descendants of a code occupy a contiguous block immediately following
//! it, terminated by the next entry whose code is at most as long as the
//! parent's.

pub mod catalog;
pub mod loader;

use crate::code::{Code, CodeSystem, Representation, major_len};
use crate::error::{ComorbidError, Result};
use rustc_hash::FxHashMap;
use serde::Deserialize;

/// One row of a canonical code list
#[derive(Debug, Clone, Deserialize)]
pub struct CanonicalEntry {
    /// The defined code, in short form
    pub code: String,
    /// Whether the code is billable (has no officially recognized
    /// descendants)
    #[serde(default)]
    pub leaf: bool,
    /// Chapter the code belongs to
    #[serde(default)]
    pub chapter: Option<String>,
    /// Sub-chapter the code belongs to
    #[serde(default)]
    pub sub_chapter: Option<String>,
}

/// Immutable, version-specific index over a canonical code list
#[derive(Debug)]
pub struct HierarchyIndex {
    system: CodeSystem,
    year: u16,
    entries: Vec<CanonicalEntry>,
    positions: FxHashMap<String, usize>,
    max_block: usize,
}

impl HierarchyIndex {
    /// Build an index from a pre-sorted canonical list.
    ///
    /// Callers supply reference data already sorted into canonical order;
    /// construction verifies the descendant-contiguity invariant rather than
    /// re-sorting, and fails with [`ComorbidError::InvalidIndex`] if the
    /// invariant does not hold. Each code is also syntax-checked for the
    /// declared system.
    pub fn build(system: CodeSystem, year: u16, entries: Vec<CanonicalEntry>) -> Result<Self> {
        let mut positions =
            FxHashMap::with_capacity_and_hasher(entries.len(), rustc_hash::FxBuildHasher);
        let mut max_block = 0usize;
        // Stack of positions of the currently open ancestor blocks.
        let mut open: Vec<usize> = Vec::new();

        for (pos, entry) in entries.iter().enumerate() {
            let code =
                Code::parse(&entry.code, system, Representation::Short)?.short_value();
            if code != entry.code {
                return Err(ComorbidError::InvalidIndex(format!(
                    "entry {:?} is not in normalized short form",
                    entry.code
                )));
            }
            if positions.insert(code, pos).is_some() {
                return Err(ComorbidError::InvalidIndex(format!(
                    "duplicate entry {:?}",
                    entry.code
                )));
            }

            // Close every block this entry does not belong to, recording its
            // descendant count. A block is delimited by length alone, so a
            // longer entry inside it must be a descendant, and a closing
            // entry must not be a prefix of anything still on the stack.
            while let Some(&top) = open.last() {
                let parent = &entries[top].code;
                if entry.code.len() > parent.len() {
                    if entry.code.starts_with(parent.as_str()) {
                        break;
                    }
                    return Err(ComorbidError::InvalidIndex(format!(
                        "{:?} falls inside the block of {:?} without being its descendant",
                        entry.code, parent
                    )));
                }
                if parent.starts_with(entry.code.as_str()) {
                    return Err(ComorbidError::InvalidIndex(format!(
                        "descendant {:?} appears before its parent {:?}",
                        parent, entry.code
                    )));
                }
                max_block = max_block.max(pos - top - 1);
                open.pop();
            }

            // Any prefix of this code longer than the nearest open ancestor
            // must not already be in the list: its block was closed, so its
            // descendants would no longer be contiguous.
            let ancestor_len = open.last().map_or(0, |&top| entries[top].code.len());
            let shortest = major_len(&entry.code, system).max(ancestor_len + 1);
            for len in shortest..entry.code.len() {
                if positions.contains_key(&entry.code[..len]) {
                    return Err(ComorbidError::InvalidIndex(format!(
                        "descendants of {:?} are not contiguous: {:?} appears after the block closed",
                        &entry.code[..len],
                        entry.code
                    )));
                }
            }

            open.push(pos);
        }
        for &top in &open {
            max_block = max_block.max(entries.len() - top - 1);
        }

        Ok(Self {
            system,
            year,
            entries,
            positions,
            max_block,
        })
    }

    /// The coding system this index covers
    #[must_use]
    pub const fn system(&self) -> CodeSystem {
        self.system
    }

    /// The revision year this index covers
    #[must_use]
    pub const fn year(&self) -> u16 {
        self.year
    }

    /// Number of defined codes in the list
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical position of a short-form code, if defined
    #[must_use]
    pub fn position_of(&self, short_code: &str) -> Option<usize> {
        self.positions.get(short_code).copied()
    }

    /// The entry at a canonical position
    #[must_use]
    pub fn entry_at(&self, pos: usize) -> &CanonicalEntry {
        &self.entries[pos]
    }

    /// Whether a defined code is billable; `None` if the code is not defined
    #[must_use]
    pub fn is_leaf(&self, short_code: &str) -> Option<bool> {
        self.position_of(short_code).map(|p| self.entries[p].leaf)
    }

    /// Positions of the descendants of the entry at `pos`: the contiguous
    /// block of longer codes immediately following it. Empty for a
    /// structural leaf.
    #[must_use]
    pub fn block_of(&self, pos: usize) -> std::ops::Range<usize> {
        let len = self.entries[pos].code.len();
        let mut end = pos + 1;
        while end < self.entries.len() && self.entries[end].code.len() > len {
            end += 1;
        }
        pos + 1..end
    }

    /// The largest descendant-block length observed in this list.
    ///
    /// Derived from the data at build time; used as the lookahead bound for
    /// the ambiguous-start exclusion in range expansion.
    #[must_use]
    pub const fn max_block(&self) -> usize {
        self.max_block
    }

    /// Rebuild a `Code` value for the entry at `pos`
    #[must_use]
    pub(crate) fn code_at(&self, pos: usize) -> Code {
        Code::from_short_unchecked(self.entries[pos].code.clone(), self.system)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(code: &str, leaf: bool) -> CanonicalEntry {
        CanonicalEntry {
            code: code.to_string(),
            leaf,
            chapter: None,
            sub_chapter: None,
        }
    }

    fn small_index() -> HierarchyIndex {
        HierarchyIndex::build(
            CodeSystem::Icd9,
            2015,
            vec![
                entry("410", false),
                entry("4100", false),
                entry("41000", true),
                entry("41001", true),
                entry("4101", true),
                entry("411", true),
            ],
        )
        .unwrap()
    }

    #[test]
    fn builds_and_looks_up() {
        let index = small_index();
        assert_eq!(index.len(), 6);
        assert_eq!(index.position_of("4100"), Some(1));
        assert_eq!(index.position_of("412"), None);
        assert_eq!(index.is_leaf("410"), Some(false));
        assert_eq!(index.is_leaf("41001"), Some(true));
    }

    #[test]
    fn block_covers_contiguous_descendants() {
        let index = small_index();
        assert_eq!(index.block_of(0), 1..5);
        assert_eq!(index.block_of(1), 2..4);
        assert_eq!(index.block_of(5), 6..6);
    }

    #[test]
    fn max_block_derived_from_data() {
        let index = small_index();
        assert_eq!(index.max_block(), 4);
    }

    #[test]
    fn rejects_duplicates() {
        let result = HierarchyIndex::build(
            CodeSystem::Icd9,
            2015,
            vec![entry("410", false), entry("410", false)],
        );
        assert!(matches!(result, Err(ComorbidError::InvalidIndex(_))));
    }

    #[test]
    fn rejects_non_contiguous_descendants() {
        // 4101 re-opens the block of 410 after 411 closed it.
        let result = HierarchyIndex::build(
            CodeSystem::Icd9,
            2015,
            vec![
                entry("410", false),
                entry("4100", true),
                entry("411", true),
                entry("4101", true),
            ],
        );
        assert!(matches!(result, Err(ComorbidError::InvalidIndex(_))));
    }

    #[test]
    fn rejects_non_descendant_inside_a_block() {
        // 4110 is longer than 410, so it sits inside 410's length-delimited
        // block, but it is not a descendant of 410.
        let result = HierarchyIndex::build(
            CodeSystem::Icd9,
            2015,
            vec![entry("410", false), entry("4110", true)],
        );
        assert!(matches!(result, Err(ComorbidError::InvalidIndex(_))));

        let result = HierarchyIndex::build(
            CodeSystem::Icd9,
            2015,
            vec![entry("410", false), entry("4110", true), entry("411", false)],
        );
        assert!(matches!(result, Err(ComorbidError::InvalidIndex(_))));
    }

    #[test]
    fn rejects_descendant_before_its_parent() {
        let result = HierarchyIndex::build(
            CodeSystem::Icd9,
            2015,
            vec![entry("4110", true), entry("411", false)],
        );
        assert!(matches!(result, Err(ComorbidError::InvalidIndex(_))));
    }

    #[test]
    fn rejects_deep_reopened_block() {
        // 41005 belongs to 4100's block, which closed at 4101.
        let result = HierarchyIndex::build(
            CodeSystem::Icd9,
            2015,
            vec![
                entry("410", false),
                entry("4100", false),
                entry("41000", true),
                entry("4101", true),
                entry("41005", true),
            ],
        );
        assert!(matches!(result, Err(ComorbidError::InvalidIndex(_))));
    }
}
