//! Registry of hierarchy indexes by coding system and year
//!
//! Multiple canonical revisions coexist in one process. The catalog owns one
//! shared, read-only [`HierarchyIndex`] per (system, year); picking the right
//! one for a request remains the caller's responsibility.

use crate::code::CodeSystem;
use crate::hierarchy::HierarchyIndex;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Process-wide collection of canonical indexes.
///
/// Populate it fully before sharing it across threads; afterwards it is
/// read-only and safe for concurrent lookup.
#[derive(Debug, Default)]
pub struct IndexCatalog {
    indexes: FxHashMap<(CodeSystem, u16), Arc<HierarchyIndex>>,
}

impl IndexCatalog {
    /// Create an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an index under its (system, year) key, replacing any
    /// previous registration for that revision
    pub fn insert(&mut self, index: HierarchyIndex) -> Arc<HierarchyIndex> {
        let key = (index.system(), index.year());
        let shared = Arc::new(index);
        self.indexes.insert(key, Arc::clone(&shared));
        shared
    }

    /// The index for a specific revision, if registered
    #[must_use]
    pub fn get(&self, system: CodeSystem, year: u16) -> Option<Arc<HierarchyIndex>> {
        self.indexes.get(&(system, year)).map(Arc::clone)
    }

    /// The most recent registered revision for a system, if any
    #[must_use]
    pub fn latest(&self, system: CodeSystem) -> Option<Arc<HierarchyIndex>> {
        self.indexes
            .iter()
            .filter(|((s, _), _)| *s == system)
            .max_by_key(|((_, year), _)| *year)
            .map(|(_, index)| Arc::clone(index))
    }

    /// Number of registered revisions
    #[must_use]
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    /// True if no revision is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}
