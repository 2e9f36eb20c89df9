//! Per-path cache of opened searchers.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};

use sift_config::IndexDescriptor;

use super::IndexSearcher;

/// Keeps one open searcher per index path.
///
/// Entries stay until [`invalidate`](Self::invalidate) is called, typically
/// after a writer commits to that path. Unavailable indexes are not cached,
/// so the next lookup tries again.
#[derive(Default)]
pub struct SearcherCache {
    /// Open searchers keyed by index directory.
    searchers: RwLock<HashMap<PathBuf, Arc<IndexSearcher>>>,
}

impl SearcherCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached searcher for the descriptor's path, opening it if
    /// needed.
    pub fn get_or_open(&self, descriptor: &IndexDescriptor) -> Option<Arc<IndexSearcher>> {
        if let Some(searcher) = self
            .searchers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(descriptor.path())
        {
            return Some(Arc::clone(searcher));
        }

        let searcher = Arc::new(IndexSearcher::open(descriptor)?);
        let mut searchers = self
            .searchers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = searchers
            .entry(descriptor.path().to_path_buf())
            .or_insert(searcher);
        Some(Arc::clone(entry))
    }

    /// Drops the cached searcher for `path`. Returns true if one was cached.
    pub fn invalidate(&self, path: &Path) -> bool {
        self.searchers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path)
            .is_some()
    }

    /// Drops every cached searcher.
    pub fn clear(&self) {
        self.searchers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Returns the number of cached searchers.
    pub fn len(&self) -> usize {
        self.searchers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
