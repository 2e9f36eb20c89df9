//! Read-only access to built indexes.
//!
//! An [`IndexSearcher`] wraps one opened index. Opening never fails hard:
//! a missing, empty or unreadable directory is the normal state of an index
//! that has not been built yet, so [`IndexSearcher::open`] returns `None`
//! and the index simply contributes nothing to a search.
//!
//! [`QueryExecutor`] runs one query over any number of searchers.

mod cache;
mod compile;
mod execute;

use std::path::Path;

pub use cache::SearcherCache;
pub use execute::{Hit, QueryExecutor, ResultSet, SearchRequest};
use sift_config::IndexDescriptor;
use tantivy::{Index, IndexReader, ReloadPolicy, Searcher, schema::Schema};
use tracing::debug;

use crate::{
    analyzer::{AnalysisMode, Analyzer},
    error::IndexError,
    schema::stored_field_names,
    store::DirectoryStore,
};

/// An opened index, safe to share between threads.
#[derive(Clone)]
pub struct IndexSearcher {
    /// Descriptor the index was opened from.
    descriptor: IndexDescriptor,
    /// The Tantivy index.
    index: Index,
    /// Reader following new commits.
    reader: IndexReader,
}

impl IndexSearcher {
    /// Opens the index, or returns `None` if it is not ready.
    pub fn open(descriptor: &IndexDescriptor) -> Option<Self> {
        match Self::try_open(descriptor) {
            Ok(searcher) => Some(searcher),
            Err(e) => {
                debug!(index = %descriptor.name, reason = %e, "index unavailable");
                None
            }
        }
    }

    /// Opens the index, reporting why it is unavailable.
    pub fn try_open(descriptor: &IndexDescriptor) -> Result<Self, IndexError> {
        let path = descriptor.path();
        let store = DirectoryStore::new(path);
        if !store.exists() {
            return Err(unavailable(path, "directory does not exist"));
        }
        if store.is_empty() {
            return Err(unavailable(path, "directory is empty"));
        }

        let directory = store
            .open()
            .map_err(|e| unavailable(path, &e.to_string()))?;
        let index = Index::open(directory).map_err(|e| unavailable(path, &e.to_string()))?;
        Analyzer::for_index(descriptor, AnalysisMode::Index)
            .map_err(|e| unavailable(path, &e.to_string()))?
            .register(&index);

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e: tantivy::TantivyError| unavailable(path, &e.to_string()))?;

        Ok(Self {
            descriptor: descriptor.clone(),
            index,
            reader,
        })
    }

    /// Returns the descriptor.
    pub fn descriptor(&self) -> &IndexDescriptor {
        &self.descriptor
    }

    /// Returns the index name.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Returns the schema stored in the index.
    pub fn schema(&self) -> Schema {
        self.index.schema()
    }

    /// Names of the stored fields returned with hits.
    pub fn schema_fields(&self) -> Vec<String> {
        stored_field_names(&self.schema())
    }

    /// Returns a point-in-time view of the index.
    pub fn searcher(&self) -> Searcher {
        self.reader.searcher()
    }

    /// Returns the number of searchable documents.
    pub fn num_docs(&self) -> u64 {
        self.searcher().num_docs()
    }

    /// Picks up the latest commit immediately.
    pub fn reload(&self) -> Result<(), IndexError> {
        self.reader.reload().map_err(|e| IndexError::read(&e))
    }
}

impl AsRef<Self> for IndexSearcher {
    fn as_ref(&self) -> &Self {
        self
    }
}

/// Builds an `IndexUnavailable` error.
fn unavailable(path: &Path, reason: &str) -> IndexError {
    IndexError::IndexUnavailable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
