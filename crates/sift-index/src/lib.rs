//! Tantivy-backed indexes for sift.
//!
//! This crate owns everything below the query language:
//! - Directory stores holding one index each, with lock inspection
//! - Analyzer pipelines built from index descriptors
//! - Index writers with configuration-hash tracking
//! - Searchers that treat missing indexes as empty
//! - Multi-index query execution with path filters, sorting and paging
//! - Recovery from stale writer locks
//!
//! # Example
//!
//! ```no_run
//! use sift_config::{EngineSettings, IndexDescriptor};
//! use sift_index::{Document, IndexSearcher, IndexWriter, QueryExecutor, SearchRequest};
//!
//! let news = IndexDescriptor::new("news", "./idx/news");
//!
//! let mut writer = IndexWriter::open_or_create(&news, false).unwrap();
//! writer
//!     .add_document(&Document::new("1", "The quick brown fox").with_alias_path("/news/fox"))
//!     .unwrap();
//! writer.commit().unwrap();
//!
//! let searchers: Vec<IndexSearcher> = IndexSearcher::open(&news).into_iter().collect();
//! let executor = QueryExecutor::new(&EngineSettings::default());
//! let results = executor
//!     .search(&SearchRequest::new("fox").with_path_scope("/news"), &searchers)
//!     .unwrap();
//! assert_eq!(results.total, 1);
//! ```

#![warn(missing_docs)]

mod analyzer;
mod config_hash;
mod document;
mod error;
mod filter;
mod schema;
mod search;
mod sort;
mod status;
mod store;
mod unlock;
mod writer;

pub use analyzer::{AnalysisMode, Analyzer, SIFT_TOKENIZER, parse_language, strip_diacritics};
pub use config_hash::{
    CONFIG_HASH_FILE, IndexingConfig, SCHEMA_VERSION, compute_config_hash, config_hash_path,
    read_stored_hash, write_config_hash,
};
pub use document::{Document, read_json_lines};
pub use error::{AnalyzerError, IndexError, SearchError};
pub use filter::{Filter, FilterPredicate, FilteredCollector};
pub use schema::IndexSchema;
pub use search::{Hit, IndexSearcher, QueryExecutor, ResultSet, SearchRequest, SearcherCache};
pub use sort::{
    SCORE_FIELD, SortComparator, SortCriterion, SortKind, SortSpecification, parse_sort,
};
pub use status::{IndexStatus, detect_index_status};
pub use store::{DirectoryStore, META_FILE, WRITER_LOCK_FILE};
pub use unlock::force_unlock;
pub use writer::{DEFAULT_HEAP_SIZE, IndexWriter};
