//! Error types for the sift-index crate.

use std::{io, path::PathBuf};

use sift_query::QueryError;
use thiserror::Error;

/// Errors that can occur when working with an index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Failed to open or create the index.
    #[error("failed to open index at {path}: {message}")]
    OpenIndex {
        /// Path to the index directory.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// The index cannot be searched right now.
    #[error("index at {path} is unavailable: {reason}")]
    IndexUnavailable {
        /// Path to the index directory.
        path: PathBuf,
        /// Why the index could not be opened.
        reason: String,
    },

    /// Failed to write to the index.
    #[error("failed to write to index: {0}")]
    Write(String),

    /// Failed to commit changes to the index.
    #[error("failed to commit index: {0}")]
    Commit(String),

    /// Failed to read from the index.
    #[error("failed to read index: {0}")]
    Read(String),

    /// A document in a feed could not be parsed.
    #[error("invalid document on line {line}: {message}")]
    InvalidDocument {
        /// One-based line number.
        line: usize,
        /// Parser message.
        message: String,
    },

    /// The index directory could not be inspected or modified.
    #[error("index directory error: {0}")]
    Directory(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid analyzer configuration.
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
}

impl IndexError {
    /// Creates an `OpenIndex` error from a path and Tantivy error.
    pub(crate) fn open_index(path: PathBuf, source: &tantivy::TantivyError) -> Self {
        Self::OpenIndex {
            path,
            message: source.to_string(),
        }
    }

    /// Creates a `Write` error from a Tantivy error.
    pub(crate) fn write(source: &tantivy::TantivyError) -> Self {
        Self::Write(source.to_string())
    }

    /// Creates a `Commit` error from a Tantivy error.
    pub(crate) fn commit(source: &tantivy::TantivyError) -> Self {
        Self::Commit(source.to_string())
    }

    /// Creates a `Read` error from a Tantivy error.
    pub(crate) fn read(source: &tantivy::TantivyError) -> Self {
        Self::Read(source.to_string())
    }
}

/// Errors raised while building analyzers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyzerError {
    /// A cross-index analyzer was requested for zero indexes.
    #[error("at least one index is required to build an analyzer")]
    NoIndexes,

    /// Unsupported stemming language.
    #[error("unsupported stemmer language: {0}")]
    InvalidLanguage(String),

    /// No stop-word list exists for the language.
    #[error("no stop-word list for language: {0}")]
    NoStopWords(String),

    /// The tokenizer could not be constructed.
    #[error("invalid tokenizer settings: {0}")]
    Tokenizer(String),
}

/// Errors returned by multi-index search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// No searchers were supplied.
    #[error("no indexes to search")]
    NoIndexes,

    /// The query string could not be parsed.
    #[error("invalid search query: {0}")]
    QuerySyntax(#[from] QueryError),

    /// The query has more clauses than allowed.
    #[error("query too broad: {clauses} clauses exceeds the limit of {limit}")]
    TooComplex {
        /// Number of leaf clauses in the query.
        clauses: usize,
        /// Configured ceiling.
        limit: usize,
    },

    /// Any other failure during execution.
    #[error("search failed: {0}")]
    Internal(String),
}

impl From<AnalyzerError> for SearchError {
    fn from(err: AnalyzerError) -> Self {
        match err {
            AnalyzerError::NoIndexes => Self::NoIndexes,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<tantivy::TantivyError> for SearchError {
    fn from(err: tantivy::TantivyError) -> Self {
        Self::Internal(err.to_string())
    }
}
