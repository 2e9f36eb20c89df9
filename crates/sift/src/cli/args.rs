//! Clap argument definitions for the `sift` CLI.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Multi-index full-text search")]
pub struct Cli {
    /// Configuration file to use instead of the discovered one
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v for info, -vv for debug)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments for `sift index`.
#[derive(Args, Debug, Clone)]
pub struct IndexCommand {
    /// Index to write to
    pub name: String,

    /// JSON-lines file of documents (reads stdin when omitted)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Discard existing contents before indexing
    #[arg(long)]
    pub rebuild: bool,
}

/// Arguments for `sift search`.
#[derive(Args, Debug, Clone)]
pub struct SearchCommand {
    /// Query string
    pub query: String,

    /// Limit the search to specific indexes (can be specified multiple times)
    #[arg(short, long = "index")]
    pub indexes: Vec<String>,

    /// Only match documents whose alias path starts with this prefix
    #[arg(long)]
    pub scope: Option<String>,

    /// Sort expression, e.g. "(date)published desc, ##score##"
    #[arg(long)]
    pub sort: Option<String>,

    /// Maximum results to return
    #[arg(short = 'n', long, default_value = "10")]
    pub limit: usize,

    /// Number of results to skip
    #[arg(long, default_value = "0")]
    pub offset: usize,

    /// Return nothing unless the query searches document content
    #[arg(long)]
    pub require_content: bool,

    /// Require every unmarked clause to match
    #[arg(long)]
    pub all: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `sift decompose`.
#[derive(Args, Debug, Clone)]
pub struct DecomposeCommand {
    /// Query string
    pub query: String,

    /// Field whose clauses are kept
    #[arg(long, default_value = "content")]
    pub field: String,

    /// Render as a SQL LIKE predicate over this column
    #[arg(long)]
    pub sql: Option<String>,
}

/// Arguments for `sift unlock`.
#[derive(Args, Debug, Clone)]
pub struct UnlockCommand {
    /// Index to unlock (all indexes when omitted)
    pub name: Option<String>,
}

/// Supported `sift` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Add documents to an index
    Index(IndexCommand),

    /// Search one or more indexes
    Search(SearchCommand),

    /// Show the AND/OR/NOT clauses a query reduces to on one field
    Decompose(DecomposeCommand),

    /// Remove writer locks left behind by crashed processes
    Unlock(UnlockCommand),

    /// Show configured indexes and their state
    Status,

    /// Validate configuration and diagnose issues
    Check,
}
