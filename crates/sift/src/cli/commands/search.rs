//! Implementation of `sift search`.

use std::process::ExitCode;

use sift_index::{IndexSearcher, QueryExecutor, SearchError, SearchRequest};
use sift_query::Operator;
use tracing::info;

use crate::cli::{args::SearchCommand, context::CommandContext, output};

/// Searches the selected indexes and prints the merged hits.
pub fn run(ctx: &CommandContext, cmd: &SearchCommand) -> ExitCode {
    let descriptors = match ctx.select(&cmd.indexes) {
        Ok(descriptors) => descriptors,
        Err(code) => return code,
    };

    let searchers: Vec<IndexSearcher> = descriptors
        .iter()
        .filter_map(|descriptor| {
            let searcher = IndexSearcher::open(descriptor);
            if searcher.is_none() {
                info!(index = %descriptor.name, "skipping unavailable index");
            }
            searcher
        })
        .collect();

    let executor = QueryExecutor::new(&ctx.config.engine);
    match executor.search(&request(cmd), &searchers) {
        Ok(results) => {
            if cmd.json {
                output::print_json(&output::JsonSearchOutput::new(&cmd.query, &results))
            } else {
                output::print_results(&results);
                ExitCode::SUCCESS
            }
        }
        Err(SearchError::NoIndexes) => {
            eprintln!("error: none of the selected indexes have been built");
            eprintln!("Run 'sift index <name>' to build one.");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Translates CLI flags into a search request.
fn request(cmd: &SearchCommand) -> SearchRequest {
    let mut request = SearchRequest::new(&cmd.query)
        .with_max_results(cmd.limit)
        .with_offset(cmd.offset);
    if let Some(scope) = &cmd.scope {
        request = request.with_path_scope(scope);
    }
    if let Some(sort) = &cmd.sort {
        request = request.with_sort(sort);
    }
    if cmd.require_content {
        request = request.requiring_content();
    }
    if cmd.all {
        request = request.with_operator(Operator::And);
    }
    request
}
