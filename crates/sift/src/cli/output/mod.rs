//! Rendering and JSON serialization for CLI output.

use std::process::ExitCode;

use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
use serde::Serialize;
use sift_config::CONTENT_FIELD;
use sift_index::{Hit, ResultSet};

/// Characters of content shown per hit in table output.
const SNIPPET_CHARS: usize = 60;

/// JSON output for `sift search`.
#[derive(Serialize)]
pub struct JsonSearchOutput<'a> {
    /// The query as typed.
    query: &'a str,
    /// Distinct matches before paging.
    total: usize,
    /// Best score among the matches.
    max_score: f32,
    /// Indexes that took part in the search.
    indexes: &'a [String],
    /// The returned page.
    hits: &'a [Hit],
}

impl<'a> JsonSearchOutput<'a> {
    /// Wraps a result set for serialization.
    pub fn new(query: &'a str, results: &'a ResultSet) -> Self {
        Self {
            query,
            total: results.total,
            max_score: results.max_score,
            indexes: &results.indexes,
            hits: &results.hits,
        }
    }
}

/// Prints a value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize JSON: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Prints hits as a table followed by a summary line.
pub fn print_results(results: &ResultSet) {
    if results.hits.is_empty() {
        println!("No matches ({} searched)", results.indexes.join(", "));
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["ID", "Index", "Score", "Content"]);
    for hit in &results.hits {
        table.add_row(vec![
            Cell::new(&hit.id),
            Cell::new(&hit.index),
            Cell::new(format!("{:.3}", hit.score)),
            Cell::new(snippet(hit)),
        ]);
    }
    println!("{table}");
    println!(
        "{} of {} match(es) from {}",
        results.hits.len(),
        results.total,
        results.indexes.join(", ")
    );
}

/// First line of the hit's content, shortened for display.
fn snippet(hit: &Hit) -> String {
    let content = hit.value(CONTENT_FIELD).unwrap_or_default();
    let line = content.lines().next().unwrap_or_default();
    if line.chars().count() > SNIPPET_CHARS {
        let short: String = line.chars().take(SNIPPET_CHARS).collect();
        format!("{short}…")
    } else {
        line.to_string()
    }
}
