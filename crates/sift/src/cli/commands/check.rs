//! Implementation of `sift check`.

use std::process::ExitCode;

use sift_config::ConfigWarning;
use sift_index::{Analyzer, AnalysisMode, IndexStatus, detect_index_status};

use crate::cli::context::CommandContext;

/// Validates the configuration and reports the state of each index.
///
/// Exits with failure when any warning is found.
pub fn run(ctx: &CommandContext) -> ExitCode {
    println!("Checking configuration...");
    println!();

    let Some(path) = &ctx.config_file else {
        println!("No configuration file found.");
        return ExitCode::SUCCESS;
    };
    println!("Config file:");
    println!("  {}", path.display());
    println!();

    let warnings = ctx.config.validate();
    let mut problems: Vec<String> = warnings.iter().map(ToString::to_string).collect();

    if !ctx.config.indexes.is_empty() {
        println!("Indexes:");
        for descriptor in &ctx.config.indexes {
            let status = detect_index_status(descriptor);
            println!("  {} [{}]", descriptor.name, status.description());
            if status == IndexStatus::ConfigChanged {
                problems.push(format!(
                    "index '{}' was built with a different configuration",
                    descriptor.name
                ));
            }
            for mode in [AnalysisMode::Index, AnalysisMode::Search] {
                if let Err(e) = Analyzer::for_index(descriptor, mode) {
                    problems.push(format!("index '{}': {e}", descriptor.name));
                }
            }
        }
        println!();
    }

    if problems.is_empty() {
        println!("No issues found.");
        return ExitCode::SUCCESS;
    }

    problems.dedup();
    println!("Warnings ({}):", problems.len());
    for problem in &problems {
        println!("  - {problem}");
    }
    println!();
    print_hints(&warnings);

    ExitCode::FAILURE
}

/// Prints hints for resolving common warnings.
fn print_hints(warnings: &[ConfigWarning]) {
    let mut hints: Vec<&str> = warnings
        .iter()
        .map(|warning| match warning {
            ConfigWarning::NoIndexesDefined => "Add [[index]] sections to define indexes.",
            ConfigWarning::DuplicateIndexName { .. } => "Give every index a unique name.",
            ConfigWarning::DuplicateField { .. } => "Remove repeated [[index.field]] entries.",
            ConfigWarning::ReservedField { .. } => {
                "The fields id, content and alias_path are always present; remove them."
            }
            ConfigWarning::UnknownLanguage { .. } => {
                "Use one of the supported stemming languages, e.g. \"english\"."
            }
            ConfigWarning::StemmingWithoutLanguage { .. } => {
                "Set analyzer.language or disable analyzer.stemming."
            }
            ConfigWarning::IndexPathNotDirectory { .. } => {
                "Index paths must point to directories, not files."
            }
        })
        .collect();
    hints.sort_unstable();
    hints.dedup();

    if !hints.is_empty() {
        println!("Hints:");
        for hint in hints {
            println!("  - {hint}");
        }
    }
}
