//! Implementation of `sift status`.

use std::process::ExitCode;

use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
use sift_index::{DirectoryStore, IndexSearcher, IndexStatus, detect_index_status};

use crate::cli::context::CommandContext;

/// Shows the configuration file, engine settings and every index's state.
pub fn run(ctx: &CommandContext) -> ExitCode {
    match &ctx.config_file {
        Some(path) => println!("Config: {}", path.display()),
        None => {
            println!("No configuration file found.");
            println!("Create sift.toml with [[index]] sections to get started.");
            return ExitCode::SUCCESS;
        }
    }
    match ctx.config.engine_to_toml() {
        Ok(engine) => print!("\n{engine}"),
        Err(e) => eprintln!("warning: could not render engine settings: {e}"),
    }
    println!();

    if ctx.config.indexes.is_empty() {
        println!("Indexes: (none defined)");
        return ExitCode::SUCCESS;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Index", "Status", "Documents", "Size", "Path"]);
    for descriptor in &ctx.config.indexes {
        let status = detect_index_status(descriptor);
        let docs = match status {
            IndexStatus::Missing => "-".to_string(),
            _ => IndexSearcher::open(descriptor)
                .map_or_else(|| "?".to_string(), |s| s.num_docs().to_string()),
        };
        let size = DirectoryStore::new(descriptor.path()).disk_usage();
        table.add_row(vec![
            Cell::new(&descriptor.name),
            Cell::new(status.description()),
            Cell::new(docs),
            Cell::new(format_bytes(size)),
            Cell::new(descriptor.path().display()),
        ]);
    }
    println!("{table}");
    ExitCode::SUCCESS
}

/// Human-readable byte count.
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
    }
}
