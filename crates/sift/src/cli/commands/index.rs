//! Implementation of `sift index`.

use std::{
    fs::File,
    io::{self, BufReader},
    process::ExitCode,
};

use sift_config::IndexDescriptor;
use sift_index::{Document, IndexStatus, IndexWriter, detect_index_status, read_json_lines};

use crate::cli::{args::IndexCommand, context::CommandContext};

/// Reads JSON-lines documents and upserts them into one index.
pub fn run(ctx: &CommandContext, cmd: &IndexCommand) -> ExitCode {
    let descriptor = match ctx.index(&cmd.name) {
        Ok(descriptor) => descriptor,
        Err(code) => return code,
    };

    let status = detect_index_status(descriptor);
    if status == IndexStatus::Locked {
        eprintln!("error: index '{}' is locked by another writer", cmd.name);
        eprintln!(
            "If no other sift process is running, run 'sift unlock {}'.",
            cmd.name
        );
        return ExitCode::FAILURE;
    }
    if status == IndexStatus::ConfigChanged && !cmd.rebuild {
        eprintln!(
            "warning: configuration of '{}' changed since it was built; consider --rebuild",
            cmd.name
        );
    }

    let docs = match read_documents(cmd) {
        Ok(docs) => docs,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::FAILURE;
        }
    };

    match write_documents(ctx, descriptor, &docs, cmd.rebuild) {
        Ok(total) => {
            println!(
                "Indexed {} document(s) into '{}' ({total} total)",
                docs.len(),
                cmd.name
            );
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

/// Reads documents from `--file` or stdin.
fn read_documents(cmd: &IndexCommand) -> Result<Vec<Document>, String> {
    let parsed = match &cmd.file {
        Some(path) => {
            let file = File::open(path)
                .map_err(|e| format!("could not open {}: {e}", path.display()))?;
            read_json_lines(BufReader::new(file))
        }
        None => read_json_lines(io::stdin().lock()),
    };
    parsed.map_err(|e| e.to_string())
}

/// Upserts and commits. Returns the document count after the commit.
fn write_documents(
    ctx: &CommandContext,
    descriptor: &IndexDescriptor,
    docs: &[Document],
    rebuild: bool,
) -> Result<u64, String> {
    let mut writer = IndexWriter::open_or_create_with_heap(
        descriptor,
        rebuild,
        ctx.config.engine.writer_heap_bytes,
    )
    .map_err(|e| format!("failed to open index '{}': {e}", descriptor.name))?;
    for doc in docs {
        writer.upsert_document(doc).map_err(|e| e.to_string())?;
    }
    writer.commit().map_err(|e| e.to_string())?;
    writer.num_docs().map_err(|e| e.to_string())
}
