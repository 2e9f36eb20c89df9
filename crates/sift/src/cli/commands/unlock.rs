//! Implementation of `sift unlock`.

use std::process::ExitCode;

use sift_index::force_unlock;

use crate::cli::{args::UnlockCommand, context::CommandContext};

/// Removes stale writer locks from one or all indexes.
pub fn run(ctx: &CommandContext, cmd: &UnlockCommand) -> ExitCode {
    let names: Vec<String> = cmd.name.iter().cloned().collect();
    let descriptors = match ctx.select(&names) {
        Ok(descriptors) => descriptors,
        Err(code) => return code,
    };

    for descriptor in descriptors {
        if force_unlock(descriptor.path()) {
            println!("{}: lock removed", descriptor.name);
        } else {
            println!("{}: not locked", descriptor.name);
        }
    }
    ExitCode::SUCCESS
}
