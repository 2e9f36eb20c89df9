//! Command implementations and dispatch.

pub mod check;
pub mod decompose;
pub mod index;
pub mod search;
pub mod status;
pub mod unlock;

use std::process::ExitCode;

use super::{args::Commands, context::CommandContext};

/// Dispatches to the selected subcommand.
pub fn run(command: Commands, ctx: &CommandContext) -> ExitCode {
    match command {
        Commands::Index(cmd) => index::run(ctx, &cmd),
        Commands::Search(cmd) => search::run(ctx, &cmd),
        Commands::Decompose(cmd) => decompose::run(ctx, &cmd),
        Commands::Unlock(cmd) => unlock::run(ctx, &cmd),
        Commands::Status => status::run(ctx),
        Commands::Check => check::run(ctx),
    }
}
