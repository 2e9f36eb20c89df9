//! Implementation of `sift decompose`.

use std::process::ExitCode;

use sift_config::DefaultOperator;
use sift_query::{Operator, decompose, parse};

use crate::cli::{args::DecomposeCommand, context::CommandContext};

/// Prints the clause tree a query reduces to on one field.
pub fn run(ctx: &CommandContext, cmd: &DecomposeCommand) -> ExitCode {
    let operator = match ctx.config.engine.default_operator {
        DefaultOperator::Or => Operator::Or,
        DefaultOperator::And => Operator::And,
    };
    let node = match parse(&cmd.query, &cmd.field, operator) {
        Ok(node) => node,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let tree = node
        .map(|node| decompose(&node, &cmd.field))
        .unwrap_or_default();
    match &cmd.sql {
        Some(column) => println!("{}", tree.to_sql_predicate(column)),
        None => println!("{}", tree.to_query_string()),
    }
    ExitCode::SUCCESS
}
