//! Command line interface for kodegen_bundler_nsis.
//!
//! Parses arguments, dispatches to the `make`, `verify` and `hash` commands
//! and reports results through [`OutputManager`].

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, RuntimeConfig};
pub use commands::execute_command;
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute_command(args).await
}
