//! Command execution for the maker CLI.

mod hash;
mod make;
mod verify;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;

use hash::execute_hash;
use make::execute_make;
use verify::execute_verify;

/// Execute the main command based on parsed arguments
///
/// Returns the process exit code. Invalid arguments and command failures
/// are returned as errors for the caller to report.
pub async fn execute_command(args: Args) -> Result<i32> {
    args.validate()?;

    let config = RuntimeConfig::from(&args);

    let result = match &args.command {
        Command::Make { .. } => execute_make(&args, &config).await,
        Command::Verify { .. } => execute_verify(&args, &config).await,
        Command::Hash { .. } => execute_hash(&args, &config).await,
    };

    if result.is_err() {
        log::debug!("Command '{}' failed", args.command.name());
    }
    result
}
