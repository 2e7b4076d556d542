//! Hash command implementation.

use crate::bundler::ArtifactDescriptor;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;

/// Execute hash command
pub(super) async fn execute_hash(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let Command::Hash { file } = &args.command else {
        unreachable!("execute_hash called with non-Hash command");
    };

    let artifact = ArtifactDescriptor::from_path(file).await?;
    let output = config.output();
    let _ = output.field("file", &artifact.file_name());
    let _ = output.field("sha512", &artifact.sha512);
    let _ = output.field("size", &artifact.size.to_string());
    let _ = output.field("version", artifact.version.as_deref().unwrap_or("-"));

    Ok(0)
}
