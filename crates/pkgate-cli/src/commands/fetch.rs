//! `pkgate fetch` command implementation.
//!
//! Streams the decompressed tarball to a file or to stdout without
//! buffering the whole package in memory.

use std::path::{Path, PathBuf};

use pkgate_core::error::{GatewayError, GatewayResult};
use pkgate_core::types::PackageName;
use pkgate_registry::TarballStream;

use super::CommandContext;

/// Execute the `pkgate fetch` command
pub async fn execute(
    name: PackageName,
    version: String,
    output: Option<PathBuf>,
    ctx: &CommandContext,
) -> GatewayResult<()> {
    let log = ctx.logger("fetch");

    let stream = ctx
        .gateway
        .get_package(&name, &version, &log)
        .await?
        .ok_or_else(|| GatewayError::PackageNotFound {
            name: format!("{}@{}", name, version),
        })?;

    match output {
        Some(path) => {
            let written = write_to_file(stream, &path).await?;
            ctx.output.success(&format!("Wrote {} bytes to {}", written, path.display()));
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stream.copy_to(&mut stdout).await?;
        }
    }

    Ok(())
}

async fn write_to_file(stream: TarballStream, path: &Path) -> GatewayResult<u64> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| GatewayError::io(format!("Failed to create {}", path.display()), e))?;

    match stream.copy_to(&mut file).await {
        Ok(written) => Ok(written),
        Err(e) => {
            // Do not leave a truncated tarball behind
            drop(file);
            let _ = tokio::fs::remove_file(path).await;
            Err(e)
        }
    }
}
