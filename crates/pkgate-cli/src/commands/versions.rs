//! `pkgate versions` command implementation.

use pkgate_core::error::{GatewayError, GatewayResult};
use pkgate_core::types::PackageName;

use super::CommandContext;

/// Execute the `pkgate versions` command
pub async fn execute(name: PackageName, ctx: &CommandContext) -> GatewayResult<()> {
    let log = ctx.logger("versions");

    let found = ctx
        .gateway
        .get_versions_and_tags(&name, &log)
        .await?
        .ok_or_else(|| GatewayError::PackageNotFound { name: name.to_string() })?;

    ctx.output.json(&found)?;
    ctx.output.success(&format!(
        "{} has {} versions, latest {}",
        name,
        found.versions.len(),
        found.tag("latest").unwrap_or("-")
    ));

    Ok(())
}
