//! `pkgate manifest` command implementation.

use pkgate_core::error::{GatewayError, GatewayResult};
use pkgate_core::types::PackageName;

use super::CommandContext;

/// Execute the `pkgate manifest` command
pub async fn execute(name: PackageName, version: String, ctx: &CommandContext) -> GatewayResult<()> {
    let log = ctx.logger("manifest");

    let config = ctx
        .gateway
        .get_package_config(&name, &version, &log)
        .await?
        .ok_or_else(|| GatewayError::PackageNotFound {
            name: format!("{}@{}", name, version),
        })?;

    ctx.output.json(&config)
}
