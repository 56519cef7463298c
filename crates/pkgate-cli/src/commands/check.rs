//! `pkgate check` command implementation.
//!
//! Prints the effective configuration, with the private token redacted, and
//! optionally where one package would be fetched from.

use pkgate_config::{ConfigSource, toml::serialize_gateway_toml};
use pkgate_core::error::GatewayResult;
use pkgate_core::types::PackageName;

use super::CommandContext;

const REDACTED: &str = "<redacted>";

/// Execute the `pkgate check` command
pub async fn execute(name: Option<PackageName>, ctx: &CommandContext) -> GatewayResult<()> {
    ctx.output.info(&format!("Working directory: {}", ctx.cwd));
    ctx.output.info(&format!("Configuration: {}", describe_source(&ctx.source)));

    let mut shown = ctx.config.clone();
    if shown.registry.private_token.is_some() {
        shown.registry.private_token = Some(REDACTED.to_string());
    }
    ctx.output.data(&serialize_gateway_toml(&shown)?);

    if ctx.config.registry.private_scopes.is_empty() {
        ctx.output.warn("No private scopes configured, every package goes to the public registry");
    }

    if let Some(name) = name {
        let selector = ctx.gateway.selector();
        let class = selector.classify(&name);
        let target = selector.metadata_target(&name, class)?;

        ctx.output.success(&format!(
            "{} is served by the {} registry at {}",
            name,
            class,
            target.url()
        ));
    }

    let stats = ctx.gateway.cache().stats();
    ctx.output.info(&format!(
        "Cache: {} entries, {} of {} bytes",
        stats.entries,
        stats.weighted_bytes,
        ctx.gateway.cache().policy().max_bytes
    ));

    Ok(())
}

pub(crate) fn describe_source(source: &ConfigSource) -> String {
    match source {
        ConfigSource::Explicit(path) => format!("{} (--config)", path),
        ConfigSource::Project(path) => format!("{} (project)", path),
        ConfigSource::Global(path) => format!("{} (global)", path),
        ConfigSource::Defaults => "built-in defaults".to_string(),
    }
}
