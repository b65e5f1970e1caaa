//! `shelf config` command implementation.

use shelf_config::toml::serialize_shelf_toml;

use super::CommandContext;

/// Execute the `shelf config` command
pub async fn execute(ctx: &CommandContext) -> anyhow::Result<()> {
    if ctx.output.is_json() {
        return ctx.output.json(&ctx.config);
    }

    ctx.output.info(&format!("# loaded from {}", ctx.source));
    ctx.output.result(serialize_shelf_toml(&ctx.config)?.trim_end());
    Ok(())
}
