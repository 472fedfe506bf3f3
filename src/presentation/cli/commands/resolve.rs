use anyhow::{bail, Result};

use super::{print_resolution, CommandContext};

/// Handler for the resolve command
pub struct ResolveCommand;

impl ResolveCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let _lock = ctx.lock()?;
        let manager = ctx.open().await?;

        if !manager.active_backend().is_composite() {
            ctx.display
                .step("Single-store workspace: nothing to resolve (use `multirepo add` first)");
            return Ok(());
        }

        let spinner = ctx.display.create_spinner("Resolving dependencies...");
        let resolved = manager.resolve().await;
        spinner.finish_and_clear();
        let (manifest, report) = resolved?;

        let failed = print_resolution(&ctx.display, &report, ctx.verbose);
        if failed > 0 {
            bail!("{} stores could not be cloned", failed);
        }

        ctx.display
            .success(&format!("All {} stores are materialized", manifest.len()));
        Ok(())
    }
}
