use anyhow::Result;

use super::CommandContext;

/// Handler for the migrate command
pub struct MigrateCommand;

impl MigrateCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let _lock = ctx.lock()?;
        let manager = ctx.open().await?;
        let report = manager.migrate().await?;

        if !report.performed {
            ctx.display.success("Workspace already uses the composite layout");
            return Ok(());
        }

        if ctx.verbose {
            for moved in &report.moved {
                println!("  moved {}", moved.display());
            }
        }
        for failure in &report.failures {
            ctx.display.warning(&format!(
                "left behind {}: {}",
                failure.path.display(),
                failure.message
            ));
        }
        if report.metadata_removed {
            println!("  removed version-control metadata from the workspace root");
        }

        ctx.display.success(&format!(
            "Moved {} entries into {}",
            report.moved.len(),
            report.local_store.display()
        ));
        Ok(())
    }
}
