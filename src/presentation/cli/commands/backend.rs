use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use crate::domain::entities::backend_state::BackendState;

/// Handler for the backend command
pub struct BackendCommand;

impl BackendCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let manager = ctx.open().await?;
        let state = manager.active_backend();

        println!("{} {}", "Backend:".bold(), state);
        if let BackendState::Composite { manifest, .. } = state.as_ref() {
            for (index, store) in manifest.iter().enumerate() {
                let role = if index == 0 { "writable" } else { "read-only" };
                println!("  {}. {} [{}]", index + 1, store.location().display(), role);
            }
        }
        Ok(())
    }
}
