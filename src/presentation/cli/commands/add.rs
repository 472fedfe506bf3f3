use anyhow::{bail, Result};

use super::{print_resolution, CommandContext};
use crate::domain::value_objects::remote_ref::RemoteRef;

/// Handler for the add command
pub struct AddCommand {
    pub urls: Vec<String>,
    pub branch: Option<String>,
    pub name: Option<String>,
}

impl AddCommand {
    pub fn new(urls: Vec<String>, branch: Option<String>, name: Option<String>) -> Self {
        Self { urls, branch, name }
    }

    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        if self.name.is_some() && self.urls.len() > 1 {
            bail!("--name can only be used with a single store");
        }

        let remotes = self
            .urls
            .iter()
            .map(|url| RemoteRef::parse(url))
            .collect::<Result<Vec<_>, _>>()?;

        let _lock = ctx.lock()?;
        let manager = ctx.open().await?;

        let handles = manager
            .handles_for(remotes)
            .await?
            .into_iter()
            .map(|handle| {
                let handle = match &self.branch {
                    Some(branch) => handle.with_branch(branch.clone()),
                    None => handle,
                };
                match &self.name {
                    Some(name) => handle.with_name(name.clone()),
                    None => handle,
                }
            })
            .collect();

        let spinner = ctx.display.create_spinner("Adding stores and cloning dependencies...");
        let result = manager.add_stores(handles).await;
        spinner.finish_and_clear();
        let result = result?;

        if result.migration.performed {
            ctx.display.step(&format!(
                "Migrated workspace into {}",
                result.migration.local_store.display()
            ));
        }
        for skipped in &result.skipped {
            ctx.display
                .warning(&format!("{} is already part of the workspace", skipped.display()));
        }

        let failed = print_resolution(&ctx.display, &result.resolution, ctx.verbose);
        if failed > 0 {
            bail!("{} stores could not be cloned", failed);
        }

        ctx.display.success(&format!(
            "Workspace has {} active stores",
            manager.active_backend().store_roots().len()
        ));
        Ok(())
    }
}
