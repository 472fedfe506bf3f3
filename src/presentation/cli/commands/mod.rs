pub mod add;
pub mod artifacts;
pub mod backend;
pub mod list;
pub mod migrate;
pub mod resolve;

pub use add::*;
pub use artifacts::*;
pub use backend::*;
pub use list::*;
pub use migrate::*;
pub use resolve::*;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use super::display::Display;
use crate::application::use_cases::manage_workspace::WorkspaceManager;
use crate::application::use_cases::resolve_dependencies::{ReferenceStatus, ResolutionReport};
use crate::domain::entities::workspace_config::WorkspaceConfig;
use crate::infrastructure::filesystem::workspace_lock::WorkspaceLock;
use crate::infrastructure::scm::GitScm;

/// Everything a command needs to reach the workspace
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub workspace_root: PathBuf,
    pub config: WorkspaceConfig,
    pub verbose: bool,
    pub display: Display,
}

impl CommandContext {
    pub async fn open(&self) -> Result<WorkspaceManager> {
        let manager = WorkspaceManager::open(
            self.workspace_root.clone(),
            self.config.clone(),
            Arc::new(GitScm::new()),
        )
        .await
        .with_context(|| format!("cannot open workspace {}", self.workspace_root.display()))?;
        Ok(manager)
    }

    /// Lock held by commands that change the layout or the manifest
    pub fn lock(&self) -> Result<WorkspaceLock> {
        let lock = WorkspaceLock::acquire_for(&self.workspace_root, &self.config)?;
        Ok(lock)
    }
}

/// Print per-reference outcomes; returns the number of failures
pub(crate) fn print_resolution(display: &Display, report: &ResolutionReport, verbose: bool) -> usize {
    for outcome in &report.outcomes {
        match &outcome.status {
            ReferenceStatus::Cloned { location } => {
                display.success(&format!("{} -> {}", outcome.reference, location.display()))
            }
            ReferenceStatus::AlreadyPresent { location } => {
                if verbose {
                    println!("  {} already at {}", outcome.reference, location.display());
                }
            }
            ReferenceStatus::Failed { reason } => {
                display.failure(&format!("{}: {}", outcome.reference, reason))
            }
        }
    }
    report.failed().len()
}
