use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use super::CommandContext;
use crate::domain::entities::store_handle::StoreHandle;
use crate::presentation::cli::OutputFormat;

/// One row of `multirepo list`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRow {
    pub name: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub dependencies: Vec<String>,
    pub present: bool,
}

impl From<&StoreHandle> for StoreRow {
    fn from(store: &StoreHandle) -> Self {
        Self {
            name: store.display_name(),
            location: store.location().display().to_string(),
            remote_url: store.remote_url().map(|r| r.as_str().to_string()),
            branch: store.branch().map(str::to_string),
            dependencies: store
                .dependencies()
                .iter()
                .map(|d| d.as_str().to_string())
                .collect(),
            present: store.location().is_dir(),
        }
    }
}

/// Handler for the list command
pub struct ListCommand {
    pub output: OutputFormat,
}

impl ListCommand {
    pub fn new(output: OutputFormat) -> Self {
        Self { output }
    }

    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let manager = ctx.open().await?;
        let manifest = manager.list_stores().await?;
        let rows: Vec<StoreRow> = manifest.iter().map(StoreRow::from).collect();

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&rows)?),
            OutputFormat::Text => {
                if rows.is_empty() {
                    println!("Single-store workspace at {}", ctx.workspace_root.display());
                    return Ok(());
                }
                for (index, row) in rows.iter().enumerate() {
                    let marker = if row.present { "✓".green() } else { "?".red() };
                    let role = if index == 0 { " (local)" } else { "" };
                    println!("{} {}{}", marker, row.name.bold(), role);
                    println!("    {}", row.location);
                    if let Some(remote) = &row.remote_url {
                        println!("    remote: {}", remote);
                    }
                    if let Some(branch) = &row.branch {
                        println!("    branch: {}", branch);
                    }
                    if ctx.verbose && !row.dependencies.is_empty() {
                        println!("    dependencies: {}", row.dependencies.join(", "));
                    }
                }
            }
        }

        Ok(())
    }
}
