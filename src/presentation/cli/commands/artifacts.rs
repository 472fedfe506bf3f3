use anyhow::Result;
use std::io::Write;

use super::CommandContext;
use crate::domain::value_objects::artifact_id::ArtifactId;
use crate::presentation::cli::OutputFormat;

/// Handler for the artifacts command
pub struct ArtifactsCommand {
    pub output: OutputFormat,
}

impl ArtifactsCommand {
    pub fn new(output: OutputFormat) -> Self {
        Self { output }
    }

    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let manager = ctx.open().await?;
        let view = manager.aggregate_view();
        let listing = view.list_artifacts().await?;

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listing)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&listing)?),
            OutputFormat::Text => {
                for artifact in &listing.artifacts {
                    if ctx.verbose {
                        println!("{}  ({})", artifact.id, artifact.store_root.display());
                    } else {
                        println!("{}", artifact.id);
                    }
                }
                for collision in &listing.collisions {
                    ctx.display.warning(&format!(
                        "{} in {} is shadowed by {}",
                        collision.id,
                        collision.shadowed.display(),
                        collision.winner.display()
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Handler for the show command
pub struct ShowCommand {
    pub id: String,
}

impl ShowCommand {
    pub fn new(id: String) -> Self {
        Self { id }
    }

    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let id = ArtifactId::new(&self.id)?;
        let manager = ctx.open().await?;
        let view = manager.aggregate_view();

        let content = view.read(&id).await?;
        for warning in view.take_warnings() {
            eprintln!(
                "warning: {} in {} is shadowed by {}",
                warning.id,
                warning.shadowed.display(),
                warning.winner.display()
            );
        }

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&content)?;
        stdout.flush()?;
        Ok(())
    }
}
