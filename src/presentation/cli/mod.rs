pub mod commands;
pub mod display;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process::exit;
use tracing_subscriber::EnvFilter;

use crate::domain::entities::workspace_config::WorkspaceConfig;
use commands::{
    AddCommand, ArtifactsCommand, BackendCommand, CommandContext, ListCommand, MigrateCommand,
    ResolveCommand, ShowCommand,
};
use display::Display;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    Text,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

/// multirepo - compose a workspace out of several version-controlled stores
#[derive(Parser, Debug)]
#[command(name = "multirepo")]
#[command(about = "Compose a modeling workspace out of several version-controlled stores")]
#[command(version)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", ",
    env!("BUILD_TARGET"),
    ", built ",
    env!("BUILD_DATE"),
    ")"
))]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Workspace root (defaults to current directory)
    #[arg(short = 'C', long, global = true, env = "MULTIREPO_WORKSPACE")]
    pub directory: Option<PathBuf>,

    /// Maximum number of concurrent clones
    #[arg(long, global = true, env = "MULTIREPO_JOBS")]
    pub jobs: Option<usize>,

    /// Seconds before a single clone is abandoned
    #[arg(long, global = true, env = "MULTIREPO_CLONE_TIMEOUT")]
    pub clone_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the stores of the workspace
    List {
        /// Output format (text, json, yaml)
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Add stores by remote URL and clone them with their dependencies
    Add {
        /// Remote URLs of the stores
        #[arg(required = true)]
        urls: Vec<String>,

        /// Branch to clone
        #[arg(short, long)]
        branch: Option<String>,

        /// Display name (single store only)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Convert a single-store workspace to the composite layout
    Migrate,

    /// Clone every missing store and dependency
    Resolve,

    /// Show the active storage backend
    Backend,

    /// List artifacts across all stores
    Artifacts {
        /// Output format (text, json, yaml)
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Print an artifact as served by the aggregate view
    Show {
        /// Artifact id, a path relative to a store root
        id: String,
    },
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
}

impl Default for CliApp {
    fn default() -> Self {
        Self::new()
    }
}

impl CliApp {
    pub fn new() -> Self {
        Self { cli: Cli::parse() }
    }

    pub fn from_cli(cli: Cli) -> Self {
        Self { cli }
    }

    /// Install the tracing subscriber; `RUST_LOG` overrides the default level
    pub fn init_logging(&self) {
        let default_level = if self.cli.verbose { "debug" } else { "info" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("multirepo={}", default_level)));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(!self.cli.no_color)
            .try_init();
    }

    pub async fn run(self) -> anyhow::Result<()> {
        colored::control::set_override(!self.cli.no_color);

        match self.handle_command().await {
            Ok(()) => Ok(()),
            Err(e) => {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
                exit(1);
            }
        }
    }

    fn context(&self) -> anyhow::Result<CommandContext> {
        let workspace_root = match &self.cli.directory {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };

        let mut config = WorkspaceConfig::default();
        if let Some(jobs) = self.cli.jobs {
            config = config.with_parallel_jobs(jobs);
        }
        if let Some(timeout) = self.cli.clone_timeout {
            config = config.with_clone_timeout(timeout);
        }
        config.check()?;

        Ok(CommandContext {
            workspace_root,
            config,
            verbose: self.cli.verbose,
            display: Display::new(!self.cli.no_color),
        })
    }

    async fn handle_command(&self) -> anyhow::Result<()> {
        let ctx = self.context()?;

        match &self.cli.command {
            Commands::List { output } => ListCommand::new(*output).execute(&ctx).await,
            Commands::Add { urls, branch, name } => {
                AddCommand::new(urls.clone(), branch.clone(), name.clone())
                    .execute(&ctx)
                    .await
            }
            Commands::Migrate => MigrateCommand.execute(&ctx).await,
            Commands::Resolve => ResolveCommand.execute(&ctx).await,
            Commands::Backend => BackendCommand.execute(&ctx).await,
            Commands::Artifacts { output } => ArtifactsCommand::new(*output).execute(&ctx).await,
            Commands::Show { id } => ShowCommand::new(id.clone()).execute(&ctx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_globals() {
        let cli = Cli::try_parse_from([
            "multirepo",
            "-C",
            "/ws",
            "--jobs",
            "4",
            "add",
            "https://example.com/a.git",
            "--branch",
            "main",
        ])
        .unwrap();

        assert_eq!(cli.directory, Some(PathBuf::from("/ws")));
        assert_eq!(cli.jobs, Some(4));
        match cli.command {
            Commands::Add { urls, branch, name } => {
                assert_eq!(urls, vec!["https://example.com/a.git".to_string()]);
                assert_eq!(branch.as_deref(), Some("main"));
                assert!(name.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_invalid_jobs_rejected_by_config() {
        let cli = Cli::try_parse_from(["multirepo", "--jobs", "0", "backend"]).unwrap();
        assert!(CliApp::from_cli(cli).context().is_err());
    }
}
