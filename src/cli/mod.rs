//! CLI module for migrant.
//!
//! Subcommands:
//! - `init`: Apply pending knowledge-store schema migrations
//! - `check`: Probe every external dependency
//! - `migrate`: Run the full pipeline
//! - `migrate-component`: Migrate one stored component
//! - `report`: Print the aggregated migration log

mod check;
mod init;
mod migrate;
mod report;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::models::ComponentKind;

/// migrant - legacy codebase migration agent
#[derive(Parser)]
#[command(name = "migrant")]
#[command(about = "Migrate a legacy codebase through a code knowledge store")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project config file to use instead of .migrant.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize the knowledge store schema
    Init,

    /// Test connectivity to the source repository, store, LLM and legacy database
    Check,

    /// Fetch, store and migrate the configured source tree
    Migrate {
        /// Component kinds to migrate (overrides migration.target_kinds)
        #[arg(long = "kind", value_delimiter = ',')]
        kinds: Vec<ComponentKind>,
    },

    /// Migrate a single stored component by its source path
    MigrateComponent {
        /// Source path as fetched, e.g. Controllers/OrderController.cs
        path: String,
    },

    /// Print migration counts by component type and status
    Report,
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Init => self.run_init().await,
            Command::Check => self.run_check().await,
            Command::Migrate { ref kinds } => self.run_migrate(kinds).await,
            Command::MigrateComponent { ref path } => self.run_migrate_component(path).await,
            Command::Report => self.run_report().await,
        }
    }

    /// Loads the layered configuration, honoring `--config`.
    fn load_config(&self) -> color_eyre::Result<Config> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_migrate_kinds() {
        let app = App::try_parse_from(["migrant", "migrate", "--kind", "controller,service"]).unwrap();
        match app.command {
            Command::Migrate { kinds } => {
                assert_eq!(kinds, vec![ComponentKind::Controller, ComponentKind::Service])
            }
            _ => panic!("expected migrate"),
        }
    }

    #[test]
    fn test_parse_migrate_component_with_global_flags() {
        let app = App::try_parse_from([
            "migrant",
            "migrate-component",
            "src/Controllers/OrderController.cs",
            "-v",
            "--config",
            "ci.toml",
        ])
        .unwrap();
        assert!(app.verbose);
        assert_eq!(app.config, Some(PathBuf::from("ci.toml")));
        assert!(matches!(
            app.command,
            Command::MigrateComponent { ref path } if path == "src/Controllers/OrderController.cs"
        ));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!(App::try_parse_from(["migrant", "migrate", "--kind", "widget"]).is_err());
    }
}
