//! Migration command handlers.

use color_eyre::Result;

use crate::context::Context;
use crate::models::{ComponentKind, MigrationStatus};
use crate::services::MigrationOutcome;

use super::App;

fn print_outcome(outcome: &MigrationOutcome) {
    match outcome.status {
        MigrationStatus::Success => {
            println!("  ✓ {} ({})", outcome.name, outcome.kind);
            for path in &outcome.files {
                println!("      {}", path.display());
            }
        }
        MigrationStatus::Failure => println!(
            "  ✗ {} ({}): {}",
            outcome.name,
            outcome.kind,
            outcome.error.as_deref().unwrap_or_default()
        ),
    }
}

impl App {
    /// Run the full pipeline. Per-component failures are reported but do not
    /// fail the command.
    pub async fn run_migrate(&self, kinds: &[ComponentKind]) -> Result<()> {
        let mut config = self.load_config()?;
        if !kinds.is_empty() {
            config.migration.target_kinds = kinds.to_vec();
        }

        let ctx = Context::from(config)?;
        let summary = ctx.orchestrator().run().await?;

        println!(
            "Fetched {} files, stored {} components ({} embeddings reused)",
            summary.files_fetched, summary.components_stored, summary.embeddings_reused
        );
        println!(
            "Cached {} tables and {} stored procedures",
            summary.tables_cached, summary.procedures_cached
        );
        println!("Migrated components:");
        for outcome in &summary.outcomes {
            print_outcome(outcome);
        }
        println!(
            "{} succeeded, {} failed",
            summary.succeeded(),
            summary.failed()
        );
        super::report::print_report(&summary.report);
        Ok(())
    }

    /// Migrate one component stored by an earlier run.
    pub async fn run_migrate_component(&self, path: &str) -> Result<()> {
        let config = self.load_config()?;
        let ctx = Context::from(config)?;

        println!("Migrating component: {}", path);
        let outcome = ctx.orchestrator().migrate_component(path).await?;
        print_outcome(&outcome);
        Ok(())
    }
}
