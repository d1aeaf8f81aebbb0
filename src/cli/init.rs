//! Init command handler.

use color_eyre::eyre::WrapErr;
use color_eyre::Result;

use crate::db::ConnectionPool;
use crate::migrations::run_migrations;

use super::App;

impl App {
    /// Creates or upgrades the knowledge store tables.
    pub async fn run_init(&self) -> Result<()> {
        let config = self.load_config()?;

        tracing::info!(
            dimension = config.vector.dimension,
            "Initializing knowledge store at {}",
            config.postgres.uri
        );
        let pool = ConnectionPool::connect(&config.postgres.uri, config.postgres.pool_size)
            .wrap_err("cannot open the knowledge store pool")?;

        let result = run_migrations(&pool, config.vector.dimension)
            .await
            .wrap_err("knowledge store migration failed")?;

        if result.applied_migrations.is_empty() {
            println!("Knowledge store is current (schema v{})", result.current_version);
        } else {
            println!(
                "Knowledge store upgraded v{} -> v{} ({})",
                result.previous_version,
                result.current_version,
                result.applied_migrations.join(", ")
            );
        }

        Ok(())
    }
}
