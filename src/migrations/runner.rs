//! Migration runner with version tracking.

use crate::db::{ConnectionPool, PoolTransaction};
use crate::error::StoreError;
use crate::migrations::create_register;

/// Result of running migrations.
#[derive(Debug, Clone)]
pub struct MigrationResult {
    pub previous_version: u32,
    pub current_version: u32,
    pub applied_migrations: Vec<String>,
}

const CREATE_SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS migrant_schema_version (
    id INTEGER PRIMARY KEY DEFAULT 1 CHECK (id = 1),
    version INTEGER NOT NULL DEFAULT 0,
    applied_migrations TEXT[] NOT NULL DEFAULT '{}',
    last_applied_at TIMESTAMPTZ DEFAULT NOW()
);
INSERT INTO migrant_schema_version (id, version) VALUES (1, 0) ON CONFLICT (id) DO NOTHING;
"#;

/// Applies all pending migrations for a store of the given embedding dimension.
pub async fn run_migrations(
    pool: &ConnectionPool,
    dimension: usize,
) -> Result<MigrationResult, StoreError> {
    ensure_schema_version_table(pool).await?;

    let previous_version = get_schema_version(pool).await?;
    let register = create_register(dimension);
    let (current_version, applied_migrations) =
        register.run_pending(pool, previous_version).await?;

    if applied_migrations.is_empty() {
        tracing::debug!("Store schema up to date at v{}", current_version);
    } else {
        tracing::info!(
            "Store schema migrated v{} -> v{}",
            previous_version,
            current_version
        );
    }

    Ok(MigrationResult {
        previous_version,
        current_version,
        applied_migrations,
    })
}

async fn ensure_schema_version_table(pool: &ConnectionPool) -> Result<(), StoreError> {
    let txn = pool.begin().await?;
    match txn.batch_execute(CREATE_SCHEMA_VERSION_TABLE).await {
        Ok(()) => txn.commit().await,
        Err(e) => {
            tracing::error!("Creating migrant_schema_version failed: {}", e);
            txn.rollback().await?;
            Err(e)
        }
    }
}

async fn get_schema_version(pool: &ConnectionPool) -> Result<u32, StoreError> {
    let rows = pool
        .execute_query("SELECT version FROM migrant_schema_version WHERE id = 1", &[])
        .await?;

    Ok(rows
        .first()
        .and_then(|r| r.get::<i64>("version").ok())
        .unwrap_or(0) as u32)
}

pub(super) async fn record_version(
    txn: &PoolTransaction,
    version: u32,
    migration_id: &str,
) -> Result<(), StoreError> {
    txn.execute(
        "UPDATE migrant_schema_version \
         SET version = $1, applied_migrations = array_append(applied_migrations, $2), last_applied_at = NOW() \
         WHERE id = 1",
        &[&(version as i32), &migration_id],
    )
    .await?;
    Ok(())
}
