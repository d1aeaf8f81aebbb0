//! Migration trait and registry.

use futures::future::BoxFuture;

use crate::db::{ConnectionPool, PoolTransaction};
use crate::error::StoreError;

/// A single forward-only schema change.
///
/// Uses `BoxFuture` so the future can borrow both the migration and the
/// transaction.
pub trait Migration: Send + Sync {
    fn id(&self) -> &'static str;
    fn version(&self) -> u32;
    fn description(&self) -> &'static str;
    fn up<'a>(&'a self, txn: &'a PoolTransaction) -> BoxFuture<'a, Result<(), StoreError>>;
}

/// Ordered list of migrations.
#[derive(Default)]
pub struct Register {
    migrations: Vec<Box<dyn Migration>>,
}

impl Register {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, migration: impl Migration + 'static) -> Self {
        self.migrations.push(Box::new(migration));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Migration> {
        self.migrations.iter().map(|m| m.as_ref())
    }

    /// Applies every migration above `current_version`, each in its own
    /// transaction, recording the version inside the same transaction.
    ///
    /// Returns `(new_version, applied_migration_ids)`.
    pub async fn run_pending(
        &self,
        pool: &ConnectionPool,
        current_version: u32,
    ) -> Result<(u32, Vec<String>), StoreError> {
        let mut applied = vec![];
        let mut new_version = current_version;

        for migration in &self.migrations {
            if migration.version() <= current_version {
                continue;
            }

            tracing::info!(
                "Applying migration {} (v{}): {}",
                migration.id(),
                migration.version(),
                migration.description()
            );

            let txn = pool.begin().await?;
            let result = async {
                migration.up(&txn).await?;
                super::runner::record_version(&txn, migration.version(), migration.id()).await
            }
            .await;

            match result {
                Ok(()) => txn.commit().await?,
                Err(e) => {
                    tracing::error!("Migration {} failed: {}", migration.id(), e);
                    txn.rollback().await?;
                    return Err(e);
                }
            }

            new_version = migration.version();
            applied.push(migration.id().to_string());
        }

        Ok((new_version, applied))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_versions_are_strictly_increasing() {
        let register = crate::migrations::create_register(1536);
        let versions: Vec<u32> = register.iter().map(|m| m.version()).collect();
        assert!(!versions.is_empty());
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_register_ids_are_unique() {
        let register = crate::migrations::create_register(8);
        let mut ids: Vec<&str> = register.iter().map(|m| m.id()).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }
}
