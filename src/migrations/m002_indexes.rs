//! Lookup indexes.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::db::PoolTransaction;
use crate::error::StoreError;
use crate::migrations::Migration;

/// pgvector's HNSW index rejects vectors wider than this.
const HNSW_MAX_DIMENSION: usize = 2000;

/// Kind, reverse-edge and ANN indexes.
pub struct M002Indexes {
    pub dimension: usize,
}

impl Migration for M002Indexes {
    fn id(&self) -> &'static str {
        "m002_indexes"
    }

    fn version(&self) -> u32 {
        2
    }

    fn description(&self) -> &'static str {
        "Indexes for kind filters, dependents lookups and cosine search"
    }

    fn up<'a>(&'a self, txn: &'a PoolTransaction) -> BoxFuture<'a, Result<(), StoreError>> {
        async move {
            txn.batch_execute(
                r#"
                CREATE INDEX IF NOT EXISTS code_components_kind_idx
                ON code_components (kind);

                CREATE INDEX IF NOT EXISTS code_dependencies_to_idx
                ON code_dependencies (to_id);

                CREATE INDEX IF NOT EXISTS migration_logs_component_idx
                ON migration_logs (component_id);
                "#,
            )
            .await?;

            if self.dimension <= HNSW_MAX_DIMENSION {
                txn.batch_execute(
                    r#"
                    CREATE INDEX IF NOT EXISTS code_components_embedding_idx
                    ON code_components USING hnsw (embedding vector_cosine_ops);
                    "#,
                )
                .await?;
            } else {
                tracing::warn!(
                    "Embedding dimension {} exceeds HNSW limit; similarity search will scan",
                    self.dimension
                );
            }

            Ok(())
        }
        .boxed()
    }
}
