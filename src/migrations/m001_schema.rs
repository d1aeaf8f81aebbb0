//! Base tables for the knowledge store.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::db::PoolTransaction;
use crate::error::StoreError;
use crate::migrations::Migration;

/// pgvector extension plus the components, dependency, schema cache and log tables.
///
/// The embedding column is sized once here; changing the dimension later
/// needs a new migration.
pub struct M001Schema {
    pub dimension: usize,
}

impl Migration for M001Schema {
    fn id(&self) -> &'static str {
        "m001_schema"
    }

    fn version(&self) -> u32 {
        1
    }

    fn description(&self) -> &'static str {
        "Knowledge store tables (components, dependencies, schema cache, migration log)"
    }

    fn up<'a>(&'a self, txn: &'a PoolTransaction) -> BoxFuture<'a, Result<(), StoreError>> {
        async move {
            txn.batch_execute("CREATE EXTENSION IF NOT EXISTS vector")
                .await?;

            // seq keeps first-insert order for tie-breaks; upserts never touch it
            txn.batch_execute(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS code_components (
                    seq BIGSERIAL NOT NULL UNIQUE,
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    namespace TEXT NOT NULL DEFAULT '',
                    file_path TEXT NOT NULL,
                    code_content TEXT NOT NULL DEFAULT '',
                    embedding vector({dim}),
                    metadata JSONB NOT NULL DEFAULT '{{}}',
                    node_metadata JSONB NOT NULL DEFAULT '{{}}',
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );
                "#,
                dim = self.dimension
            ))
            .await?;

            // to_id is deliberately not a foreign key: edges may point at
            // components that are stored later
            txn.batch_execute(
                r#"
                CREATE TABLE IF NOT EXISTS code_dependencies (
                    seq BIGSERIAL NOT NULL UNIQUE,
                    from_id TEXT NOT NULL,
                    to_id TEXT NOT NULL,
                    dependency_type TEXT NOT NULL,
                    strength DOUBLE PRECISION NOT NULL DEFAULT 1.0 CHECK (strength >= 0),
                    metadata JSONB NOT NULL DEFAULT '{}',
                    PRIMARY KEY (from_id, to_id, dependency_type)
                );

                CREATE TABLE IF NOT EXISTS db_schema_reference (
                    seq BIGSERIAL NOT NULL UNIQUE,
                    schema_name TEXT NOT NULL,
                    table_name TEXT NOT NULL,
                    columns JSONB NOT NULL DEFAULT '[]',
                    indexes JSONB NOT NULL DEFAULT '[]',
                    relationships JSONB NOT NULL DEFAULT '[]',
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    PRIMARY KEY (schema_name, table_name)
                );

                CREATE TABLE IF NOT EXISTS stored_procedures (
                    seq BIGSERIAL NOT NULL UNIQUE,
                    schema_name TEXT NOT NULL,
                    proc_name TEXT NOT NULL,
                    parameters JSONB NOT NULL DEFAULT '[]',
                    definition TEXT,
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    PRIMARY KEY (schema_name, proc_name)
                );

                CREATE TABLE IF NOT EXISTS migration_logs (
                    seq BIGSERIAL PRIMARY KEY,
                    component_id TEXT NOT NULL,
                    component_type TEXT NOT NULL,
                    status TEXT NOT NULL CHECK (status IN ('SUCCESS', 'FAILURE')),
                    start_time TIMESTAMPTZ NOT NULL,
                    end_time TIMESTAMPTZ NOT NULL,
                    output TEXT NOT NULL DEFAULT ''
                );
                "#,
            )
            .await?;

            Ok(())
        }
        .boxed()
    }
}
