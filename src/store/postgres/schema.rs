//! Schema cache over `db_schema_reference` and `stored_procedures`.

use async_trait::async_trait;

use super::{escape_like, PostgresStore};
use crate::db::Row;
use crate::error::StoreError;
use crate::models::{StoredProcedure, TableSchema};
use crate::store::{keyword_regex, SchemaStore};

const UPSERT_TABLE: &str = r#"
INSERT INTO db_schema_reference (schema_name, table_name, columns, indexes, relationships, updated_at)
VALUES ($1, $2, $3, $4, $5, NOW())
ON CONFLICT (schema_name, table_name) DO UPDATE SET
    columns = EXCLUDED.columns,
    indexes = EXCLUDED.indexes,
    relationships = EXCLUDED.relationships,
    updated_at = NOW()
"#;

const UPSERT_PROCEDURE: &str = r#"
INSERT INTO stored_procedures (schema_name, proc_name, parameters, definition, updated_at)
VALUES ($1, $2, $3, $4, NOW())
ON CONFLICT (schema_name, proc_name) DO UPDATE SET
    parameters = EXCLUDED.parameters,
    definition = EXCLUDED.definition,
    updated_at = NOW()
"#;

const SEARCH_TABLES: &str = r#"
SELECT t.schema_name, t.table_name, t.columns, t.indexes, t.relationships
FROM db_schema_reference t
WHERE t.table_name ILIKE '%' || $1 || '%'
   OR EXISTS (
       SELECT 1 FROM jsonb_array_elements(t.columns) c
       WHERE c->>'name' ~* $2
   )
ORDER BY t.seq
"#;

fn table_from_row(row: &Row) -> Result<TableSchema, StoreError> {
    Ok(TableSchema {
        schema_name: row.get("schema_name")?,
        table_name: row.get("table_name")?,
        columns: row.get("columns")?,
        indexes: row.get_opt("indexes")?.unwrap_or_default(),
        relationships: row.get_opt("relationships")?.unwrap_or_default(),
    })
}

fn procedure_from_row(row: &Row) -> Result<StoredProcedure, StoreError> {
    Ok(StoredProcedure {
        schema_name: row.get("schema_name")?,
        proc_name: row.get("proc_name")?,
        parameters: row.get_opt("parameters")?.unwrap_or_default(),
        definition: row.get_opt("definition")?,
    })
}

#[async_trait]
impl SchemaStore for PostgresStore {
    async fn add_table_schema(&self, table: &TableSchema) -> Result<(), StoreError> {
        let columns = serde_json::to_value(&table.columns)?;
        let indexes = serde_json::to_value(&table.indexes)?;
        let relationships = serde_json::to_value(&table.relationships)?;

        self.pool
            .execute_update(
                UPSERT_TABLE,
                &[
                    &table.schema_name,
                    &table.table_name,
                    &columns,
                    &indexes,
                    &relationships,
                ],
            )
            .await?;
        Ok(())
    }

    async fn add_stored_procedure(&self, procedure: &StoredProcedure) -> Result<(), StoreError> {
        let parameters = serde_json::to_value(&procedure.parameters)?;
        self.pool
            .execute_update(
                UPSERT_PROCEDURE,
                &[
                    &procedure.schema_name,
                    &procedure.proc_name,
                    &parameters,
                    &procedure.definition,
                ],
            )
            .await?;
        Ok(())
    }

    async fn get_table_schema(&self, table_name: &str) -> Result<Option<TableSchema>, StoreError> {
        let rows = self
            .pool
            .execute_query(
                "SELECT schema_name, table_name, columns, indexes, relationships \
                 FROM db_schema_reference WHERE table_name = $1 \
                 ORDER BY schema_name LIMIT 1",
                &[&table_name],
            )
            .await?;
        rows.first().map(table_from_row).transpose()
    }

    async fn get_stored_procedure(
        &self,
        proc_name: &str,
    ) -> Result<Option<StoredProcedure>, StoreError> {
        let rows = self
            .pool
            .execute_query(
                "SELECT schema_name, proc_name, parameters, definition \
                 FROM stored_procedures WHERE proc_name = $1 \
                 ORDER BY schema_name LIMIT 1",
                &[&proc_name],
            )
            .await?;
        rows.first().map(procedure_from_row).transpose()
    }

    async fn search_tables_by_keyword(
        &self,
        keyword: &str,
    ) -> Result<Vec<TableSchema>, StoreError> {
        // rejects what the regex crate cannot parse; see the trait docs for dialect gaps
        keyword_regex(keyword)?;

        let like = escape_like(keyword);
        let rows = self
            .pool
            .execute_query(SEARCH_TABLES, &[&like, &keyword])
            .await?;
        rows.iter().map(table_from_row).collect()
    }
}
