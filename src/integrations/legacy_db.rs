//! Legacy database reader over ANSI `information_schema` views.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_postgres::{Client, NoTls};

use crate::error::{describe_pg_error, AppError};
use crate::integrations::LegacySchemaSource;
use crate::models::{ColumnDef, ProcedureParameter, StoredProcedure, TableSchema};

/// One row of the column listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyColumn {
    pub schema_name: String,
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    pub nullable: bool,
    pub max_length: Option<i64>,
}

/// Groups ordered column rows into one [`TableSchema`] per `(schema, table)`.
///
/// Tables appear in first-seen order and keep their column order.
pub fn group_columns(rows: Vec<LegacyColumn>) -> Vec<TableSchema> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut tables: Vec<TableSchema> = Vec::new();

    for row in rows {
        let key = (row.schema_name.clone(), row.table_name.clone());
        let idx = *index.entry(key).or_insert_with(|| {
            tables.push(TableSchema::new(&row.schema_name, &row.table_name, Vec::new()));
            tables.len() - 1
        });
        tables[idx].columns.push(ColumnDef {
            name: row.column_name,
            data_type: row.data_type,
            nullable: row.nullable,
            max_length: row.max_length,
        });
    }

    tables
}

const COLUMNS_QUERY: &str = r#"
SELECT c.table_schema::text AS table_schema,
       c.table_name::text AS table_name,
       c.column_name::text AS column_name,
       c.data_type::text AS data_type,
       c.is_nullable::text AS is_nullable,
       c.character_maximum_length::int8 AS max_length
FROM information_schema.tables t
JOIN information_schema.columns c
  ON c.table_schema = t.table_schema AND c.table_name = t.table_name
WHERE t.table_type = 'BASE TABLE'
  AND t.table_schema NOT IN ('pg_catalog', 'information_schema')
ORDER BY c.table_schema, c.table_name, c.ordinal_position
"#;

const ROUTINES_QUERY: &str = r#"
SELECT r.routine_schema::text AS routine_schema,
       r.routine_name::text AS routine_name,
       r.specific_name::text AS specific_name,
       r.routine_definition::text AS routine_definition
FROM information_schema.routines r
WHERE r.routine_type = 'PROCEDURE'
  AND r.routine_schema NOT IN ('pg_catalog', 'information_schema')
ORDER BY r.routine_schema, r.routine_name
"#;

const PARAMETERS_QUERY: &str = r#"
SELECT p.specific_schema::text AS specific_schema,
       p.specific_name::text AS specific_name,
       COALESCE(p.parameter_name::text, '') AS parameter_name,
       p.data_type::text AS data_type,
       COALESCE(p.parameter_mode::text, 'IN') AS parameter_mode
FROM information_schema.parameters p
WHERE p.specific_schema NOT IN ('pg_catalog', 'information_schema')
ORDER BY p.specific_schema, p.specific_name, p.ordinal_position
"#;

/// Opens a short-lived connection per call; the legacy database is read once
/// per run.
pub struct InformationSchemaReader {
    uri: String,
}

impl InformationSchemaReader {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    async fn connect(&self) -> Result<Client, AppError> {
        let (client, connection) = tokio_postgres::connect(&self.uri, NoTls)
            .await
            .map_err(legacy_error)?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!("Legacy database connection closed: {}", e);
            }
        });
        Ok(client)
    }

    /// Round-trips `SELECT 1`.
    pub async fn ping(&self) -> Result<(), AppError> {
        let client = self.connect().await?;
        client.simple_query("SELECT 1").await.map_err(legacy_error)?;
        Ok(())
    }
}

fn legacy_error(err: tokio_postgres::Error) -> AppError {
    AppError::LegacyDatabase(describe_pg_error(&err))
}

#[async_trait]
impl LegacySchemaSource for InformationSchemaReader {
    async fn columns(&self) -> Result<Vec<LegacyColumn>, AppError> {
        let client = self.connect().await?;
        let rows = client.query(COLUMNS_QUERY, &[]).await.map_err(legacy_error)?;

        rows.iter()
            .map(|row| -> Result<_, tokio_postgres::Error> {
                Ok(LegacyColumn {
                    schema_name: row.try_get("table_schema")?,
                    table_name: row.try_get("table_name")?,
                    column_name: row.try_get("column_name")?,
                    data_type: row.try_get("data_type")?,
                    nullable: row.try_get::<_, String>("is_nullable")? == "YES",
                    max_length: row.try_get("max_length")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(legacy_error)
    }

    async fn procedures(&self) -> Result<Vec<StoredProcedure>, AppError> {
        let client = self.connect().await?;
        let routines = client.query(ROUTINES_QUERY, &[]).await.map_err(legacy_error)?;
        let parameter_rows = client
            .query(PARAMETERS_QUERY, &[])
            .await
            .map_err(legacy_error)?;

        let mut parameters: HashMap<(String, String), Vec<ProcedureParameter>> = HashMap::new();
        for row in &parameter_rows {
            let key = (
                row.try_get("specific_schema").map_err(legacy_error)?,
                row.try_get("specific_name").map_err(legacy_error)?,
            );
            parameters.entry(key).or_default().push(ProcedureParameter {
                name: row.try_get("parameter_name").map_err(legacy_error)?,
                data_type: row.try_get("data_type").map_err(legacy_error)?,
                mode: row.try_get("parameter_mode").map_err(legacy_error)?,
            });
        }

        let mut procedures = Vec::with_capacity(routines.len());
        for row in &routines {
            let schema_name: String = row.try_get("routine_schema").map_err(legacy_error)?;
            let specific_name: String = row.try_get("specific_name").map_err(legacy_error)?;
            procedures.push(StoredProcedure {
                parameters: parameters
                    .remove(&(schema_name.clone(), specific_name))
                    .unwrap_or_default(),
                schema_name,
                proc_name: row.try_get("routine_name").map_err(legacy_error)?,
                definition: row.try_get("routine_definition").map_err(legacy_error)?,
            });
        }

        Ok(procedures)
    }
}
