//! Migration log over `migration_logs`.

use async_trait::async_trait;

use super::{kind_column, PostgresStore};
use crate::error::StoreError;
use crate::models::{ComponentKind, MigrationLogEntry, MigrationStatus, ReportRow};
use crate::store::MigrationLog;

fn status_column(row: &crate::db::Row) -> Result<MigrationStatus, StoreError> {
    row.get::<String>("status")?
        .parse()
        .map_err(StoreError::Decode)
}

#[async_trait]
impl MigrationLog for PostgresStore {
    async fn append(&self, entry: &MigrationLogEntry) -> Result<(), StoreError> {
        self.pool
            .execute_update(
                "INSERT INTO migration_logs \
                 (component_id, component_type, status, start_time, end_time, output) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
                &[
                    &entry.component_id,
                    &entry.component_type.as_str(),
                    &entry.status.as_str(),
                    &entry.start_time,
                    &entry.end_time,
                    &entry.output,
                ],
            )
            .await?;
        Ok(())
    }

    async fn report(&self) -> Result<Vec<ReportRow>, StoreError> {
        let rows = self
            .pool
            .execute_query(
                "SELECT component_type, status, COUNT(*) AS count FROM migration_logs \
                 GROUP BY component_type, status ORDER BY component_type, status",
                &[],
            )
            .await?;

        rows.iter()
            .map(|row| -> Result<_, StoreError> {
                Ok(ReportRow {
                    component_type: ComponentKind::from_stored(&row.get::<String>("component_type")?),
                    status: status_column(row)?,
                    count: row.get("count")?,
                })
            })
            .collect()
    }

    async fn entries(&self) -> Result<Vec<MigrationLogEntry>, StoreError> {
        let rows = self
            .pool
            .execute_query(
                "SELECT component_id, component_type AS kind, status, start_time, end_time, output \
                 FROM migration_logs ORDER BY seq",
                &[],
            )
            .await?;

        rows.iter()
            .map(|row| -> Result<_, StoreError> {
                Ok(MigrationLogEntry {
                    component_id: row.get("component_id")?,
                    component_type: kind_column(row)?,
                    status: status_column(row)?,
                    start_time: row.get("start_time")?,
                    end_time: row.get("end_time")?,
                    output: row.get("output")?,
                })
            })
            .collect()
    }
}
