//! Connection pool manager.
//!
//! Wraps a deadpool pool of `tokio-postgres` connections. Every helper borrows
//! one connection for the duration of a single call; the connection returns
//! to the pool when the guard drops, on success and on error alike.
//!
//! # Example
//!
//! ```ignore
//! use migrant::db::ConnectionPool;
//!
//! let pool = ConnectionPool::connect("postgresql://localhost/migrant", 10)?;
//! let rows = pool.execute_query("SELECT id FROM code_components", &[]).await?;
//! ```

use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio_postgres::types::ToSql;
use tokio_postgres::NoTls;

use crate::db::row::{parse_pg_row, Row};
use crate::error::StoreError;

/// A borrowed, type-erased statement parameter.
pub type SqlParam<'a> = &'a (dyn ToSql + Sync);

/// Bounded PostgreSQL connection pool.
///
/// Cheap to clone; clones share the same underlying pool.
#[derive(Clone)]
pub struct ConnectionPool {
    pool: Pool,
}

impl ConnectionPool {
    /// Creates a pool holding at most `max_size` connections.
    ///
    /// Connections are opened lazily on first acquire, so this does not touch
    /// the network.
    pub fn connect(connection_string: &str, max_size: usize) -> Result<Self, StoreError> {
        let pg_config: tokio_postgres::Config = connection_string
            .parse()
            .map_err(|e| StoreError::Pool(format!("Invalid PostgreSQL connection string: {}", e)))?;

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(max_size.max(1))
            .build()
            .map_err(|e| StoreError::Pool(format!("Failed to create connection pool: {}", e)))?;

        Ok(Self { pool })
    }

    /// Runs `f` with exclusive use of one pooled connection.
    ///
    /// Waits while all connections are borrowed; the connection goes back to
    /// the pool when `f` finishes, whatever its result.
    pub async fn with_connection<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: for<'c> FnOnce(&'c Object) -> BoxFuture<'c, Result<T, StoreError>>,
    {
        let conn = self.pool.get().await?;
        f(&conn).await
    }

    /// Runs a query and collects every row in result order.
    pub async fn execute_query(
        &self,
        sql: &str,
        params: &[SqlParam<'_>],
    ) -> Result<Vec<Row>, StoreError> {
        let conn = self.pool.get().await?;
        let stmt = conn.prepare_cached(sql).await?;
        let rows = conn.query(&stmt, params).await?;
        Ok(rows.iter().map(parse_pg_row).collect())
    }

    /// Runs a single write statement and returns the affected-row count.
    ///
    /// The statement runs in autocommit mode and is durable on return.
    pub async fn execute_update(
        &self,
        sql: &str,
        params: &[SqlParam<'_>],
    ) -> Result<u64, StoreError> {
        let conn = self.pool.get().await?;
        let stmt = conn.prepare_cached(sql).await?;
        Ok(conn.execute(&stmt, params).await?)
    }

    /// Runs one statement once per parameter set and commits the batch.
    ///
    /// Returns the summed affected-row count. A failing set rolls back the
    /// whole batch.
    pub async fn execute_many(
        &self,
        sql: &str,
        param_sets: &[&[SqlParam<'_>]],
    ) -> Result<u64, StoreError> {
        let mut conn = self.pool.get().await?;
        let txn = conn.transaction().await?;
        let stmt = txn.prepare_cached(sql).await?;

        let mut affected = 0;
        for params in param_sets {
            affected += txn.execute(&stmt, params).await?;
        }
        txn.commit().await?;

        Ok(affected)
    }

    /// Begins an explicit transaction on a dedicated connection.
    pub async fn begin(&self) -> Result<PoolTransaction, StoreError> {
        let conn = self.pool.get().await?;
        conn.batch_execute("BEGIN").await?;

        Ok(PoolTransaction {
            conn: Some(conn),
            finished: false,
        })
    }

    /// Round-trips `SELECT 1`.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.with_connection(|conn| {
            async move {
                conn.simple_query("SELECT 1").await?;
                Ok(())
            }
            .boxed()
        })
        .await
    }

    /// Configured maximum pool size.
    pub fn max_size(&self) -> usize {
        self.pool.status().max_size
    }
}

/// An open transaction holding one pooled connection.
///
/// Must be explicitly committed or rolled back. Dropping it unfinished logs a
/// warning and detaches the connection from the pool, closing it.
pub struct PoolTransaction {
    conn: Option<Object>,
    finished: bool,
}

impl PoolTransaction {
    fn conn(&self) -> Result<&Object, StoreError> {
        self.conn
            .as_ref()
            .ok_or_else(|| StoreError::Pool("transaction connection already released".into()))
    }

    /// Executes one or more semicolon-separated statements without parameters.
    pub async fn batch_execute(&self, sql: &str) -> Result<(), StoreError> {
        self.conn()?.batch_execute(sql).await?;
        Ok(())
    }

    pub async fn execute(&self, sql: &str, params: &[SqlParam<'_>]) -> Result<u64, StoreError> {
        Ok(self.conn()?.execute(sql, params).await?)
    }

    pub async fn query(&self, sql: &str, params: &[SqlParam<'_>]) -> Result<Vec<Row>, StoreError> {
        let rows = self.conn()?.query(sql, params).await?;
        Ok(rows.iter().map(parse_pg_row).collect())
    }

    pub async fn commit(mut self) -> Result<(), StoreError> {
        self.finish("COMMIT").await
    }

    pub async fn rollback(mut self) -> Result<(), StoreError> {
        self.finish("ROLLBACK").await
    }

    /// Ends the transaction; if that fails the connection is not reused.
    async fn finish(&mut self, statement: &str) -> Result<(), StoreError> {
        self.conn()?.batch_execute(statement).await?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for PoolTransaction {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        tracing::warn!("PoolTransaction dropped without commit or rollback, discarding connection");
        if let Some(conn) = self.conn.take() {
            drop(Object::take(conn));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_rejects_malformed_uri() {
        let result = ConnectionPool::connect("postgresql://host:notaport/db", 4);
        assert!(matches!(result, Err(StoreError::Pool(_))));
    }

    #[tokio::test]
    async fn test_connect_is_lazy() {
        let pool = ConnectionPool::connect("postgresql://postgres@127.0.0.1:1/none", 3).unwrap();
        assert_eq!(pool.max_size(), 3);
    }
}
