//! PostgreSQL + pgvector implementation of the store traits.
//!
//! All four traits share one [`ConnectionPool`]. Every write is a single
//! autocommitted upsert, so a multi-step caller (node, then edges) is not
//! atomic as a whole.

mod graph;
mod log;
mod schema;
mod vector;

use crate::db::{ConnectionPool, Row};
use crate::error::StoreError;
use crate::models::{ComponentKind, ComponentNode, DependencyDescriptor, Metadata};

/// Knowledge store over the tables created by the schema migrations.
#[derive(Clone)]
pub struct PostgresStore {
    pool: ConnectionPool,
    dimension: usize,
}

impl PostgresStore {
    pub fn new(pool: ConnectionPool, dimension: usize) -> Self {
        Self { pool, dimension }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}

fn kind_column(row: &Row) -> Result<ComponentKind, StoreError> {
    Ok(ComponentKind::from_stored(&row.get::<String>("kind")?))
}

fn metadata_column(row: &Row, column: &str) -> Result<Metadata, StoreError> {
    Ok(row.get_opt::<Metadata>(column)?.unwrap_or_default())
}

fn node_from_row(row: &Row) -> Result<ComponentNode, StoreError> {
    Ok(ComponentNode {
        id: row.get("id")?,
        name: row.get("name")?,
        kind: kind_column(row)?,
        namespace: row.get("namespace")?,
        file_path: row.get("file_path")?,
        metadata: metadata_column(row, "node_metadata")?,
    })
}

fn descriptor_from_row(row: &Row) -> Result<DependencyDescriptor, StoreError> {
    Ok(DependencyDescriptor {
        id: row.get("id")?,
        name: row.get("name")?,
        kind: kind_column(row)?,
        namespace: row.get("namespace")?,
        file_path: row.get("file_path")?,
        dependency_type: row.get("dependency_type")?,
        strength: row.get("strength")?,
    })
}

/// Escapes `LIKE` wildcards so the keyword matches literally.
fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for ch in keyword.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
