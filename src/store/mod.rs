//! Knowledge store: vector search, dependency graph, schema cache and
//! migration log.
//!
//! Each concern is an object-safe async trait so the pipeline can run
//! against PostgreSQL ([`PostgresStore`]) or an in-process backend
//! ([`MemoryStore`]). [`KnowledgeStore`] bundles one implementation of each.

mod memory;
mod postgres;
mod similarity;
mod traversal;

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use similarity::cosine_distance;

use crate::db::ConnectionPool;
use crate::error::StoreError;
use crate::models::{
    Component, ComponentKind, ComponentNode, ComponentSummary, DependencyDescriptor,
    DependencyEdge, MigrationLogEntry, ReportRow, SimilarComponent, StoredProcedure, TableSchema,
};

/// Embedding rows and nearest-neighbour search.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Embedding length every stored and query vector must have.
    fn dimension(&self) -> usize;

    /// Upserts the vector-bearing row for `component.id`.
    ///
    /// Fails with [`StoreError::DimensionMismatch`] before writing anything if
    /// the embedding has the wrong length.
    async fn add_code_vector(&self, component: &Component) -> Result<(), StoreError>;

    /// Returns at most `top_k` components ordered by cosine distance, nearest
    /// first; equal distances keep insertion order.
    async fn search_similar_code(
        &self,
        query: &[f32],
        top_k: usize,
        kind: Option<ComponentKind>,
    ) -> Result<Vec<SimilarComponent>, StoreError>;

    async fn get_component_by_id(&self, id: &str) -> Result<Option<Component>, StoreError>;

    /// Lists embedded components of the given kinds in insertion order.
    async fn list_components(
        &self,
        kinds: &[ComponentKind],
    ) -> Result<Vec<ComponentSummary>, StoreError>;
}

/// Component nodes and typed, weighted edges.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Upserts a node by id.
    async fn create_component_node(&self, node: &ComponentNode) -> Result<(), StoreError>;

    /// Upserts an edge by `(from_id, to_id, dependency_type)`.
    ///
    /// Neither endpoint has to exist.
    async fn create_dependency(&self, edge: &DependencyEdge) -> Result<(), StoreError>;

    /// Outgoing edges of `id` whose target node exists, by descending strength.
    async fn direct_dependencies(&self, id: &str)
        -> Result<Vec<DependencyDescriptor>, StoreError>;

    /// Incoming edges of `id` whose source node exists, by descending strength.
    async fn get_dependents(&self, id: &str) -> Result<Vec<DependencyDescriptor>, StoreError>;

    /// Raw edge targets of every id in `frontier`, grouped in frontier order,
    /// then by descending strength. Dangling targets are included.
    async fn successors(&self, frontier: &[String]) -> Result<Vec<String>, StoreError>;

    /// Nodes for the ids that exist, in no particular order.
    async fn nodes(&self, ids: &[String]) -> Result<Vec<ComponentNode>, StoreError>;

    /// Dependencies reachable from `id` within `max_depth` hops.
    ///
    /// `max_depth == 1` returns direct edges with their own type and strength.
    /// Deeper walks return each reachable component once, in discovery order,
    /// tagged `DEPENDS_ON` with strength 1.0. Depth 0 and unknown ids yield an
    /// empty list.
    async fn get_dependencies(
        &self,
        id: &str,
        max_depth: usize,
    ) -> Result<Vec<DependencyDescriptor>, StoreError> {
        match max_depth {
            0 => Ok(Vec::new()),
            1 => self.direct_dependencies(id).await,
            _ => traversal::bounded_dependencies(self, id, max_depth).await,
        }
    }
}

/// Cached legacy table and stored procedure definitions.
#[async_trait]
pub trait SchemaStore: Send + Sync {
    async fn add_table_schema(&self, table: &TableSchema) -> Result<(), StoreError>;

    async fn add_stored_procedure(&self, procedure: &StoredProcedure) -> Result<(), StoreError>;

    /// Case-sensitive exact lookup. With the same name in several schemas the
    /// lowest schema name wins.
    async fn get_table_schema(&self, table_name: &str) -> Result<Option<TableSchema>, StoreError>;

    async fn get_stored_procedure(
        &self,
        proc_name: &str,
    ) -> Result<Option<StoredProcedure>, StoreError>;

    /// Tables whose name contains `keyword` (case-insensitive) or that have a
    /// column whose name matches `keyword` as a case-insensitive regex.
    ///
    /// Results are in insertion order. Patterns are checked with the `regex`
    /// crate; PostgreSQL evaluates them as POSIX regexes with `~*`, so
    /// constructs outside the shared subset (lookaround, backreferences,
    /// Unicode classes) may match differently between backends or be
    /// rejected by the server. Plain words and `regex::escape` output behave
    /// the same on both.
    async fn search_tables_by_keyword(&self, keyword: &str)
        -> Result<Vec<TableSchema>, StoreError>;
}

/// Append-only migration audit log.
#[async_trait]
pub trait MigrationLog: Send + Sync {
    async fn append(&self, entry: &MigrationLogEntry) -> Result<(), StoreError>;

    /// Counts grouped by `(component_type, status)`, ordered by both names.
    async fn report(&self) -> Result<Vec<ReportRow>, StoreError>;

    /// Every entry in append order.
    async fn entries(&self) -> Result<Vec<MigrationLogEntry>, StoreError>;
}

/// One implementation of each store concern.
#[derive(Clone)]
pub struct KnowledgeStore {
    pub vectors: Arc<dyn VectorStore>,
    pub graph: Arc<dyn GraphStore>,
    pub schema: Arc<dyn SchemaStore>,
    pub log: Arc<dyn MigrationLog>,
}

impl KnowledgeStore {
    /// PostgreSQL-backed store sharing one connection pool.
    pub fn postgres(pool: ConnectionPool, dimension: usize) -> Self {
        Self::from_backend(Arc::new(PostgresStore::new(pool, dimension)))
    }

    /// Process-local store, empty on creation.
    pub fn in_memory(dimension: usize) -> Self {
        Self::from_backend(Arc::new(MemoryStore::new(dimension)))
    }

    fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: VectorStore + GraphStore + SchemaStore + MigrationLog + 'static,
    {
        Self {
            vectors: backend.clone(),
            graph: backend.clone(),
            schema: backend.clone(),
            log: backend,
        }
    }
}

/// Compiles the case-insensitive column-name matcher for a keyword search.
pub(crate) fn keyword_regex(keyword: &str) -> Result<Regex, StoreError> {
    Regex::new(&format!("(?i){}", keyword)).map_err(|e| StoreError::InvalidPattern {
        pattern: keyword.to_string(),
        reason: e.to_string(),
    })
}

/// Rejects edge weights outside `[0, inf)`.
pub(crate) fn validate_strength(strength: f64) -> Result<(), StoreError> {
    if strength.is_finite() && strength >= 0.0 {
        Ok(())
    } else {
        Err(StoreError::InvalidStrength(strength))
    }
}

pub(crate) fn validate_dimension(expected: usize, actual: usize) -> Result<(), StoreError> {
    if expected == actual {
        Ok(())
    } else {
        Err(StoreError::DimensionMismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_regex_is_case_insensitive() {
        let re = keyword_regex("customer").unwrap();
        assert!(re.is_match("CustomerId"));
        assert!(!re.is_match("OrderId"));
    }

    #[test]
    fn test_keyword_regex_rejects_malformed_pattern() {
        let err = keyword_regex("cust(").unwrap_err();
        assert!(matches!(err, StoreError::InvalidPattern { .. }));
    }

    #[test]
    fn test_validate_strength() {
        assert!(validate_strength(0.0).is_ok());
        assert!(validate_strength(12.5).is_ok());
        assert!(validate_strength(-0.1).is_err());
        assert!(validate_strength(f64::NAN).is_err());
        assert!(validate_strength(f64::INFINITY).is_err());
    }
}
