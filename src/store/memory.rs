//! In-process implementation of every store trait.
//!
//! Mirrors the PostgreSQL backend's semantics (upsert identity, insertion
//! order tie-breaks, dangling edges) so the pipeline can run without a
//! database. State lives behind one `RwLock` and is lost on drop.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{
    Component, ComponentKind, ComponentNode, ComponentSummary, DependencyDescriptor,
    DependencyEdge, Metadata, MigrationLogEntry, ReportRow, SimilarComponent, StoredProcedure,
    TableSchema,
};
use crate::store::{
    cosine_distance, keyword_regex, validate_dimension, validate_strength, GraphStore,
    MigrationLog, SchemaStore, VectorStore,
};

#[derive(Debug, Clone)]
struct ComponentRecord {
    id: String,
    name: String,
    kind: ComponentKind,
    namespace: String,
    file_path: String,
    code_content: String,
    embedding: Option<Vec<f32>>,
    metadata: Metadata,
    node_metadata: Metadata,
}

impl ComponentRecord {
    fn empty(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: String::new(),
            kind: ComponentKind::Other,
            namespace: String::new(),
            file_path: String::new(),
            code_content: String::new(),
            embedding: None,
            metadata: Metadata::new(),
            node_metadata: Metadata::new(),
        }
    }

    fn to_component(&self) -> Option<Component> {
        let embedding = self.embedding.clone()?;
        Some(Component {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind,
            namespace: self.namespace.clone(),
            file_path: self.file_path.clone(),
            code_content: self.code_content.clone(),
            embedding,
            metadata: self.metadata.clone(),
        })
    }

    fn to_node(&self) -> ComponentNode {
        ComponentNode {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind,
            namespace: self.namespace.clone(),
            file_path: self.file_path.clone(),
            metadata: self.node_metadata.clone(),
        }
    }

    fn describe(&self, edge: &DependencyEdge) -> DependencyDescriptor {
        DependencyDescriptor {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind,
            namespace: self.namespace.clone(),
            file_path: self.file_path.clone(),
            dependency_type: edge.dependency_type.clone(),
            strength: edge.strength,
        }
    }
}

/// Keyed rows kept in first-insert order.
#[derive(Debug)]
struct Ordered<K, V> {
    index: HashMap<K, usize>,
    rows: Vec<V>,
}

impl<K, V> Default for Ordered<K, V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            rows: Vec::new(),
        }
    }
}

impl<K: std::hash::Hash + Eq, V> Ordered<K, V> {
    /// Returns the slot for `key`, creating it with `init` on first use.
    fn entry(&mut self, key: K, init: impl FnOnce() -> V) -> &mut V {
        let idx = match self.index.get(&key) {
            Some(idx) => *idx,
            None => {
                self.rows.push(init());
                let idx = self.rows.len() - 1;
                self.index.insert(key, idx);
                idx
            }
        };
        &mut self.rows[idx]
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|idx| &self.rows[*idx])
    }
}

#[derive(Debug, Default)]
struct State {
    components: Ordered<String, ComponentRecord>,
    edges: Ordered<(String, String, String), DependencyEdge>,
    tables: Ordered<(String, String), TableSchema>,
    procedures: Ordered<(String, String), StoredProcedure>,
    log: Vec<MigrationLogEntry>,
}

/// Process-local knowledge store.
#[derive(Debug)]
pub struct MemoryStore {
    dimension: usize,
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            state: RwLock::new(State::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state.read().map_err(|_| StoreError::Database {
            message: "memory store lock poisoned".into(),
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state.write().map_err(|_| StoreError::Database {
            message: "memory store lock poisoned".into(),
        })
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn add_code_vector(&self, component: &Component) -> Result<(), StoreError> {
        validate_dimension(self.dimension, component.embedding.len())?;

        let mut state = self.write()?;
        let record = state
            .components
            .entry(component.id.clone(), || ComponentRecord::empty(&component.id));
        record.name = component.name.clone();
        record.kind = component.kind;
        record.namespace = component.namespace.clone();
        record.file_path = component.file_path.clone();
        record.code_content = component.code_content.clone();
        record.embedding = Some(component.embedding.clone());
        record.metadata = component.metadata.clone();
        Ok(())
    }

    async fn search_similar_code(
        &self,
        query: &[f32],
        top_k: usize,
        kind: Option<ComponentKind>,
    ) -> Result<Vec<SimilarComponent>, StoreError> {
        validate_dimension(self.dimension, query.len())?;
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let state = self.read()?;
        let mut matches: Vec<SimilarComponent> = state
            .components
            .rows
            .iter()
            .filter(|r| kind.map_or(true, |k| r.kind == k))
            .filter_map(|r| r.to_component())
            .map(|component| SimilarComponent {
                distance: cosine_distance(query, &component.embedding),
                component,
            })
            .collect();

        // stable: equal distances keep insertion order
        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn get_component_by_id(&self, id: &str) -> Result<Option<Component>, StoreError> {
        let state = self.read()?;
        Ok(state
            .components
            .get(&id.to_string())
            .and_then(ComponentRecord::to_component))
    }

    async fn list_components(
        &self,
        kinds: &[ComponentKind],
    ) -> Result<Vec<ComponentSummary>, StoreError> {
        let state = self.read()?;
        Ok(state
            .components
            .rows
            .iter()
            .filter(|r| r.embedding.is_some() && kinds.contains(&r.kind))
            .map(|r| ComponentSummary {
                id: r.id.clone(),
                name: r.name.clone(),
                kind: r.kind,
                file_path: r.file_path.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn create_component_node(&self, node: &ComponentNode) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let record = state
            .components
            .entry(node.id.clone(), || ComponentRecord::empty(&node.id));
        record.name = node.name.clone();
        record.kind = node.kind;
        record.namespace = node.namespace.clone();
        record.file_path = node.file_path.clone();
        record.node_metadata = node.metadata.clone();
        Ok(())
    }

    async fn create_dependency(&self, edge: &DependencyEdge) -> Result<(), StoreError> {
        validate_strength(edge.strength)?;

        let mut state = self.write()?;
        let key = (
            edge.from_id.clone(),
            edge.to_id.clone(),
            edge.dependency_type.clone(),
        );
        let stored = state.edges.entry(key, || edge.clone());
        stored.strength = edge.strength;
        stored.metadata = edge.metadata.clone();
        Ok(())
    }

    async fn direct_dependencies(
        &self,
        id: &str,
    ) -> Result<Vec<DependencyDescriptor>, StoreError> {
        let state = self.read()?;
        let mut deps: Vec<DependencyDescriptor> = state
            .edges
            .rows
            .iter()
            .filter(|e| e.from_id == id)
            .filter_map(|e| state.components.get(&e.to_id).map(|r| r.describe(e)))
            .collect();
        deps.sort_by(|a, b| b.strength.total_cmp(&a.strength));
        Ok(deps)
    }

    async fn get_dependents(&self, id: &str) -> Result<Vec<DependencyDescriptor>, StoreError> {
        let state = self.read()?;
        let mut deps: Vec<DependencyDescriptor> = state
            .edges
            .rows
            .iter()
            .filter(|e| e.to_id == id)
            .filter_map(|e| state.components.get(&e.from_id).map(|r| r.describe(e)))
            .collect();
        deps.sort_by(|a, b| b.strength.total_cmp(&a.strength));
        Ok(deps)
    }

    async fn successors(&self, frontier: &[String]) -> Result<Vec<String>, StoreError> {
        let state = self.read()?;
        let mut targets = Vec::new();
        for from in frontier {
            let mut edges: Vec<&DependencyEdge> =
                state.edges.rows.iter().filter(|e| &e.from_id == from).collect();
            edges.sort_by(|a, b| b.strength.total_cmp(&a.strength));
            targets.extend(edges.into_iter().map(|e| e.to_id.clone()));
        }
        Ok(targets)
    }

    async fn nodes(&self, ids: &[String]) -> Result<Vec<ComponentNode>, StoreError> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.components.get(id))
            .map(ComponentRecord::to_node)
            .collect())
    }
}

#[async_trait]
impl SchemaStore for MemoryStore {
    async fn add_table_schema(&self, table: &TableSchema) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let key = (table.schema_name.clone(), table.table_name.clone());
        *state.tables.entry(key, || table.clone()) = table.clone();
        Ok(())
    }

    async fn add_stored_procedure(&self, procedure: &StoredProcedure) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let key = (procedure.schema_name.clone(), procedure.proc_name.clone());
        *state.procedures.entry(key, || procedure.clone()) = procedure.clone();
        Ok(())
    }

    async fn get_table_schema(&self, table_name: &str) -> Result<Option<TableSchema>, StoreError> {
        let state = self.read()?;
        Ok(state
            .tables
            .rows
            .iter()
            .filter(|t| t.table_name == table_name)
            .min_by(|a, b| a.schema_name.cmp(&b.schema_name))
            .cloned())
    }

    async fn get_stored_procedure(
        &self,
        proc_name: &str,
    ) -> Result<Option<StoredProcedure>, StoreError> {
        let state = self.read()?;
        Ok(state
            .procedures
            .rows
            .iter()
            .filter(|p| p.proc_name == proc_name)
            .min_by(|a, b| a.schema_name.cmp(&b.schema_name))
            .cloned())
    }

    async fn search_tables_by_keyword(
        &self,
        keyword: &str,
    ) -> Result<Vec<TableSchema>, StoreError> {
        let column_re = keyword_regex(keyword)?;
        let needle = keyword.to_lowercase();

        let state = self.read()?;
        Ok(state
            .tables
            .rows
            .iter()
            .filter(|t| {
                t.table_name.to_lowercase().contains(&needle)
                    || t.columns.iter().any(|c| column_re.is_match(&c.name))
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MigrationLog for MemoryStore {
    async fn append(&self, entry: &MigrationLogEntry) -> Result<(), StoreError> {
        self.write()?.log.push(entry.clone());
        Ok(())
    }

    async fn report(&self) -> Result<Vec<ReportRow>, StoreError> {
        let state = self.read()?;
        let mut groups: BTreeMap<(&str, &str), ReportRow> = BTreeMap::new();
        for entry in &state.log {
            groups
                .entry((entry.component_type.as_str(), entry.status.as_str()))
                .or_insert_with(|| ReportRow {
                    component_type: entry.component_type,
                    status: entry.status,
                    count: 0,
                })
                .count += 1;
        }
        Ok(groups.into_values().collect())
    }

    async fn entries(&self) -> Result<Vec<MigrationLogEntry>, StoreError> {
        Ok(self.read()?.log.clone())
    }
}
