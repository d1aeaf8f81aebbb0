//! Context assembly for one component.
//!
//! Merges a component's direct dependencies, the legacy tables behind its
//! data-access dependencies, the loaded guidelines and the target package into
//! the input of a code emitter.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Component, ComponentKind, DependencyDescriptor, TableSchema};
use crate::parsers::GuidelineSet;
use crate::store::KnowledgeStore;

/// Metadata keys every stored component must carry to be migrated.
pub const REQUIRED_METADATA_KEYS: [&str; 3] = ["methods", "properties", "dependencies"];

/// Class-name suffixes that mark a data-access component.
const DATA_ACCESS_SUFFIXES: [&str; 3] = ["Repository", "Dao", "DAO"];

/// Everything an emitter needs besides the component itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationContext {
    /// Direct dependencies, strongest first.
    pub dependencies: Vec<DependencyDescriptor>,
    pub guidelines: GuidelineSet,
    /// Legacy tables resolved from data-access names, deduplicated.
    pub matched_table_schemas: Vec<TableSchema>,
    pub target_package: String,
    /// Legacy method names from the extractor.
    pub methods: Vec<String>,
    /// Legacy property names from the extractor.
    pub properties: Vec<String>,
    /// Model components migrated by the same run; their DTOs are not
    /// emitted again for controllers.
    pub migrated_models: Vec<String>,
}

/// Entity name implied by a data-access class name (`CustomerRepository` -> `Customer`).
pub fn data_access_entity(name: &str) -> Option<&str> {
    DATA_ACCESS_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .filter(|entity| !entity.is_empty())
}

/// Reads a required string-list metadata key.
fn required_list(component: &Component, key: &str) -> Result<Vec<String>, AppError> {
    component.metadata_list(key).ok_or_else(|| {
        AppError::Validation(format!(
            "component '{}' ({}) has no '{}' list in its metadata",
            component.name, component.id, key
        ))
    })
}

/// Builds the generation context for `component`.
///
/// Fails with a validation error when the component's metadata lacks one of
/// [`REQUIRED_METADATA_KEYS`]; store errors propagate.
pub async fn assemble_context(
    store: &KnowledgeStore,
    component: &Component,
    guidelines: &GuidelineSet,
    target_package: &str,
) -> Result<MigrationContext, AppError> {
    let methods = required_list(component, REQUIRED_METADATA_KEYS[0])?;
    let properties = required_list(component, REQUIRED_METADATA_KEYS[1])?;
    required_list(component, REQUIRED_METADATA_KEYS[2])?;

    let dependencies = store.graph.get_dependencies(&component.id, 1).await?;

    let mut entities: Vec<&str> = Vec::new();
    if matches!(component.kind, ComponentKind::Model) {
        entities.push(&component.name);
    }
    if matches!(component.kind, ComponentKind::Repository) {
        entities.extend(data_access_entity(&component.name));
    }
    entities.extend(
        dependencies
            .iter()
            .filter_map(|dep| data_access_entity(&dep.name)),
    );

    let mut matched_table_schemas: Vec<TableSchema> = Vec::new();
    for entity in entities {
        let Some(table) = resolve_table(store, entity).await? else {
            tracing::debug!(entity, component = %component.name, "No legacy table matched");
            continue;
        };
        let seen = matched_table_schemas.iter().any(|t| {
            t.schema_name == table.schema_name && t.table_name == table.table_name
        });
        if !seen {
            matched_table_schemas.push(table);
        }
    }

    tracing::debug!(
        component = %component.name,
        dependencies = dependencies.len(),
        tables = matched_table_schemas.len(),
        "Assembled migration context"
    );

    Ok(MigrationContext {
        dependencies,
        guidelines: guidelines.clone(),
        matched_table_schemas,
        target_package: target_package.to_string(),
        methods,
        properties,
        migrated_models: Vec::new(),
    })
}

/// Exact table name first, then the first keyword hit whose table name
/// contains the entity.
async fn resolve_table(
    store: &KnowledgeStore,
    entity: &str,
) -> Result<Option<TableSchema>, AppError> {
    if let Some(table) = store.schema.get_table_schema(entity).await? {
        return Ok(Some(table));
    }

    let needle = entity.to_lowercase();
    let candidates = store
        .schema
        .search_tables_by_keyword(&regex::escape(entity))
        .await?;
    Ok(candidates
        .into_iter()
        .find(|t| t.table_name.to_lowercase().contains(&needle)))
}
