//! Graph store over `code_components` and `code_dependencies`.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use super::{descriptor_from_row, node_from_row, PostgresStore};
use crate::error::StoreError;
use crate::models::{ComponentNode, DependencyDescriptor, DependencyEdge};
use crate::store::{validate_strength, GraphStore};

const UPSERT_NODE: &str = r#"
INSERT INTO code_components (id, name, kind, namespace, file_path, node_metadata, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, NOW())
ON CONFLICT (id) DO UPDATE SET
    name = EXCLUDED.name,
    kind = EXCLUDED.kind,
    namespace = EXCLUDED.namespace,
    file_path = EXCLUDED.file_path,
    node_metadata = EXCLUDED.node_metadata,
    updated_at = NOW()
"#;

const UPSERT_EDGE: &str = r#"
INSERT INTO code_dependencies (from_id, to_id, dependency_type, strength, metadata)
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT (from_id, to_id, dependency_type) DO UPDATE SET
    strength = EXCLUDED.strength,
    metadata = EXCLUDED.metadata
"#;

const DIRECT_DEPENDENCIES: &str = r#"
SELECT c.id, c.name, c.kind, c.namespace, c.file_path, d.dependency_type, d.strength
FROM code_dependencies d
JOIN code_components c ON c.id = d.to_id
WHERE d.from_id = $1
ORDER BY d.strength DESC, d.seq
"#;

const DEPENDENTS: &str = r#"
SELECT c.id, c.name, c.kind, c.namespace, c.file_path, d.dependency_type, d.strength
FROM code_dependencies d
JOIN code_components c ON c.id = d.from_id
WHERE d.to_id = $1
ORDER BY d.strength DESC, d.seq
"#;

const SUCCESSORS: &str = r#"
SELECT d.to_id
FROM code_dependencies d
JOIN unnest($1::text[]) WITH ORDINALITY AS f(id, ord) ON d.from_id = f.id
ORDER BY f.ord, d.strength DESC, d.seq
"#;

#[async_trait]
impl GraphStore for PostgresStore {
    async fn create_component_node(&self, node: &ComponentNode) -> Result<(), StoreError> {
        let metadata = JsonValue::Object(node.metadata.clone());
        self.pool
            .execute_update(
                UPSERT_NODE,
                &[
                    &node.id,
                    &node.name,
                    &node.kind.as_str(),
                    &node.namespace,
                    &node.file_path,
                    &metadata,
                ],
            )
            .await?;
        Ok(())
    }

    async fn create_dependency(&self, edge: &DependencyEdge) -> Result<(), StoreError> {
        validate_strength(edge.strength)?;

        let metadata = JsonValue::Object(edge.metadata.clone());
        self.pool
            .execute_update(
                UPSERT_EDGE,
                &[
                    &edge.from_id,
                    &edge.to_id,
                    &edge.dependency_type,
                    &edge.strength,
                    &metadata,
                ],
            )
            .await?;
        Ok(())
    }

    async fn direct_dependencies(
        &self,
        id: &str,
    ) -> Result<Vec<DependencyDescriptor>, StoreError> {
        let rows = self.pool.execute_query(DIRECT_DEPENDENCIES, &[&id]).await?;
        rows.iter().map(descriptor_from_row).collect()
    }

    async fn get_dependents(&self, id: &str) -> Result<Vec<DependencyDescriptor>, StoreError> {
        let rows = self.pool.execute_query(DEPENDENTS, &[&id]).await?;
        rows.iter().map(descriptor_from_row).collect()
    }

    async fn successors(&self, frontier: &[String]) -> Result<Vec<String>, StoreError> {
        let rows = self.pool.execute_query(SUCCESSORS, &[&frontier]).await?;
        rows.iter().map(|row| row.get("to_id")).collect()
    }

    async fn nodes(&self, ids: &[String]) -> Result<Vec<ComponentNode>, StoreError> {
        let rows = self
            .pool
            .execute_query(
                "SELECT id, name, kind, namespace, file_path, node_metadata \
                 FROM code_components WHERE id = ANY($1)",
                &[&ids],
            )
            .await?;
        rows.iter().map(node_from_row).collect()
    }
}
