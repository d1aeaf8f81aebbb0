//! Vector store over `code_components`.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use super::{kind_column, metadata_column, PostgresStore};
use crate::db::{PgVector, Row};
use crate::error::StoreError;
use crate::models::{Component, ComponentKind, ComponentSummary, SimilarComponent};
use crate::store::{validate_dimension, VectorStore};

const UPSERT_VECTOR: &str = r#"
INSERT INTO code_components
    (id, name, kind, namespace, file_path, code_content, embedding, metadata, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
ON CONFLICT (id) DO UPDATE SET
    name = EXCLUDED.name,
    kind = EXCLUDED.kind,
    namespace = EXCLUDED.namespace,
    file_path = EXCLUDED.file_path,
    code_content = EXCLUDED.code_content,
    embedding = EXCLUDED.embedding,
    metadata = EXCLUDED.metadata,
    updated_at = NOW()
"#;

/// `<=>` is NaN when either side has zero norm; such rows rank at 1.0.
const SEARCH_SIMILAR: &str = r#"
SELECT id, name, kind, namespace, file_path, code_content, embedding, metadata,
       COALESCE(NULLIF((embedding <=> $1)::float8, 'NaN'::float8), 1.0) AS distance
FROM code_components
WHERE embedding IS NOT NULL AND ($2::text IS NULL OR kind = $2)
ORDER BY distance, seq
LIMIT $3
"#;

fn component_from_row(row: &Row) -> Result<Component, StoreError> {
    Ok(Component {
        id: row.get("id")?,
        name: row.get("name")?,
        kind: kind_column(row)?,
        namespace: row.get("namespace")?,
        file_path: row.get("file_path")?,
        code_content: row.get("code_content")?,
        embedding: row.get("embedding")?,
        metadata: metadata_column(row, "metadata")?,
    })
}

#[async_trait]
impl VectorStore for PostgresStore {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn add_code_vector(&self, component: &Component) -> Result<(), StoreError> {
        validate_dimension(self.dimension, component.embedding.len())?;

        let embedding = PgVector::from(component.embedding.as_slice());
        let metadata = JsonValue::Object(component.metadata.clone());
        self.pool
            .execute_update(
                UPSERT_VECTOR,
                &[
                    &component.id,
                    &component.name,
                    &component.kind.as_str(),
                    &component.namespace,
                    &component.file_path,
                    &component.code_content,
                    &embedding,
                    &metadata,
                ],
            )
            .await?;

        tracing::debug!(id = %component.id, name = %component.name, "Stored component vector");
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

        let query = PgVector::from(query);
        let kind = kind.map(|k| k.as_str());
        let limit = top_k as i64;
        let rows = self
            .pool
            .execute_query(SEARCH_SIMILAR, &[&query, &kind, &limit])
            .await?;

        rows.iter()
            .map(|row| -> Result<_, StoreError> {
                Ok(SimilarComponent {
                    component: component_from_row(row)?,
                    distance: row.get("distance")?,
                })
            })
            .collect()
    }

    async fn get_component_by_id(&self, id: &str) -> Result<Option<Component>, StoreError> {
        let rows = self
            .pool
            .execute_query(
                "SELECT id, name, kind, namespace, file_path, code_content, embedding, metadata \
                 FROM code_components WHERE id = $1 AND embedding IS NOT NULL",
                &[&id],
            )
            .await?;

        rows.first().map(component_from_row).transpose()
    }

    async fn list_components(
        &self,
        kinds: &[ComponentKind],
    ) -> Result<Vec<ComponentSummary>, StoreError> {
        let kinds: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
        let rows = self
            .pool
            .execute_query(
                "SELECT id, name, kind, file_path FROM code_components \
                 WHERE embedding IS NOT NULL AND kind = ANY($1) ORDER BY seq",
                &[&kinds],
            )
            .await?;

        rows.iter()
            .map(|row| -> Result<_, StoreError> {
                Ok(ComponentSummary {
                    id: row.get("id")?,
                    name: row.get("name")?,
                    kind: kind_column(row)?,
                    file_path: row.get("file_path")?,
                })
            })
            .collect()
    }
}
