//! Component model: one migration unit of legacy source.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use sha2::{Digest, Sha256};

use super::ComponentKind;

/// Open key-value document attached to components and edges.
///
/// Kept schemaless so extractor output can grow; required keys are checked
/// where the metadata is consumed.
pub type Metadata = Map<String, JsonValue>;

/// Derives the stable component id from a source path.
///
/// Hex-encoded SHA-256 of the path bytes, so every run maps the same path to
/// the same id.
pub fn component_id(source_path: &str) -> String {
    format!("{:x}", Sha256::digest(source_path.as_bytes()))
}

/// A vector-bearing component row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub name: String,
    pub kind: ComponentKind,
    pub namespace: String,
    pub file_path: String,
    /// Full source text.
    pub code_content: String,
    /// Embedding of `code_content` (internal, not serialized).
    #[serde(skip_serializing, default)]
    pub embedding: Vec<f32>,
    pub metadata: Metadata,
}

impl Component {
    /// String list stored under a metadata key, if present and well-formed.
    pub fn metadata_list(&self, key: &str) -> Option<Vec<String>> {
        let values = self.metadata.get(key)?.as_array()?;
        values
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }
}

/// A component node in the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentNode {
    pub id: String,
    pub name: String,
    pub kind: ComponentKind,
    pub namespace: String,
    pub file_path: String,
    pub metadata: Metadata,
}

/// Lightweight listing entry used to drive per-component migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSummary {
    pub id: String,
    pub name: String,
    pub kind: ComponentKind,
    pub file_path: String,
}

/// A similarity search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarComponent {
    pub component: Component,
    /// Cosine distance to the query vector (0 = same direction).
    pub distance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_component_id_is_deterministic() {
        let a = component_id("src/Controllers/OrderController.cs");
        let b = component_id("src/Controllers/OrderController.cs");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, component_id("src/Controllers/CustomerController.cs"));
        assert_eq!(
            component_id("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_metadata_list() {
        let mut metadata = Metadata::new();
        metadata.insert("methods".into(), json!(["Get", "Post"]));
        metadata.insert("broken".into(), json!(["Get", 3]));
        let component = Component {
            id: "id".into(),
            name: "OrderController".into(),
            kind: ComponentKind::Controller,
            namespace: String::new(),
            file_path: "OrderController.cs".into(),
            code_content: String::new(),
            embedding: vec![],
            metadata,
        };

        assert_eq!(
            component.metadata_list("methods"),
            Some(vec!["Get".to_string(), "Post".to_string()])
        );
        assert_eq!(component.metadata_list("broken"), None);
        assert_eq!(component.metadata_list("missing"), None);
    }
}
