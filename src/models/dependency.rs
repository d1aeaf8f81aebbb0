//! Dependency edges between components.

use serde::{Deserialize, Serialize};

use super::{ComponentKind, Metadata};

/// Edge type written by the pipeline for every extracted dependency name.
pub const USES: &str = "USES";

/// Synthetic edge type reported for multi-hop traversal results.
pub const DEPENDS_ON: &str = "DEPENDS_ON";

/// Weight used when the caller does not supply one.
pub const DEFAULT_STRENGTH: f64 = 1.0;

/// A directed, typed, weighted relation.
///
/// Identity is `(from_id, to_id, dependency_type)`; `to_id` may name a
/// component that does not exist yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from_id: String,
    pub to_id: String,
    pub dependency_type: String,
    pub strength: f64,
    pub metadata: Metadata,
}

impl DependencyEdge {
    /// Creates an edge with default strength and empty metadata.
    pub fn new(from_id: impl Into<String>, to_id: impl Into<String>, dependency_type: &str) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            dependency_type: dependency_type.to_string(),
            strength: DEFAULT_STRENGTH,
            metadata: Metadata::new(),
        }
    }

    /// Sets the edge weight.
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }
}

/// A neighbor returned by dependency lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyDescriptor {
    pub id: String,
    pub name: String,
    pub kind: ComponentKind,
    pub namespace: String,
    pub file_path: String,
    pub dependency_type: String,
    pub strength: f64,
}
