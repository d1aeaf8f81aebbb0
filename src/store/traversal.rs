//! Bounded breadth-first dependency traversal.

use std::collections::{HashMap, HashSet};

use crate::error::StoreError;
use crate::models::{DependencyDescriptor, DEFAULT_STRENGTH, DEPENDS_ON};
use crate::store::GraphStore;

/// Collects every node reachable from `start` in `1..=max_depth` hops.
///
/// Each hop issues one `successors` call for the whole frontier. Visited ids
/// are never expanded twice, so cycles terminate before the depth cap. The
/// start id is excluded and ids without a node are dropped from the result
/// (but still expanded).
pub(crate) async fn bounded_dependencies<G>(
    graph: &G,
    start: &str,
    max_depth: usize,
) -> Result<Vec<DependencyDescriptor>, StoreError>
where
    G: GraphStore + ?Sized,
{
    let mut visited: HashSet<String> = HashSet::from([start.to_string()]);
    let mut discovered: Vec<String> = Vec::new();
    let mut frontier: Vec<String> = vec![start.to_string()];

    for depth in 1..=max_depth {
        if frontier.is_empty() {
            break;
        }

        let mut next = Vec::new();
        for target in graph.successors(&frontier).await? {
            if visited.insert(target.clone()) {
                next.push(target);
            }
        }

        tracing::debug!(start, depth, found = next.len(), "dependency traversal hop");
        discovered.extend(next.iter().cloned());
        frontier = next;
    }

    if discovered.is_empty() {
        return Ok(Vec::new());
    }

    let mut nodes: HashMap<String, _> = graph
        .nodes(&discovered)
        .await?
        .into_iter()
        .map(|node| (node.id.clone(), node))
        .collect();

    Ok(discovered
        .into_iter()
        .filter_map(|id| nodes.remove(&id))
        .map(|node| DependencyDescriptor {
            id: node.id,
            name: node.name,
            kind: node.kind,
            namespace: node.namespace,
            file_path: node.file_path,
            dependency_type: DEPENDS_ON.to_string(),
            strength: DEFAULT_STRENGTH,
        })
        .collect())
}
