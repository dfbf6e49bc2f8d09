//! Connectivity enforcement — no islands left behind
//!
//! A batch fresh out of normalization may contain disconnected islands: the
//! extractor names entities it never relates to anything. This pass
//! partitions the batch into connected components (undirected BFS) and
//! bridges every component that does not contain the root with one synthetic
//! `ROOT_CONCEPT_OF` edge from the root to the component's first-discovered
//! node. After it runs, a traversal from the root reaches every node.
//!
//! Pure graph theory over the batch only — the store is never consulted, so
//! islands that only exist across batches are not repaired here.

use crate::graph::{predicate, Batch, Edge, NodeId};
use std::collections::{HashMap, HashSet, VecDeque};

/// Partition the batch's nodes into connected components over the
/// undirected adjacency induced by its edges.
///
/// Component order and the order of nodes within a component follow the
/// batch's node ordering, so results are deterministic for a given input.
pub fn connected_components(batch: &Batch) -> Vec<Vec<NodeId>> {
    let mut adjacency: HashMap<&NodeId, Vec<&NodeId>> = batch
        .nodes
        .iter()
        .map(|n| (&n.id, Vec::new()))
        .collect();

    for edge in &batch.edges {
        // Edges referencing store-resident nodes don't participate
        if adjacency.contains_key(&edge.source) && adjacency.contains_key(&edge.target) {
            if let Some(neighbors) = adjacency.get_mut(&edge.source) {
                neighbors.push(&edge.target);
            }
            if let Some(neighbors) = adjacency.get_mut(&edge.target) {
                neighbors.push(&edge.source);
            }
        }
    }

    let mut visited: HashSet<&NodeId> = HashSet::new();
    let mut components = Vec::new();

    for node in &batch.nodes {
        if visited.contains(&node.id) {
            continue;
        }
        let mut component = Vec::new();
        let mut queue = VecDeque::from([&node.id]);
        visited.insert(&node.id);

        while let Some(current) = queue.pop_front() {
            component.push(current.clone());
            if let Some(neighbors) = adjacency.get(current) {
                for &neighbor in neighbors {
                    if visited.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
        }
        components.push(component);
    }

    components
}

/// Bridge every component that does not contain the root to the root.
///
/// Appends one `ROOT_CONCEPT_OF` edge per rootless component, from the root
/// to the component's representative (the first node discovered when the
/// component was traversed). A batch without a flagged root is left
/// untouched.
pub fn enforce_connectivity(batch: &mut Batch) {
    let Some(root_id) = batch.root().map(|r| r.id.clone()) else {
        return;
    };

    let components = connected_components(batch);
    let mut bridged = 0usize;

    for component in &components {
        if component.contains(&root_id) {
            continue;
        }
        // Representative: first node encountered in the component
        let representative = component[0].clone();
        batch.edges.push(Edge::new(
            root_id.clone(),
            representative,
            predicate::ROOT_CONCEPT_OF,
        ));
        bridged += 1;
    }

    if bridged > 0 {
        tracing::debug!(
            batch = %batch.id,
            components = components.len(),
            bridged,
            "anchored disconnected components to root"
        );
    }
}

/// The ids reachable from `start` over the batch's undirected edges.
/// Used by tests to assert the connectivity invariant.
pub fn reachable_from(batch: &Batch, start: &NodeId) -> HashSet<NodeId> {
    let components = connected_components(batch);
    components
        .into_iter()
        .find(|c| c.contains(start))
        .map(|c| c.into_iter().collect())
        .unwrap_or_default()
}
