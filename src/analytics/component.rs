//! Component filtering — hide low-relevance fragments
//!
//! A broad keyword match can drag in disconnected scraps of the graph.
//! This filter keeps only the connected component containing the resolved
//! root — or, when no root resolves, the largest component by node count.

use super::root::resolve_root;
use crate::view::ViewGraph;
use std::collections::{HashMap, HashSet, VecDeque};

/// Reduce a view to its dominant connected component.
///
/// Root resolution follows the same ordered strategies as enrichment; the
/// component containing the root wins, otherwise the largest. Links survive
/// only when both endpoints do.
pub fn reduce_to_component(graph: &ViewGraph, hint: Option<&str>) -> ViewGraph {
    if graph.nodes.is_empty() {
        return ViewGraph::default();
    }

    let index: HashMap<&str, usize> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); graph.nodes.len()];
    for link in &graph.links {
        let (Some(&s), Some(&t)) = (index.get(link.source.as_str()), index.get(link.target.as_str()))
        else {
            continue;
        };
        adjacency[s].push(t);
        adjacency[t].push(s);
    }

    let components = partition(&adjacency);

    let chosen = match resolve_root(&graph.nodes, hint) {
        Some(root_idx) => components
            .iter()
            .find(|c| c.contains(&root_idx))
            .cloned()
            .unwrap_or_default(),
        None => components
            .into_iter()
            .max_by_key(|c| c.len())
            .unwrap_or_default(),
    };

    let keep: HashSet<usize> = chosen.into_iter().collect();
    let kept_ids: HashSet<&str> = keep
        .iter()
        .map(|&i| graph.nodes[i].id.as_str())
        .collect();

    ViewGraph {
        nodes: graph
            .nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| keep.contains(i))
            .map(|(_, n)| n.clone())
            .collect(),
        links: graph
            .links
            .iter()
            .filter(|l| kept_ids.contains(l.source.as_str()) && kept_ids.contains(l.target.as_str()))
            .cloned()
            .collect(),
    }
}

/// BFS partition of node indices into connected components
fn partition(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut visited = vec![false; adjacency.len()];
    let mut components = Vec::new();

    for start in 0..adjacency.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut component = Vec::new();
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            component.push(current);
            for &next in &adjacency[current] {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
        components.push(component);
    }
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{ViewLink, ViewNode};
    use std::collections::HashMap;

    fn node(id: &str) -> ViewNode {
        ViewNode {
            id: id.to_string(),
            label: "Concept".to_string(),
            name: id.to_string(),
            val: 1.0,
            layer: None,
            centrality: None,
            group: None,
            is_root: None,
            properties: HashMap::new(),
        }
    }

    fn link(s: &str, t: &str) -> ViewLink {
        ViewLink {
            source: s.to_string(),
            target: t.to_string(),
            name: "RELATED".to_string(),
        }
    }

    fn split_graph() -> ViewGraph {
        // component 1: a-b-c (3 nodes), component 2: x-y (2 nodes)
        ViewGraph {
            nodes: vec![node("a"), node("b"), node("c"), node("x"), node("y")],
            links: vec![link("a", "b"), link("b", "c"), link("x", "y")],
        }
    }

    // === Scenario: rooted component wins even when smaller ===
    #[test]
    fn rooted_component_is_selected() {
        let reduced = reduce_to_component(&split_graph(), Some("x"));
        let ids: Vec<&str> = reduced.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(reduced.nodes.len(), 2);
        assert!(ids.contains(&"x") && ids.contains(&"y"));
        assert_eq!(reduced.links.len(), 1);
    }

    // === Scenario: no root resolves → largest component ===
    #[test]
    fn largest_component_without_root() {
        let reduced = reduce_to_component(&split_graph(), Some("zebra"));
        assert_eq!(reduced.nodes.len(), 3);
        assert_eq!(reduced.links.len(), 2);

        let no_hint = reduce_to_component(&split_graph(), None);
        assert_eq!(no_hint.nodes.len(), 3);
    }

    #[test]
    fn links_with_one_surviving_endpoint_are_cut() {
        let mut graph = split_graph();
        // cross-component link makes them one component; remove it to keep
        // the scenario, then add a dangling link to a missing node instead
        graph.links.push(link("c", "ghost"));
        let reduced = reduce_to_component(&graph, Some("a"));
        assert!(reduced
            .links
            .iter()
            .all(|l| l.target != "ghost" && l.source != "ghost"));
    }

    #[test]
    fn empty_view_reduces_to_empty() {
        let reduced = reduce_to_component(&ViewGraph::default(), Some("x"));
        assert!(reduced.is_empty());
    }

    #[test]
    fn explicit_root_flag_selects_its_component() {
        let mut graph = split_graph();
        graph.nodes[4].is_root = Some(true); // y
        let reduced = reduce_to_component(&graph, None);
        assert_eq!(reduced.nodes.len(), 2);
    }
}
