//! Read-side graph analytics — importance, communities, component filtering
//!
//! A pure lens over retrieved subgraphs: nothing here mutates the store.
//! Every algorithm has a documented fallback so a non-empty graph always
//! yields displayable output.

mod centrality;
mod community;
mod component;
mod root;

pub use centrality::{degree_centrality, pagerank, NonConvergence};
pub use community::detect_communities;
pub use component::reduce_to_component;
pub use root::resolve_root;

use crate::view::ViewGraph;
use std::collections::{HashMap, HashSet};

/// Tuning for enrichment
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// PageRank damping factor
    pub damping: f64,
    /// PageRank iteration budget before the degree fallback kicks in
    pub max_iterations: usize,
    /// PageRank L1 convergence tolerance
    pub tolerance: f64,
    /// Minimum display size
    pub base_size: f64,
    /// Multiplier inside the log compression
    pub size_scale: f64,
    /// Multiplier outside the log compression
    pub size_factor: f64,
    /// Display size force-set on the resolved root
    pub root_size: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 100,
            tolerance: 1e-6,
            base_size: 2.0,
            size_scale: 10.0,
            size_factor: 3.0,
            root_size: 10.0,
        }
    }
}

impl AnalyticsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_root_size(mut self, root_size: f64) -> Self {
        self.root_size = root_size;
        self
    }

    /// The largest display size a non-root node can receive
    pub fn max_size(&self) -> f64 {
        self.base_size + (1.0 + self.size_scale).ln() * self.size_factor
    }
}

/// Enrich a view in place with centrality, display sizes, and communities.
///
/// Importance: PageRank over the undirected simple graph, min/max
/// normalized, then log-compressed into a display size so dense graphs stay
/// visually distinguishable. On non-convergence, degree centrality.
/// Communities: greedy modularity, single group on degenerate input.
/// The resolved root (if any) is forced to the maximum display size and
/// centrality 1.0 — always visually dominant, whatever the topology says.
pub fn enrich(graph: &mut ViewGraph, hint: Option<&str>, config: &AnalyticsConfig) {
    if graph.nodes.is_empty() {
        return;
    }

    let adjacency = build_adjacency(graph);

    let scores = match pagerank(
        &adjacency,
        config.damping,
        config.max_iterations,
        config.tolerance,
    ) {
        Ok(scores) => scores,
        Err(NonConvergence) => {
            tracing::warn!("pagerank did not converge, falling back to degree centrality");
            degree_centrality(&adjacency)
        }
    };

    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if max > min { max - min } else { 1.0 };

    for (i, node) in graph.nodes.iter_mut().enumerate() {
        let normalized = (scores[i] - min) / range;
        node.val = config.base_size + (1.0 + normalized * config.size_scale).ln() * config.size_factor;
        node.centrality = Some(scores[i]);
    }

    let groups = detect_communities(&adjacency);
    for (i, node) in graph.nodes.iter_mut().enumerate() {
        node.group = Some(groups[i]);
    }

    if let Some(root_idx) = resolve_root(&graph.nodes, hint) {
        let root = &mut graph.nodes[root_idx];
        root.val = config.root_size;
        root.centrality = Some(1.0);
        root.is_root = Some(true);
    }
}

/// Undirected simple adjacency over the view: parallel links collapse,
/// self-loops and links to unknown ids are ignored.
fn build_adjacency(graph: &ViewGraph) -> Vec<Vec<usize>> {
    let index: HashMap<&str, usize> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); graph.nodes.len()];

    for link in &graph.links {
        let (Some(&s), Some(&t)) = (index.get(link.source.as_str()), index.get(link.target.as_str()))
        else {
            continue;
        };
        if s == t {
            continue;
        }
        let pair = (s.min(t), s.max(t));
        if seen.insert(pair) {
            adjacency[s].push(t);
            adjacency[t].push(s);
        }
    }
    adjacency
}
