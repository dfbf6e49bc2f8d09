//! Visualization-facing graph contract
//!
//! The JSON shape consumed by the 3D force-graph frontend: nodes carry a
//! display size (`val`), an optional centrality score and community group,
//! and their remaining properties flattened alongside; links carry the edge
//! predicate as `name`.

use crate::graph::{Batch, Properties};
use crate::storage::Subgraph;
use serde::{Deserialize, Serialize};

/// A node shaped for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewNode {
    /// Stable identifier within this view (canonical id for batch views,
    /// store row id for persisted views)
    pub id: String,
    /// Primary label
    pub label: String,
    /// Human-readable display text
    pub name: String,
    /// Display size (radius) for the frontend
    pub val: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    /// Raw importance score in [0, 1], set by analytics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centrality: Option<f64>,
    /// 1-based community index, set by analytics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<usize>,
    #[serde(rename = "isRoot", skip_serializing_if = "Option::is_none")]
    pub is_root: Option<bool>,
    /// Remaining node properties, flattened into the JSON object
    #[serde(flatten)]
    pub properties: Properties,
}

/// A link shaped for display; `name` is the edge predicate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewLink {
    pub source: String,
    pub target: String,
    pub name: String,
}

/// The full view payload: `{nodes: [...], links: [...]}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewGraph {
    pub nodes: Vec<ViewNode>,
    pub links: Vec<ViewLink>,
}

/// Default display size before analytics runs
const DEFAULT_VAL: f64 = 1.0;

/// Keys lifted out of the property bag into first-class fields
const LIFTED_KEYS: [&str; 4] = ["name", "isRoot", "id", "layer"];

fn residual_properties(properties: &Properties) -> Properties {
    properties
        .iter()
        .filter(|(k, _)| !LIFTED_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

impl ViewGraph {
    /// True when the view carries no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node's position by id
    pub fn position(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }
}

impl From<&Batch> for ViewGraph {
    /// Shape a batch as the "diff" view returned after a merge: the
    /// frontend flashes exactly what this extraction added.
    fn from(batch: &Batch) -> Self {
        let nodes = batch
            .nodes
            .iter()
            .map(|n| ViewNode {
                id: n.id.as_str().to_string(),
                label: n.kind.as_label().to_string(),
                name: n
                    .display_name()
                    .unwrap_or("Unknown")
                    .to_string(),
                val: DEFAULT_VAL,
                layer: n.layer.clone().or_else(|| {
                    n.properties
                        .get("layer")
                        .and_then(|v| v.as_str())
                        .map(String::from)
                }),
                centrality: None,
                group: None,
                is_root: if n.is_root() { Some(true) } else { None },
                properties: residual_properties(&n.properties),
            })
            .collect();

        let links = batch
            .edges
            .iter()
            .map(|e| ViewLink {
                source: e.source.as_str().to_string(),
                target: e.target.as_str().to_string(),
                name: e.predicate.clone(),
            })
            .collect();

        Self { nodes, links }
    }
}

impl From<&Subgraph> for ViewGraph {
    /// Shape a store read for display; node ids become store row ids so
    /// links stay consistent with what the store returned.
    fn from(subgraph: &Subgraph) -> Self {
        let nodes = subgraph
            .nodes
            .iter()
            .map(|n| ViewNode {
                id: n.row_id.to_string(),
                label: n.label.clone(),
                name: n.display_name().unwrap_or("Unknown").to_string(),
                val: DEFAULT_VAL,
                layer: n.layer.clone().or_else(|| {
                    n.properties
                        .get("layer")
                        .and_then(|v| v.as_str())
                        .map(String::from)
                }),
                centrality: None,
                group: None,
                is_root: if n.is_root() { Some(true) } else { None },
                properties: residual_properties(&n.properties),
            })
            .collect();

        let links = subgraph
            .edges
            .iter()
            .map(|e| ViewLink {
                source: e.source.to_string(),
                target: e.target.to_string(),
                name: e.predicate.clone(),
            })
            .collect();

        Self { nodes, links }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{predicate, Edge, EntityKind, Node};

    #[test]
    fn batch_view_carries_predicates_as_link_names() {
        let mut batch = Batch::new();
        batch
            .nodes
            .push(Node::new("a", EntityKind::Person).with_property("name", "A"));
        batch
            .nodes
            .push(Node::new("b", EntityKind::Person).with_property("name", "B"));
        batch.edges.push(Edge::new("a", "b", predicate::KNOWS));

        let view = ViewGraph::from(&batch);
        assert_eq!(view.nodes.len(), 2);
        assert_eq!(view.links[0].name, "KNOWS");
        assert_eq!(view.nodes[0].val, 1.0);
    }

    #[test]
    fn lifted_keys_do_not_duplicate_in_json() {
        let mut batch = Batch::new();
        let mut root = Node::new("jazz", EntityKind::Concept)
            .with_property("name", "Jazz")
            .with_property("id", "jazz")
            .with_property("summary", "music");
        root.mark_root();
        batch.nodes.push(root);

        let view = ViewGraph::from(&batch);
        let json = serde_json::to_value(&view.nodes[0]).unwrap();
        assert_eq!(json["name"], "Jazz");
        assert_eq!(json["isRoot"], true);
        assert_eq!(json["summary"], "music");
        // flattened bag must not shadow the first-class id
        assert_eq!(json["id"], "jazz");
    }

    #[test]
    fn missing_display_name_falls_back_to_unknown() {
        let mut batch = Batch::new();
        batch.nodes.push(Node::new("x", EntityKind::Event));
        let view = ViewGraph::from(&batch);
        assert_eq!(view.nodes[0].name, "Unknown");
    }
}
