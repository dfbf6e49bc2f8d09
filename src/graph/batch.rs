//! Batch: the unit of extraction and ingestion
//!
//! One extraction call produces one batch. A batch is consumed exactly once
//! by the pipeline (normalize → connect → ingest) and then discarded; its
//! only durable trace is what the ingestor persists.

use super::edge::Edge;
use super::node::{Node, NodeId, PropertyValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a batch, used for log correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(Uuid);

impl BatchId {
    /// Create a new random BatchId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An extraction-local graph: nodes and edges from one extraction call
///
/// After normalization, exactly one node is flagged as root and sits at the
/// front of `nodes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    /// Identifier for log correlation
    pub id: BatchId,
    /// The driving keyword this batch was extracted for, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    /// Nodes in the batch
    pub nodes: Vec<Node>,
    /// Edges in the batch
    pub edges: Vec<Edge>,
}

impl Batch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self {
            id: BatchId::new(),
            keyword: None,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Set the driving keyword
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// True when the batch carries no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Get a node by id
    pub fn get_node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// The root node, if one is flagged
    pub fn root(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.is_root())
    }

    /// Stamp a `source` property onto every node (identity tagging for
    /// ingest paths that need to distinguish user data from test junk)
    pub fn tag_source(&mut self, source: &str) {
        for node in &mut self.nodes {
            node.properties
                .insert("source".to_string(), PropertyValue::from(source));
        }
    }
}

impl Default for Batch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EntityKind;

    #[test]
    fn root_lookup_finds_flagged_node() {
        let mut batch = Batch::new().with_keyword("jazz");
        batch.nodes.push(Node::new("a", EntityKind::Concept));
        let mut root = Node::new("jazz", EntityKind::Concept);
        root.mark_root();
        batch.nodes.push(root);

        assert_eq!(batch.root().unwrap().id.as_str(), "jazz");
    }

    #[test]
    fn tag_source_stamps_every_node() {
        let mut batch = Batch::new();
        batch.nodes.push(Node::new("a", EntityKind::Person));
        batch.nodes.push(Node::new("b", EntityKind::Event));

        batch.tag_source("user");

        for node in &batch.nodes {
            assert_eq!(
                node.properties.get("source").and_then(|v| v.as_str()),
                Some("user")
            );
        }
    }
}
