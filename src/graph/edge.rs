//! Edge representation: typed, directed relationships between nodes

use super::node::{NodeId, Properties, PropertyValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Known predicate vocabulary
///
/// Predicates are UPPER_SNAKE verb phrases. The extraction prompt is steered
/// toward this vocabulary but free-form predicates are accepted as long as
/// they normalize cleanly.
pub mod predicate {
    /// Fallback for relationships whose predicate could not be resolved
    pub const RELATED: &str = "RELATED";
    /// Synthetic anchoring edge from the batch root to a disconnected island
    pub const ROOT_CONCEPT_OF: &str = "ROOT_CONCEPT_OF";

    // Semantic
    pub const IS_A: &str = "IS_A";
    pub const PART_OF: &str = "PART_OF";
    pub const KNOWS: &str = "KNOWS";
    pub const BELONGS_TO: &str = "BELONGS_TO";
    pub const HAS_SKILL: &str = "HAS_SKILL";
    // Episodic
    pub const EXPERIENCED: &str = "EXPERIENCED";
    pub const HAPPENED_AT: &str = "HAPPENED_AT";
    // Psychometric
    pub const VALUES: &str = "VALUES";
    pub const DESIRES: &str = "DESIRES";
    pub const FEELS: &str = "FEELS";
}

/// A directed edge between two nodes
///
/// Endpoints are canonical batch-local ids until ingestion resolves them to
/// store rows. An edge never outlives the resolvability of its endpoints:
/// the normalizer drops edges it cannot anchor to real nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Source node id
    pub source: NodeId,
    /// Target node id
    pub target: NodeId,
    /// UPPER_SNAKE verb-phrase predicate (e.g. "BELONGS_TO")
    #[serde(rename = "type")]
    pub predicate: String,
    /// Open-ended property bag (weight, timestamp, confidence, ...)
    #[serde(default)]
    pub properties: Properties,
}

impl Edge {
    /// Create a new edge
    pub fn new(
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        predicate: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            predicate: predicate.into(),
            properties: HashMap::new(),
        }
    }

    /// Add a property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Whether this is a synthetic anchoring edge
    pub fn is_anchor(&self) -> bool {
        self.predicate == predicate::ROOT_CONCEPT_OF
    }
}
