//! Node representation in the ontology graph

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Canonical identifier for a node within an extraction batch
///
/// Serializes as a plain string (e.g. "samsung_electronics"). Canonical ids
/// are produced by the normalizer: lowercased, trimmed, interior whitespace
/// replaced with underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a NodeId from a string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Classification tiers for nodes (the ALIVE layers)
///
/// A node's layer is applied as a secondary label on top of its entity kind.
/// Arbitrary layer strings are legal; these are the known vocabulary.
pub mod layer {
    /// Static structure: people, organizations, skills, concepts
    pub const SEMANTIC: &str = "Semantic";
    /// Memory and time: events, periods
    pub const EPISODIC: &str = "Episodic";
    /// Inner self: values, emotions, goals, traits
    pub const PSYCHOMETRIC: &str = "Psychometric";
    /// Agency: actions the subject can perform
    pub const KINETIC: &str = "Kinetic";
}

/// Entity kind: the node's primary label, with its merge-key rule
///
/// The closed set of kinds the extraction prompt is asked to produce, plus
/// `Other` for anything it invents. Each kind knows how the ingestor should
/// deduplicate it — the dispatch happens exactly once, in the store's merge
/// pass, never via string comparison at call sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityKind {
    Person,
    Organization,
    Skill,
    Interest,
    Concept,
    Event,
    Other(String),
}

/// How the ingestor finds an existing store node for an incoming one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRule {
    /// Find-or-create by the named natural-key property.
    /// Falls back to create when the property is absent.
    Key(&'static str),
    /// Merge by an explicit `id` property when one is supplied;
    /// otherwise always create a new node. Event nodes land here —
    /// they are treated as always-new occurrences (known limitation).
    ByIdOrCreate,
}

impl EntityKind {
    /// Parse a raw label string into a kind
    pub fn from_label(label: &str) -> Self {
        match label {
            "Person" => Self::Person,
            "Organization" => Self::Organization,
            "Skill" => Self::Skill,
            "Interest" => Self::Interest,
            "Concept" => Self::Concept,
            "Event" => Self::Event,
            other => Self::Other(other.to_string()),
        }
    }

    /// The label string as stored and displayed
    pub fn as_label(&self) -> &str {
        match self {
            Self::Person => "Person",
            Self::Organization => "Organization",
            Self::Skill => "Skill",
            Self::Interest => "Interest",
            Self::Concept => "Concept",
            Self::Event => "Event",
            Self::Other(label) => label,
        }
    }

    /// The merge-key rule for this kind
    pub fn merge_rule(&self) -> MergeRule {
        match self {
            Self::Person | Self::Organization | Self::Skill => MergeRule::Key("name"),
            Self::Interest => MergeRule::Key("topic"),
            // Concept merges by its `id` property; so does any unknown label
            // that supplies one. Event carries neither key.
            Self::Concept | Self::Event | Self::Other(_) => MergeRule::ByIdOrCreate,
        }
    }
}

impl From<String> for EntityKind {
    fn from(s: String) -> Self {
        Self::from_label(&s)
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        kind.as_label().to_string()
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

/// Typed property values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Array(Vec<PropertyValue>),
    Object(HashMap<String, PropertyValue>),
}

impl PropertyValue {
    /// Borrow the string value, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// True if this is boolean `true`
    pub fn is_true(&self) -> bool {
        matches!(self, Self::Bool(true))
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Properties collection
pub type Properties = HashMap<String, PropertyValue>;

/// A node in the ontology graph
///
/// Fixed first-class fields (id, kind, layer) plus an open-ended property
/// bag. The display name lives in the bag under `name` (or `topic`/`summary`
/// for kinds that use those), never in the canonical id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Canonical batch-local identifier
    pub id: NodeId,
    /// Primary label
    #[serde(rename = "label")]
    pub kind: EntityKind,
    /// Secondary classification label, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    /// Open-ended property bag
    #[serde(default)]
    pub properties: Properties,
}

impl Node {
    /// Create a new node with the given id and kind
    pub fn new(id: impl Into<NodeId>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            kind,
            layer: None,
            properties: HashMap::new(),
        }
    }

    /// Set the layer
    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    /// Add a property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Human-readable display text: `name`, then `summary`, then `topic`
    pub fn display_name(&self) -> Option<&str> {
        ["name", "summary", "topic"]
            .iter()
            .find_map(|k| self.properties.get(*k).and_then(|v| v.as_str()))
    }

    /// Whether this node is flagged as the batch root
    pub fn is_root(&self) -> bool {
        self.properties
            .get("isRoot")
            .map(|v| v.is_true())
            .unwrap_or(false)
    }

    /// Flag this node as the batch root
    pub fn mark_root(&mut self) {
        self.properties
            .insert("isRoot".to_string(), PropertyValue::Bool(true));
    }

    /// The ingestor's find-or-create key: `(property name, value)`, or
    /// `None` when this node is always created fresh.
    pub fn merge_key(&self) -> Option<(&'static str, String)> {
        let prop = match self.kind.merge_rule() {
            MergeRule::Key(prop) => prop,
            MergeRule::ByIdOrCreate => "id",
        };
        self.properties
            .get(prop)
            .and_then(|v| v.as_str())
            .map(|v| (prop, v.to_string()))
    }
}
