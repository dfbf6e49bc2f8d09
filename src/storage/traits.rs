//! Storage trait definitions

use crate::graph::{Batch, Properties};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A node as persisted, identified by its store row id
#[derive(Debug, Clone)]
pub struct StoredNode {
    /// Store identity (stable across batches)
    pub row_id: i64,
    /// Primary label
    pub label: String,
    /// Secondary classification label, if any
    pub layer: Option<String>,
    /// Property bag
    pub properties: Properties,
}

impl StoredNode {
    /// Human-readable display text: `name`, then `summary`, then `topic`
    pub fn display_name(&self) -> Option<&str> {
        ["name", "summary", "topic"]
            .iter()
            .find_map(|k| self.properties.get(*k).and_then(|v| v.as_str()))
    }

    /// Whether this node carries the root flag
    pub fn is_root(&self) -> bool {
        self.properties
            .get("isRoot")
            .map(|v| v.is_true())
            .unwrap_or(false)
    }
}

/// An edge as persisted, endpoints by store row id
#[derive(Debug, Clone)]
pub struct StoredEdge {
    pub source: i64,
    pub target: i64,
    pub predicate: String,
    pub properties: Properties,
}

/// A subgraph read back from the store
///
/// Edges only reference nodes present in `nodes`.
#[derive(Debug, Clone, Default)]
pub struct Subgraph {
    pub nodes: Vec<StoredNode>,
    pub edges: Vec<StoredEdge>,
}

/// Counters from one transactional batch merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReceipt {
    /// Nodes that matched an existing store node and were overlaid
    pub nodes_merged: usize,
    /// Nodes created fresh
    pub nodes_created: usize,
    /// Edges merged or created
    pub edges_written: usize,
    /// Edges whose endpoints resolved through neither the batch nor the store
    pub edges_dropped: usize,
}

/// Trait for property-graph storage backends
///
/// The contract the pipeline requires of its store: labeled nodes with
/// property maps, typed directed edges, transactional multi-write with
/// upsert-by-key, and pattern-matching reads. Implementations must be
/// thread-safe (Send + Sync).
pub trait GraphStore: Send + Sync {
    /// Transactionally merge one normalized batch.
    ///
    /// All node upserts, then all edge upserts, inside a single transaction:
    /// a failure aborts the whole batch with no partial mutation visible.
    /// Re-merging the same batch must not create duplicate keyed nodes or
    /// duplicate `(source, target, predicate)` edges.
    fn merge_batch(&self, batch: &Batch) -> StorageResult<IngestReceipt>;

    /// Pattern read: nodes whose display name, topic, or canonical id
    /// contains `keyword` (case-insensitive), plus their 1-hop
    /// neighborhood. `limit` caps the seed matches.
    fn keyword_subgraph(&self, keyword: &str, limit: usize) -> StorageResult<Subgraph>;

    /// Capped whole-graph read, optionally restricted to nodes whose
    /// `source` property equals `source`.
    fn full_graph(&self, limit: usize, source: Option<&str>) -> StorageResult<Subgraph>;

    /// Total `(node, edge)` counts
    fn counts(&self) -> StorageResult<(u64, u64)>;

    /// Number of nodes with the given primary label
    fn count_label(&self, label: &str) -> StorageResult<u64>;

    /// Delete every node and edge
    fn wipe(&self) -> StorageResult<()>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: GraphStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
