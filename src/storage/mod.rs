//! Persistent property-graph storage

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{
    GraphStore, IngestReceipt, OpenStore, StorageError, StorageResult, StoredEdge, StoredNode,
    Subgraph,
};
