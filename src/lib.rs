//! Ontograph: Personal Ontology Graph Engine
//!
//! Takes LLM-extracted node/edge payloads — malformed, duplicate-ridden,
//! and disconnected as they arrive — and turns them into well-formed,
//! deduplicated, fully-connected subgraphs merged idempotently into a
//! persistent property-graph store. Retrieved subgraphs are enriched with
//! centrality and community signals for visualization.
//!
//! # Pipeline
//!
//! raw payload → [`Normalizer`] → connectivity repair → transactional
//! store merge → (on read) [`analytics`] enrichment.
//!
//! # Example
//!
//! ```
//! use ontograph::{OntographApi, OpenStore, RawGraphPayload, SqliteStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(SqliteStore::open_in_memory().unwrap());
//! let api = OntographApi::new(store);
//!
//! let payload = RawGraphPayload::from_json_lossy(
//!     r#"{"nodes": [{"id": "Jazz", "label": "Concept", "properties": {"id": "jazz"}}],
//!         "relationships": []}"#,
//! );
//! let outcome = api.ingest(payload, "jazz", None).unwrap();
//! assert_eq!(outcome.receipt.nodes_created, 1);
//! ```

mod api;
pub mod analytics;
pub mod extract;
mod graph;
pub mod pipeline;
pub mod storage;
mod view;

pub use api::OntographApi;
pub use analytics::{reduce_to_component, AnalyticsConfig};
pub use extract::{CommandExtractor, ExtractError, ExtractorClient, MockExtractor, RawGraphPayload};
pub use graph::{
    layer, predicate, Batch, BatchId, Edge, EntityKind, MergeRule, Node, NodeId, Properties,
    PropertyValue,
};
pub use pipeline::{
    canonical_id, enforce_connectivity, IngestOutcome, IngestPipeline, Normalizer,
    NormalizerConfig, PipelineError, Script,
};
pub use storage::{
    GraphStore, IngestReceipt, OpenStore, SqliteStore, StorageError, StorageResult, StoredEdge,
    StoredNode, Subgraph,
};
pub use view::{ViewGraph, ViewLink, ViewNode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
