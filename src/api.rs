//! Transport-independent API layer.
//!
//! `OntographApi` is the single entry point for consumer-facing operations.
//! Transports (CLI, HTTP embedding, tests) call these methods — they never
//! reach into the pipeline, store, or analytics directly.

use std::sync::Arc;

use crate::analytics::{self, AnalyticsConfig};
use crate::extract::{ExtractorClient, RawGraphPayload};
use crate::pipeline::{IngestOutcome, IngestPipeline, Normalizer, PipelineError};
use crate::storage::{GraphStore, StorageResult};
use crate::view::ViewGraph;

/// Default cap on whole-graph reads
const FULL_GRAPH_LIMIT: usize = 300;
/// Default cap on keyword seed matches
const KEYWORD_LIMIT: usize = 100;

/// Single entry point for all consumer-facing operations
pub struct OntographApi<S> {
    store: Arc<S>,
    pipeline: IngestPipeline<S>,
    analytics: AnalyticsConfig,
}

impl<S: GraphStore> OntographApi<S> {
    /// Create an API instance over a store
    pub fn new(store: Arc<S>) -> Self {
        let pipeline = IngestPipeline::new(store.clone());
        Self {
            store,
            pipeline,
            analytics: AnalyticsConfig::default(),
        }
    }

    /// Replace the normalization policy
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.pipeline = self.pipeline.with_normalizer(normalizer);
        self
    }

    /// Replace the analytics tuning
    pub fn with_analytics(mut self, analytics: AnalyticsConfig) -> Self {
        self.analytics = analytics;
        self
    }

    // --- Write ---

    /// Ingest one raw extraction payload for `keyword`
    pub fn ingest(
        &self,
        payload: RawGraphPayload,
        keyword: &str,
        source: Option<&str>,
    ) -> Result<IngestOutcome, PipelineError> {
        self.pipeline.ingest(payload, keyword, source)
    }

    /// Extract from context text via the collaborator and merge the result,
    /// returning the diff for visualization
    pub async fn merge_search(
        &self,
        extractor: &dyn ExtractorClient,
        keyword: &str,
        context: &str,
    ) -> Result<IngestOutcome, PipelineError> {
        self.pipeline.merge_extracted(extractor, keyword, context).await
    }

    /// Delete everything in the store
    pub fn reset(&self) -> StorageResult<()> {
        self.store.wipe()
    }

    // --- Read ---

    /// The whole graph (capped), enriched for display
    pub fn full_view(&self, source: Option<&str>) -> StorageResult<ViewGraph> {
        let subgraph = self.store.full_graph(FULL_GRAPH_LIMIT, source)?;
        let mut view = ViewGraph::from(&subgraph);
        analytics::enrich(&mut view, None, &self.analytics);
        Ok(view)
    }

    /// Keyword neighborhood, enriched for display
    pub fn keyword_view(&self, keyword: &str) -> StorageResult<ViewGraph> {
        let subgraph = self.store.keyword_subgraph(keyword, KEYWORD_LIMIT)?;
        let mut view = ViewGraph::from(&subgraph);
        analytics::enrich(&mut view, Some(keyword), &self.analytics);
        Ok(view)
    }

    /// Keyword neighborhood reduced to its dominant component, then
    /// enriched — hides low-relevance fragments of a broad match
    pub fn focused_view(&self, keyword: &str) -> StorageResult<ViewGraph> {
        let subgraph = self.store.keyword_subgraph(keyword, KEYWORD_LIMIT)?;
        let view = ViewGraph::from(&subgraph);
        let mut focused = analytics::reduce_to_component(&view, Some(keyword));
        analytics::enrich(&mut focused, Some(keyword), &self.analytics);
        Ok(focused)
    }

    /// Total `(node, edge)` counts
    pub fn counts(&self) -> StorageResult<(u64, u64)> {
        self.store.counts()
    }

    /// Node count for one label
    pub fn count_label(&self, label: &str) -> StorageResult<u64> {
        self.store.count_label(label)
    }
}
