//! The ingestion pipeline: normalize → repair connectivity → merge
//!
//! One extraction payload in, one transactional store merge out, plus the
//! "diff" view of what the batch added (the frontend flashes it). All graph
//! writes go through this pipeline.

mod connectivity;
mod normalize;

pub use connectivity::{connected_components, enforce_connectivity, reachable_from};
pub use normalize::{canonical_id, normalize_predicate, Normalizer, NormalizerConfig, Script};

use crate::extract::{ExtractError, ExtractorClient, RawGraphPayload};
use crate::storage::{GraphStore, IngestReceipt, StorageError};
use crate::view::ViewGraph;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by pipeline operations
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),

    #[error("extraction failure: {0}")]
    Extraction(#[from] ExtractError),
}

/// What one ingestion produced
#[derive(Debug)]
pub struct IngestOutcome {
    /// Store-side counters for the merge
    pub receipt: IngestReceipt,
    /// The normalized, connectivity-repaired batch shaped for display
    pub diff: ViewGraph,
}

/// The single write endpoint over a store
///
/// Owns the normalization policy; the store owns transactionality. A failed
/// merge aborts the whole batch — the error is reported, never retried here.
pub struct IngestPipeline<S> {
    store: Arc<S>,
    normalizer: Normalizer,
}

impl<S: GraphStore> IngestPipeline<S> {
    /// Create a pipeline with default normalization
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            normalizer: Normalizer::default(),
        }
    }

    /// Replace the normalizer (e.g. to enable the banned-script filter)
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Ingest one raw payload extracted for `keyword`.
    ///
    /// `source` optionally stamps an identity tag onto every node before the
    /// merge so retrieval can separate user data from junk.
    pub fn ingest(
        &self,
        payload: RawGraphPayload,
        keyword: &str,
        source: Option<&str>,
    ) -> Result<IngestOutcome, PipelineError> {
        let mut batch = self.normalizer.normalize(payload, keyword);
        if let Some(source) = source {
            batch.tag_source(source);
        }
        enforce_connectivity(&mut batch);

        let receipt = self.store.merge_batch(&batch)?;
        Ok(IngestOutcome {
            receipt,
            diff: ViewGraph::from(&batch),
        })
    }

    /// Drive the extraction collaborator and merge what it produces —
    /// the real-time graph evolution path.
    pub async fn merge_extracted(
        &self,
        extractor: &dyn ExtractorClient,
        keyword: &str,
        context: &str,
    ) -> Result<IngestOutcome, PipelineError> {
        if !extractor.is_available().await {
            return Err(ExtractError::Unavailable("extractor not running".to_string()).into());
        }
        let payload = extractor.extract_concepts(keyword, context).await?;
        self.ingest(payload, keyword, None)
    }
}
