//! Extraction client — the boundary to the language-model collaborator
//!
//! The LLM produces a raw, untrusted node/edge payload. This module defines
//! the lenient payload types, the client trait, and two implementations:
//! - `CommandExtractor`: spawns a configured external extraction command and
//!   reads JSON from its stdout (production)
//! - `MockExtractor`: returns preconfigured payloads (testing)
//!
//! Payload leniency: extraction output is not guaranteed consistent. Both
//! `relationships` and `edges` are accepted as the edge-list key, and each
//! relationship may use `source`/`from`, `target`/`to`, `type`/`relationship`.
//! Identifiers may arrive as strings or numbers. Everything stricter than
//! "is it JSON" is the normalizer's job.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A raw node as emitted by the extractor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawNode {
    /// Extraction-local identifier; string or number, possibly missing
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    /// Entity label (e.g. "Person")
    #[serde(default)]
    pub label: Option<String>,
    /// Classification tier (e.g. "Semantic")
    #[serde(default)]
    pub layer: Option<String>,
    /// Arbitrary attributes
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
    /// Display name, when the extractor lifts it out of `properties`
    #[serde(default)]
    pub name: Option<String>,
}

/// A raw relationship as emitted by the extractor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRelationship {
    #[serde(default, alias = "from")]
    pub source: Option<serde_json::Value>,
    #[serde(default, alias = "to")]
    pub target: Option<serde_json::Value>,
    #[serde(default, rename = "type", alias = "relationship")]
    pub rel_type: Option<String>,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

/// The raw extraction payload: `{nodes: [...], relationships|edges: [...]}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawGraphPayload {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default, alias = "edges")]
    pub relationships: Vec<RawRelationship>,
}

impl RawGraphPayload {
    /// Parse extractor output, degrading to an empty payload on malformed
    /// JSON. Downstream stages are no-ops on empty input, so a bad model
    /// response costs one batch, never a crash.
    pub fn from_json_lossy(text: &str) -> Self {
        match serde_json::from_str::<Self>(text) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "malformed extraction payload, treating as empty");
                Self::default()
            }
        }
    }

    /// True when the payload carries no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Errors from extractor client operations
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("extractor not available: {0}")]
    Unavailable(String),
    #[error("extraction failed: {0}")]
    InvocationFailed(String),
    #[error("extractor io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client trait for the extraction collaborator
///
/// Abstracts over transport (HTTP service, subprocess, mock) so the pipeline
/// does not depend on how the model is reached.
#[async_trait]
pub trait ExtractorClient: Send + Sync {
    /// Check if the extractor is reachable
    async fn is_available(&self) -> bool;

    /// Extract a concept graph for a keyword from web-search context text
    async fn extract_concepts(
        &self,
        keyword: &str,
        context: &str,
    ) -> Result<RawGraphPayload, ExtractError>;
}

/// Extractor that shells out to an external extraction command.
///
/// The command receives the keyword as its single argument and the context
/// text on stdin; it must print a `{nodes, relationships}` JSON object on
/// stdout. Malformed output degrades to an empty payload rather than
/// failing the batch.
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
}

impl CommandExtractor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

#[async_trait]
impl ExtractorClient for CommandExtractor {
    async fn is_available(&self) -> bool {
        // The command is reachable if it can be spawned at all
        tokio::process::Command::new(&self.program)
            .arg("--version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await
            .is_ok()
    }

    async fn extract_concepts(
        &self,
        keyword: &str,
        context: &str,
    ) -> Result<RawGraphPayload, ExtractError> {
        use tokio::io::AsyncWriteExt;

        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(keyword)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(context.as_bytes()).await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(ExtractError::InvocationFailed(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        Ok(RawGraphPayload::from_json_lossy(&text))
    }
}

/// Mock extractor for testing — returns preconfigured payloads
pub struct MockExtractor {
    available: bool,
    responses: HashMap<String, RawGraphPayload>,
}

impl MockExtractor {
    /// Create a mock that reports as available
    pub fn available() -> Self {
        Self {
            available: true,
            responses: HashMap::new(),
        }
    }

    /// Create a mock that reports as unavailable
    pub fn unavailable() -> Self {
        Self {
            available: false,
            responses: HashMap::new(),
        }
    }

    /// Register a payload for a specific keyword
    pub fn with_payload(mut self, keyword: impl Into<String>, payload: RawGraphPayload) -> Self {
        self.responses.insert(keyword.into(), payload);
        self
    }

    /// Register a payload parsed from raw JSON text
    pub fn with_json(self, keyword: impl Into<String>, json: &str) -> Self {
        self.with_payload(keyword, RawGraphPayload::from_json_lossy(json))
    }
}

#[async_trait]
impl ExtractorClient for MockExtractor {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn extract_concepts(
        &self,
        keyword: &str,
        _context: &str,
    ) -> Result<RawGraphPayload, ExtractError> {
        if !self.available {
            return Err(ExtractError::Unavailable("mock is offline".to_string()));
        }
        Ok(self.responses.get(keyword).cloned().unwrap_or_default())
    }
}
