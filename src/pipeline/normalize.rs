//! Batch normalization — canonical ids, predicate cleanup, root guarantee
//!
//! Extraction output is heterogeneous: identifiers vary in casing and
//! whitespace, relationship keys come in several spellings, and the graph may
//! not mention the keyword it was extracted for. The normalizer turns that
//! into a canonical batch: stable lowercase ids, UPPER_SNAKE predicates,
//! display casing preserved in the `name` property, and exactly one root
//! node at the front of the node list.
//!
//! Canonicalization is case/whitespace-insensitive on purpose: "Samsung
//! Electronics" and "samsung_electronics" must collapse to the same id so
//! they merge into one store node. It is a dedup mechanism, not a display
//! transform — original casing survives only in `name`.

use crate::extract::RawGraphPayload;
use crate::graph::{layer, predicate, Batch, Edge, EntityKind, Node, Properties, PropertyValue};
use std::collections::HashMap;

/// A writing system the normalizer can filter on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Hangul,
    Han,
    Kana,
    Cyrillic,
}

impl Script {
    fn matches_char(&self, c: char) -> bool {
        match self {
            Self::Hangul => matches!(c,
                '\u{AC00}'..='\u{D7A3}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}'),
            Self::Han => matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}'),
            Self::Kana => matches!(c, '\u{3040}'..='\u{30FF}'),
            Self::Cyrillic => matches!(c, '\u{0400}'..='\u{04FF}'),
        }
    }

    /// True when any character of `text` belongs to this script
    pub fn contains(&self, text: &str) -> bool {
        text.chars().any(|c| self.matches_char(c))
    }
}

/// Normalizer configuration
#[derive(Debug, Clone, Default)]
pub struct NormalizerConfig {
    /// Language-consistency filter: when the driving keyword is NOT written
    /// in this script, nodes whose display text is are stripped (along with
    /// edges touching them). Content-quality policy, off by default.
    pub banned_script: Option<Script>,
}

impl NormalizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_banned_script(mut self, script: Script) -> Self {
        self.banned_script = Some(script);
        self
    }
}

/// Derive a canonical machine id: trim, lowercase, interior whitespace
/// runs replaced with a single underscore.
pub fn canonical_id(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Normalize a predicate to UPPER_SNAKE: trim, uppercase, spaces and
/// hyphens replaced with underscores.
pub fn normalize_predicate(raw: &str) -> String {
    raw.trim()
        .to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .replace('-', "_")
}

/// Coerce a raw identifier value (string or number) to a trimmed string
fn coerce_id(value: &Option<serde_json::Value>) -> Option<String> {
    match value {
        Some(serde_json::Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Convert a raw JSON object into a typed property bag, dropping nulls
fn json_to_properties(map: serde_json::Map<String, serde_json::Value>) -> Properties {
    map.into_iter()
        .filter_map(|(k, v)| serde_json::from_value::<PropertyValue>(v).ok().map(|pv| (k, pv)))
        .collect()
}

/// Converts raw extraction payloads into canonical batches
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Normalize a raw payload into a canonical batch for `keyword`.
    ///
    /// An empty or unusable payload yields an empty batch — no root is
    /// injected into nothing, and downstream stages are no-ops.
    pub fn normalize(&self, payload: RawGraphPayload, keyword: &str) -> Batch {
        let mut batch = Batch::new().with_keyword(keyword);
        if payload.is_empty() {
            return batch;
        }

        // Pass 1: canonicalize node ids, preserving display casing in `name`
        let mut id_map: HashMap<String, String> = HashMap::new();
        let mut by_canon: HashMap<String, usize> = HashMap::new();

        for raw in payload.nodes {
            let Some(original) = coerce_id(&raw.id) else {
                tracing::warn!("node dropped: missing or empty id");
                continue;
            };
            let canon = canonical_id(&original);
            if canon.is_empty() {
                tracing::warn!(id = %original, "node dropped: id canonicalizes to nothing");
                continue;
            }
            let Some(label) = raw.label.as_deref().map(str::trim).filter(|l| !l.is_empty())
            else {
                tracing::warn!(id = %original, "node dropped: unresolvable label");
                continue;
            };

            let mut properties = json_to_properties(raw.properties);
            if let Some(name) = raw.name.filter(|n| !n.trim().is_empty()) {
                properties.entry("name".to_string()).or_insert(PropertyValue::String(name));
            }
            let name_missing = properties
                .get("name")
                .and_then(|v| v.as_str())
                .map(|s| s.trim().is_empty())
                .unwrap_or(true);

            id_map.insert(original.clone(), canon.clone());

            match by_canon.get(&canon) {
                Some(&idx) => {
                    // Same canonical id seen twice in one batch: overlay the
                    // explicitly supplied properties, last write wins per key
                    tracing::debug!(id = %canon, "duplicate canonical id in batch, merging");
                    let existing = &mut batch.nodes[idx];
                    for (k, v) in properties {
                        existing.properties.insert(k, v);
                    }
                    if existing.layer.is_none() {
                        existing.layer = raw.layer.filter(|l| !l.trim().is_empty());
                    }
                }
                None => {
                    // Default the display name to the original identifier so
                    // casing survives canonicalization ("Superman" the name,
                    // "superman" the id)
                    if name_missing {
                        properties
                            .insert("name".to_string(), PropertyValue::String(original.clone()));
                    }
                    let node = Node {
                        id: canon.clone().into(),
                        kind: EntityKind::from_label(label),
                        layer: raw.layer.filter(|l| !l.trim().is_empty()),
                        properties,
                    };
                    by_canon.insert(canon, batch.nodes.len());
                    batch.nodes.push(node);
                }
            }
        }

        // Pass 2: resolve edge endpoints through the id map, falling back to
        // direct canonicalization so an edge may reference a node that lives
        // in the store rather than this batch
        for raw in payload.relationships {
            let (Some(src), Some(tgt)) = (coerce_id(&raw.source), coerce_id(&raw.target)) else {
                tracing::warn!("edge dropped: missing endpoint");
                continue;
            };
            let src_c = id_map.get(&src).cloned().unwrap_or_else(|| canonical_id(&src));
            let tgt_c = id_map.get(&tgt).cloned().unwrap_or_else(|| canonical_id(&tgt));
            if src_c.is_empty() || tgt_c.is_empty() {
                tracing::warn!(source = %src, target = %tgt, "edge dropped: endpoint canonicalizes to nothing");
                continue;
            }

            let pred = raw
                .rel_type
                .as_deref()
                .map(normalize_predicate)
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| predicate::RELATED.to_string());

            batch.edges.push(Edge {
                source: src_c.into(),
                target: tgt_c.into(),
                predicate: pred,
                properties: json_to_properties(raw.properties),
            });
        }

        self.apply_script_filter(&mut batch, keyword);
        self.ensure_root(&mut batch, keyword);

        tracing::debug!(
            batch = %batch.id,
            nodes = batch.node_count(),
            edges = batch.edge_count(),
            "batch normalized"
        );
        batch
    }

    /// Strip nodes written in the banned script (and edges touching them)
    /// when the driving keyword itself is not written in it.
    fn apply_script_filter(&self, batch: &mut Batch, keyword: &str) {
        let Some(script) = self.config.banned_script else {
            return;
        };
        if script.contains(keyword) {
            return;
        }

        let stripped: Vec<_> = batch
            .nodes
            .iter()
            .filter(|n| {
                let display = n.display_name().unwrap_or_else(|| n.id.as_str());
                script.contains(display) || script.contains(n.id.as_str())
            })
            .map(|n| n.id.clone())
            .collect();

        if stripped.is_empty() {
            return;
        }
        tracing::warn!(count = stripped.len(), "stripping nodes in banned script");

        batch.nodes.retain(|n| !stripped.contains(&n.id));
        batch
            .edges
            .retain(|e| !stripped.contains(&e.source) && !stripped.contains(&e.target));
    }

    /// Guarantee exactly one root node, promoted to the front of the list.
    ///
    /// An existing node matching the keyword (by canonical id or display
    /// name) is promoted; otherwise a Concept node carrying the keyword is
    /// injected. Skipped entirely for empty batches.
    fn ensure_root(&self, batch: &mut Batch, keyword: &str) {
        if batch.nodes.is_empty() {
            return;
        }
        let canon_kw = canonical_id(keyword);
        let kw_lower = keyword.trim().to_lowercase();

        let found = batch.nodes.iter().position(|n| {
            n.id.as_str() == canon_kw
                || n.display_name()
                    .map(|d| d.to_lowercase() == kw_lower)
                    .unwrap_or(false)
        });

        let mut root = match found {
            Some(idx) => batch.nodes.remove(idx),
            None => {
                tracing::debug!(keyword, "root node missing from extraction, injecting");
                Node::new(canon_kw.clone(), EntityKind::Concept)
                    .with_layer(layer::SEMANTIC)
                    .with_property("id", canon_kw.as_str())
                    .with_property("summary", format!("Central concept of {}", keyword))
            }
        };

        root.mark_root();
        if root.properties.get("name").and_then(|v| v.as_str()).is_none() {
            root.properties
                .insert("name".to_string(), PropertyValue::from(keyword));
        }
        batch.nodes.insert(0, root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> RawGraphPayload {
        serde_json::from_str(json).unwrap()
    }

    fn normalize(json: &str, keyword: &str) -> Batch {
        Normalizer::default().normalize(payload(json), keyword)
    }

    // === Scenario: canonical ids are case/whitespace-insensitive ===
    #[test]
    fn canonical_id_collapses_case_and_whitespace() {
        assert_eq!(canonical_id("Samsung Electronics"), "samsung_electronics");
        assert_eq!(canonical_id("  samsung_electronics  "), "samsung_electronics");
        assert_eq!(canonical_id("A   B\tC"), "a_b_c");
    }

    #[test]
    fn duplicate_canonical_ids_merge_within_batch() {
        let batch = normalize(
            r#"{
                "nodes": [
                    {"id": "Samsung Electronics", "label": "Organization", "properties": {"founded": 1969}},
                    {"id": "samsung_electronics", "label": "Organization", "properties": {"hq": "Suwon"}}
                ],
                "relationships": []
            }"#,
            "samsung",
        );
        // injected root + one merged organization
        assert_eq!(batch.node_count(), 2);
        let org = batch.get_node(&"samsung_electronics".into()).unwrap();
        assert!(org.properties.contains_key("founded"));
        assert!(org.properties.contains_key("hq"));
        // display casing from the first sighting survives
        assert_eq!(org.display_name(), Some("Samsung Electronics"));
    }

    // === Scenario: display casing preserved, machine id canonical ===
    #[test]
    fn display_name_defaults_to_original_identifier() {
        let batch = normalize(
            r#"{"nodes": [{"id": "Superman", "label": "Concept"}], "relationships": []}"#,
            "superman",
        );
        let root = batch.root().unwrap();
        assert_eq!(root.id.as_str(), "superman");
        assert_eq!(root.display_name(), Some("Superman"));
    }

    // === Scenario: predicate normalization with fallback ===
    #[test]
    fn predicates_normalize_to_upper_snake() {
        assert_eq!(normalize_predicate("works at"), "WORKS_AT");
        assert_eq!(normalize_predicate(" part-of "), "PART_OF");

        let batch = normalize(
            r#"{
                "nodes": [{"id": "a", "label": "Person"}, {"id": "b", "label": "Organization"}],
                "relationships": [
                    {"source": "a", "target": "b", "type": "works at"},
                    {"source": "a", "target": "b"}
                ]
            }"#,
            "a",
        );
        assert_eq!(batch.edges[0].predicate, "WORKS_AT");
        assert_eq!(batch.edges[1].predicate, predicate::RELATED);
    }

    // === Scenario: dangling edges dropped, batch proceeds ===
    #[test]
    fn edges_with_missing_endpoints_are_dropped() {
        let batch = normalize(
            r#"{
                "nodes": [{"id": "a", "label": "Person"}],
                "relationships": [
                    {"source": "a", "type": "KNOWS"},
                    {"target": "a", "type": "KNOWS"},
                    {"source": "", "target": "a", "type": "KNOWS"}
                ]
            }"#,
            "a",
        );
        assert!(batch.edges.is_empty());
        assert_eq!(batch.node_count(), 1);
    }

    #[test]
    fn edge_endpoints_fall_back_to_direct_canonicalization() {
        // "Old Friend" is not a node in this batch — it may already exist in
        // the store, so the edge is kept with a canonicalized endpoint
        let batch = normalize(
            r#"{
                "nodes": [{"id": "a", "label": "Person"}],
                "relationships": [{"source": "a", "target": "Old Friend", "type": "KNOWS"}]
            }"#,
            "a",
        );
        assert_eq!(batch.edges.len(), 1);
        assert_eq!(batch.edges[0].target.as_str(), "old_friend");
    }

    #[test]
    fn nodes_without_labels_are_dropped() {
        let batch = normalize(
            r#"{
                "nodes": [{"id": "a"}, {"id": "b", "label": "  "}, {"id": "c", "label": "Person"}],
                "relationships": []
            }"#,
            "c",
        );
        assert_eq!(batch.node_count(), 1);
        assert_eq!(batch.nodes[0].id.as_str(), "c");
    }

    // === Scenario: root guarantee — existing node promoted ===
    #[test]
    fn existing_keyword_node_is_promoted_to_root() {
        let batch = normalize(
            r#"{
                "nodes": [
                    {"id": "x", "label": "Person", "properties": {"name": "X"}},
                    {"id": "Jazz Music", "label": "Concept"}
                ],
                "relationships": []
            }"#,
            "jazz music",
        );
        assert_eq!(batch.node_count(), 2);
        let root = &batch.nodes[0];
        assert_eq!(root.id.as_str(), "jazz_music");
        assert!(root.is_root());
        assert_eq!(batch.root().unwrap().id.as_str(), "jazz_music");
    }

    #[test]
    fn keyword_matches_display_name_case_insensitively() {
        let batch = normalize(
            r#"{
                "nodes": [{"id": "node_7", "label": "Concept", "properties": {"name": "Jazz"}}],
                "relationships": []
            }"#,
            "JAZZ",
        );
        // matched by display name, not id — no injection
        assert_eq!(batch.node_count(), 1);
        assert!(batch.nodes[0].is_root());
    }

    // === Scenario: root guarantee — synthetic injection ===
    #[test]
    fn missing_root_is_injected_at_front() {
        let batch = normalize(
            r#"{
                "nodes": [{"id": "a", "label": "Person", "properties": {"name": "A"}}],
                "relationships": []
            }"#,
            "Quantum Computing",
        );
        assert_eq!(batch.node_count(), 2);
        let root = &batch.nodes[0];
        assert_eq!(root.id.as_str(), "quantum_computing");
        assert_eq!(root.kind, EntityKind::Concept);
        assert_eq!(root.layer.as_deref(), Some(layer::SEMANTIC));
        assert!(root.is_root());
        assert_eq!(root.display_name(), Some("Quantum Computing"));
        // carries its canonical id as a property so re-ingestion merges
        assert_eq!(
            root.properties.get("id").and_then(|v| v.as_str()),
            Some("quantum_computing")
        );
    }

    // === Scenario: empty payload normalizes to empty batch ===
    #[test]
    fn empty_payload_yields_empty_batch() {
        let batch = normalize(r#"{"nodes": [], "relationships": []}"#, "anything");
        assert!(batch.is_empty());
        assert!(batch.root().is_none());

        let garbage = Normalizer::default()
            .normalize(RawGraphPayload::from_json_lossy("not json"), "anything");
        assert!(garbage.is_empty());
    }

    // === Scenario: banned-script filter ===
    #[test]
    fn banned_script_nodes_are_stripped_with_their_edges() {
        let normalizer =
            Normalizer::new(NormalizerConfig::new().with_banned_script(Script::Hangul));
        let batch = normalizer.normalize(
            payload(
                r#"{
                    "nodes": [
                        {"id": "seoul", "label": "Concept", "properties": {"name": "서울"}},
                        {"id": "jazz", "label": "Concept", "properties": {"name": "Jazz"}}
                    ],
                    "relationships": [{"source": "jazz", "target": "seoul", "type": "RELATED"}]
                }"#,
            ),
            "jazz",
        );
        assert_eq!(batch.node_count(), 1);
        assert_eq!(batch.nodes[0].id.as_str(), "jazz");
        assert!(batch.edges.is_empty());
    }

    #[test]
    fn script_filter_inert_when_keyword_uses_banned_script() {
        let normalizer =
            Normalizer::new(NormalizerConfig::new().with_banned_script(Script::Hangul));
        let batch = normalizer.normalize(
            payload(
                r#"{"nodes": [{"id": "seoul", "label": "Concept", "properties": {"name": "서울"}}], "relationships": []}"#,
            ),
            "서울",
        );
        assert_eq!(batch.node_count(), 1);
    }

    #[test]
    fn script_filter_off_by_default() {
        let batch = normalize(
            r#"{"nodes": [{"id": "seoul", "label": "Concept", "properties": {"name": "서울"}}], "relationships": []}"#,
            "jazz",
        );
        // 서울 survives, plus injected root
        assert_eq!(batch.node_count(), 2);
    }
}
