//! Root resolution — which node anchors the view
//!
//! An ordered strategy list, evaluated short-circuit:
//! (a) a node explicitly flagged `isRoot`;
//! (b) exact id match against the normalized hint keyword;
//! (c) case-insensitive substring containment between the hint and a node's
//!     display name, topic, or id — in either direction.
//!
//! This is a best-effort heuristic, not a guarantee: a broad keyword can
//! resolve to a fuzzy neighbor. Callers treat the result as advisory.

use crate::pipeline::canonical_id;
use crate::view::ViewNode;

/// Resolve the root node's position, if any
pub fn resolve_root(nodes: &[ViewNode], hint: Option<&str>) -> Option<usize> {
    // (a) explicit flag wins
    if let Some(idx) = nodes.iter().position(|n| n.is_root == Some(true)) {
        return Some(idx);
    }

    let hint = hint?.trim();
    if hint.is_empty() {
        return None;
    }

    // (b) exact match on the canonicalized hint
    let canon = canonical_id(hint);
    if let Some(idx) = nodes.iter().position(|n| n.id == canon) {
        return Some(idx);
    }

    // (c) substring containment, either direction
    let hint_lower = hint.to_lowercase();
    nodes.iter().position(|n| {
        candidate_texts(n).any(|text| {
            let text_lower = text.to_lowercase();
            text_lower.contains(&hint_lower) || hint_lower.contains(&text_lower)
        })
    })
}

/// The node texts the fuzzy branch matches against: name, topic, id
fn candidate_texts(node: &ViewNode) -> impl Iterator<Item = &str> {
    [
        Some(node.name.as_str()),
        node.properties.get("topic").and_then(|v| v.as_str()),
        Some(node.id.as_str()),
    ]
    .into_iter()
    .flatten()
    .filter(|t| !t.trim().is_empty())
}
