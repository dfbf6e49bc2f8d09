//! Read-side enrichment properties over retrieved subgraphs

use ontograph::{
    AnalyticsConfig, OntographApi, OpenStore, RawGraphPayload, SqliteStore, ViewGraph, ViewLink,
    ViewNode,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;

fn api() -> OntographApi<SqliteStore> {
    OntographApi::new(Arc::new(SqliteStore::open_in_memory().unwrap()))
}

fn node(id: &str) -> ViewNode {
    ViewNode {
        id: id.to_string(),
        label: "Concept".to_string(),
        name: id.to_string(),
        val: 1.0,
        layer: None,
        centrality: None,
        group: None,
        is_root: None,
        properties: HashMap::new(),
    }
}

fn link(s: &str, t: &str) -> ViewLink {
    ViewLink {
        source: s.to_string(),
        target: t.to_string(),
        name: "RELATED".to_string(),
    }
}

/// A reproducible random graph: n nodes, each edge kept with probability p
fn random_graph(n: usize, p: f64, seed: u64) -> ViewGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let ids: Vec<String> = (0..n).map(|i| format!("n{}", i)).collect();
    let mut graph = ViewGraph::default();
    for id in &ids {
        graph.nodes.push(node(id));
    }
    for i in 0..n {
        for j in (i + 1)..n {
            if rng.gen_bool(p) {
                graph.links.push(link(&ids[i], &ids[j]));
            }
        }
    }
    graph
}

// === Property: root dominance through the retrieval path ===
#[test]
fn retrieved_root_is_visually_dominant() {
    let api = api();
    api.ingest(
        RawGraphPayload::from_json_lossy(
            r#"{
                "nodes": [
                    {"id": "jazz", "label": "Concept", "properties": {"id": "jazz", "name": "Jazz"}},
                    {"id": "miles", "label": "Person", "properties": {"name": "Miles Davis"}},
                    {"id": "bill", "label": "Person", "properties": {"name": "Bill Evans"}}
                ],
                "relationships": [
                    {"source": "miles", "target": "jazz", "type": "PERFORMED"},
                    {"source": "bill", "target": "miles", "type": "KNOWS"}
                ]
            }"#,
        ),
        "jazz",
        None,
    )
    .unwrap();

    let view = api.keyword_view("jazz").unwrap();
    let config = AnalyticsConfig::default();

    let root = view
        .nodes
        .iter()
        .find(|n| n.is_root == Some(true))
        .expect("a root must resolve for the driving keyword");
    assert_eq!(root.val, config.root_size);
    assert_eq!(root.centrality, Some(1.0));
}

// === Property: size and centrality bounds on arbitrary topology ===
#[test]
fn bounds_hold_on_random_graphs() {
    let config = AnalyticsConfig::default();

    for seed in 0..5 {
        let mut graph = random_graph(40, 0.08, seed);
        ontograph::analytics::enrich(&mut graph, None, &config);

        for node in &graph.nodes {
            let centrality = node.centrality.expect("every node gets a score");
            assert!(
                (0.0..=1.0).contains(&centrality),
                "centrality {} out of bounds",
                centrality
            );
            assert!(
                node.val >= config.base_size - 1e-9 && node.val <= config.max_size() + 1e-9,
                "size {} out of bounds",
                node.val
            );
            let group = node.group.expect("every node gets a group");
            assert!(group >= 1);
        }
    }
}

// === Property: fallback centrality never fails past the analytics boundary ===
#[test]
fn forced_pagerank_failure_still_sizes_every_node() {
    // zero iteration budget guarantees non-convergence on any real graph
    let config = AnalyticsConfig::new().with_max_iterations(0);
    let mut graph = random_graph(25, 0.1, 7);
    ontograph::analytics::enrich(&mut graph, None, &config);

    for node in &graph.nodes {
        assert!(node.centrality.is_some());
        assert!(node.val >= config.base_size - 1e-9);
    }
}

// === Property: community indices are 1-based and cover all nodes ===
#[test]
fn communities_partition_the_view() {
    let mut graph = ViewGraph::default();
    // two cliques bridged by one edge
    for id in ["a1", "a2", "a3", "b1", "b2", "b3"] {
        graph.nodes.push(node(id));
    }
    for (s, t) in [
        ("a1", "a2"),
        ("a1", "a3"),
        ("a2", "a3"),
        ("b1", "b2"),
        ("b1", "b3"),
        ("b2", "b3"),
        ("a3", "b1"),
    ] {
        graph.links.push(link(s, t));
    }

    ontograph::analytics::enrich(&mut graph, None, &AnalyticsConfig::default());

    let groups: Vec<usize> = graph.nodes.iter().map(|n| n.group.unwrap()).collect();
    assert!(groups.iter().all(|&g| g >= 1));
    // the cliques separate
    assert_eq!(groups[0], groups[1]);
    assert_eq!(groups[3], groups[4]);
    assert_ne!(groups[0], groups[3]);
}

// === Scenario: focused view hides disconnected fragments ===
#[test]
fn focused_view_drops_unrelated_fragments() {
    let api = api();
    // main jazz cluster
    api.ingest(
        RawGraphPayload::from_json_lossy(
            r#"{
                "nodes": [
                    {"id": "jazz", "label": "Concept", "properties": {"id": "jazz", "name": "Jazz"}},
                    {"id": "jazz_piano", "label": "Concept", "properties": {"id": "jazz_piano", "name": "Jazz Piano"}}
                ],
                "relationships": [{"source": "jazz_piano", "target": "jazz", "type": "PART_OF"}]
            }"#,
        ),
        "jazz",
        None,
    )
    .unwrap();
    // unrelated node that also matches the keyword by name
    api.ingest(
        RawGraphPayload::from_json_lossy(
            r#"{"nodes": [{"id": "jazz_hands", "label": "Concept", "properties": {"id": "jazz_hands", "name": "Jazz Hands"}}], "relationships": []}"#,
        ),
        "jazz hands",
        None,
    )
    .unwrap();

    let broad = api.keyword_view("jazz").unwrap();
    let focused = api.focused_view("jazz").unwrap();

    assert!(focused.nodes.len() < broad.nodes.len());
    assert!(focused.nodes.iter().any(|n| n.name == "Jazz"));
    assert!(focused.nodes.iter().all(|n| n.name != "Jazz Hands"));
    // the surviving component is still enriched
    assert!(focused.nodes.iter().all(|n| n.centrality.is_some()));
}

// === Scenario: enrichment leaves the store untouched ===
#[test]
fn enrichment_is_read_only() {
    let api = api();
    api.ingest(
        RawGraphPayload::from_json_lossy(
            r#"{"nodes": [{"id": "jazz", "label": "Concept", "properties": {"id": "jazz", "name": "Jazz"}}], "relationships": []}"#,
        ),
        "jazz",
        None,
    )
    .unwrap();

    let before = api.counts().unwrap();
    let _ = api.keyword_view("jazz").unwrap();
    let _ = api.focused_view("jazz").unwrap();
    let _ = api.full_view(None).unwrap();
    assert_eq!(api.counts().unwrap(), before);
}
