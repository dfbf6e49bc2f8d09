//! SQLite storage backend — the transactional batch ingestor
//!
//! A property graph over two tables: labeled nodes with JSON property bags
//! and typed directed edges, unique per `(source, target, predicate)`.
//! Batch merges run as a single transaction in two passes: all nodes first
//! (find-or-create by merge key, building a batch-local id → row id map),
//! then all edges resolved through that map. The map lives only in memory
//! for the duration of the transaction — nothing transient is ever written
//! to the store.

use super::traits::{
    GraphStore, IngestReceipt, OpenStore, StorageResult, StoredEdge, StoredNode, Subgraph,
};
use crate::graph::{Batch, Edge, Node, NodeId, Properties};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed property-graph store
///
/// Uses a single database file with tables for nodes and edges.
/// Thread-safe via an internal mutex on the connection; WAL mode keeps
/// concurrent readers unblocked during writes.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Nodes: primary label + optional secondary layer label,
            -- merge key split into (property, value) for keyed upserts
            CREATE TABLE IF NOT EXISTS nodes (
                id INTEGER PRIMARY KEY,
                label TEXT NOT NULL,
                layer TEXT,
                merge_prop TEXT,
                merge_value TEXT,
                properties_json TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            -- One store node per (label, key property, key value)
            CREATE UNIQUE INDEX IF NOT EXISTS idx_nodes_merge_key
                ON nodes(label, merge_prop, merge_value)
                WHERE merge_prop IS NOT NULL;

            CREATE INDEX IF NOT EXISTS idx_nodes_label ON nodes(label);

            -- Edges: one per (source, target, predicate)
            CREATE TABLE IF NOT EXISTS edges (
                id INTEGER PRIMARY KEY,
                source_id INTEGER NOT NULL,
                target_id INTEGER NOT NULL,
                predicate TEXT NOT NULL,
                properties_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE(source_id, target_id, predicate),
                FOREIGN KEY (source_id) REFERENCES nodes(id) ON DELETE CASCADE,
                FOREIGN KEY (target_id) REFERENCES nodes(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_id);
            CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_id);

            PRAGMA foreign_keys = ON;

            -- WAL keeps concurrent reads unblocked during ingestion
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    /// Find-or-create one node inside the transaction, returning its row id.
    ///
    /// Keyed nodes (merge key present) are matched on
    /// `(label, key property, key value)` and overlaid last-write-wins per
    /// property; the layer label is only ever added, never removed. Unkeyed
    /// nodes are always created fresh.
    fn upsert_node(
        conn: &Connection,
        node: &Node,
        receipt: &mut IngestReceipt,
    ) -> StorageResult<i64> {
        let label = node.kind.as_label();
        let now = chrono::Utc::now().to_rfc3339();

        if let Some((prop, value)) = node.merge_key() {
            let existing: Option<(i64, String, Option<String>)> = conn
                .query_row(
                    "SELECT id, properties_json, layer FROM nodes
                     WHERE label = ?1 AND merge_prop = ?2 AND merge_value = ?3",
                    params![label, prop, value],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            if let Some((row_id, props_json, layer)) = existing {
                let mut properties: Properties = serde_json::from_str(&props_json)?;
                for (k, v) in &node.properties {
                    properties.insert(k.clone(), v.clone());
                }
                let layer = node.layer.clone().or(layer);
                conn.execute(
                    "UPDATE nodes SET properties_json = ?1, layer = ?2 WHERE id = ?3",
                    params![serde_json::to_string(&properties)?, layer, row_id],
                )?;
                receipt.nodes_merged += 1;
                return Ok(row_id);
            }

            conn.execute(
                "INSERT INTO nodes (label, layer, merge_prop, merge_value, properties_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    label,
                    node.layer,
                    prop,
                    value,
                    serde_json::to_string(&node.properties)?,
                    now
                ],
            )?;
            receipt.nodes_created += 1;
            return Ok(conn.last_insert_rowid());
        }

        // No natural key and no supplied id: always a new entity
        conn.execute(
            "INSERT INTO nodes (label, layer, properties_json, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![label, node.layer, serde_json::to_string(&node.properties)?, now],
        )?;
        receipt.nodes_created += 1;
        Ok(conn.last_insert_rowid())
    }

    /// Resolve an edge endpoint that is not part of the current batch:
    /// a store node whose `id` property or canonicalized merge value equals
    /// the canonical id. Exact equality only — a miss drops the edge rather
    /// than risking a mis-link.
    fn find_by_canonical(conn: &Connection, canonical: &str) -> StorageResult<Option<i64>> {
        let row = conn
            .query_row(
                "SELECT id FROM nodes
                 WHERE json_extract(properties_json, '$.id') = ?1
                    OR replace(lower(trim(merge_value)), ' ', '_') = ?1
                 LIMIT 1",
                params![canonical],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(row)
    }

    /// Merge-create one edge between resolved endpoints, overlaying
    /// properties on conflict.
    fn merge_edge(conn: &Connection, source: i64, target: i64, edge: &Edge) -> StorageResult<()> {
        let existing: Option<(i64, String)> = conn
            .query_row(
                "SELECT id, properties_json FROM edges
                 WHERE source_id = ?1 AND target_id = ?2 AND predicate = ?3",
                params![source, target, edge.predicate],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match existing {
            Some((row_id, props_json)) => {
                let mut properties: Properties = serde_json::from_str(&props_json)?;
                for (k, v) in &edge.properties {
                    properties.insert(k.clone(), v.clone());
                }
                conn.execute(
                    "UPDATE edges SET properties_json = ?1 WHERE id = ?2",
                    params![serde_json::to_string(&properties)?, row_id],
                )?;
            }
            None => {
                conn.execute(
                    "INSERT INTO edges (source_id, target_id, predicate, properties_json, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        source,
                        target,
                        edge.predicate,
                        serde_json::to_string(&edge.properties)?,
                        chrono::Utc::now().to_rfc3339()
                    ],
                )?;
            }
        }
        Ok(())
    }

    fn row_to_node(
        row_id: i64,
        label: String,
        layer: Option<String>,
        properties_json: String,
    ) -> StorageResult<StoredNode> {
        Ok(StoredNode {
            row_id,
            label,
            layer,
            properties: serde_json::from_str(&properties_json)?,
        })
    }

    /// Load all edges whose endpoints both lie in `node_ids`
    fn edges_within(
        conn: &Connection,
        node_ids: &HashSet<i64>,
    ) -> StorageResult<Vec<StoredEdge>> {
        if node_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; node_ids.len()].join(",");
        let sql = format!(
            "SELECT source_id, target_id, predicate, properties_json FROM edges
             WHERE source_id IN ({0}) AND target_id IN ({0})",
            placeholders
        );

        let ids: Vec<i64> = node_ids.iter().copied().collect();
        let mut params_vec: Vec<&dyn rusqlite::ToSql> = Vec::new();
        for id in &ids {
            params_vec.push(id);
        }
        for id in &ids {
            params_vec.push(id);
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_vec.as_slice(), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut edges = Vec::new();
        for row in rows {
            let (source, target, predicate, props_json) = row?;
            edges.push(StoredEdge {
                source,
                target,
                predicate,
                properties: serde_json::from_str(&props_json)?,
            });
        }
        Ok(edges)
    }

    /// Load specific node rows by id
    fn load_nodes(conn: &Connection, node_ids: &HashSet<i64>) -> StorageResult<Vec<StoredNode>> {
        let mut nodes = Vec::new();
        for id in node_ids {
            let row: Option<(i64, String, Option<String>, String)> = conn
                .query_row(
                    "SELECT id, label, layer, properties_json FROM nodes WHERE id = ?1",
                    params![id],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                )
                .optional()?;
            if let Some((row_id, label, layer, props)) = row {
                nodes.push(Self::row_to_node(row_id, label, layer, props)?);
            }
        }
        Ok(nodes)
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl GraphStore for SqliteStore {
    fn merge_batch(&self, batch: &Batch) -> StorageResult<IngestReceipt> {
        let mut receipt = IngestReceipt::default();
        if batch.is_empty() {
            return Ok(receipt);
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        // Pass 1: upsert nodes, mapping batch-local ids to store row ids
        let mut handles: HashMap<NodeId, i64> = HashMap::new();
        for node in &batch.nodes {
            let row_id = Self::upsert_node(&tx, node, &mut receipt)?;
            handles.insert(node.id.clone(), row_id);
        }

        // Pass 2: merge edges through the handle map, falling back to a
        // store lookup by canonical id for endpoints defined in earlier
        // batches
        for edge in &batch.edges {
            let source = match handles.get(&edge.source) {
                Some(&id) => Some(id),
                None => Self::find_by_canonical(&tx, edge.source.as_str())?,
            };
            let target = match handles.get(&edge.target) {
                Some(&id) => Some(id),
                None => Self::find_by_canonical(&tx, edge.target.as_str())?,
            };

            let (Some(source), Some(target)) = (source, target) else {
                tracing::warn!(
                    source = %edge.source,
                    target = %edge.target,
                    predicate = %edge.predicate,
                    "edge dropped at ingestion: unresolvable endpoint"
                );
                receipt.edges_dropped += 1;
                continue;
            };

            Self::merge_edge(&tx, source, target, edge)?;
            receipt.edges_written += 1;
        }

        tx.commit()?;

        tracing::info!(
            batch = %batch.id,
            created = receipt.nodes_created,
            merged = receipt.nodes_merged,
            edges = receipt.edges_written,
            dropped = receipt.edges_dropped,
            "batch ingested"
        );
        Ok(receipt)
    }

    fn keyword_subgraph(&self, keyword: &str, limit: usize) -> StorageResult<Subgraph> {
        let conn = self.conn.lock().unwrap();

        // Seed nodes: case-insensitive containment over name/topic/id
        let mut stmt = conn.prepare(
            "SELECT id, label, layer, properties_json FROM nodes
             WHERE instr(lower(coalesce(json_extract(properties_json, '$.name'), '')), lower(?1)) > 0
                OR instr(lower(coalesce(json_extract(properties_json, '$.topic'), '')), lower(?1)) > 0
                OR instr(lower(coalesce(json_extract(properties_json, '$.id'), '')), lower(?1)) > 0
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![keyword, limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut nodes = Vec::new();
        let mut seed_ids = HashSet::new();
        for row in rows {
            let (row_id, label, layer, props) = row?;
            seed_ids.insert(row_id);
            nodes.push(Self::row_to_node(row_id, label, layer, props)?);
        }
        if seed_ids.is_empty() {
            return Ok(Subgraph::default());
        }

        // 1-hop neighborhood: edges incident to any seed
        let placeholders = vec!["?"; seed_ids.len()].join(",");
        let sql = format!(
            "SELECT source_id, target_id, predicate, properties_json FROM edges
             WHERE source_id IN ({0}) OR target_id IN ({0})",
            placeholders
        );
        let ids: Vec<i64> = seed_ids.iter().copied().collect();
        let mut params_vec: Vec<&dyn rusqlite::ToSql> = Vec::new();
        for id in &ids {
            params_vec.push(id);
        }
        for id in &ids {
            params_vec.push(id);
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_vec.as_slice(), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut edges = Vec::new();
        let mut neighbor_ids = HashSet::new();
        for row in rows {
            let (source, target, predicate, props_json) = row?;
            neighbor_ids.insert(source);
            neighbor_ids.insert(target);
            edges.push(StoredEdge {
                source,
                target,
                predicate,
                properties: serde_json::from_str(&props_json)?,
            });
        }

        let missing: HashSet<i64> = neighbor_ids.difference(&seed_ids).copied().collect();
        nodes.extend(Self::load_nodes(&conn, &missing)?);

        Ok(Subgraph { nodes, edges })
    }

    fn full_graph(&self, limit: usize, source: Option<&str>) -> StorageResult<Subgraph> {
        let conn = self.conn.lock().unwrap();

        let mut sql = String::from("SELECT id, label, layer, properties_json FROM nodes");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(src) = source {
            sql.push_str(" WHERE json_extract(properties_json, '$.source') = ?");
            params_vec.push(Box::new(src.to_string()));
        }
        sql.push_str(&format!(" LIMIT {}", limit));

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|b| b.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut nodes = Vec::new();
        let mut node_ids = HashSet::new();
        for row in rows {
            let (row_id, label, layer, props) = row?;
            node_ids.insert(row_id);
            nodes.push(Self::row_to_node(row_id, label, layer, props)?);
        }

        let edges = Self::edges_within(&conn, &node_ids)?;
        Ok(Subgraph { nodes, edges })
    }

    fn counts(&self) -> StorageResult<(u64, u64)> {
        let conn = self.conn.lock().unwrap();
        let nodes: i64 = conn.query_row("SELECT COUNT(*) FROM nodes", [], |r| r.get(0))?;
        let edges: i64 = conn.query_row("SELECT COUNT(*) FROM edges", [], |r| r.get(0))?;
        Ok((nodes as u64, edges as u64))
    }

    fn count_label(&self, label: &str) -> StorageResult<u64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM nodes WHERE label = ?1",
            params![label],
            |r| r.get(0),
        )?;
        Ok(count as u64)
    }

    fn wipe(&self) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM edges", [])?;
        conn.execute("DELETE FROM nodes", [])?;
        Ok(())
    }
}
