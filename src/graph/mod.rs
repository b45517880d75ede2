//! Knowledge-graph loading, saving and node timestamp backfill.
//!
//! The graph lives in a petgraph [`DiGraph`] whose node and edge weights are
//! the records read from disk, so writing it back reproduces everything the
//! fixer did not touch.

pub mod document;
pub mod fix;
pub mod timestamp;

use anyhow::{bail, Context, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde_json::{Map, Value};
use std::{collections::HashMap, fs, path::Path};
use tracing::info;

pub use document::{node_key, GraphDocument, LinkRecord, NodeRecord};
pub use fix::{fix_timestamps, run, FixReport};

pub const TIMESTAMP: &str = "timestamp";

/// Directed knowledge graph held entirely in memory for one fixer run.
#[derive(Debug, Clone)]
pub struct KnowledgeGraph {
    directed: bool,
    multigraph: bool,
    attrs: Map<String, Value>,
    inner: DiGraph<NodeRecord, LinkRecord>,
}

impl KnowledgeGraph {
    /// Build the graph. Duplicate node ids and links to unknown nodes are rejected.
    pub fn from_document(doc: GraphDocument) -> Result<Self> {
        let mut inner = DiGraph::with_capacity(doc.nodes.len(), doc.links.len());
        let mut index: HashMap<String, NodeIndex> = HashMap::with_capacity(doc.nodes.len());

        for node in doc.nodes {
            let key = node_key(&node.id);
            if index.contains_key(&key) {
                bail!("duplicate node id {}", node.id);
            }
            let idx = inner.add_node(node);
            index.insert(key, idx);
        }

        for (i, link) in doc.links.into_iter().enumerate() {
            let Some(&src) = index.get(&node_key(&link.source)) else {
                bail!("link #{} has unknown source {}", i, link.source);
            };
            let Some(&dst) = index.get(&node_key(&link.target)) else {
                bail!("link #{} has unknown target {}", i, link.target);
            };
            inner.add_edge(src, dst, link);
        }

        Ok(Self {
            directed: doc.directed,
            multigraph: doc.multigraph,
            attrs: doc.graph,
            inner,
        })
    }

    /// Nodes and links come out in the order they were loaded.
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            directed: self.directed,
            multigraph: self.multigraph,
            graph: self.attrs.clone(),
            nodes: self
                .inner
                .node_indices()
                .map(|idx| self.inner[idx].clone())
                .collect(),
            links: self
                .inner
                .edge_indices()
                .map(|idx| self.inner[idx].clone())
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read graph {}", path.display()))?;
        let doc: GraphDocument = serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse graph {}", path.display()))?;
        let graph = Self::from_document(doc)
            .with_context(|| format!("invalid graph in {}", path.display()))?;
        info!(
            "Loaded graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Pretty JSON bytes of the whole graph.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(&self.to_document()).context("serializing graph")
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        self.inner.node_indices()
    }

    pub fn node(&self, idx: NodeIndex) -> &NodeRecord {
        &self.inner[idx]
    }

    pub fn node_timestamp(&self, idx: NodeIndex) -> Option<&Value> {
        self.inner[idx].attrs.get(TIMESTAMP)
    }

    pub fn set_node_timestamp(&mut self, idx: NodeIndex, value: Value) {
        self.inner[idx].attrs.insert(TIMESTAMP.to_string(), value);
    }

    /// Raw `timestamp` attribute of every edge entering (`Incoming`) or
    /// leaving (`Outgoing`) `idx`. Absent attributes yield `None`.
    pub fn edge_timestamps(
        &self,
        idx: NodeIndex,
        dir: Direction,
    ) -> impl Iterator<Item = Option<&Value>> + '_ {
        self.inner
            .edges_directed(idx, dir)
            .map(|e| e.weight().attrs.get(TIMESTAMP))
    }

    #[cfg(test)]
    pub fn find(&self, id: &Value) -> Option<NodeIndex> {
        let key = node_key(id);
        self.inner
            .node_indices()
            .find(|&idx| node_key(&self.inner[idx].id) == key)
    }
}

/// Human-readable node id for log lines.
pub fn node_label(node: &NodeRecord) -> String {
    match &node.id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
