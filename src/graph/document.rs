use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// On-disk node-link layout of a knowledge graph.
///
/// Attributes other than the node `id` and the link `source`/`target` are
/// kept in flattened maps so they round-trip untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphDocument {
    #[serde(default = "default_directed")]
    pub directed: bool,
    #[serde(default)]
    pub multigraph: bool,
    #[serde(default)]
    pub graph: Map<String, Value>,
    pub nodes: Vec<NodeRecord>,
    #[serde(default, alias = "edges")]
    pub links: Vec<LinkRecord>,
}

fn default_directed() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeRecord {
    pub id: Value,
    #[serde(flatten)]
    pub attrs: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkRecord {
    pub source: Value,
    pub target: Value,
    #[serde(flatten)]
    pub attrs: Map<String, Value>,
}

/// Lookup key for a node id: its JSON text, so `42` and `"42"` stay distinct.
pub fn node_key(id: &Value) -> String {
    id.to_string()
}
