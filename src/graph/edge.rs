//! Undirected relationship edges

use super::property::{PropertyMap, PropertyValue};
use super::types::{EdgeId, EdgeKind, NodeId};
use serde::{Deserialize, Serialize};

/// Canonical edge key: `min(a, b) + "_" + record + "_" + max(a, b)`.
///
/// Swapping the endpoints gives the same key, a different record does not.
pub fn edge_key(a: &str, record: &str, b: &str) -> String {
    let (low, high) = if b < a { (b, a) } else { (a, b) };
    format!("{}_{}_{}", low, record, high)
}

/// An undirected edge between two nodes of the same network.
///
/// `source` and `target` are the endpoints in key order; they carry no
/// direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub key: String,
    pub kind: EdgeKind,
    pub source: NodeId,
    pub target: NodeId,
    pub payload: PropertyMap,
}

impl Edge {
    pub fn new(
        id: EdgeId,
        key: impl Into<String>,
        kind: EdgeKind,
        source: NodeId,
        target: NodeId,
        payload: PropertyMap,
    ) -> Self {
        Edge {
            id,
            key: key.into(),
            kind,
            source,
            target,
            payload,
        }
    }

    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.payload.get(key)
    }
}
