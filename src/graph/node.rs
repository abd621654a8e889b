//! Participant nodes
//!
//! A node is identified by its string key, which never changes once the node
//! exists. Its adjacency lists every incident edge together with the node at
//! the other end, in the order the edges were added.

use super::property::{PropertyMap, PropertyValue};
use super::types::{EdgeId, NodeId, NodeKind};
use serde::{Deserialize, Serialize};

/// One incident edge and the node it leads to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjacency {
    pub edge: EdgeId,
    pub neighbor: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Handle inside the owning network
    pub id: NodeId,

    /// Identity key (e.g. an atomized organisation name)
    pub key: String,

    pub kind: NodeKind,

    /// Incident edges in insertion order
    pub adjacency: Vec<Adjacency>,

    /// Attributes, replaceable through the declaration's merge rule
    pub payload: PropertyMap,
}

impl Node {
    pub fn new(id: NodeId, key: impl Into<String>, kind: NodeKind, payload: PropertyMap) -> Self {
        Node {
            id,
            key: key.into(),
            kind,
            adjacency: Vec::new(),
            payload,
        }
    }

    pub fn degree(&self) -> usize {
        self.adjacency.len()
    }

    /// The only edge is the one it was reached through
    pub fn is_dead_end(&self) -> bool {
        self.adjacency.len() == 1
    }

    pub fn neighbors(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.iter().map(|adj| adj.neighbor)
    }

    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.payload.get(key)
    }

    pub(crate) fn link(&mut self, edge: EdgeId, neighbor: NodeId) {
        self.adjacency.push(Adjacency { edge, neighbor });
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}
