//! Declarations: what a producer asks the network to add
//!
//! Producers never build [`Node`](super::Node)s or [`Edge`](super::Edge)s
//! themselves. They hand over declarations and the network decides whether
//! to create, merge or reject.

use super::edge::edge_key;
use super::property::PropertyMap;
use super::types::{EdgeKind, NodeKind};

/// A request to add (or update) one node
pub trait NodeDeclaration {
    fn identifier(&self) -> String;

    fn kind(&self) -> NodeKind;

    fn payload(&self) -> PropertyMap;

    /// Payload to keep when the node already exists. Replaces by default.
    fn merge(&self, _old: &PropertyMap) -> PropertyMap {
        self.payload()
    }
}

/// A request to add one edge between two existing nodes
pub trait EdgeDeclaration {
    fn identifier(&self) -> String;

    fn kind(&self) -> EdgeKind;

    fn source_id(&self) -> String;

    fn target_id(&self) -> String;

    fn payload(&self) -> PropertyMap;
}

/// Plain node declaration with the default replace-on-merge rule
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleNode {
    pub key: String,
    pub kind: NodeKind,
    pub payload: PropertyMap,
}

impl SimpleNode {
    pub fn new(key: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            key: key.into(),
            kind,
            payload: PropertyMap::new(),
        }
    }

    pub fn with_payload(mut self, payload: PropertyMap) -> Self {
        self.payload = payload;
        self
    }
}

impl NodeDeclaration for SimpleNode {
    fn identifier(&self) -> String {
        self.key.clone()
    }

    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn payload(&self) -> PropertyMap {
        self.payload.clone()
    }
}

/// Plain edge declaration
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleEdge {
    pub key: String,
    pub kind: EdgeKind,
    pub source: String,
    pub target: String,
    pub payload: PropertyMap,
}

impl SimpleEdge {
    /// Edge between `a` and `b` keyed canonically for `record`
    pub fn between(a: impl Into<String>, b: impl Into<String>, record: &str, kind: EdgeKind) -> Self {
        let (a, b) = (a.into(), b.into());
        let key = edge_key(&a, record, &b);
        let (source, target) = if b < a { (b, a) } else { (a, b) };
        Self {
            key,
            kind,
            source,
            target,
            payload: PropertyMap::new(),
        }
    }

    pub fn with_payload(mut self, payload: PropertyMap) -> Self {
        self.payload = payload;
        self
    }
}

impl EdgeDeclaration for SimpleEdge {
    fn identifier(&self) -> String {
        self.key.clone()
    }

    fn kind(&self) -> EdgeKind {
        self.kind
    }

    fn source_id(&self) -> String {
        self.source.clone()
    }

    fn target_id(&self) -> String {
        self.target.clone()
    }

    fn payload(&self) -> PropertyMap {
        self.payload.clone()
    }
}
