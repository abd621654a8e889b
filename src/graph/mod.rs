//! Relationship graph model
//!
//! This module implements the undirected participant network:
//! - Nodes keyed by participant identity, Emitter or Receiver
//! - Edges keyed by endpoint pair plus originating record
//! - Declarations through which producers add nodes and edges
//! - Index-addressed arenas so adjacency never holds references

pub mod declaration;
pub mod edge;
pub mod network;
pub mod node;
pub mod property;
pub mod types;

// Re-export main types
pub use declaration::{EdgeDeclaration, NodeDeclaration, SimpleEdge, SimpleNode};
pub use edge::{edge_key, Edge};
pub use network::{Added, CompareReport, GraphError, GraphResult, IngestStats, Network, NetworkSummary};
pub use node::{Adjacency, Node};
pub use property::{fill_gaps, PropertyMap, PropertyValue};
pub use types::{EdgeId, EdgeKind, NodeId, NodeKind};
