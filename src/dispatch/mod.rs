//! Record dispatch
//!
//! A dispatcher turns one ingested record into the node and edge
//! declarations the network applies. Identity resolution and within-record
//! duplicate elimination happen here, before anything reaches the network.

pub mod filing;

use crate::graph::{EdgeDeclaration, NodeDeclaration};
use tracing::Span;

pub use filing::{atomize, Agent, Filing, FilingEdge, IndividualName};

/// One record's worth of declarations
pub trait Dispatcher {
    type Node: NodeDeclaration;
    type Edge: EdgeDeclaration;

    /// Nodes and edges for this record, duplicates already removed.
    ///
    /// Log lines belong under `span`, the span of the receiving network.
    fn dispatch(&self, span: &Span) -> (Vec<Self::Node>, Vec<Self::Edge>);
}

impl<D: Dispatcher + ?Sized> Dispatcher for &D {
    type Node = D::Node;
    type Edge = D::Edge;

    fn dispatch(&self, span: &Span) -> (Vec<Self::Node>, Vec<Self::Edge>) {
        (**self).dispatch(span)
    }
}
