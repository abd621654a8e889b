//! The in-memory relationship network
//!
//! Nodes and edges live in two insertion-ordered arenas keyed by their
//! identity strings; a node's or edge's position in its arena is its handle.
//! Nothing is ever removed, so handles stay valid for the life of the
//! network. Adjacency lists on the nodes are the traversal structure; the
//! edge arena exists for identity and deduplication.

use super::declaration::{EdgeDeclaration, NodeDeclaration};
use super::edge::Edge;
use super::node::Node;
use super::types::{EdgeId, EdgeKind, NodeId, NodeKind};
use crate::dispatch::Dispatcher;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::hash::BuildHasher;
use std::ops::AddAssign;
use tracing::{debug, error, info, info_span, warn, Span};

/// Errors that can occur during network operations
// `Display`/`Error`/`From` are written out by hand: thiserror's derive would
// treat the `source` field of `MissingEndpoint` as the error cause.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    NodeNotFound(String),

    MissingEndpoint {
        edge: String,
        source: String,
        target: String,
    },

    InvalidPattern(regex::Error),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::NodeNotFound(id) => write!(f, "Node {} not found", id),
            GraphError::MissingEndpoint { edge, source, target } => write!(
                f,
                "Edge {} rejected: endpoint missing (source {}, target {})",
                edge, source, target
            ),
            GraphError::InvalidPattern(err) => write!(f, "Invalid search pattern: {}", err),
        }
    }
}

impl std::error::Error for GraphError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GraphError::InvalidPattern(err) => Some(err),
            _ => None,
        }
    }
}

impl From<regex::Error> for GraphError {
    fn from(err: regex::Error) -> Self {
        GraphError::InvalidPattern(err)
    }
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Whether an add created something new or hit an existing identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Added<T> {
    Created(T),
    Existing(T),
}

impl<T: Copy> Added<T> {
    pub fn id(&self) -> T {
        match self {
            Added::Created(id) | Added::Existing(id) => *id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Added::Created(_))
    }
}

/// Counters accumulated while applying dispatcher output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub records: usize,
    pub nodes_created: usize,
    pub nodes_merged: usize,
    pub edges_created: usize,
    pub edges_duplicate: usize,
    pub edges_rejected: usize,
}

impl AddAssign for IngestStats {
    fn add_assign(&mut self, other: Self) {
        self.records += other.records;
        self.nodes_created += other.nodes_created;
        self.nodes_merged += other.nodes_merged;
        self.edges_created += other.edges_created;
        self.edges_duplicate += other.edges_duplicate;
        self.edges_rejected += other.edges_rejected;
    }
}

/// Differences found by [`Network::compare`], by identity key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompareReport {
    /// In this network, absent from the other
    pub missing_nodes: Vec<String>,
    /// In the other network, absent from this one
    pub extra_nodes: Vec<String>,
    /// Present in both with a different kind or payload
    pub node_mismatches: Vec<String>,
    pub missing_edges: Vec<String>,
    pub extra_edges: Vec<String>,
    /// Present in both with a different kind, payload or endpoints
    pub edge_mismatches: Vec<String>,
}

impl CompareReport {
    pub fn is_identical(&self) -> bool {
        self.issue_count() == 0
    }

    pub fn issue_count(&self) -> usize {
        self.missing_nodes.len()
            + self.extra_nodes.len()
            + self.node_mismatches.len()
            + self.missing_edges.len()
            + self.extra_edges.len()
            + self.edge_mismatches.len()
    }
}

/// Node and edge counts per kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkSummary {
    pub name: String,
    pub nodes: usize,
    pub edges: usize,
    pub emitters: usize,
    pub receivers: usize,
    pub er_edges: usize,
    pub ee_edges: usize,
    pub rr_edges: usize,
}

impl fmt::Display for NetworkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Network {}", self.name)?;
        writeln!(
            f,
            "{:>10} nodes ({} emitters, {} receivers)",
            self.nodes, self.emitters, self.receivers
        )?;
        write!(
            f,
            "{:>10} edges ({} ER, {} EE, {} RR)",
            self.edges, self.er_edges, self.ee_edges, self.rr_edges
        )
    }
}

/// Undirected network of filing participants
#[derive(Debug)]
pub struct Network {
    name: String,
    span: Span,
    nodes: IndexMap<String, Node>,
    edges: IndexMap<String, Edge>,
}

impl Network {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let span = info_span!("network", name = %name);
        Network {
            name,
            span,
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Span every network operation runs in; handed to dispatchers as their logger
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get_index(id.index()).map(|(_, node)| node)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get_index(id.index()).map(|(_, edge)| edge)
    }

    pub fn node_by_key(&self, key: &str) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn edge_by_key(&self, key: &str) -> Option<&Edge> {
        self.edges.get(key)
    }

    pub fn node_id(&self, key: &str) -> Option<NodeId> {
        self.nodes.get_index_of(key).map(|idx| NodeId::new(idx as u64))
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn neighbors(&self, id: NodeId) -> GraphResult<impl Iterator<Item = &Node>> {
        let node = self
            .node(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        Ok(node.neighbors().filter_map(move |n| self.node(n)))
    }

    /// Add a node, or merge the declaration's payload into the existing one.
    ///
    /// On a duplicate the identity and kind of the existing node are kept.
    pub fn add_node<N: NodeDeclaration + ?Sized>(&mut self, decl: &N) -> Added<NodeId> {
        let _span = self.span.clone().entered();
        let key = decl.identifier();

        if let Some((idx, _, node)) = self.nodes.get_full_mut(&key) {
            let declared = decl.kind();
            if declared != node.kind {
                warn!(node = %key, existing = %node.kind, declared = %declared, "duplicate node declared with another kind, keeping existing");
            }
            node.payload = decl.merge(&node.payload);
            warn!(node = %key, "duplicate node, payload merged");
            return Added::Existing(NodeId::new(idx as u64));
        }

        let id = NodeId::new(self.nodes.len() as u64);
        let node = Node::new(id, key.clone(), decl.kind(), decl.payload());
        self.nodes.insert(key, node);
        Added::Created(id)
    }

    /// Add an edge between two existing nodes and cross-link their adjacency.
    ///
    /// A missing endpoint is an error and leaves the network untouched; a
    /// duplicate identity is ignored.
    pub fn add_edge<E: EdgeDeclaration + ?Sized>(&mut self, decl: &E) -> GraphResult<Added<EdgeId>> {
        let _span = self.span.clone().entered();
        let key = decl.identifier();
        let source_key = decl.source_id();
        let target_key = decl.target_id();

        let (source, target) = match (self.node_id(&source_key), self.node_id(&target_key)) {
            (Some(source), Some(target)) => (source, target),
            _ => {
                error!(edge = %key, source = %source_key, target = %target_key, "edge endpoint missing, edge dropped");
                return Err(GraphError::MissingEndpoint {
                    edge: key,
                    source: source_key,
                    target: target_key,
                });
            }
        };

        if let Some(idx) = self.edges.get_index_of(&key) {
            warn!(edge = %key, "duplicate edge ignored");
            return Ok(Added::Existing(EdgeId::new(idx as u64)));
        }

        let id = EdgeId::new(self.edges.len() as u64);
        let edge = Edge::new(id, key.clone(), decl.kind(), source, target, decl.payload());
        self.edges.insert(key, edge);
        self.nodes[source.index()].link(id, target);
        self.nodes[target.index()].link(id, source);
        Ok(Added::Created(id))
    }

    /// Apply one record: all its nodes first, then its edges.
    ///
    /// Rejected and duplicate declarations are counted, never fatal.
    pub fn add_dispatcher<D: Dispatcher + ?Sized>(&mut self, dispatcher: &D) -> IngestStats {
        let (nodes, edges) = dispatcher.dispatch(&self.span);
        let mut stats = IngestStats {
            records: 1,
            ..IngestStats::default()
        };

        for decl in &nodes {
            match self.add_node(decl) {
                Added::Created(_) => stats.nodes_created += 1,
                Added::Existing(_) => stats.nodes_merged += 1,
            }
        }
        for decl in &edges {
            match self.add_edge(decl) {
                Ok(Added::Created(_)) => stats.edges_created += 1,
                Ok(Added::Existing(_)) => stats.edges_duplicate += 1,
                Err(_) => stats.edges_rejected += 1,
            }
        }
        stats
    }

    /// Apply every record of a one-pass source
    pub fn ingest<I>(&mut self, records: I) -> IngestStats
    where
        I: IntoIterator,
        I::Item: Dispatcher,
    {
        let mut stats = IngestStats::default();
        for record in records {
            stats += self.add_dispatcher(&record);
        }
        let _span = self.span.enter();
        info!(
            records = stats.records,
            nodes_created = stats.nodes_created,
            nodes_merged = stats.nodes_merged,
            edges_created = stats.edges_created,
            edges_duplicate = stats.edges_duplicate,
            edges_rejected = stats.edges_rejected,
            "ingestion finished"
        );
        stats
    }

    /// Cross-check two networks by identity key. Neither is modified.
    pub fn compare(&self, other: &Network) -> CompareReport {
        let _span = self.span.enter();
        let mut report = CompareReport::default();

        for (key, node) in &self.nodes {
            match other.nodes.get(key) {
                None => report.missing_nodes.push(key.clone()),
                Some(theirs) if theirs.kind != node.kind || theirs.payload != node.payload => {
                    report.node_mismatches.push(key.clone())
                }
                Some(_) => {}
            }
        }
        report.extra_nodes = other
            .nodes
            .keys()
            .filter(|key| !self.nodes.contains_key(*key))
            .cloned()
            .collect();

        for (key, edge) in &self.edges {
            match other.edges.get(key) {
                None => report.missing_edges.push(key.clone()),
                Some(theirs) => {
                    let same_ends = self.endpoint_keys(edge) == other.endpoint_keys(theirs);
                    if !same_ends || theirs.kind != edge.kind || theirs.payload != edge.payload {
                        report.edge_mismatches.push(key.clone());
                    }
                }
            }
        }
        report.extra_edges = other
            .edges
            .keys()
            .filter(|key| !self.edges.contains_key(*key))
            .cloned()
            .collect();

        if report.is_identical() {
            info!(other = %other.name, "networks are identical");
        } else {
            for key in report.missing_nodes.iter().chain(&report.node_mismatches) {
                debug!(node = %key, "node differs");
            }
            for key in report.missing_edges.iter().chain(&report.edge_mismatches) {
                debug!(edge = %key, "edge differs");
            }
            warn!(
                other = %other.name,
                missing_nodes = report.missing_nodes.len(),
                extra_nodes = report.extra_nodes.len(),
                node_mismatches = report.node_mismatches.len(),
                missing_edges = report.missing_edges.len(),
                extra_edges = report.extra_edges.len(),
                edge_mismatches = report.edge_mismatches.len(),
                "networks differ"
            );
        }
        report
    }

    fn endpoint_keys(&self, edge: &Edge) -> (Option<&str>, Option<&str>) {
        (
            self.node(edge.source).map(|n| n.key.as_str()),
            self.node(edge.target).map(|n| n.key.as_str()),
        )
    }

    /// True iff every neighbour of every member is a member (and every member exists)
    pub fn check_sub_network<S: BuildHasher>(&self, members: &HashSet<NodeId, S>) -> bool {
        members.iter().all(|&id| match self.node(id) {
            Some(node) => node.neighbors().all(|n| members.contains(&n)),
            None => false,
        })
    }

    /// [`check_sub_network`](Self::check_sub_network) over identity keys
    pub fn check_sub_network_keys<S: BuildHasher>(&self, members: &HashSet<String, S>) -> bool {
        members.iter().all(|key| match self.nodes.get(key) {
            Some(node) => node
                .neighbors()
                .all(|n| self.node(n).map_or(false, |m| members.contains(&m.key))),
            None => false,
        })
    }

    /// Nodes whose key matches `pattern`, in insertion order
    pub fn search_nodes(&self, pattern: &str) -> GraphResult<Vec<&Node>> {
        let re = Regex::new(pattern)?;
        Ok(self.nodes.values().filter(|n| re.is_match(&n.key)).collect())
    }

    /// Edges whose key matches `pattern`, in insertion order
    pub fn search_edges(&self, pattern: &str) -> GraphResult<Vec<&Edge>> {
        let re = Regex::new(pattern)?;
        Ok(self.edges.values().filter(|e| re.is_match(&e.key)).collect())
    }

    pub fn summary(&self) -> NetworkSummary {
        let mut summary = NetworkSummary {
            name: self.name.clone(),
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            ..NetworkSummary::default()
        };
        for node in self.nodes.values() {
            match node.kind {
                NodeKind::Emitter => summary.emitters += 1,
                NodeKind::Receiver => summary.receivers += 1,
            }
        }
        for edge in self.edges.values() {
            match edge.kind {
                EdgeKind::ER => summary.er_edges += 1,
                EdgeKind::EE => summary.ee_edges += 1,
                EdgeKind::RR => summary.rr_edges += 1,
            }
        }

        let _span = self.span.enter();
        info!(nodes = summary.nodes, edges = summary.edges, "network summary");
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::declaration::{SimpleEdge, SimpleNode};
    use crate::graph::property::PropertyMap;

    fn receiver(key: &str) -> SimpleNode {
        SimpleNode::new(key, NodeKind::Receiver)
    }

    fn small_network() -> Network {
        let mut net = Network::new("test");
        for key in ["alice", "bob", "carol"] {
            net.add_node(&receiver(key));
        }
        net.add_edge(&SimpleEdge::between("alice", "bob", "1", EdgeKind::RR)).unwrap();
        net.add_edge(&SimpleEdge::between("carol", "bob", "2", EdgeKind::RR)).unwrap();
        net
    }

    #[test]
    fn test_add_node_is_idempotent() {
        let mut net = Network::new("test");
        let first = net.add_node(&receiver("alice"));
        let second = net.add_node(&receiver("alice"));

        assert!(first.is_created());
        assert_eq!(second, Added::Existing(first.id()));
        assert_eq!(net.node_count(), 1);
    }

    #[test]
    fn test_duplicate_node_keeps_kind_and_merges_payload() {
        let mut net = Network::new("test");
        net.add_node(&SimpleNode::new("acme", NodeKind::Emitter));

        let mut payload = PropertyMap::new();
        payload.insert("city".to_string(), "Reno".into());
        net.add_node(&SimpleNode::new("acme", NodeKind::Receiver).with_payload(payload));

        let node = net.node_by_key("acme").unwrap();
        assert_eq!(node.kind, NodeKind::Emitter);
        assert_eq!(node.get_property("city").unwrap().as_string(), Some("Reno"));
    }

    #[test]
    fn test_add_edge_links_both_endpoints() {
        let net = small_network();
        let bob = net.node_by_key("bob").unwrap();
        assert_eq!(bob.degree(), 2);
        assert_eq!(net.node_by_key("alice").unwrap().degree(), 1);

        let neighbours: Vec<&str> = net
            .neighbors(bob.id)
            .unwrap()
            .map(|n| n.key.as_str())
            .collect();
        assert_eq!(neighbours, vec!["alice", "carol"]);
    }

    #[test]
    fn test_add_edge_missing_endpoint() {
        let mut net = small_network();
        let result = net.add_edge(&SimpleEdge::between("alice", "zoe", "3", EdgeKind::RR));

        assert!(matches!(result, Err(GraphError::MissingEndpoint { .. })));
        assert_eq!(net.edge_count(), 2);
        assert_eq!(net.node_by_key("alice").unwrap().degree(), 1);
    }

    #[test]
    fn test_add_edge_duplicate_in_either_order() {
        let mut net = small_network();
        let again = net
            .add_edge(&SimpleEdge::between("bob", "alice", "1", EdgeKind::RR))
            .unwrap();
        assert!(!again.is_created());
        assert_eq!(net.edge_count(), 2);

        // Same pair from another record is another edge
        net.add_edge(&SimpleEdge::between("bob", "alice", "9", EdgeKind::RR))
            .unwrap();
        assert_eq!(net.edge_count(), 3);
        assert_eq!(net.node_by_key("alice").unwrap().degree(), 2);
    }

    #[test]
    fn test_check_sub_network() {
        let mut net = small_network();
        net.add_node(&receiver("dave"));

        let component: HashSet<String> = ["alice", "bob", "carol"].iter().map(|s| s.to_string()).collect();
        let partial: HashSet<String> = ["alice", "bob"].iter().map(|s| s.to_string()).collect();
        let loner: HashSet<NodeId> = [net.node_id("dave").unwrap()].into_iter().collect();

        assert!(net.check_sub_network_keys(&component));
        assert!(!net.check_sub_network_keys(&partial));
        assert!(net.check_sub_network(&loner));
    }

    #[test]
    fn test_search() {
        let net = small_network();
        let found = net.search_nodes("^(alice|carol)$").unwrap();
        assert_eq!(found.len(), 2);

        let edges = net.search_edges("_2_").unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].key, "bob_2_carol");

        assert!(matches!(net.search_nodes("(unclosed"), Err(GraphError::InvalidPattern(_))));
    }

    #[test]
    fn test_compare() {
        let a = small_network();
        let b = small_network();
        assert!(a.compare(&b).is_identical());

        let mut c = small_network();
        c.add_node(&receiver("dave"));
        let report = a.compare(&c);
        assert_eq!(report.extra_nodes, vec!["dave".to_string()]);
        assert!(c.compare(&a).missing_nodes.contains(&"dave".to_string()));
    }

    #[test]
    fn test_summary() {
        let mut net = small_network();
        net.add_node(&SimpleNode::new("acme", NodeKind::Emitter));
        let summary = net.summary();

        assert_eq!(summary.nodes, 4);
        assert_eq!(summary.emitters, 1);
        assert_eq!(summary.rr_edges, 2);
        assert!(summary.to_string().contains("Network test"));
    }
}
