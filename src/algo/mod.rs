//! Graph algorithms module
//!
//! Connectivity and ranking algorithms live in the `filing-nets-algorithms`
//! crate and run over a dense [`GraphView`]. This module is the adapter layer:
//! it projects a [`Network`] into a view and maps results back to identity
//! keys.

use crate::graph::{Network, NodeId};
use filing_nets_algorithms::NodeId as AlgoNodeId;
use std::collections::{HashMap, HashSet};

// Re-export algorithms
pub use filing_nets_algorithms::{
    check_sub_network, crunch_network, crunch_network_wandering, degree_rank,
    detect_depth_first, detect_depth_first_concurrent, detect_width_first, matrix_rank,
    random_walk_rank, AlgoError, AlgoResult, ConcurrentDfsConfig, CrunchConfig, GraphView,
    MatrixRankConfig, NodeSet, Partition, RandomWalkConfig, SubNetwork, Traversal, Wanderer,
    WanderingConfig,
};

/// Build a GraphView from the network for algorithm execution.
///
/// View ids are the network's node handles; neighbour lists keep adjacency
/// insertion order, so order-sensitive traversals behave as on the network.
pub fn build_view(network: &Network) -> GraphView {
    let mut index_to_node = Vec::with_capacity(network.node_count());
    let mut keys = Vec::with_capacity(network.node_count());
    let mut adjacency = Vec::with_capacity(network.node_count());

    for node in network.nodes() {
        index_to_node.push(node.id.as_u64());
        keys.push(node.key.clone());
        adjacency.push(node.neighbors().map(|n| n.as_u64() as usize).collect());
    }

    GraphView::from_adjacency_list(index_to_node, keys, adjacency)
}

/// Run one bounded traversal from the node keyed `key`
pub fn detect_from_key(
    network: &Network,
    view: &GraphView,
    key: &str,
    traversal: Traversal,
    max_n: usize,
) -> AlgoResult<SubNetwork> {
    let start = network
        .node_id(key)
        .ok_or_else(|| AlgoError::InvalidParameter(format!("unknown node key {}", key)))?;
    traversal.detect(view, start.as_u64(), max_n)
}

/// View ids back to network handles, for [`Network::check_sub_network`]
pub fn to_node_ids(nodes: &NodeSet) -> HashSet<NodeId> {
    nodes.iter().map(|&id| NodeId::new(id)).collect()
}

/// Identity keys of a node set, sorted
pub fn keys_of(network: &Network, nodes: &NodeSet) -> Vec<String> {
    let mut keys: Vec<String> = nodes
        .iter()
        .filter_map(|&id| network.node(NodeId::new(id)))
        .map(|n| n.key.clone())
        .collect();
    keys.sort();
    keys
}

/// Every sub-network of a partition as sorted identity keys, in partition order
pub fn partition_keys(network: &Network, partition: &Partition) -> Vec<Vec<String>> {
    partition
        .sub_networks
        .iter()
        .map(|nodes| keys_of(network, nodes))
        .collect()
}

/// Rank weights keyed by identity, heaviest first (ties by key)
pub fn ranks_by_key(network: &Network, ranks: &HashMap<AlgoNodeId, f64>) -> Vec<(String, f64)> {
    let mut keyed: Vec<(String, f64)> = ranks
        .iter()
        .filter_map(|(&id, &weight)| network.node(NodeId::new(id)).map(|n| (n.key.clone(), weight)))
        .collect();
    keyed.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    keyed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, NodeKind, SimpleEdge, SimpleNode};

    fn network() -> Network {
        let mut net = Network::new("algo");
        for key in ["carol", "alice", "bob", "dave"] {
            net.add_node(&SimpleNode::new(key, NodeKind::Receiver));
        }
        net.add_edge(&SimpleEdge::between("alice", "bob", "1", EdgeKind::RR)).unwrap();
        net.add_edge(&SimpleEdge::between("bob", "carol", "2", EdgeKind::RR)).unwrap();
        net
    }

    #[test]
    fn test_build_view() {
        let net = network();
        let view = build_view(&net);

        assert_eq!(view.node_count, 4);
        assert_eq!(view.keys[0], "carol");
        let bob = net.node_id("bob").unwrap().as_u64() as usize;
        assert_eq!(view.neighbors(bob), &[1, 0]);
        assert_eq!(view.degree(3), 0);
        assert_eq!(view.total_degree(), 4);
    }

    #[test]
    fn test_detect_from_key() {
        let net = network();
        let view = build_view(&net);

        let sub = detect_from_key(&net, &view, "alice", Traversal::WidthFirst, 10).unwrap();
        assert!(sub.complete);
        assert_eq!(keys_of(&net, &sub.nodes), vec!["alice", "bob", "carol"]);
        assert!(net.check_sub_network(&to_node_ids(&sub.nodes)));

        assert!(matches!(
            detect_from_key(&net, &view, "zoe", Traversal::DepthFirst, 10),
            Err(AlgoError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_partition_and_rank_keys() {
        let net = network();
        let view = build_view(&net);

        let partition = crunch_network(&view, &CrunchConfig::default()).unwrap();
        let keys = partition_keys(&net, &partition);
        assert_eq!(keys, vec![vec!["alice", "bob", "carol"], vec!["dave"]]);

        let ranks = ranks_by_key(&net, &degree_rank(&view));
        assert_eq!(ranks[0], ("bob".to_string(), 0.5));
        assert_eq!(ranks.last().unwrap().0, "dave");
    }
}
