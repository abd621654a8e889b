//! Shared utilities for graph algorithms
//!
//! Provides a read-only, optimized view of the graph topology for algorithm execution.

use rustc_hash::FxHashSet;
use std::collections::HashMap;

/// Node Identifier type (u64)
pub type NodeId = u64;

/// Set of discovered nodes, keyed by [`NodeId`]
pub type NodeSet = FxHashSet<NodeId>;

/// A dense, integer-indexed view of an undirected graph in Compressed Sparse Row (CSR) format.
///
/// Every undirected edge appears twice, once in the neighbour list of each endpoint.
/// Neighbour lists keep the insertion order of the source graph's adjacency, so
/// traversals that depend on visitation order behave the same on the view as on
/// the graph it was built from.
#[derive(Debug, Clone)]
pub struct GraphView {
    /// Number of nodes
    pub node_count: usize,
    /// Mapping from dense index (0..N) back to NodeId
    pub index_to_node: Vec<NodeId>,
    /// Mapping from NodeId to dense index
    pub node_to_index: HashMap<NodeId, usize>,
    /// Identity key of each node, aligned with `index_to_node`
    pub keys: Vec<String>,

    /// Offsets into `targets`. Size = node_count + 1
    pub offsets: Vec<usize>,
    /// Contiguous array of neighbour indices
    pub targets: Vec<usize>,
}

impl GraphView {
    /// Degree of a node (by index). Parallel edges count once each.
    pub fn degree(&self, idx: usize) -> usize {
        self.offsets[idx + 1] - self.offsets[idx]
    }

    /// Neighbours of a node, in adjacency insertion order
    pub fn neighbors(&self, idx: usize) -> &[usize] {
        &self.targets[self.offsets[idx]..self.offsets[idx + 1]]
    }

    /// A node whose only adjacency is the edge it was reached through
    pub fn is_dead_end(&self, idx: usize) -> bool {
        self.degree(idx) == 1
    }

    /// Sum of all degrees (twice the edge count)
    pub fn total_degree(&self) -> usize {
        self.targets.len()
    }

    /// Resolve a NodeId to its dense index
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.node_to_index.get(&node).copied()
    }

    /// Dense indices ordered by identity key, for reproducible matrix layouts
    pub fn sorted_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.node_count).collect();
        order.sort_by(|&a, &b| self.keys[a].cmp(&self.keys[b]));
        order
    }

    /// Map a set of dense indices back to NodeIds
    pub fn to_node_set<'a>(&self, indices: impl IntoIterator<Item = &'a usize>) -> NodeSet {
        indices.into_iter().map(|&idx| self.index_to_node[idx]).collect()
    }

    /// Build a view from per-node neighbour lists.
    ///
    /// `adjacency[i]` lists the neighbour indices of node `i`. The caller is
    /// responsible for listing every undirected edge on both sides.
    pub fn from_adjacency_list(
        index_to_node: Vec<NodeId>,
        keys: Vec<String>,
        adjacency: Vec<Vec<usize>>,
    ) -> Self {
        let node_count = index_to_node.len();
        let node_to_index = index_to_node
            .iter()
            .enumerate()
            .map(|(idx, &id)| (id, idx))
            .collect();

        let mut offsets = Vec::with_capacity(node_count + 1);
        let mut targets = Vec::new();
        offsets.push(0);
        for neighbors in adjacency {
            targets.extend(neighbors);
            offsets.push(targets.len());
        }

        GraphView {
            node_count,
            index_to_node,
            node_to_index,
            keys,
            offsets,
            targets,
        }
    }

    /// Build a view from an undirected edge list over nodes `0..node_count`.
    ///
    /// NodeIds equal dense indices and keys are `n{index}`. Mostly useful in tests
    /// and benchmarks.
    pub fn from_edges(node_count: usize, edges: &[(usize, usize)]) -> Self {
        let mut adjacency = vec![Vec::new(); node_count];
        for &(a, b) in edges {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
        Self::from_adjacency_list(
            (0..node_count as NodeId).collect(),
            (0..node_count).map(|i| format!("n{}", i)).collect(),
            adjacency,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_from_edges() {
        // 0 - 1 - 2, 3 isolated
        let view = GraphView::from_edges(4, &[(0, 1), (1, 2)]);

        assert_eq!(view.node_count, 4);
        assert_eq!(view.neighbors(1), &[0, 2]);
        assert_eq!(view.degree(3), 0);
        assert!(view.is_dead_end(0));
        assert!(!view.is_dead_end(1));
        assert_eq!(view.total_degree(), 4);
    }

    #[test]
    fn test_sorted_order_follows_keys() {
        let view = GraphView::from_adjacency_list(
            vec![10, 20, 30],
            vec!["carol".to_string(), "alice".to_string(), "bob".to_string()],
            vec![vec![], vec![], vec![]],
        );
        assert_eq!(view.sorted_order(), vec![1, 2, 0]);
        assert_eq!(view.index_of(30), Some(2));
        assert_eq!(view.index_of(99), None);
    }
}
