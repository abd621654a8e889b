//! Whole-graph partitioning into connected components

use super::common::{GraphView, NodeId, NodeSet};
use super::traversal::Traversal;
use super::{AlgoError, AlgoResult};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Partitioning configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CrunchConfig {
    /// Traversal budget as a multiple of the node count
    pub budget_ratio: f64,
    /// Detector used per component
    pub traversal: Traversal,
}

impl Default for CrunchConfig {
    fn default() -> Self {
        Self {
            budget_ratio: 1.2,
            traversal: Traversal::DepthFirst,
        }
    }
}

/// Decomposition of a graph into disjoint components.
///
/// Component indices are dense and start at 0, in order of discovery.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub node_partition: FxHashMap<NodeId, usize>,
    pub sub_networks: Vec<NodeSet>,
}

impl Partition {
    /// Append a component and assign all its members to it
    pub fn add_sub_network(&mut self, nodes: NodeSet) -> usize {
        let index = self.sub_networks.len();
        for &node in &nodes {
            self.node_partition.insert(node, index);
        }
        self.sub_networks.push(nodes);
        index
    }

    pub fn from_sub_networks(sub_networks: impl IntoIterator<Item = NodeSet>) -> Self {
        let mut partition = Partition::default();
        for nodes in sub_networks {
            partition.add_sub_network(nodes);
        }
        partition
    }

    pub fn len(&self) -> usize {
        self.sub_networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_networks.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.node_partition.len()
    }

    pub fn partition_of(&self, node: NodeId) -> Option<usize> {
        self.node_partition.get(&node).copied()
    }

    pub fn sub_network(&self, index: usize) -> Option<&NodeSet> {
        self.sub_networks.get(index)
    }

    /// Component size -> indices of the components with that size
    pub fn size_histogram(&self) -> BTreeMap<usize, Vec<usize>> {
        let mut histogram: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (index, nodes) in self.sub_networks.iter().enumerate() {
            histogram.entry(nodes.len()).or_default().push(index);
        }
        histogram
    }

    /// Every component is edge-closed and every node of the view is assigned once
    pub fn is_consistent(&self, view: &GraphView) -> AlgoResult<bool> {
        let assigned: usize = self.sub_networks.iter().map(|s| s.len()).sum();
        if assigned != view.node_count || self.node_partition.len() != view.node_count {
            return Ok(false);
        }
        for nodes in &self.sub_networks {
            if !check_sub_network(view, nodes)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// True iff every neighbour of every member is itself a member
pub fn check_sub_network(view: &GraphView, nodes: &NodeSet) -> AlgoResult<bool> {
    for &node in nodes {
        let idx = view.index_of(node).ok_or(AlgoError::UnknownNode(node))?;
        let closed = view
            .neighbors(idx)
            .iter()
            .all(|&next| nodes.contains(&view.index_to_node[next]));
        if !closed {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Partition the whole graph.
///
/// Nodes are visited in view order; each unassigned node seeds a bounded
/// detection with budget `budget_ratio * node_count`. An incomplete
/// detection means the budget heuristic failed and the whole operation is
/// abandoned with [`AlgoError::BudgetExhausted`].
pub fn crunch_network(view: &GraphView, config: &CrunchConfig) -> AlgoResult<Partition> {
    if !config.budget_ratio.is_finite() || config.budget_ratio <= 0.0 {
        return Err(AlgoError::InvalidParameter(format!(
            "budget_ratio must be positive, got {}",
            config.budget_ratio
        )));
    }
    let budget = (config.budget_ratio * view.node_count as f64) as usize;

    let mut partition = Partition::default();
    for idx in 0..view.node_count {
        let node = view.index_to_node[idx];
        if partition.node_partition.contains_key(&node) {
            continue;
        }
        let sub = config.traversal.detect(view, node, budget)?;
        if !sub.complete {
            return Err(AlgoError::BudgetExhausted { start: node, budget });
        }
        let index = partition.add_sub_network(sub.nodes);
        debug!(start = node, index, "component detected");
    }

    info!(
        nodes = view.node_count,
        components = partition.len(),
        budget,
        "network crunched"
    );
    Ok(partition)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles_and_a_loner() -> GraphView {
        GraphView::from_edges(7, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)])
    }

    #[test]
    fn test_crunch_network() {
        let view = two_triangles_and_a_loner();
        let partition = crunch_network(&view, &CrunchConfig::default()).unwrap();

        assert_eq!(partition.len(), 3);
        assert_eq!(partition.node_count(), 7);
        assert_eq!(partition.partition_of(0), Some(0));
        assert_eq!(partition.partition_of(4), Some(1));
        assert_eq!(partition.partition_of(6), Some(2));
        assert!(partition.is_consistent(&view).unwrap());
    }

    #[test]
    fn test_crunch_with_every_traversal() {
        let view = GraphView::from_edges(8, &[(0, 1), (1, 2), (2, 3), (4, 5), (5, 6), (6, 4), (6, 7)]);
        let reference = crunch_network(&view, &CrunchConfig::default()).unwrap();
        for traversal in [Traversal::Wanderer, Traversal::WidthFirst] {
            let config = CrunchConfig {
                traversal,
                ..CrunchConfig::default()
            };
            assert_eq!(crunch_network(&view, &config).unwrap(), reference);
        }
    }

    #[test]
    fn test_budget_too_small_is_fatal() {
        // A long chain cannot be walked with a tenth of its length
        let edges: Vec<(usize, usize)> = (0..49).map(|i| (i, i + 1)).collect();
        let view = GraphView::from_edges(50, &edges);
        let config = CrunchConfig {
            budget_ratio: 0.1,
            ..CrunchConfig::default()
        };
        assert_eq!(
            crunch_network(&view, &config),
            Err(AlgoError::BudgetExhausted { start: 0, budget: 5 })
        );
    }

    #[test]
    fn test_invalid_ratio() {
        let view = two_triangles_and_a_loner();
        let config = CrunchConfig {
            budget_ratio: f64::NAN,
            ..CrunchConfig::default()
        };
        assert!(matches!(
            crunch_network(&view, &config),
            Err(AlgoError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_check_sub_network() {
        let view = two_triangles_and_a_loner();
        let closed: NodeSet = [0, 1, 2].into_iter().collect();
        let open: NodeSet = [0, 1].into_iter().collect();
        let unknown: NodeSet = [42].into_iter().collect();

        assert!(check_sub_network(&view, &closed).unwrap());
        assert!(!check_sub_network(&view, &open).unwrap());
        assert_eq!(check_sub_network(&view, &unknown), Err(AlgoError::UnknownNode(42)));
    }

    #[test]
    fn test_size_histogram() {
        let view = two_triangles_and_a_loner();
        let partition = crunch_network(&view, &CrunchConfig::default()).unwrap();
        let histogram = partition.size_histogram();

        assert_eq!(histogram.get(&3), Some(&vec![0, 1]));
        assert_eq!(histogram.get(&1), Some(&vec![2]));
    }
}
