//! Bounded sequential subnetwork detection
//!
//! All detectors share one contract: starting from a node and given a step
//! budget, return the discovered nodes and whether the whole connected
//! component was enumerated within that budget. An incomplete result is a
//! subset of the component, never a node outside it.

use super::common::{GraphView, NodeId, NodeSet};
use super::wanderer::Wanderer;
use super::{AlgoError, AlgoResult};
use rustc_hash::FxHashSet;

/// Nodes discovered from a start node, and whether the component is complete
#[derive(Debug, Clone, PartialEq)]
pub struct SubNetwork {
    pub nodes: NodeSet,
    /// `false` when the budget ran out before the component was exhausted
    pub complete: bool,
}

impl SubNetwork {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }
}

/// The interchangeable sequential detectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Traversal {
    /// Depth-first, budget bounds the branch depth
    DepthFirst,
    /// Iterative depth-first with an explicit stack, budget bounds the step count
    Wanderer,
    /// Layer-by-layer breadth-first, budget bounds the number of layers
    WidthFirst,
}

impl Traversal {
    pub fn detect(self, view: &GraphView, start: NodeId, max_n: usize) -> AlgoResult<SubNetwork> {
        match self {
            Traversal::DepthFirst => detect_depth_first(view, start, max_n),
            Traversal::Wanderer => Wanderer::detect(view, start, max_n),
            Traversal::WidthFirst => detect_width_first(view, start, max_n),
        }
    }
}

/// Depth-first detection.
///
/// Each level of depth consumes one unit of budget. A dead end (a node whose
/// only edge is the one it was reached by) closes its branch successfully; hitting
/// a zero budget anywhere aborts the whole search as incomplete. Neighbours are
/// visited in adjacency insertion order, so which branch exhausts the budget first
/// depends on how the graph was built.
pub fn detect_depth_first(view: &GraphView, start: NodeId, max_n: usize) -> AlgoResult<SubNetwork> {
    let start_idx = view.index_of(start).ok_or(AlgoError::UnknownNode(start))?;

    let mut discovered = FxHashSet::default();
    discovered.insert(start_idx);

    let mut complete = true;
    for &next in view.neighbors(start_idx) {
        if discovered.contains(&next) {
            continue;
        }
        let closed = match max_n.checked_sub(1) {
            Some(budget) => descend(view, next, budget, &mut discovered),
            None => false,
        };
        if !closed {
            complete = false;
            break;
        }
    }

    Ok(SubNetwork {
        nodes: view.to_node_set(&discovered),
        complete,
    })
}

/// One depth-first branch from `root`, with an explicit stack of
/// (node, remaining budget, neighbour cursor) frames in place of recursion.
/// Returns `false` as soon as any branch needs a level beyond the budget.
fn descend(view: &GraphView, root: usize, budget: usize, discovered: &mut FxHashSet<usize>) -> bool {
    if budget == 0 {
        return false;
    }
    discovered.insert(root);
    if view.is_dead_end(root) {
        return true;
    }

    let mut stack = vec![(root, budget, 0usize)];
    while let Some(frame) = stack.last_mut() {
        let (node, budget, cursor) = *frame;
        let neighbors = view.neighbors(node);
        if cursor == neighbors.len() {
            stack.pop();
            continue;
        }
        frame.2 += 1;

        let next = neighbors[cursor];
        if discovered.contains(&next) {
            continue;
        }
        if budget == 1 {
            return false;
        }
        discovered.insert(next);
        if !view.is_dead_end(next) {
            stack.push((next, budget - 1, 0));
        }
    }
    true
}

/// Layer-by-layer ("width-first") detection.
///
/// Layer 0 is the start node, layer k+1 the undiscovered neighbours of layer k.
/// Stops after `max_n` layers, or earlier when a layer comes out empty. The
/// discovered set is the distance-`max_n` neighbourhood of the start node,
/// independent of adjacency order.
pub fn detect_width_first(view: &GraphView, start: NodeId, max_n: usize) -> AlgoResult<SubNetwork> {
    let start_idx = view.index_of(start).ok_or(AlgoError::UnknownNode(start))?;

    let mut discovered = FxHashSet::default();
    discovered.insert(start_idx);
    let mut layer = vec![start_idx];

    for _ in 0..max_n {
        let mut next_layer = Vec::new();
        for &node in &layer {
            for &next in view.neighbors(node) {
                if discovered.insert(next) {
                    next_layer.push(next);
                }
            }
        }
        if next_layer.is_empty() {
            return Ok(SubNetwork {
                nodes: view.to_node_set(&discovered),
                complete: true,
            });
        }
        layer = next_layer;
    }

    // Out of layers: complete only if the last layer has nowhere left to go
    let complete = layer
        .iter()
        .all(|&node| view.neighbors(node).iter().all(|next| discovered.contains(next)));

    Ok(SubNetwork {
        nodes: view.to_node_set(&discovered),
        complete,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[NodeId]) -> NodeSet {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_depth_first_two_components() {
        // 0-1-2-3 and 4-5
        let view = GraphView::from_edges(6, &[(0, 1), (1, 2), (2, 3), (4, 5)]);

        let sub = detect_depth_first(&view, 1, 10).unwrap();
        assert!(sub.complete);
        assert_eq!(sub.nodes, set(&[0, 1, 2, 3]));

        let sub = detect_depth_first(&view, 5, 10).unwrap();
        assert!(sub.complete);
        assert_eq!(sub.nodes, set(&[4, 5]));
    }

    #[test]
    fn test_depth_first_budget_exhausted() {
        // Path 0-1-2-3-4-5 explored from one end
        let view = GraphView::from_edges(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5)]);

        let sub = detect_depth_first(&view, 0, 3).unwrap();
        assert!(!sub.complete);
        assert!(sub.contains(0));
        assert!(sub.len() < 6);

        let sub = detect_depth_first(&view, 0, 6).unwrap();
        assert!(sub.complete);
        assert_eq!(sub.len(), 6);
    }

    #[test]
    fn test_depth_first_isolated_and_zero_budget() {
        let view = GraphView::from_edges(3, &[(0, 1)]);

        let sub = detect_depth_first(&view, 2, 0).unwrap();
        assert!(sub.complete);
        assert_eq!(sub.nodes, set(&[2]));

        let sub = detect_depth_first(&view, 0, 0).unwrap();
        assert!(!sub.complete);
        assert_eq!(sub.nodes, set(&[0]));
    }

    #[test]
    fn test_depth_first_long_path() {
        // Far deeper than any thread stack would allow for one frame per node
        let n = 60_000;
        let edges: Vec<(usize, usize)> = (0..n - 1).map(|i| (i, i + 1)).collect();
        let view = GraphView::from_edges(n, &edges);

        let sub = detect_depth_first(&view, 0, n).unwrap();
        assert!(sub.complete);
        assert_eq!(sub.len(), n);

        let sub = detect_depth_first(&view, 0, n - 2).unwrap();
        assert!(!sub.complete);
        assert!(sub.len() < n);
    }

    #[test]
    fn test_width_first_layers() {
        // Star around 0 with a tail 3-4
        let view = GraphView::from_edges(5, &[(0, 1), (0, 2), (0, 3), (3, 4)]);

        let sub = detect_width_first(&view, 0, 1).unwrap();
        assert!(!sub.complete);
        assert_eq!(sub.nodes, set(&[0, 1, 2, 3]));

        let sub = detect_width_first(&view, 0, 2).unwrap();
        assert!(sub.complete);
        assert_eq!(sub.len(), 5);
    }

    #[test]
    fn test_width_first_exact_budget_is_complete() {
        // 0-1-2: two layers reach everything, no third layer needed
        let view = GraphView::from_edges(3, &[(0, 1), (1, 2)]);
        let sub = detect_width_first(&view, 0, 2).unwrap();
        assert!(sub.complete);
    }

    #[test]
    fn test_unknown_start() {
        let view = GraphView::from_edges(2, &[(0, 1)]);
        assert_eq!(
            detect_width_first(&view, 42, 3),
            Err(AlgoError::UnknownNode(42))
        );
        assert_eq!(
            Traversal::DepthFirst.detect(&view, 42, 3),
            Err(AlgoError::UnknownNode(42))
        );
    }

    #[test]
    fn test_traversals_agree_on_cycle_with_chords() {
        let view = GraphView::from_edges(
            7,
            &[(0, 1), (1, 2), (2, 3), (3, 0), (1, 3), (3, 4), (5, 6)],
        );
        for traversal in [Traversal::DepthFirst, Traversal::Wanderer, Traversal::WidthFirst] {
            let sub = traversal.detect(&view, 2, 100).unwrap();
            assert!(sub.complete, "{:?} should complete", traversal);
            assert_eq!(sub.nodes, set(&[0, 1, 2, 3, 4]), "{:?}", traversal);
        }
    }
}
