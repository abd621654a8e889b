//! Resumable, stack-based depth-first exploration
//!
//! A [`Wanderer`] walks the component of its start node without recursion.
//! It keeps a cursor on the node it is about to expand and a LIFO of branch
//! points: nodes already discovered but not yet expanded. Because all of its
//! state lives in the struct, it can be driven a few steps at a time, moved
//! between tasks, and merged with another wanderer that ran into the same
//! component.

use super::common::{GraphView, NodeId, NodeSet};
use super::traversal::SubNetwork;
use super::{AlgoError, AlgoResult};
use rustc_hash::FxHashSet;

/// Outcome of driving a wanderer for a bounded number of steps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WanderStep {
    /// Dense indices discovered during this call, in discovery order
    pub increment: Vec<usize>,
    /// The component is exhausted: no cursor and no branch point left
    pub done: bool,
}

#[derive(Debug, Clone)]
pub struct Wanderer {
    cursor: Option<usize>,
    branch_points: Vec<usize>,
    discovered: FxHashSet<usize>,
}

impl Wanderer {
    /// Place a wanderer on `start` (a dense index). Nothing is expanded yet.
    pub fn new(view: &GraphView, start: usize) -> AlgoResult<Self> {
        if start >= view.node_count {
            return Err(AlgoError::InvalidParameter(format!(
                "start index {} out of range for {} nodes",
                start, view.node_count
            )));
        }
        let mut discovered = FxHashSet::default();
        discovered.insert(start);
        Ok(Self {
            cursor: Some(start),
            branch_points: Vec::new(),
            discovered,
        })
    }

    /// Expand up to `max_steps` nodes.
    ///
    /// Each step expands one node: every undiscovered neighbour is marked
    /// discovered, the first one that is not a dead end becomes the next
    /// cursor, and the others are pushed as branch points. When a branch runs
    /// dry, the most recent branch point is resumed.
    pub fn step(&mut self, view: &GraphView, max_steps: usize) -> WanderStep {
        let mut increment = Vec::new();

        for _ in 0..max_steps {
            let current = match self.cursor.take().or_else(|| self.branch_points.pop()) {
                Some(node) => node,
                None => break,
            };

            for &next in view.neighbors(current) {
                if !self.discovered.insert(next) {
                    continue;
                }
                increment.push(next);
                if view.is_dead_end(next) {
                    continue;
                }
                if self.cursor.is_none() {
                    self.cursor = Some(next);
                } else {
                    self.branch_points.push(next);
                }
            }
        }

        WanderStep {
            increment,
            done: self.is_done(),
        }
    }

    /// Absorb another wanderer's pending work and discoveries.
    ///
    /// The other LIFO is transferred by popping it onto ours (so its order is
    /// reversed), followed by its cursor if it had one.
    pub fn merge(&mut self, mut other: Wanderer) {
        while let Some(node) = other.branch_points.pop() {
            self.branch_points.push(node);
        }
        if let Some(node) = other.cursor.take() {
            self.branch_points.push(node);
        }
        self.discovered.extend(other.discovered);
    }

    pub fn is_done(&self) -> bool {
        self.cursor.is_none() && self.branch_points.is_empty()
    }

    pub fn has_discovered(&self, idx: usize) -> bool {
        self.discovered.contains(&idx)
    }

    pub fn discovered(&self) -> &FxHashSet<usize> {
        &self.discovered
    }

    /// Number of nodes waiting to be expanded
    pub fn pending(&self) -> usize {
        self.branch_points.len() + usize::from(self.cursor.is_some())
    }

    pub fn node_set(&self, view: &GraphView) -> NodeSet {
        view.to_node_set(&self.discovered)
    }

    /// One-shot detection from a NodeId with a step budget of `max_n` expansions
    pub fn detect(view: &GraphView, start: NodeId, max_n: usize) -> AlgoResult<SubNetwork> {
        let start_idx = view.index_of(start).ok_or(AlgoError::UnknownNode(start))?;
        let mut wanderer = Wanderer::new(view, start_idx)?;
        let outcome = wanderer.step(view, max_n);
        Ok(SubNetwork {
            nodes: wanderer.node_set(view),
            complete: outcome.done,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder() -> GraphView {
        // 0-1-2-3
        // |   |
        // 4   5-6
        GraphView::from_edges(8, &[(0, 1), (1, 2), (2, 3), (0, 4), (2, 5), (5, 6)])
    }

    #[test]
    fn test_detect_complete() {
        let view = ladder();
        let sub = Wanderer::detect(&view, 3, 100).unwrap();
        assert!(sub.complete);
        assert_eq!(sub.nodes, (0..7).collect::<NodeSet>());

        // 7 is isolated
        let sub = Wanderer::detect(&view, 7, 1).unwrap();
        assert!(sub.complete);
        assert_eq!(sub.len(), 1);
    }

    #[test]
    fn test_detect_zero_budget() {
        let view = ladder();
        let sub = Wanderer::detect(&view, 0, 0).unwrap();
        assert!(!sub.complete);
        assert_eq!(sub.len(), 1);
    }

    #[test]
    fn test_chunked_matches_one_shot() {
        let view = ladder();
        let one_shot = Wanderer::detect(&view, 0, 100).unwrap();

        let mut wanderer = Wanderer::new(&view, 0).unwrap();
        let mut seen = vec![0usize];
        loop {
            let outcome = wanderer.step(&view, 1);
            seen.extend(outcome.increment);
            if outcome.done {
                break;
            }
        }
        assert_eq!(wanderer.node_set(&view), one_shot.nodes);
        assert_eq!(seen.len(), 7, "each node is reported exactly once");
    }

    #[test]
    fn test_merge_collapses_two_wanderers() {
        let view = ladder();
        let mut left = Wanderer::new(&view, 4).unwrap();
        let mut right = Wanderer::new(&view, 6).unwrap();
        left.step(&view, 1);
        right.step(&view, 1);
        assert!(!left.is_done());
        assert!(!right.is_done());

        left.merge(right);
        assert!(left.has_discovered(6));
        assert!(left.has_discovered(5));
        assert!(left.pending() >= 2);

        while !left.step(&view, 3).done {}
        assert_eq!(left.node_set(&view), (0..7).collect::<NodeSet>());
    }

    #[test]
    fn test_out_of_range_start() {
        let view = ladder();
        assert!(matches!(
            Wanderer::new(&view, 99),
            Err(AlgoError::InvalidParameter(_))
        ));
        assert_eq!(
            Wanderer::detect(&view, 99, 5).unwrap_err(),
            AlgoError::UnknownNode(99)
        );
    }
}
