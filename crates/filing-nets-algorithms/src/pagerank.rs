//! Closed-form and matrix ranking
//!
//! Both functions return a distribution over every node of the view that
//! sums to 1. Neither checks its preconditions: degree ranking is only the
//! stationary distribution of an undirected graph, and matrix ranking keeps
//! a dense n x n matrix, so it is meant for small graphs.

use super::common::{GraphView, NodeId};
use super::{AlgoError, AlgoResult};
use ndarray::{Array1, Array2};
use std::collections::HashMap;
use tracing::debug;

/// Matrix ranking configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatrixRankConfig {
    /// Convergence threshold on the largest entry-wise change
    pub tolerance: f64,
    /// Maximum number of squarings
    pub max_iterations: usize,
}

impl Default for MatrixRankConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 100,
        }
    }
}

fn uniform(view: &GraphView) -> HashMap<NodeId, f64> {
    let weight = 1.0 / view.node_count as f64;
    view.index_to_node.iter().map(|&id| (id, weight)).collect()
}

/// weight(node) = degree(node) / total degree.
///
/// An edgeless graph yields the uniform distribution.
pub fn degree_rank(view: &GraphView) -> HashMap<NodeId, f64> {
    if view.node_count == 0 {
        return HashMap::new();
    }
    let total = view.total_degree();
    if total == 0 {
        return uniform(view);
    }

    let total = total as f64;
    (0..view.node_count)
        .map(|idx| (view.index_to_node[idx], view.degree(idx) as f64 / total))
        .collect()
}

/// Row-stochastic transition matrix in key-sorted order
fn transition_matrix(view: &GraphView, order: &[usize]) -> Array2<f64> {
    let n = view.node_count;
    let mut position = vec![0; n];
    for (pos, &idx) in order.iter().enumerate() {
        position[idx] = pos;
    }

    let mut d = Array2::<f64>::zeros((n, n));
    for (row, &idx) in order.iter().enumerate() {
        let degree = view.degree(idx);
        if degree == 0 {
            continue;
        }
        let share = 1.0 / degree as f64;
        for &next in view.neighbors(idx) {
            d[[row, position[next]]] += share;
        }
    }
    d
}

fn max_abs_diff(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    (a - b).fold(0.0_f64, |acc, &x| acc.max(x.abs()))
}

/// Power-iteration ranking by repeated squaring of the transition matrix.
///
/// Rows and columns follow the key-sorted node order so the matrix is
/// reproducible. `D` is squared until no entry moves by more than
/// `tolerance`. The limit is averaged with one more step (`D∞·D`) so that
/// period-2 (bipartite) chains read out their stationary distribution, and
/// the rows of nodes with edges are averaged into the result. Nodes without
/// edges keep a zero row.
pub fn matrix_rank(view: &GraphView, config: &MatrixRankConfig) -> AlgoResult<HashMap<NodeId, f64>> {
    if config.tolerance.is_nan() || config.tolerance <= 0.0 || config.max_iterations == 0 {
        return Err(AlgoError::InvalidParameter(
            "tolerance must be positive and max_iterations at least 1".to_string(),
        ));
    }
    let n = view.node_count;
    if n == 0 {
        return Ok(HashMap::new());
    }
    if view.total_degree() == 0 {
        return Ok(uniform(view));
    }

    let order = view.sorted_order();
    let step = transition_matrix(view, &order);
    let mut power = step.clone();

    let mut iterations = 0;
    loop {
        let next = power.dot(&power);
        let diff = max_abs_diff(&next, &power);
        power = next;
        iterations += 1;
        if diff < config.tolerance {
            debug!(iterations, diff, nodes = n, "matrix rank converged");
            break;
        }
        if iterations >= config.max_iterations {
            return Err(AlgoError::NotConverged { iterations, diff });
        }
    }

    let limit = (&power + &power.dot(&step)) * 0.5;

    let mut weights = Array1::<f64>::zeros(n);
    let mut rows = 0usize;
    for (row, &idx) in order.iter().enumerate() {
        if view.degree(idx) > 0 {
            weights += &limit.row(row);
            rows += 1;
        }
    }
    weights /= rows as f64;

    Ok(order
        .iter()
        .enumerate()
        .map(|(pos, &idx)| (view.index_to_node[idx], weights[pos]))
        .collect())
}
