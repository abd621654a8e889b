pub mod common;
pub mod concurrent;
pub mod pagerank;
pub mod partition;
pub mod random_walk;
pub mod traversal;
pub mod wanderer;
pub mod wandering;

pub use common::{GraphView, NodeId, NodeSet};
pub use concurrent::{detect_depth_first_concurrent, ConcurrentDfsConfig};
pub use pagerank::{degree_rank, matrix_rank, MatrixRankConfig};
pub use partition::{check_sub_network, crunch_network, CrunchConfig, Partition};
pub use random_walk::{random_walk_rank, RandomWalkConfig};
pub use traversal::{detect_depth_first, detect_width_first, SubNetwork, Traversal};
pub use wanderer::{WanderStep, Wanderer};
pub use wandering::{crunch_network_wandering, Order, WanderingConfig};

use thiserror::Error;

/// Errors raised by the connectivity and ranking engines
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlgoError {
    #[error("Node {0} is not part of the graph view")]
    UnknownNode(NodeId),

    /// The traversal budget was too small to enumerate a whole component
    #[error("Budget of {budget} steps exhausted before the component of node {start} was complete")]
    BudgetExhausted { start: NodeId, budget: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Matrix iteration did not converge after {iterations} iterations (last diff {diff:e})")]
    NotConverged { iterations: usize, diff: f64 },

    #[error("Worker task failed: {0}")]
    Task(String),

    #[error("Inconsistent coordinator state: {0}")]
    Inconsistent(String),
}

pub type AlgoResult<T> = Result<T, AlgoError>;

impl From<tokio::task::JoinError> for AlgoError {
    fn from(err: tokio::task::JoinError) -> Self {
        AlgoError::Task(err.to_string())
    }
}
