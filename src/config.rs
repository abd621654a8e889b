//! Analysis configuration
//!
//! Every tunable the engines take is passed explicitly from here; nothing is
//! read from process-wide state. Any subset of fields may be given in YAML,
//! the rest fall back to their defaults.

use filing_nets_algorithms::{
    ConcurrentDfsConfig, CrunchConfig, MatrixRankConfig, RandomWalkConfig, Traversal,
    WanderingConfig,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Connectivity settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Step budget for a single bounded traversal
    pub budget: usize,
    /// Algorithm used per start node and by the partitioner
    pub traversal: Traversal,
    /// Partitioner budget as a multiple of the node count
    pub crunch_budget_ratio: f64,
    /// Buffer of each concurrent DFS report stage
    pub stage_capacity: usize,
    pub wander_workers: usize,
    pub wander_step_size: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            budget: 20,
            traversal: Traversal::DepthFirst,
            crunch_budget_ratio: 1.2,
            stage_capacity: 10,
            wander_workers: 4,
            wander_step_size: 64,
        }
    }
}

/// Ranking settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub walkers: usize,
    pub steps_per_walker: usize,
    pub restart_probability: f64,
    pub chunk_size: usize,
    pub channel_capacity: usize,
    /// Fixed seed for reproducible walks
    pub seed: Option<u64>,
    pub matrix_tolerance: f64,
    pub matrix_max_iterations: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            walkers: 4,
            steps_per_walker: 100_000,
            restart_probability: 0.15,
            chunk_size: 1000,
            channel_capacity: 64,
            seed: None,
            matrix_tolerance: 1e-8,
            matrix_max_iterations: 100,
        }
    }
}

/// Storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory (None = in-memory only)
    pub path: Option<PathBuf>,
    /// Records per committed write batch
    pub batch_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            batch_size: 100_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub traversal: TraversalConfig,
    pub ranking: RankingConfig,
    pub storage: StorageConfig,
}

impl AnalysisConfig {
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let t = &self.traversal;
        let r = &self.ranking;

        let positive = [
            ("traversal.stage_capacity", t.stage_capacity),
            ("traversal.wander_workers", t.wander_workers),
            ("traversal.wander_step_size", t.wander_step_size),
            ("ranking.walkers", r.walkers),
            ("ranking.steps_per_walker", r.steps_per_walker),
            ("ranking.chunk_size", r.chunk_size),
            ("ranking.channel_capacity", r.channel_capacity),
            ("ranking.matrix_max_iterations", r.matrix_max_iterations),
            ("storage.batch_size", self.storage.batch_size),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Invalid(format!("{} must be at least 1", name)));
        }
        if !(t.crunch_budget_ratio.is_finite() && t.crunch_budget_ratio > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "traversal.crunch_budget_ratio must be positive, got {}",
                t.crunch_budget_ratio
            )));
        }
        if !(0.0..=1.0).contains(&r.restart_probability) {
            return Err(ConfigError::Invalid(format!(
                "ranking.restart_probability must lie in [0, 1], got {}",
                r.restart_probability
            )));
        }
        if !(r.matrix_tolerance.is_finite() && r.matrix_tolerance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "ranking.matrix_tolerance must be positive, got {}",
                r.matrix_tolerance
            )));
        }
        Ok(())
    }

    pub fn crunch(&self) -> CrunchConfig {
        CrunchConfig {
            budget_ratio: self.traversal.crunch_budget_ratio,
            traversal: self.traversal.traversal,
        }
    }

    pub fn concurrent_dfs(&self) -> ConcurrentDfsConfig {
        ConcurrentDfsConfig {
            stage_capacity: self.traversal.stage_capacity,
        }
    }

    pub fn wandering(&self) -> WanderingConfig {
        WanderingConfig {
            workers: self.traversal.wander_workers,
            step_size: self.traversal.wander_step_size,
        }
    }

    pub fn random_walk(&self) -> RandomWalkConfig {
        let r = &self.ranking;
        RandomWalkConfig {
            walkers: r.walkers,
            steps: r.steps_per_walker,
            restart_probability: r.restart_probability,
            chunk_size: r.chunk_size,
            channel_capacity: r.channel_capacity,
            seed: r.seed,
        }
    }

    pub fn matrix_rank(&self) -> MatrixRankConfig {
        MatrixRankConfig {
            tolerance: self.ranking.matrix_tolerance,
            max_iterations: self.ranking.matrix_max_iterations,
        }
    }
}
