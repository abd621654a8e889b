//! Monte-Carlo random-walk ranking
//!
//! Walkers run on the blocking pool, each with its own RNG. Visits are
//! counted in chunks that are shipped to a single aggregator over a bounded
//! channel; completion goes over a second channel. The aggregator never
//! assumes an order between the two: it keeps merging until every walker has
//! signalled, then drains whatever chunks are still buffered.

use super::common::{GraphView, NodeId};
use super::{AlgoError, AlgoResult};
use futures::future::try_join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Random-walk ranking configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RandomWalkConfig {
    /// Number of concurrent walkers
    pub walkers: usize,
    /// Steps per walker
    pub steps: usize,
    /// Probability of jumping back to a seed node at each step
    pub restart_probability: f64,
    /// Steps counted locally before a chunk is sent to the aggregator
    pub chunk_size: usize,
    /// Buffered chunks before walkers block
    pub channel_capacity: usize,
    /// Base RNG seed; walker `i` uses `seed + i`. Entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for RandomWalkConfig {
    fn default() -> Self {
        Self {
            walkers: 4,
            steps: 100_000,
            restart_probability: 0.15,
            chunk_size: 1000,
            channel_capacity: 64,
            seed: None,
        }
    }
}

impl RandomWalkConfig {
    fn validate(&self) -> AlgoResult<()> {
        if self.walkers == 0 || self.steps == 0 || self.chunk_size == 0 || self.channel_capacity == 0 {
            return Err(AlgoError::InvalidParameter(
                "walkers, steps, chunk_size and channel_capacity must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.restart_probability) {
            return Err(AlgoError::InvalidParameter(format!(
                "restart_probability must lie in [0, 1], got {}",
                self.restart_probability
            )));
        }
        Ok(())
    }
}

/// Visit counts of one chunk
#[derive(Debug, Default)]
struct Counter {
    counts: FxHashMap<usize, u64>,
    total: u64,
}

impl Counter {
    fn add(&mut self, node: usize) {
        *self.counts.entry(node).or_insert(0) += 1;
        self.total += 1;
    }
}

struct Walker {
    view: Arc<GraphView>,
    seeds: Arc<Vec<usize>>,
    restart_probability: f64,
    state: usize,
    rng: StdRng,
}

impl Walker {
    fn restart(&mut self) -> usize {
        self.seeds[self.rng.gen_range(0..self.seeds.len())]
    }

    /// Move one step. A node without edges always restarts.
    fn next(&mut self) -> usize {
        let degree = self.view.degree(self.state);
        self.state = if degree == 0 || self.rng.gen_bool(self.restart_probability) {
            self.restart()
        } else {
            self.view.neighbors(self.state)[self.rng.gen_range(0..degree)]
        };
        self.state
    }

    fn walk(
        mut self,
        id: usize,
        steps: usize,
        chunk_size: usize,
        chunks: mpsc::Sender<Counter>,
        done: mpsc::Sender<usize>,
    ) {
        let mut remaining = steps;
        while remaining > 0 {
            let len = remaining.min(chunk_size);
            let mut counter = Counter::default();
            for _ in 0..len {
                let node = self.next();
                counter.add(node);
            }
            remaining -= len;
            if chunks.blocking_send(counter).is_err() {
                return;
            }
        }
        let _ = done.blocking_send(id);
    }
}

/// Rank nodes by the share of random-walk steps spent on them.
///
/// `seeds` restricts the restart targets (personalised ranking); `None`
/// means every node. The result covers every node of the view, unvisited
/// ones with weight 0, and sums to 1.
pub async fn random_walk_rank(
    view: Arc<GraphView>,
    config: &RandomWalkConfig,
    seeds: Option<Vec<NodeId>>,
) -> AlgoResult<HashMap<NodeId, f64>> {
    config.validate()?;
    if view.node_count == 0 {
        return Ok(HashMap::new());
    }

    let seeds: Vec<usize> = match seeds {
        None => (0..view.node_count).collect(),
        Some(ids) => ids
            .into_iter()
            .map(|id| view.index_of(id).ok_or(AlgoError::UnknownNode(id)))
            .collect::<AlgoResult<_>>()?,
    };
    if seeds.is_empty() {
        return Err(AlgoError::InvalidParameter("seed set is empty".to_string()));
    }
    let seeds = Arc::new(seeds);

    let (chunk_tx, mut chunk_rx) = mpsc::channel::<Counter>(config.channel_capacity);
    let (done_tx, mut done_rx) = mpsc::channel::<usize>(config.walkers);

    let mut handles = Vec::with_capacity(config.walkers);
    for id in 0..config.walkers {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id as u64)),
            None => StdRng::from_entropy(),
        };
        let state = seeds[rng.gen_range(0..seeds.len())];
        let walker = Walker {
            view: Arc::clone(&view),
            seeds: Arc::clone(&seeds),
            restart_probability: config.restart_probability,
            state,
            rng,
        };
        let (steps, chunk_size) = (config.steps, config.chunk_size);
        let chunks = chunk_tx.clone();
        let done = done_tx.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            walker.walk(id, steps, chunk_size, chunks, done)
        }));
    }
    drop(chunk_tx);
    drop(done_tx);

    let mut counts = vec![0u64; view.node_count];
    let mut total = 0u64;
    let mut merge = |counter: Counter| {
        for (node, n) in counter.counts {
            counts[node] += n;
        }
        total += counter.total;
    };

    let mut running = config.walkers;
    while running > 0 {
        tokio::select! {
            Some(counter) = chunk_rx.recv() => merge(counter),
            Some(id) = done_rx.recv() => {
                running -= 1;
                debug!(walker = id, running, "walker finished");
            }
            else => break,
        }
    }
    // Chunks sent before a done signal may still be buffered
    while let Some(counter) = chunk_rx.recv().await {
        merge(counter);
    }
    try_join_all(handles).await?;

    let expected = (config.walkers * config.steps) as u64;
    if total != expected {
        return Err(AlgoError::Task(format!(
            "aggregated {} steps, expected {}",
            total, expected
        )));
    }

    let total = total as f64;
    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(idx, n)| (view.index_to_node[idx], n as f64 / total))
        .collect())
}
