//! Concurrent depth-first subnetwork detection
//!
//! Every neighbour expansion runs as its own tokio task. Tasks share one
//! discovered set behind a plain mutex, taken per lookup and never across an
//! await. Results flow back through one bounded channel per remaining budget
//! ("stage"): a task with budget `b` reports on stage `b` and collects its
//! children's reports from stage `b - 1`. Collectors on the same stage take
//! turns on its receiver, and a collector accepts any report on its stage,
//! not only its own children's. Per stage the number of reports sent equals
//! the number awaited, so every collector eventually gets its count.
//!
//! The completeness flag is a majority vote over all collected reports. It is
//! an approximation: the discovered set is reliable, the flag is not.
//!
//! A task that panics is reported as an incomplete vote on its stage so its
//! parent stops waiting, and the whole run then fails with [`AlgoError::Task`].

use super::common::{GraphView, NodeId};
use super::traversal::SubNetwork;
use super::{AlgoError, AlgoResult};
use futures::future::{BoxFuture, FutureExt};
use rustc_hash::FxHashSet;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tracing::{debug, warn};

/// Concurrent DFS configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConcurrentDfsConfig {
    /// Buffer size of each per-budget report channel
    pub stage_capacity: usize,
}

impl Default for ConcurrentDfsConfig {
    fn default() -> Self {
        Self { stage_capacity: 10 }
    }
}

struct Stage {
    tx: mpsc::Sender<bool>,
    rx: AsyncMutex<mpsc::Receiver<bool>>,
}

struct Exploration {
    view: Arc<GraphView>,
    discovered: Mutex<FxHashSet<usize>>,
    stages: Vec<Stage>,
    complete_votes: AtomicUsize,
    incomplete_votes: AtomicUsize,
    panicked: AtomicBool,
}

impl Exploration {
    /// Mark a node discovered, returning `true` if it was new
    fn discover(&self, idx: usize) -> bool {
        self.discovered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(idx)
    }

    async fn report(&self, stage: usize, vote: bool) {
        // Both ends live in `self`, so the channel cannot be closed here
        if self.stages[stage].tx.send(vote).await.is_err() {
            warn!(stage, "report channel closed");
        }
    }

    async fn collect(&self, stage: usize, count: usize) {
        let mut rx = self.stages[stage].rx.lock().await;
        for _ in 0..count {
            match rx.recv().await {
                Some(true) => {
                    self.complete_votes.fetch_add(1, Ordering::Relaxed);
                }
                Some(false) => {
                    self.incomplete_votes.fetch_add(1, Ordering::Relaxed);
                }
                None => {
                    warn!(stage, "report channel closed while collecting");
                    return;
                }
            }
        }
    }

    /// Fail every send still pending on a stage so no task outlives the run
    async fn close_stages(&self) {
        for stage in &self.stages {
            stage.rx.lock().await.close();
        }
    }

    fn is_complete(&self) -> bool {
        let yes = self.complete_votes.load(Ordering::Relaxed);
        let no = self.incomplete_votes.load(Ordering::Relaxed);
        yes + no == 0 || yes > no
    }
}

fn spawn_explore(ctx: &Arc<Exploration>, node: usize, budget: usize) {
    let ctx = Arc::clone(ctx);
    tokio::spawn(async move {
        let run = AssertUnwindSafe(explore(Arc::clone(&ctx), node, budget)).catch_unwind();
        if run.await.is_err() {
            warn!(node, budget, "exploration task panicked");
            ctx.panicked.store(true, Ordering::Relaxed);
            ctx.report(budget, false).await;
        }
    });
}

fn explore(ctx: Arc<Exploration>, node: usize, budget: usize) -> BoxFuture<'static, ()> {
    async move {
        if budget == 0 {
            ctx.report(0, false).await;
            return;
        }

        let mut children = 0;
        for &next in ctx.view.neighbors(node) {
            if ctx.discover(next) && !ctx.view.is_dead_end(next) {
                children += 1;
                spawn_explore(&ctx, next, budget - 1);
            }
        }

        if children > 0 {
            ctx.collect(budget - 1, children).await;
        }
        ctx.report(budget, true).await;
    }
    .boxed()
}

/// Concurrent depth-first detection from `start` with recursion budget `max_n`.
///
/// The discovered set is always a subset of the start node's component and
/// equals it whenever the budget exceeds the component's depth. The
/// `complete` flag is a majority vote (see module docs); a run that collects
/// no reports counts as complete. With `max_n == 0` only the start node is
/// returned, complete iff it has no neighbours.
///
/// Fails with [`AlgoError::Task`] if any exploration task panicked.
pub async fn detect_depth_first_concurrent(
    view: Arc<GraphView>,
    start: NodeId,
    max_n: usize,
    config: &ConcurrentDfsConfig,
) -> AlgoResult<SubNetwork> {
    if config.stage_capacity == 0 {
        return Err(AlgoError::InvalidParameter(
            "stage_capacity must be at least 1".to_string(),
        ));
    }
    let start_idx = view.index_of(start).ok_or(AlgoError::UnknownNode(start))?;

    if max_n == 0 {
        return Ok(SubNetwork {
            nodes: std::iter::once(start).collect(),
            complete: view.degree(start_idx) == 0,
        });
    }

    let stages = (0..max_n)
        .map(|_| {
            let (tx, rx) = mpsc::channel(config.stage_capacity);
            Stage {
                tx,
                rx: AsyncMutex::new(rx),
            }
        })
        .collect();

    let ctx = Arc::new(Exploration {
        view: Arc::clone(&view),
        discovered: Mutex::new(FxHashSet::default()),
        stages,
        complete_votes: AtomicUsize::new(0),
        incomplete_votes: AtomicUsize::new(0),
        panicked: AtomicBool::new(false),
    });
    ctx.discover(start_idx);

    // The start node expands every new neighbour, dead ends included
    let mut children = 0;
    for &next in view.neighbors(start_idx) {
        if ctx.discover(next) {
            children += 1;
            spawn_explore(&ctx, next, max_n - 1);
        }
    }
    ctx.collect(max_n - 1, children).await;
    ctx.close_stages().await;

    if ctx.panicked.load(Ordering::Relaxed) {
        return Err(AlgoError::Task(format!(
            "exploration from node {} panicked",
            start
        )));
    }

    let nodes = {
        let discovered = ctx.discovered.lock().unwrap_or_else(PoisonError::into_inner);
        view.to_node_set(discovered.iter())
    };
    let complete = ctx.is_complete();

    debug!(
        start,
        max_n,
        discovered = nodes.len(),
        complete_votes = ctx.complete_votes.load(Ordering::Relaxed),
        incomplete_votes = ctx.incomplete_votes.load(Ordering::Relaxed),
        "concurrent detection finished"
    );

    Ok(SubNetwork { nodes, complete })
}
