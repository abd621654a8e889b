//! Concurrent partitioning with cooperating wanderers
//!
//! A coordinator seeds up to `workers` wanderers on unowned nodes. Each worker
//! task expands `step_size` nodes, reports what it discovered, and waits for
//! an [`Order`]. The coordinator records the first reporter of every node as
//! its owner. When a report touches nodes owned by another live exploration
//! the two explorations are in the same component: one is aliased into the
//! other, told to yield its wanderer, and the survivor absorbs it at its next
//! report. A finished exploration has already enumerated its whole component,
//! so anything that collides with it is simply dropped.

use super::common::{GraphView, NodeSet};
use super::partition::Partition;
use super::wanderer::{WanderStep, Wanderer};
use super::{AlgoError, AlgoResult};
use futures::future::try_join_all;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Concurrent wandering configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WanderingConfig {
    /// Maximum number of wanderers exploring at the same time
    pub workers: usize,
    /// Nodes expanded by a wanderer between two reports
    pub step_size: usize,
}

impl Default for WanderingConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            step_size: 64,
        }
    }
}

/// Instruction sent to a worker after each of its reports
#[derive(Debug)]
pub enum Order {
    /// Keep wandering
    Continue,
    /// Merge these wanderers into yours, then keep wandering
    Absorb(Vec<Wanderer>),
    /// Hand your wanderer back to the coordinator and stop
    Yield,
    /// Component exhausted, stop
    Finish,
}

enum Report {
    Progress {
        worker: usize,
        increment: Vec<usize>,
        done: bool,
    },
    Yielded {
        worker: usize,
        wanderer: Wanderer,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerState {
    Running,
    /// Done, but wanderers promised to it are still in flight
    Held,
    Finished,
    /// Yielded into another exploration
    Gone,
}

async fn run_worker(
    id: usize,
    view: Arc<GraphView>,
    mut wanderer: Wanderer,
    step_size: usize,
    reports: mpsc::Sender<Report>,
    mut orders: mpsc::Receiver<Order>,
) {
    loop {
        let WanderStep { increment, done } = wanderer.step(&view, step_size);
        let progress = Report::Progress {
            worker: id,
            increment,
            done,
        };
        if reports.send(progress).await.is_err() {
            return;
        }

        match orders.recv().await {
            Some(Order::Continue) => {}
            Some(Order::Absorb(others)) => {
                for other in others {
                    wanderer.merge(other);
                }
            }
            Some(Order::Yield) => {
                let _ = reports
                    .send(Report::Yielded {
                        worker: id,
                        wanderer,
                    })
                    .await;
                return;
            }
            Some(Order::Finish) | None => return,
        }
    }
}

struct Coordinator {
    view: Arc<GraphView>,
    config: WanderingConfig,
    owner: Vec<Option<usize>>,
    alias: Vec<usize>,
    state: Vec<WorkerState>,
    orders: Vec<Option<mpsc::Sender<Order>>>,
    pending: Vec<Vec<Wanderer>>,
    /// Yields in flight towards each root
    awaiting: Vec<usize>,
    active: usize,
    next_seed: usize,
    reports_tx: mpsc::Sender<Report>,
    handles: Vec<JoinHandle<()>>,
}

impl Coordinator {
    fn resolve(&self, mut worker: usize) -> usize {
        while self.alias[worker] != worker {
            worker = self.alias[worker];
        }
        worker
    }

    async fn send(&self, worker: usize, order: Order) -> AlgoResult<()> {
        let tx = self.orders[worker]
            .as_ref()
            .ok_or_else(|| AlgoError::Inconsistent(format!("worker {} has no order channel", worker)))?;
        tx.send(order)
            .await
            .map_err(|_| AlgoError::Inconsistent(format!("worker {} hung up", worker)))
    }

    fn spawn_workers(&mut self) -> AlgoResult<()> {
        while self.active < self.config.workers {
            while self.next_seed < self.view.node_count && self.owner[self.next_seed].is_some() {
                self.next_seed += 1;
            }
            if self.next_seed >= self.view.node_count {
                break;
            }

            let seed = self.next_seed;
            let id = self.alias.len();
            let wanderer = Wanderer::new(&self.view, seed)?;
            self.owner[seed] = Some(id);
            self.alias.push(id);
            self.state.push(WorkerState::Running);
            self.pending.push(Vec::new());
            self.awaiting.push(0);

            // One order per report, so a single slot never fills up
            let (tx, rx) = mpsc::channel(1);
            self.orders.push(Some(tx));
            self.handles.push(tokio::spawn(run_worker(
                id,
                Arc::clone(&self.view),
                wanderer,
                self.config.step_size,
                self.reports_tx.clone(),
                rx,
            )));
            self.active += 1;
            debug!(worker = id, seed, "wanderer seeded");
        }
        Ok(())
    }

    /// Alias root `from` into root `to`, moving everything owed to it
    async fn redirect(&mut self, from: usize, to: usize) -> AlgoResult<()> {
        self.alias[from] = to;
        let moved = std::mem::take(&mut self.pending[from]);
        if self.state[to] != WorkerState::Finished {
            self.pending[to].extend(moved);
        }
        let owed = std::mem::take(&mut self.awaiting[from]);
        self.awaiting[to] += owed;

        if self.state[from] == WorkerState::Held {
            self.state[from] = WorkerState::Running;
            self.awaiting[to] += 1;
            self.send(from, Order::Yield).await?;
        }
        debug!(from, to, "explorations merged");
        Ok(())
    }

    async fn on_progress(&mut self, worker: usize, increment: Vec<usize>, done: bool) -> AlgoResult<()> {
        let me = self.resolve(worker);

        let mut colliding = Vec::new();
        for node in increment {
            let current = self.owner[node];
            match current {
                None => self.owner[node] = Some(worker),
                Some(other) => {
                    let root = self.resolve(other);
                    if root != me && !colliding.contains(&root) {
                        colliding.push(root);
                    }
                }
            }
        }

        if !colliding.is_empty() {
            let roots: Vec<usize> = std::iter::once(me).chain(colliding).collect();
            let target = roots
                .iter()
                .copied()
                .find(|&root| self.state[root] == WorkerState::Finished)
                .unwrap_or(me);
            for root in roots {
                if root != target {
                    self.redirect(root, target).await?;
                }
            }
        }

        let root = self.resolve(worker);
        if root != worker {
            self.awaiting[root] += 1;
            self.send(worker, Order::Yield).await
        } else if !self.pending[worker].is_empty() {
            let absorbed = std::mem::take(&mut self.pending[worker]);
            self.send(worker, Order::Absorb(absorbed)).await
        } else if done {
            if self.awaiting[worker] > 0 {
                self.state[worker] = WorkerState::Held;
                return Ok(());
            }
            self.state[worker] = WorkerState::Finished;
            self.send(worker, Order::Finish).await?;
            self.orders[worker] = None;
            self.active -= 1;
            self.spawn_workers()
        } else {
            self.send(worker, Order::Continue).await
        }
    }

    async fn on_yielded(&mut self, worker: usize, wanderer: Wanderer) -> AlgoResult<()> {
        self.state[worker] = WorkerState::Gone;
        self.orders[worker] = None;
        self.active -= 1;

        let root = self.resolve(worker);
        if self.awaiting[root] == 0 {
            return Err(AlgoError::Inconsistent(format!(
                "unexpected wanderer from worker {} for root {}",
                worker, root
            )));
        }
        self.awaiting[root] -= 1;

        match self.state[root] {
            WorkerState::Finished => {}
            WorkerState::Running => self.pending[root].push(wanderer),
            WorkerState::Held => {
                self.state[root] = WorkerState::Running;
                let mut absorbed = std::mem::take(&mut self.pending[root]);
                absorbed.push(wanderer);
                self.send(root, Order::Absorb(absorbed)).await?;
            }
            WorkerState::Gone => {
                return Err(AlgoError::Inconsistent(format!(
                    "root {} has already yielded",
                    root
                )))
            }
        }
        self.spawn_workers()
    }

    fn into_partition(self) -> AlgoResult<Partition> {
        let mut index_of_root: FxHashMap<usize, usize> = FxHashMap::default();
        let mut sub_networks: Vec<NodeSet> = Vec::new();

        for (idx, &owner) in self.owner.iter().enumerate() {
            let owner = owner.ok_or_else(|| {
                AlgoError::Inconsistent(format!("node index {} was never discovered", idx))
            })?;
            let root = self.resolve(owner);
            let index = *index_of_root.entry(root).or_insert_with(|| {
                sub_networks.push(NodeSet::default());
                sub_networks.len() - 1
            });
            sub_networks[index].insert(self.view.index_to_node[idx]);
        }

        Ok(Partition::from_sub_networks(sub_networks))
    }
}

/// Partition the whole graph with concurrently running wanderers.
///
/// Components are numbered by their lowest view index, so the result is
/// identical to [`crunch_network`](super::partition::crunch_network) on the
/// same view. There is no step budget: every wanderer runs until its
/// component is exhausted or it is merged away.
pub async fn crunch_network_wandering(
    view: Arc<GraphView>,
    config: &WanderingConfig,
) -> AlgoResult<Partition> {
    if config.workers == 0 || config.step_size == 0 {
        return Err(AlgoError::InvalidParameter(format!(
            "workers and step_size must be at least 1, got {} and {}",
            config.workers, config.step_size
        )));
    }

    let (reports_tx, mut reports_rx) = mpsc::channel(config.workers * 2);
    let mut coordinator = Coordinator {
        owner: vec![None; view.node_count],
        view: Arc::clone(&view),
        config: config.clone(),
        alias: Vec::new(),
        state: Vec::new(),
        orders: Vec::new(),
        pending: Vec::new(),
        awaiting: Vec::new(),
        active: 0,
        next_seed: 0,
        reports_tx,
        handles: Vec::new(),
    };

    coordinator.spawn_workers()?;
    while coordinator.active > 0 {
        match reports_rx.recv().await {
            Some(Report::Progress {
                worker,
                increment,
                done,
            }) => coordinator.on_progress(worker, increment, done).await?,
            Some(Report::Yielded { worker, wanderer }) => {
                coordinator.on_yielded(worker, wanderer).await?
            }
            None => {
                return Err(AlgoError::Inconsistent(
                    "report channel closed with workers still active".to_string(),
                ))
            }
        }
    }

    let handles = std::mem::take(&mut coordinator.handles);
    let spawned = handles.len();
    try_join_all(handles).await?;

    let partition = coordinator.into_partition()?;
    info!(
        nodes = view.node_count,
        components = partition.len(),
        wanderers = spawned,
        "network crunched by wandering"
    );
    Ok(partition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::{crunch_network, CrunchConfig};

    fn tangled_view() -> GraphView {
        // A 40-node ring with chords, a 10-node star, a path, and loners
        let mut edges = Vec::new();
        for i in 0..40 {
            edges.push((i, (i + 1) % 40));
            if i % 7 == 0 {
                edges.push((i, (i + 13) % 40));
            }
        }
        for leaf in 41..50 {
            edges.push((40, leaf));
        }
        for i in 50..59 {
            edges.push((i, i + 1));
        }
        GraphView::from_edges(63, &edges)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_matches_sequential_partition() {
        let view = Arc::new(tangled_view());
        let expected = crunch_network(&view, &CrunchConfig::default()).unwrap();

        for (workers, step_size) in [(1, 1), (3, 2), (8, 5), (4, 64)] {
            let config = WanderingConfig { workers, step_size };
            let partition = crunch_network_wandering(Arc::clone(&view), &config)
                .await
                .unwrap();
            assert_eq!(partition, expected, "workers={} step_size={}", workers, step_size);
            assert!(partition.is_consistent(&view).unwrap());
        }
    }

    #[tokio::test]
    async fn test_isolated_nodes_and_empty_graph() {
        let view = Arc::new(GraphView::from_edges(5, &[]));
        let partition = crunch_network_wandering(view, &WanderingConfig::default())
            .await
            .unwrap();
        assert_eq!(partition.len(), 5);

        let empty = Arc::new(GraphView::from_edges(0, &[]));
        let partition = crunch_network_wandering(empty, &WanderingConfig::default())
            .await
            .unwrap();
        assert!(partition.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_zero_workers() {
        let view = Arc::new(GraphView::from_edges(2, &[(0, 1)]));
        let config = WanderingConfig {
            workers: 0,
            step_size: 4,
        };
        assert!(matches!(
            crunch_network_wandering(view, &config).await,
            Err(AlgoError::InvalidParameter(_))
        ));
    }
}
