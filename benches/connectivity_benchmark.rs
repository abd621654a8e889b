use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use filing_nets::algo::{
    build_view, crunch_network, crunch_network_wandering, degree_rank,
    detect_depth_first_concurrent, random_walk_rank, ConcurrentDfsConfig, CrunchConfig, GraphView,
    RandomWalkConfig, Traversal, WanderingConfig,
};
use filing_nets::graph::{EdgeKind, Network, NodeKind, SimpleEdge, SimpleNode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Clusters of `cluster` participants with random co-filings inside each cluster
fn clustered_network(size: usize, cluster: usize) -> Network {
    let mut rng = StdRng::seed_from_u64(7);
    let mut network = Network::new("bench");
    for i in 0..size {
        network.add_node(&SimpleNode::new(format!("p{}", i), NodeKind::Receiver));
    }
    for (record, i) in (0..size).enumerate() {
        let base = i - i % cluster;
        let j = base + rng.gen_range(0..cluster.min(size - base));
        let edge = SimpleEdge::between(format!("p{}", i), format!("p{}", j), &record.to_string(), EdgeKind::RR);
        let _ = network.add_edge(&edge);
    }
    network
}

fn view(size: usize) -> Arc<GraphView> {
    Arc::new(build_view(&clustered_network(size, 50)))
}

/// Benchmark network construction through declarations
fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_network");

    for size in [1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| criterion::black_box(clustered_network(size, 50).edge_count()));
        });
    }
    group.finish();
}

/// Benchmark whole-graph partitioning per traversal
fn bench_crunch(c: &mut Criterion) {
    let mut group = c.benchmark_group("crunch_network");
    let rt = tokio::runtime::Runtime::new().unwrap();

    for size in [1_000, 10_000].iter() {
        let view = view(*size);
        for traversal in [Traversal::DepthFirst, Traversal::Wanderer, Traversal::WidthFirst] {
            let config = CrunchConfig {
                traversal,
                ..CrunchConfig::default()
            };
            group.bench_with_input(BenchmarkId::new(format!("{:?}", traversal), size), &view, |b, view| {
                b.iter(|| criterion::black_box(crunch_network(view, &config).unwrap().len()));
            });
        }
        group.bench_with_input(BenchmarkId::new("ConcurrentWandering", size), &view, |b, view| {
            b.iter(|| {
                let partition = rt
                    .block_on(crunch_network_wandering(Arc::clone(view), &WanderingConfig::default()))
                    .unwrap();
                criterion::black_box(partition.len())
            });
        });
    }
    group.finish();
}

/// Benchmark single-component detection, sequential against concurrent
fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_component");
    let rt = tokio::runtime::Runtime::new().unwrap();
    let view = view(10_000);

    group.bench_function("DepthFirst", |b| {
        b.iter(|| criterion::black_box(Traversal::DepthFirst.detect(&view, 0, 100).unwrap().len()));
    });
    group.bench_function("ConcurrentDepthFirst", |b| {
        b.iter(|| {
            let sub = rt
                .block_on(detect_depth_first_concurrent(
                    Arc::clone(&view),
                    0,
                    100,
                    &ConcurrentDfsConfig::default(),
                ))
                .unwrap();
            criterion::black_box(sub.len())
        });
    });
    group.finish();
}

/// Benchmark ranking
fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");
    let rt = tokio::runtime::Runtime::new().unwrap();
    let view = view(10_000);
    let config = RandomWalkConfig {
        steps: 50_000,
        seed: Some(1),
        ..RandomWalkConfig::default()
    };

    group.bench_function("degree", |b| {
        b.iter(|| criterion::black_box(degree_rank(&view).len()));
    });
    group.bench_function("random_walk", |b| {
        b.iter(|| {
            let ranks = rt
                .block_on(random_walk_rank(Arc::clone(&view), &config, None))
                .unwrap();
            criterion::black_box(ranks.len())
        });
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_crunch, bench_detect, bench_rank);
criterion_main!(benches);
