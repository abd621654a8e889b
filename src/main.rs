use anyhow::{Context, Result};
use filing_nets::algo::{
    build_view, crunch_network, crunch_network_wandering, degree_rank,
    detect_depth_first_concurrent, matrix_rank, partition_keys, random_walk_rank, ranks_by_key,
};
use filing_nets::{AnalysisConfig, Filing, GraphStorage, Network, RocksStorage};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

const SAMPLE_FILINGS: &str = include_str!("../data/sample_filings.json");

/// Matrix ranking keeps n x n doubles; skip it beyond this
const MATRIX_RANK_MAX_NODES: usize = 2_000;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("Filing Nets v{}", filing_nets::version());
    println!("==========================================");

    let config = match std::env::var_os("FILING_NETS_CONFIG") {
        Some(path) => AnalysisConfig::from_path(&path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => AnalysisConfig::default(),
    };

    let network = build_network()?;
    println!("\n{}", network.summary());

    analyse_connectivity(&network, &config).await?;
    analyse_ranks(&network, &config).await?;

    if let Some(path) = &config.storage.path {
        round_trip(&network, path, config.storage.batch_size)?;
    }
    Ok(())
}

fn build_network() -> Result<Network> {
    let mut filings: Vec<Filing> =
        serde_json::from_str(SAMPLE_FILINGS).context("Failed to decode sample filings")?;
    for filing in &mut filings {
        filing.clean();
    }

    let mut network = Network::new("sample");
    let stats = network.ingest(&filings);
    println!(
        "Ingested {} filings: {} nodes created, {} merged, {} edges created",
        stats.records, stats.nodes_created, stats.nodes_merged, stats.edges_created
    );
    let amended = network
        .edges()
        .filter(|edge| edge.get_property("amendment_type").is_some_and(|v| !v.is_blank()))
        .count();
    println!("  {} edges come from amended filings", amended);
    Ok(network)
}

async fn analyse_connectivity(network: &Network, config: &AnalysisConfig) -> Result<()> {
    println!("\n=== Sub-networks ===");
    let view = Arc::new(build_view(network));

    let partition = crunch_network(&view, &config.crunch()).context("Partitioning failed")?;
    for (idx, keys) in partition_keys(network, &partition).iter().enumerate() {
        println!("  #{:<3} {:>3} nodes: {}", idx, keys.len(), keys.join(", "));
    }
    for (size, members) in partition.size_histogram() {
        println!("  size {:>3}: {} sub-network(s)", size, members.len());
    }

    let wandering = crunch_network_wandering(Arc::clone(&view), &config.wandering()).await?;
    info!(
        agrees = wandering.len() == partition.len(),
        "concurrent wandering partition computed"
    );

    if let Some(first) = network.nodes().next() {
        let sub = detect_depth_first_concurrent(
            Arc::clone(&view),
            first.id.as_u64(),
            config.traversal.budget,
            &config.concurrent_dfs(),
        )
        .await?;
        println!(
            "  concurrent DFS from {}: {} nodes (completeness estimate: {})",
            first.key,
            sub.len(),
            sub.complete
        );
    }
    Ok(())
}

async fn analyse_ranks(network: &Network, config: &AnalysisConfig) -> Result<()> {
    println!("\n=== Ranks ===");
    let view = Arc::new(build_view(network));

    print_top("degree", network, &degree_rank(&view));

    if view.node_count <= MATRIX_RANK_MAX_NODES {
        let ranks = matrix_rank(&view, &config.matrix_rank()).context("Matrix ranking failed")?;
        print_top("matrix", network, &ranks);
    }

    let ranks = random_walk_rank(Arc::clone(&view), &config.random_walk(), None).await?;
    print_top("random walk", network, &ranks);
    Ok(())
}

fn print_top(label: &str, network: &Network, ranks: &HashMap<u64, f64>) {
    println!("  {}:", label);
    for (key, weight) in ranks_by_key(network, ranks).iter().take(5) {
        let city = network
            .node_by_key(key)
            .and_then(|node| node.get_property("city"))
            .and_then(|v| v.as_string())
            .unwrap_or("-");
        println!("    {:<40} {:<16} {:.4}", key, city, weight);
    }
}

fn round_trip(network: &Network, path: &std::path::Path, batch_size: usize) -> Result<()> {
    println!("\n=== Persistence ===");
    let storage = RocksStorage::open(path, batch_size).context("Failed to open storage")?;
    storage.save(network)?;
    let reloaded = storage.load(network.name())?;
    let report = network.compare(&reloaded);
    println!(
        "  reloaded {} nodes, {} edges; identical: {}",
        reloaded.node_count(),
        reloaded.edge_count(),
        report.is_identical()
    );
    Ok(())
}
