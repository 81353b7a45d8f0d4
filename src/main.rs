//! waypath CLI: load a graph, cross-validate every backend, print timings
//!
//! ```bash
//! waypath graph.txt 5
//! ```
//!
//! Exits 1 on argument errors, unreadable input, or a cross-validation
//! mismatch.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use waypath::{load_graph, HarnessConfig, ValidationHarness};

#[derive(Debug, Parser)]
#[command(version, about = "Cross-validated single-source shortest paths")]
struct Args {
    /// Graph file: `vertex_count edge_count` header, then `from to` pairs
    graph_file: PathBuf,

    /// Number of test repetitions, each from a fresh random source vertex
    repetitions: usize,

    /// Abort any accelerated session that has not converged after this many
    /// seconds
    #[cfg(feature = "gpu")]
    #[arg(long)]
    deadline_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let graph = load_graph(&args.graph_file)
        .with_context(|| format!("loading {}", args.graph_file.display()))?;
    tracing::info!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        repetitions = args.repetitions,
        "graph loaded"
    );

    let config = HarnessConfig {
        repetitions: args.repetitions,
        ..Default::default()
    };
    #[cfg(feature = "gpu")]
    let config = HarnessConfig {
        run: waypath::RunOptions {
            deadline: args.deadline_secs.map(std::time::Duration::from_secs),
            max_passes: None,
        },
        ..config
    };

    let harness = ValidationHarness::new(config).await;
    let report = harness.run(&graph).await.context("cross-validation failed")?;

    println!("{report}");
    Ok(())
}
