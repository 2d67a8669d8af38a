//! ferry - run a TOML-described pipeline until interrupted

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ferry_components::default_registry;
use ferry_pipeline::PipelineBuilder;
use ferry_topology::Topology;

#[derive(Parser, Debug)]
#[command(name = "ferry", version, about = "Message-passing pipeline runtime")]
struct Args {
    /// Path to the TOML topology description
    #[arg(short, long, default_value = "ferry.toml")]
    config: PathBuf,

    /// Default log filter; the FERRY_LOG env var takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Validate the topology and exit without running
    #[arg(long)]
    check: bool,
}

fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_env("FERRY_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let topology = Topology::from_path(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    if args.check {
        topology.validate().context("topology is invalid")?;
        println!("ok: {} node(s)", topology.len());
        return Ok(());
    }

    let registry = default_registry();
    let pipeline = PipelineBuilder::new()
        .build(&topology, &registry)
        .context("building pipeline")?;
    tracing::info!(
        config = %args.config.display(),
        chains = pipeline.chain_count(),
        sinks = pipeline.sink_count(),
        "starting"
    );

    let handle = pipeline.start();
    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    tracing::info!("interrupt received, shutting down");

    handle.stop().await.context("graceful stop failed")?;
    Ok(())
}
