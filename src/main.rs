//! KratOs Peer Probe CLI
//!
//! Asks a node for its active peers, measures how fast each one accepts a
//! TCP connection, and prints the fastest ones as a comma-separated list
//! ready to paste into a persistent-peers setting.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use kratos_peer_probe::config::ProbeConfig;
use kratos_peer_probe::pipeline;

/// KratOs Peer Probe - pick the fastest peers of a node
#[derive(Parser, Debug)]
#[command(name = "kratos-peer-probe")]
#[command(author = "KratOs Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Probe a node's active peers and list the fastest ones", long_about = None)]
struct Args {
    /// Node JSON-RPC endpoint [default: http://localhost:3030]
    #[arg(long)]
    rpc: Option<String>,

    /// Maximum number of peers to select [default: 30]
    #[arg(long, allow_negative_numbers = true)]
    n: Option<i64>,

    /// Latency threshold in milliseconds; slower peers are not selected [default: 1000]
    #[arg(long, allow_negative_numbers = true)]
    ms: Option<i64>,

    /// Connect timeout for each probe, in milliseconds [default: 3000]
    #[arg(long)]
    probe_timeout_ms: Option<u64>,

    /// Deadline for the network_info request, in seconds [default: 3]
    #[arg(long)]
    fetch_timeout_secs: Option<u64>,

    /// Number of probes in flight at once [default: 1]
    #[arg(long)]
    concurrency: Option<usize>,

    /// Deadline for the whole probing phase, in seconds
    #[arg(long)]
    deadline_secs: Option<u64>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "KRATOS_LOG")]
    log_level: String,
}

impl Args {
    /// Configuration file named with `--config`, or defaults when none is given
    fn base_config(&self) -> anyhow::Result<ProbeConfig> {
        match &self.config {
            Some(path) if !path.exists() => {
                anyhow::bail!("config file {:?} not found", path)
            }
            Some(path) => ProbeConfig::load(path),
            None => Ok(ProbeConfig::default()),
        }
    }

    /// Apply flags given on the command line over the base configuration
    fn apply(&self, mut config: ProbeConfig) -> ProbeConfig {
        if let Some(rpc) = &self.rpc {
            config = config.with_rpc_url(rpc.clone());
        }
        if let Some(n) = self.n {
            config = config.with_max_peers(n);
        }
        if let Some(ms) = self.ms {
            config = config.with_latency_threshold_ms(ms);
        }
        if let Some(ms) = self.probe_timeout_ms {
            config = config.with_probe_timeout_ms(ms);
        }
        if let Some(secs) = self.fetch_timeout_secs {
            config = config.with_fetch_timeout_secs(secs);
        }
        if let Some(concurrency) = self.concurrency {
            config = config.with_concurrency(concurrency);
        }
        if self.deadline_secs.is_some() {
            config = config.with_deadline_secs(self.deadline_secs);
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr, stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = args.apply(args.base_config()?);

    info!("🌐 KratOs Peer Probe v{}", env!("CARGO_PKG_VERSION"));
    info!("   RPC: {}", config.rpc_url);
    info!(
        "   Selecting up to {} peers under {}ms",
        config.max_peers, config.latency_threshold_ms
    );

    let report = pipeline::run_with_rpc(&config).await?;

    if args.json {
        println!("{}", report.render_json()?);
    } else {
        println!("{}", report.render_text());
    }

    Ok(())
}
