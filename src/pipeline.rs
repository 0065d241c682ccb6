//! Probe pipeline
//!
//! Fetch → probe and classify → select. Configuration errors are caught
//! before any I/O; a failed fetch ends the run before any probe is sent.

use tracing::info;

use crate::config::ProbeConfig;
use crate::error::ProbeError;
use crate::probe::{classify_peers, Prober, TcpProber};
use crate::report::ProbeReport;
use crate::rpc::{PeerDirectory, RpcClient};

/// Run one probe pass against the given directory and prober
pub async fn run(
    config: &ProbeConfig,
    directory: &dyn PeerDirectory,
    prober: &dyn Prober,
) -> Result<ProbeReport, ProbeError> {
    let params = config.validate()?;

    let peers = directory.active_peers().await?;
    info!("🔎 Probing {} active peers", peers.len());

    let classification = classify_peers(peers, prober, &params).await;

    let report = ProbeReport::new(
        classification,
        params.max_peers,
        params.threshold.as_millis() as u64,
    );

    info!(
        "📊 {} fast, {} slow, {} unreachable, {} selected",
        report.fast.len(),
        report.slow.len(),
        report.unreachable.len(),
        report.selected.len()
    );

    Ok(report)
}

/// Run against the node RPC with TCP probes, as configured
pub async fn run_with_rpc(config: &ProbeConfig) -> Result<ProbeReport, ProbeError> {
    let params = config.validate()?;

    let directory = RpcClient::new(&config.rpc_url, params.fetch_timeout)?;
    let prober = TcpProber::new(params.probe_timeout);

    run(config, &directory, &prober).await
}
