//! Peer Speed Classifier & Selector
//!
//! Every peer is probed once and lands in exactly one bucket:
//!
//! ```text
//! Unprobed ──probe──┬── connected, latency <= threshold ──→ Fast
//!                   ├── connected, latency >  threshold ──→ Slow
//!                   └── failed / cancelled ─────────────→ Unreachable
//! ```
//!
//! Probes run at most `concurrency` at a time. Outcomes are collected in input
//! order and bucketed only once every probe has settled, so the result does
//! not depend on which probe finished first.

use futures::stream::{self, StreamExt};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::Prober;
use crate::config::SelectionParams;
use crate::types::{Bucket, Peer, PeerSet, ProbeFailure, ProbeOutcome};

/// Bucket for a probe outcome
pub fn classify(outcome: &ProbeOutcome, threshold: Duration) -> Bucket {
    match outcome {
        ProbeOutcome::Connected(latency) if *latency > threshold => Bucket::Slow,
        ProbeOutcome::Connected(_) => Bucket::Fast,
        ProbeOutcome::Failed(_) => Bucket::Unreachable,
    }
}

/// Peers split into disjoint buckets, each in classification order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub fast: Vec<Peer>,
    pub slow: Vec<Peer>,
    pub unreachable: Vec<Peer>,
}

impl Classification {
    /// Record a probed peer and return the bucket it went to
    pub fn push(&mut self, mut peer: Peer, outcome: &ProbeOutcome, threshold: Duration) -> Bucket {
        peer.latency = outcome.latency();

        let bucket = classify(outcome, threshold);
        match bucket {
            Bucket::Fast => self.fast.push(peer),
            Bucket::Slow => self.slow.push(peer),
            Bucket::Unreachable => self.unreachable.push(peer),
        }
        bucket
    }

    /// Order the fast bucket by ascending latency
    ///
    /// `sort_by_key` is stable: equal latencies keep classification order.
    pub fn sort_fast(&mut self) {
        self.fast.sort_by_key(|peer| peer.latency.unwrap_or(Duration::ZERO));
    }

    /// First `n` peers of the fast bucket (fewer if there are not enough)
    pub fn select(&self, n: usize) -> Vec<Peer> {
        self.fast.iter().take(n).cloned().collect()
    }

    /// Number of peers across all buckets
    pub fn total(&self) -> usize {
        self.fast.len() + self.slow.len() + self.unreachable.len()
    }
}

/// Probe one peer, giving up at the umbrella deadline
async fn probe_peer(prober: &dyn Prober, peer: &Peer, deadline: Option<Instant>) -> ProbeOutcome {
    if !peer.is_probeable() {
        return ProbeOutcome::Failed(ProbeFailure::EmptyAddress);
    }

    let Some(deadline) = deadline else {
        return prober.probe(&peer.address).await;
    };

    if Instant::now() >= deadline {
        return ProbeOutcome::Failed(ProbeFailure::Cancelled);
    }

    tokio::select! {
        outcome = prober.probe(&peer.address) => outcome,
        _ = tokio::time::sleep_until(deadline) => ProbeOutcome::Failed(ProbeFailure::Cancelled),
    }
}

/// Probe every peer and bucket the results
///
/// Individual probe failures never fail the call: they end up in
/// `unreachable`. The fast bucket is returned sorted.
pub async fn classify_peers(
    peers: PeerSet,
    prober: &dyn Prober,
    params: &SelectionParams,
) -> Classification {
    let deadline = params.deadline.map(|d| Instant::now() + d);
    let concurrency = params.concurrency.max(1);

    debug!(
        "Probing {} peers ({} at a time, threshold {}ms)",
        peers.len(),
        concurrency,
        params.threshold.as_millis()
    );

    // `buffered` yields in input order
    let outcomes: Vec<(Peer, ProbeOutcome)> = stream::iter(peers)
        .map(move |peer| async move {
            let outcome = probe_peer(prober, &peer, deadline).await;
            (peer, outcome)
        })
        .buffered(concurrency)
        .collect()
        .await;

    let mut classification = Classification::default();
    for (peer, outcome) in outcomes {
        let address = peer.address.clone();
        let bucket = classification.push(peer, &outcome, params.threshold);
        debug!("{} → {}", address, bucket);

        match bucket {
            Bucket::Fast => {
                if let Some(latency) = outcome.latency() {
                    info!("   {} connected in {}ms", address, latency.as_millis());
                }
            }
            Bucket::Slow => {
                if let Some(latency) = outcome.latency() {
                    info!("🐢 Too slow: {} ({}ms)", address, latency.as_millis());
                }
            }
            Bucket::Unreachable => {
                if let ProbeOutcome::Failed(failure) = &outcome {
                    warn!("Failed to check speed of '{}': {}", address, failure);
                }
            }
        }
    }

    classification.sort_fast();
    classification
}
