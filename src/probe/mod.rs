//! Peer Probing Module
//!
//! Measures how long a plain TCP connect to a peer takes. The connection is
//! dropped as soon as it is established: no handshake, no payload.
//!
//! ## Outcomes
//!
//! - Connected within the timeout → latency recorded
//! - Refused, unresolvable or malformed address → transport failure
//! - Timer fired first → timed out
//! - Empty address → never dialed

pub mod classifier;

pub use classifier::{classify, classify_peers, Classification};

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tracing::debug;

use crate::config::DEFAULT_PROBE_TIMEOUT_MS;
use crate::types::{ProbeFailure, ProbeOutcome};

/// Measures connect latency to one address
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, address: &str) -> ProbeOutcome;
}

/// TCP connect prober
#[derive(Debug, Clone)]
pub struct TcpProber {
    timeout: Duration,
}

impl TcpProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for TcpProber {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS))
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, address: &str) -> ProbeOutcome {
        let address = address.trim();
        if address.is_empty() {
            return ProbeOutcome::Failed(ProbeFailure::EmptyAddress);
        }

        let start = Instant::now();
        let connect_result = tokio::time::timeout(self.timeout, TcpStream::connect(address)).await;

        match connect_result {
            Ok(Ok(stream)) => {
                let elapsed = start.elapsed();
                drop(stream);
                debug!("Connected to {} in {}ms", address, elapsed.as_millis());
                ProbeOutcome::Connected(elapsed)
            }
            Ok(Err(e)) => ProbeOutcome::Failed(ProbeFailure::Transport(format!(
                "Connection failed: {}",
                e
            ))),
            Err(_) => ProbeOutcome::Failed(ProbeFailure::TimedOut),
        }
    }
}
