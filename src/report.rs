//! Probe report
//!
//! The end product of a run: bucket contents, the selection, and the
//! comma-joined persistent-peer list. Rendering is plain text for operators
//! or JSON for scripts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::probe::Classification;
use crate::types::Peer;

/// Outcome of one probe run
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    /// When the run finished
    pub generated_at: DateTime<Utc>,

    /// Latency threshold used for classification
    pub threshold_ms: u64,

    /// Peers reported by the node
    pub total: usize,

    /// Reachable within the threshold, fastest first
    pub fast: Vec<Peer>,

    /// Reachable, but slower than the threshold
    pub slow: Vec<Peer>,

    /// Probe failed or was cancelled
    pub unreachable: Vec<Peer>,

    /// Prefix of `fast`, at most `n` long
    pub selected: Vec<Peer>,
}

impl ProbeReport {
    pub fn new(classification: Classification, max_peers: usize, threshold_ms: u64) -> Self {
        let selected = classification.select(max_peers);
        let total = classification.total();

        Self {
            generated_at: Utc::now(),
            threshold_ms,
            total,
            fast: classification.fast,
            slow: classification.slow,
            unreachable: classification.unreachable,
            selected,
        }
    }

    /// Selected addresses
    pub fn selected_addresses(&self) -> Vec<&str> {
        self.selected.iter().map(|p| p.address.as_str()).collect()
    }

    /// Selected addresses joined for a persistent-peers setting
    pub fn persistent_peers(&self) -> String {
        self.selected_addresses().join(",")
    }

    /// Operator-facing summary, one line per entry
    pub fn render_text(&self) -> String {
        let mut lines = Vec::with_capacity(self.selected.len() + 6);

        for (idx, peer) in self.selected.iter().enumerate() {
            let latency = peer.latency.map(|l| l.as_millis()).unwrap_or_default();
            lines.push(format!("#{} {} latency: {}ms", idx + 1, peer.address, latency));
        }

        lines.push(format!("total active peers: {}", self.total));
        lines.push(format!("unreachable peers: {}", self.unreachable.len()));
        lines.push(format!("slow peers: {}", self.slow.len()));
        lines.push(format!("fast peers: {}", self.fast.len()));
        lines.push(format!("selected peers: {}", self.selected.len()));
        lines.push(self.persistent_peers());

        lines.join("\n")
    }

    /// Pretty JSON of the whole report
    pub fn render_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
