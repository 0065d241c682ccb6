//! Peer Probe Configuration
//!
//! Every run is driven by an explicit `ProbeConfig` record. It can be loaded
//! from TOML, overridden from the CLI, and must pass `validate()` before any
//! network I/O happens.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ProbeError;

/// Default node RPC endpoint
pub const DEFAULT_RPC_URL: &str = "http://localhost:3030";

/// Default number of peers to select
pub const DEFAULT_MAX_PEERS: i64 = 30;

/// Default latency threshold between fast and slow (milliseconds)
pub const DEFAULT_LATENCY_THRESHOLD_MS: i64 = 1000;

/// Default per-probe connect timeout (milliseconds)
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 3000;

/// Default deadline for the directory fetch (seconds)
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 3;

/// Main configuration for a probe run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    // === Source ===

    /// Node JSON-RPC endpoint
    pub rpc_url: String,

    /// Deadline for the `network_info` request (seconds)
    pub fetch_timeout_secs: u64,

    // === Selection ===

    /// Maximum number of peers to select
    /// Signed so that a negative value is reported instead of wrapped
    pub max_peers: i64,

    /// Probes slower than this are classified slow (milliseconds)
    pub latency_threshold_ms: i64,

    // === Probing ===

    /// Connect timeout for a single probe (milliseconds)
    pub probe_timeout_ms: u64,

    /// Probes in flight at once (1 = sequential)
    pub concurrency: usize,

    /// Optional deadline for the whole probing phase (seconds)
    pub deadline_secs: Option<u64>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            max_peers: DEFAULT_MAX_PEERS,
            latency_threshold_ms: DEFAULT_LATENCY_THRESHOLD_MS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            concurrency: 1,
            deadline_secs: None,
        }
    }
}

/// Validated parameters consumed by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionParams {
    pub max_peers: usize,
    pub threshold: Duration,
    pub probe_timeout: Duration,
    pub fetch_timeout: Duration,
    pub concurrency: usize,
    pub deadline: Option<Duration>,
}

impl ProbeConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    // Builder-style methods for CLI overrides

    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = url.into();
        self
    }

    pub fn with_max_peers(mut self, n: i64) -> Self {
        self.max_peers = n;
        self
    }

    pub fn with_latency_threshold_ms(mut self, ms: i64) -> Self {
        self.latency_threshold_ms = ms;
        self
    }

    pub fn with_probe_timeout_ms(mut self, ms: u64) -> Self {
        self.probe_timeout_ms = ms;
        self
    }

    pub fn with_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_deadline_secs(mut self, secs: Option<u64>) -> Self {
        self.deadline_secs = secs;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<SelectionParams, ProbeError> {
        let max_peers = usize::try_from(self.max_peers).map_err(|_| {
            ProbeError::Config(format!("n must not be negative (got {})", self.max_peers))
        })?;

        let threshold_ms = u64::try_from(self.latency_threshold_ms).map_err(|_| {
            ProbeError::Config(format!(
                "ms must not be negative (got {})",
                self.latency_threshold_ms
            ))
        })?;

        if self.probe_timeout_ms == 0 {
            return Err(ProbeError::Config(
                "probe_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.fetch_timeout_secs == 0 {
            return Err(ProbeError::Config(
                "fetch_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.concurrency == 0 {
            return Err(ProbeError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }

        if self.deadline_secs == Some(0) {
            return Err(ProbeError::Config(
                "deadline_secs must be greater than 0 when set".to_string(),
            ));
        }

        validate_rpc_url(&self.rpc_url)?;

        Ok(SelectionParams {
            max_peers,
            threshold: Duration::from_millis(threshold_ms),
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            concurrency: self.concurrency,
            deadline: self.deadline_secs.map(Duration::from_secs),
        })
    }
}

/// The endpoint must be an absolute http(s) URL
pub(crate) fn validate_rpc_url(url: &str) -> Result<reqwest::Url, ProbeError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| ProbeError::Config(format!("invalid rpc url '{}': {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ProbeError::Config(format!(
            "unsupported rpc url scheme '{}'",
            other
        ))),
    }
}
