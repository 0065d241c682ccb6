//! Error taxonomy for the peer probe
//!
//! Directory fetch errors are fatal for a run. Probe errors never surface
//! here: they are absorbed into the `unreachable` bucket.

/// Errors returned by the library
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// Network-level failure reaching the RPC endpoint
    #[error("Transport error: {0}")]
    Transport(String),

    /// Deadline elapsed before a response was obtained
    #[error("Request cancelled: {0}")]
    Cancelled(String),

    /// Response body is not the expected `network_info` shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid selection or timing parameters
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ProbeError {
    /// True for errors detected before any I/O
    pub fn is_config(&self) -> bool {
        matches!(self, ProbeError::Config(_))
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProbeError::Cancelled(e.to_string())
        } else if e.is_decode() {
            ProbeError::Decode(e.to_string())
        } else {
            ProbeError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(e: serde_json::Error) -> Self {
        ProbeError::Decode(e.to_string())
    }
}
