//! Core types for peer probing
//!
//! A `Peer` is created from the node's `network_info` response, decorated
//! with a latency once probed, and then only read.

use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Helper module for serializing Option<Duration> as whole milliseconds
mod latency_ms_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(data: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match data {
            Some(d) => (d.as_millis() as u64).serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<u64> = Option::deserialize(deserializer)?;
        Ok(opt.map(Duration::from_millis))
    }
}

/// Upstream nodes send `"addr": null` for peers they only know by id
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

// =============================================================================
// PEER
// =============================================================================

/// A candidate peer as reported by the node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Account the peer is running as, if any (not interpreted)
    #[serde(default)]
    pub account_id: Option<String>,

    /// Node identifier, e.g. `ed25519:...` (not interpreted)
    #[serde(default)]
    pub id: Option<String>,

    /// Transport endpoint `host:port`, the only field used for probing
    #[serde(rename = "addr", default, deserialize_with = "null_as_empty")]
    pub address: String,

    /// Connect latency, set only after a successful probe
    #[serde(default, rename = "latency_ms", with = "latency_ms_serde")]
    pub latency: Option<Duration>,
}

impl Peer {
    /// Create an unprobed peer with only an address
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            account_id: None,
            id: None,
            address: address.into(),
            latency: None,
        }
    }

    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// A probe is only attempted for peers with an address
    pub fn is_probeable(&self) -> bool {
        !self.address.trim().is_empty()
    }
}

/// Peers returned by one directory fetch, in upstream order
pub type PeerSet = Vec<Peer>;

// =============================================================================
// PROBE OUTCOME
// =============================================================================

/// Why a probe did not produce a latency
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// Peer has no address to connect to
    EmptyAddress,
    /// Connect failed (refused, unresolvable, malformed address)
    Transport(String),
    /// Per-probe timeout fired
    TimedOut,
    /// Umbrella deadline passed before the probe settled
    Cancelled,
}

impl std::fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeFailure::EmptyAddress => write!(f, "empty address"),
            ProbeFailure::Transport(e) => write!(f, "{}", e),
            ProbeFailure::TimedOut => write!(f, "connection timeout"),
            ProbeFailure::Cancelled => write!(f, "cancelled by deadline"),
        }
    }
}

/// Result of probing one peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Connection established after the given elapsed time
    Connected(Duration),
    /// No connection
    Failed(ProbeFailure),
}

impl ProbeOutcome {
    pub fn latency(&self) -> Option<Duration> {
        match self {
            ProbeOutcome::Connected(latency) => Some(*latency),
            ProbeOutcome::Failed(_) => None,
        }
    }
}

/// Quality tier assigned to a probed peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Fast,
    Slow,
    Unreachable,
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bucket::Fast => write!(f, "fast"),
            Bucket::Slow => write!(f, "slow"),
            Bucket::Unreachable => write!(f, "unreachable"),
        }
    }
}
