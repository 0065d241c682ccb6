//! KratOs Peer Probe
//!
//! Builds a persistent-peer list from a node's view of the network:
//!
//! ```text
//! network_info (JSON-RPC) ──→ TCP connect probes ──→ fast / slow / unreachable
//!                                                        │
//!                                  fastest N of `fast` ←─┘
//! ```
//!
//! Nothing is persisted and nothing is retried: one fetch, one probe per peer.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod probe;
pub mod report;
pub mod rpc;
pub mod types;

pub use config::{ProbeConfig, SelectionParams};
pub use error::ProbeError;
pub use pipeline::{run, run_with_rpc};
pub use probe::{Classification, Prober, TcpProber};
pub use report::ProbeReport;
pub use rpc::{PeerDirectory, RpcClient};
pub use types::{Bucket, Peer, PeerSet, ProbeFailure, ProbeOutcome};
