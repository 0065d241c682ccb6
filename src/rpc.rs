//! Peer Directory Fetcher
//!
//! Asks the node for its currently active peers with a single
//! `network_info` JSON-RPC call. No retries: one failure ends the run.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::validate_rpc_url;
use crate::error::ProbeError;
use crate::types::PeerSet;

/// JSON-RPC method listing the node's connections
pub const NETWORK_INFO_METHOD: &str = "network_info";

/// Request id the node echoes back; never checked
const REQUEST_ID: &str = "dontcare";

/// JSON-RPC request
#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    id: &'static str,
    method: &'static str,
    params: serde_json::Value,
}

/// JSON-RPC response
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

/// JSON-RPC error
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// `result` of `network_info`; everything but the peer list is ignored
#[derive(Debug, Deserialize)]
struct NetworkInfo {
    active_peers: PeerSet,
}

/// Source of candidate peers
#[async_trait]
pub trait PeerDirectory: Send + Sync {
    /// Fetch the currently active peers
    async fn active_peers(&self) -> Result<PeerSet, ProbeError>;
}

impl JsonRpcRequest {
    /// The `network_info` call, which takes no parameters
    fn network_info() -> Self {
        Self {
            jsonrpc: "2.0",
            id: REQUEST_ID,
            method: NETWORK_INFO_METHOD,
            params: serde_json::json!([]),
        }
    }
}

/// Decode a `network_info` response body into the peer set
pub fn decode_network_info(body: &[u8]) -> Result<PeerSet, ProbeError> {
    let response: JsonRpcResponse<NetworkInfo> = serde_json::from_slice(body)?;

    if let Some(error) = response.error {
        return Err(ProbeError::Decode(format!(
            "node returned RPC error {}: {}",
            error.code, error.message
        )));
    }

    response
        .result
        .map(|info| info.active_peers)
        .ok_or_else(|| ProbeError::Decode("response has no `result`".to_string()))
}

/// RPC client for the node's `network_info` endpoint
pub struct RpcClient {
    url: reqwest::Url,
    client: reqwest::Client,
    timeout: Duration,
}

impl RpcClient {
    /// Create new RPC client bounded by `timeout` per request
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ProbeError> {
        if timeout.is_zero() {
            return Err(ProbeError::Config(
                "fetch timeout must be greater than 0".to_string(),
            ));
        }

        let url = validate_rpc_url(url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url,
            client,
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Fetch active peers with a single request
    pub async fn fetch_active_peers(&self) -> Result<PeerSet, ProbeError> {
        info!("📡 Fetching active peers from {}", self.url);

        let result = match tokio::time::timeout(self.timeout, self.request()).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Cancelled(format!(
                "no response from {} within {:?}",
                self.url, self.timeout
            ))),
        };

        match &result {
            Ok(peers) => info!("   Node reports {} active peers", peers.len()),
            Err(e) => warn!("Failed to fetch network info: {}", e),
        }

        result
    }

    async fn request(&self) -> Result<PeerSet, ProbeError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&JsonRpcRequest::network_info())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProbeError::Transport(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response.bytes().await?;
        debug!("network_info response: {} bytes", body.len());

        decode_network_info(&body)
    }
}

#[async_trait]
impl PeerDirectory for RpcClient {
    async fn active_peers(&self) -> Result<PeerSet, ProbeError> {
        self.fetch_active_peers().await
    }
}

/// Minimal one-shot HTTP node for tests
#[cfg(test)]
pub(crate) mod test_node {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve one HTTP response and hand back the request body
    pub async fn serve_once(
        status: &'static str,
        body: impl Into<String>,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let body = body.into();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];

            // Read headers, then Content-Length bytes of body
            let request_body = loop {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break String::new();
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let l = l.to_ascii_lowercase();
                            l.strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + length {
                        break text[end + 4..end + 4 + length].to_string();
                    }
                }
            };

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            let _ = tx.send(request_body);
        });

        (url, rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::test_node::serve_once;
    use tokio::net::TcpListener;

    const NETWORK_INFO_OK: &str = r#"{
        "jsonrpc": "2.0",
        "id": "dontcare",
        "result": {
            "active_peers": [
                {"id": "ed25519:AAA", "addr": "10.0.0.1:24567", "account_id": null},
                {"id": "ed25519:BBB", "addr": "10.0.0.2:24567", "account_id": "validator.near"}
            ],
            "num_active_peers": 2,
            "peer_max_count": 40
        }
    }"#;

    #[test]
    fn test_request_shape() {
        let request = serde_json::to_value(JsonRpcRequest::network_info()).unwrap();
        assert_eq!(
            request,
            serde_json::json!({
                "jsonrpc": "2.0",
                "id": "dontcare",
                "method": "network_info",
                "params": []
            })
        );
    }

    #[test]
    fn test_decode_network_info() {
        let peers = decode_network_info(NETWORK_INFO_OK.as_bytes()).unwrap();
        assert_eq!(peers.len(), 2);
        assert_eq!(peers[0].address, "10.0.0.1:24567");
        assert_eq!(peers[0].id.as_deref(), Some("ed25519:AAA"));
        assert!(peers[0].account_id.is_none());
        assert_eq!(peers[1].account_id.as_deref(), Some("validator.near"));
    }

    #[test]
    fn test_decode_empty_peer_list() {
        let body = br#"{"result": {"active_peers": []}}"#;
        assert!(decode_network_info(body).unwrap().is_empty());
    }

    #[test]
    fn test_decode_malformed() {
        let err = decode_network_info(b"{\"result\": {\"active_peers\": [").unwrap_err();
        assert!(matches!(err, ProbeError::Decode(_)));

        let err = decode_network_info(br#"{"result": {"peers": []}}"#).unwrap_err();
        assert!(matches!(err, ProbeError::Decode(_)));

        let err = decode_network_info(br#"{"result": {"active_peers": "none"}}"#).unwrap_err();
        assert!(matches!(err, ProbeError::Decode(_)));

        let err = decode_network_info(br#"[1, 2, 3]"#).unwrap_err();
        assert!(matches!(err, ProbeError::Decode(_)));

        let err = decode_network_info(br#"{"jsonrpc": "2.0"}"#).unwrap_err();
        assert!(matches!(err, ProbeError::Decode(_)));
    }

    #[test]
    fn test_decode_rpc_error() {
        let body = br#"{"jsonrpc":"2.0","id":"dontcare","error":{"code":-32601,"message":"Method not found"}}"#;
        match decode_network_info(body).unwrap_err() {
            ProbeError::Decode(msg) => assert!(msg.contains("Method not found")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_client_rejects_bad_input() {
        assert!(RpcClient::new("localhost:3030", Duration::from_secs(3)).is_err());
        assert!(RpcClient::new("http://localhost:3030", Duration::ZERO).is_err());

        let client = RpcClient::new("http://127.0.0.1:3030", Duration::from_secs(3)).unwrap();
        assert_eq!(client.url(), "http://127.0.0.1:3030/");
    }

    #[tokio::test]
    async fn test_fetch_active_peers() {
        let (url, request_rx) = serve_once("200 OK", NETWORK_INFO_OK).await;
        let client = RpcClient::new(&url, Duration::from_secs(5)).unwrap();

        let peers = client.fetch_active_peers().await.unwrap();
        assert_eq!(peers.len(), 2);

        let sent: serde_json::Value = serde_json::from_str(&request_rx.await.unwrap()).unwrap();
        assert_eq!(sent["method"], "network_info");
        assert_eq!(sent["id"], "dontcare");
        assert_eq!(sent["params"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let (url, _rx) = serve_once("200 OK", "<html>not json</html>").await;
        let client = RpcClient::new(&url, Duration::from_secs(5)).unwrap();

        let err = client.fetch_active_peers().await.unwrap_err();
        assert!(matches!(err, ProbeError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_http_error_status() {
        let (url, _rx) = serve_once("500 Internal Server Error", "{}").await;
        let client = RpcClient::new(&url, Duration::from_secs(5)).unwrap();

        let err = client.fetch_active_peers().await.unwrap_err();
        assert!(matches!(err, ProbeError::Transport(_)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = RpcClient::new(&url, Duration::from_secs(5)).unwrap();
        let err = client.fetch_active_peers().await.unwrap_err();
        assert!(matches!(err, ProbeError::Transport(_)));
    }

    #[tokio::test]
    async fn test_fetch_deadline_elapses() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        // Accept and never answer
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let client = RpcClient::new(&url, Duration::from_millis(200)).unwrap();
        let err = client.fetch_active_peers().await.unwrap_err();
        assert!(matches!(err, ProbeError::Cancelled(_)));
    }
}
