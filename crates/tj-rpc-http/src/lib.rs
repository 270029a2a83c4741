use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tj_rpc::{Provider, ProviderError, RpcRequest, RpcResponse};
use tracing::debug;

pub use tj_rpc::TokioSleeper;

pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// JSON-RPC 2.0 over HTTP.
///
/// Nodes with unlocked accounts (a local dev chain, for instance) answer
/// `eth_accounts` and `eth_requestAccounts` the same way an injected wallet
/// does, so this also stands in for the browser wallet on native hosts.
pub struct HttpProvider {
    endpoint: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl Default for HttpProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

impl HttpProvider {
    pub fn new(endpoint: Option<String>) -> Self {
        let endpoint = endpoint.unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Provider for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(id, method, "json-rpc request");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&RpcRequest::new(id, method, &params))
            .send()
            .await
            .map_err(|err| ProviderError::Transport(format!("{method} transport: {err}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| ProviderError::Transport(format!("{method} body: {err}")))?;

        // Some nodes pair an error body with a non-2xx status; prefer the structured error.
        let parsed = serde_json::from_str::<RpcResponse>(&text);
        if !status.is_success() {
            if let Ok(RpcResponse { error: Some(err), .. }) = parsed {
                return Err(err.into());
            }
            return Err(ProviderError::Transport(format!("{method} HTTP {status}: {text}")));
        }

        parsed
            .map_err(|err| ProviderError::Decode(format!("{method}: {err}")))?
            .into_result()
    }
}
