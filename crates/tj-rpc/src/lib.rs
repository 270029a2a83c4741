use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

pub mod jsonrpc;
#[cfg(feature = "mock")]
pub mod mock;
pub mod types;

pub use jsonrpc::{RpcErrorObject, RpcRequest, RpcResponse};
pub use types::{Log, LogFilter, TransactionReceipt, TransactionRequest, parse_quantity};

/// EIP-1193 code for "the user rejected the request".
pub const USER_REJECTED: i64 = 4001;

#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSendSync: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync + ?Sized> MaybeSendSync for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSendSync {}
#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSendSync for T {}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Rpc { code, .. } if *code == USER_REJECTED)
    }
}

impl From<RpcErrorObject> for ProviderError {
    fn from(err: RpcErrorObject) -> Self {
        Self::Rpc {
            code: err.code,
            message: err.message,
        }
    }
}

/// A request/response channel in the shape of EIP-1193 `request({ method, params })`.
///
/// Implemented by the injected browser wallet and by plain JSON-RPC endpoints.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Provider: MaybeSendSync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;
}

/// Send a request and deserialize its result.
pub async fn call<T, P>(provider: &P, method: &str, params: Value) -> Result<T, ProviderError>
where
    T: DeserializeOwned,
    P: Provider + ?Sized,
{
    let value = provider.request(method, params).await?;
    serde_json::from_value(value).map_err(|err| ProviderError::Decode(format!("{method}: {err}")))
}

/// Timer used by polling loops; lets the same code run on Tokio and in the browser.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Sleeper: MaybeSendSync {
    async fn sleep(&self, duration: Duration);
}

#[cfg(feature = "tokio")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[cfg(feature = "tokio")]
#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
