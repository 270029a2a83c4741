//! The wallet injected by the browser extension as `window.ethereum`.

use async_trait::async_trait;
use js_sys::{Function, Promise, Reflect};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tj_rpc::{Provider, ProviderError, Sleeper};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

pub struct InjectedProvider {
    ethereum: JsValue,
    request: Function,
}

impl InjectedProvider {
    /// `None` when no wallet extension has injected itself into the page.
    pub fn detect() -> Option<Self> {
        let window = web_sys::window()?;
        let ethereum = Reflect::get(&window, &JsValue::from_str("ethereum")).ok()?;
        if ethereum.is_undefined() || ethereum.is_null() {
            return None;
        }
        let request = Reflect::get(&ethereum, &JsValue::from_str("request"))
            .ok()?
            .dyn_into::<Function>()
            .ok()?;
        Some(Self { ethereum, request })
    }
}

#[derive(Serialize)]
struct RequestArguments<'a> {
    method: &'a str,
    params: Value,
}

#[async_trait(?Send)]
impl Provider for InjectedProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        // plain objects and arrays, not ES maps
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let args = RequestArguments { method, params }
            .serialize(&serializer)
            .map_err(|err| ProviderError::Decode(format!("{method}: {err}")))?;

        let promise: Promise = self
            .request
            .call1(&self.ethereum, &args)
            .map_err(rejection)?
            .dyn_into()
            .map_err(|_| ProviderError::Decode(format!("{method}: wallet did not return a promise")))?;
        let result = JsFuture::from(promise).await.map_err(rejection)?;

        if result.is_undefined() {
            return Ok(Value::Null);
        }
        serde_wasm_bindgen::from_value(result)
            .map_err(|err| ProviderError::Decode(format!("{method}: {err}")))
    }
}

/// EIP-1193 errors carry a numeric `code` and a `message`.
fn rejection(err: JsValue) -> ProviderError {
    let code = Reflect::get(&err, &JsValue::from_str("code"))
        .ok()
        .and_then(|code| code.as_f64());
    let message = Reflect::get(&err, &JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    match code {
        Some(code) => ProviderError::Rpc {
            code: code as i64,
            message,
        },
        None => ProviderError::Transport(message),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GlooSleeper;

#[async_trait(?Send)]
impl Sleeper for GlooSleeper {
    async fn sleep(&self, duration: Duration) {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        gloo_timers::future::TimeoutFuture::new(millis).await;
    }
}
