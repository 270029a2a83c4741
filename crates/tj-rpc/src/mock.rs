//! Scripted provider for tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{Provider, ProviderError};

type Reply = Result<Value, ProviderError>;

/// Answers each method from a queue of scripted replies, then from an
/// optional standing reply. Unscripted methods fail with `-32601`.
#[derive(Debug, Default)]
pub struct MockProvider {
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    standing: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<(String, Value)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one successful reply.
    pub fn reply(&self, method: &str, result: Value) -> &Self {
        self.enqueue(method, Ok(result))
    }

    /// Queue one failure.
    pub fn fail(&self, method: &str, err: ProviderError) -> &Self {
        self.enqueue(method, Err(err))
    }

    /// Reply used whenever the queue for `method` is empty.
    pub fn always(&self, method: &str, reply: Reply) -> &Self {
        lock(&self.standing).insert(method.to_owned(), reply);
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        lock(&self.calls).clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        lock(&self.calls)
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
            .collect()
    }

    fn enqueue(&self, method: &str, reply: Reply) -> &Self {
        lock(&self.queued)
            .entry(method.to_owned())
            .or_default()
            .push_back(reply);
        self
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Provider for MockProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        lock(&self.calls).push((method.to_owned(), params));

        if let Some(reply) = lock(&self.queued).get_mut(method).and_then(VecDeque::pop_front) {
            return reply;
        }
        if let Some(reply) = lock(&self.standing).get(method) {
            return reply.clone();
        }
        Err(ProviderError::Rpc {
            code: -32601,
            message: format!("method not mocked: {method}"),
        })
    }
}
