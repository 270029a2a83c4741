//! Live `NewMemo` notifications.
//!
//! `MemoFeed::subscribe` installs a log filter and hands back two halves:
//! a [`Subscription`] the owner keeps (dropping it closes the feed) and a
//! [`FeedDriver`] future the host spawns to poll the filter.

use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tj_rpc::{Log, Provider, Sleeper, call};
use tj_types::Memo;
use tracing::{debug, error, info, warn};

use crate::TipError;
use crate::contract::TipContract;

#[cfg(not(target_arch = "wasm32"))]
pub type RecordSink = Box<dyn FnMut(Memo) + Send>;
#[cfg(target_arch = "wasm32")]
pub type RecordSink = Box<dyn FnMut(Memo)>;

pub struct MemoFeed<P: ?Sized> {
    provider: Option<Arc<P>>,
    contract: Arc<TipContract>,
    sleeper: Arc<dyn Sleeper>,
    poll_interval: Duration,
}

impl<P: Provider + ?Sized> MemoFeed<P> {
    pub fn new(
        provider: Option<Arc<P>>,
        contract: Arc<TipContract>,
        sleeper: Arc<dyn Sleeper>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            provider,
            contract,
            sleeper,
            poll_interval,
        }
    }

    pub async fn subscribe(
        &self,
        on_record: RecordSink,
    ) -> Result<(Subscription, FeedDriver<P>), TipError> {
        let provider = self.provider.clone().ok_or(TipError::WalletUnavailable)?;
        let filter_id: String =
            call(provider.as_ref(), "eth_newFilter", json!([self.contract.log_filter()])).await?;
        info!(filter = %filter_id, "listening for new memos");

        let active = Arc::new(AtomicBool::new(true));
        let driver = FeedDriver {
            provider,
            contract: self.contract.clone(),
            sleeper: self.sleeper.clone(),
            poll_interval: self.poll_interval,
            filter_id,
            active: active.clone(),
            on_record,
        };
        Ok((Subscription { active: Some(active) }, driver))
    }
}

/// Owner's handle on an open feed.
#[derive(Debug)]
pub struct Subscription {
    active: Option<Arc<AtomicBool>>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.load(Ordering::SeqCst))
    }

    /// Stop delivery. Returns `true` only for the call that closed the feed.
    pub fn unsubscribe(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                let was_open = active.swap(false, Ordering::SeqCst);
                if was_open {
                    info!("stopped listening for new memos");
                }
                was_open
            }
            None => false,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

pub struct FeedDriver<P: ?Sized> {
    provider: Arc<P>,
    contract: Arc<TipContract>,
    sleeper: Arc<dyn Sleeper>,
    poll_interval: Duration,
    filter_id: String,
    active: Arc<AtomicBool>,
    on_record: RecordSink,
}

impl<P: Provider + ?Sized> FeedDriver<P> {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn filter_id(&self) -> &str {
        &self.filter_id
    }

    /// Fetch pending logs once and deliver them. Returns how many memos were delivered.
    pub async fn poll_once(&mut self) -> Result<usize, TipError> {
        if !self.is_active() {
            return Ok(0);
        }
        let logs: Vec<Log> =
            call(self.provider.as_ref(), "eth_getFilterChanges", json!([self.filter_id])).await?;

        let mut delivered = 0;
        for log in logs.iter().filter(|log| !log.removed) {
            let memo = match self.contract.decode_new_memo(log) {
                Ok(memo) => memo,
                Err(err) => {
                    warn!(error = %err, tx = ?log.transaction_hash, "skipping undecodable memo log");
                    continue;
                }
            };
            // unsubscribed while the poll was in flight
            if !self.is_active() {
                break;
            }
            info!(from = %memo.from, timestamp = memo.timestamp, name = %memo.name, "memo received");
            (self.on_record)(memo);
            delivered += 1;
        }
        Ok(delivered)
    }

    /// Poll until unsubscribed or a poll fails, then uninstall the filter.
    pub async fn run(mut self) {
        while self.is_active() {
            self.sleeper.sleep(self.poll_interval).await;
            if let Err(err) = self.poll_once().await {
                error!(error = %err, "memo feed stopped");
                self.active.store(false, Ordering::SeqCst);
            }
        }
        self.uninstall().await;
    }

    async fn uninstall(self) {
        let uninstalled: Result<bool, _> = call(
            self.provider.as_ref(),
            "eth_uninstallFilter",
            json!([self.filter_id]),
        )
        .await;
        match uninstalled {
            Ok(found) => debug!(filter = %self.filter_id, found, "memo filter uninstalled"),
            Err(err) => debug!(filter = %self.filter_id, error = %err, "could not uninstall memo filter"),
        }
    }
}
