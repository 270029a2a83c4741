//! The page controller: wires wallet, ledger and feed into the store.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tj_rpc::{Provider, Sleeper};
use tj_types::WalletAddress;
use tracing::{error, info};

use crate::bridge::WalletBridge;
use crate::config::TipJarConfig;
use crate::contract::{ARTIFACT, TipContract};
use crate::feed::{FeedDriver, MemoFeed, RecordSink, Subscription};
use crate::ledger::{LedgerClient, PaymentReceipt};
use crate::state::{Action, Store, TipJarState};
use crate::TipError;

#[cfg(not(target_arch = "wasm32"))]
pub type ChangeListener = Box<dyn FnMut(&TipJarState) + Send>;
#[cfg(target_arch = "wasm32")]
pub type ChangeListener = Box<dyn FnMut(&TipJarState)>;

/// Outcome of each step of [`TipJar::mount`]. A failed step does not stop the others.
#[derive(Debug)]
pub struct MountReport {
    pub account: Result<Option<WalletAddress>, TipError>,
    /// Number of memos loaded.
    pub history: Result<usize, TipError>,
    pub feed: Result<(), TipError>,
}

pub struct TipJar<P: ?Sized> {
    config: TipJarConfig,
    bridge: WalletBridge<P>,
    ledger: LedgerClient<P>,
    feed: MemoFeed<P>,
    store: Store,
    subscription: Mutex<Option<Subscription>>,
}

impl<P: Provider + ?Sized> TipJar<P> {
    /// `provider` is `None` when no wallet is installed; every wallet or
    /// ledger operation then fails with [`TipError::WalletUnavailable`].
    pub fn new(
        provider: Option<Arc<P>>,
        config: TipJarConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, TipError> {
        config.validate()?;
        let contract = Arc::new(TipContract::bind(config.contract_address.clone(), ARTIFACT)?);

        Ok(Self {
            bridge: WalletBridge::new(provider.clone()),
            ledger: LedgerClient::new(
                provider.clone(),
                contract.clone(),
                sleeper.clone(),
                config.receipt_poll_interval(),
            ),
            feed: MemoFeed::new(provider, contract, sleeper, config.poll_interval()),
            store: Store::default(),
            subscription: Mutex::new(None),
            config,
        })
    }

    pub fn config(&self) -> &TipJarConfig {
        &self.config
    }

    pub fn state(&self) -> TipJarState {
        self.store.snapshot()
    }

    pub fn on_name_changed(&self, name: impl Into<String>) -> TipJarState {
        self.store.dispatch(Action::NameChanged(name.into()))
    }

    pub fn on_message_changed(&self, message: impl Into<String>) -> TipJarState {
        self.store.dispatch(Action::MessageChanged(message.into()))
    }

    pub async fn connect(&self) -> Result<WalletAddress, TipError> {
        match self.bridge.request_connection().await {
            Ok(account) => {
                self.store.dispatch(Action::AccountConnected(account.clone()));
                Ok(account)
            }
            Err(err) => {
                error!(error = %err, "could not connect wallet");
                Err(err)
            }
        }
    }

    /// Buy one coffee with the current draft. The draft is cleared only once the
    /// transaction is mined successfully.
    pub async fn submit(&self) -> Result<PaymentReceipt, TipError> {
        let result = self.submit_draft().await;
        match &result {
            Ok(_) => {
                self.store.dispatch(Action::SubmitSucceeded);
            }
            Err(err) => error!(error = %err, "could not buy coffee"),
        }
        result
    }

    async fn submit_draft(&self) -> Result<PaymentReceipt, TipError> {
        let snapshot = self.store.snapshot();
        let from = match snapshot.account {
            Some(account) => account,
            None => self.bridge.detect_account().await?.ok_or(TipError::NotConnected)?,
        };
        self.ledger
            .submit_payment(
                &from,
                &snapshot.draft.name,
                &snapshot.draft.message,
                self.config.tip_amount,
            )
            .await
    }

    /// Check for a connected account, open the live feed and load the memo history.
    ///
    /// `listener` runs after each live memo is applied. The returned driver,
    /// when present, must be spawned for live memos to arrive.
    pub async fn mount(&self, listener: ChangeListener) -> (MountReport, Option<FeedDriver<P>>) {
        self.unmount();

        let account = self.bridge.detect_account().await;
        match &account {
            Ok(Some(found)) => {
                self.store.dispatch(Action::AccountDetected(found.clone()));
            }
            Ok(None) => {}
            Err(err) => error!(error = %err, "could not check for a connected wallet"),
        }

        let store = self.store.clone();
        let mut listener = listener;
        let sink: RecordSink = Box::new(move |memo| {
            let state = store.dispatch(Action::MemoReceived(memo));
            listener(&state);
        });

        let (feed, driver) = match self.feed.subscribe(sink).await {
            Ok((subscription, driver)) => {
                *self.subscription() = Some(subscription);
                (Ok(()), Some(driver))
            }
            Err(err) => {
                error!(error = %err, "could not listen for new memos");
                (Err(err), None)
            }
        };

        // the filter is installed first so nothing mined meanwhile is missed
        let history = match self.ledger.fetch_history().await {
            Ok(memos) => {
                let count = memos.len();
                self.store.dispatch(Action::HistoryLoaded(memos));
                Ok(count)
            }
            Err(err) => {
                error!(error = %err, "could not load memos");
                Err(err)
            }
        };

        info!(memos = self.store.snapshot().memo_count(), "tip jar mounted");
        (MountReport { account, history, feed }, driver)
    }

    /// Close the live feed. Returns `false` if none was open.
    pub fn unmount(&self) -> bool {
        match self.subscription().take() {
            Some(mut subscription) => subscription.unsubscribe(),
            None => false,
        }
    }

    fn subscription(&self) -> MutexGuard<'_, Option<Subscription>> {
        self.subscription.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
