//! Page state and the reducer that owns every change to it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tj_types::{FormDraft, Memo, WalletAddress};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TipJarState {
    pub account: Option<WalletAddress>,
    pub draft: FormDraft,
    /// Last snapshot read from the contract.
    pub history: Vec<Memo>,
    /// Memos received live since the page mounted.
    pub live: Vec<Memo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Disconnected,
    Connected,
}

impl TipJarState {
    pub fn mode(&self) -> DisplayMode {
        match self.account {
            Some(_) => DisplayMode::Connected,
            None => DisplayMode::Disconnected,
        }
    }

    /// History followed by live memos, in arrival order.
    pub fn memos(&self) -> impl Iterator<Item = &Memo> {
        self.history.iter().chain(self.live.iter())
    }

    pub fn memo_count(&self) -> usize {
        self.history.len() + self.live.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Found by the silent check on mount.
    AccountDetected(WalletAddress),
    /// Granted by an explicit connect.
    AccountConnected(WalletAddress),
    NameChanged(String),
    MessageChanged(String),
    SubmitSucceeded,
    HistoryLoaded(Vec<Memo>),
    MemoReceived(Memo),
}

pub fn reduce(mut state: TipJarState, action: Action) -> TipJarState {
    match action {
        Action::AccountDetected(account) | Action::AccountConnected(account) => {
            state.account = Some(account);
        }
        Action::NameChanged(name) => state.draft.name = name,
        Action::MessageChanged(message) => state.draft.message = message,
        Action::SubmitSucceeded => state.draft = FormDraft::default(),
        Action::HistoryLoaded(memos) => state.history = memos,
        Action::MemoReceived(memo) => state.live.push(memo),
    }
    state
}

/// Shared handle on the state; every mutation goes through [`reduce`].
#[derive(Debug, Clone, Default)]
pub struct Store {
    inner: Arc<Mutex<TipJarState>>,
}

impl Store {
    pub fn new(initial: TipJarState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(initial)),
        }
    }

    /// Apply `action` and return the resulting state.
    pub fn dispatch(&self, action: Action) -> TipJarState {
        let mut guard = self.lock();
        let next = reduce(std::mem::take(&mut *guard), action);
        *guard = next.clone();
        next
    }

    pub fn snapshot(&self) -> TipJarState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, TipJarState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
