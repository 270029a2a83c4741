//! Tip jar logic: wallet access, contract calls, live memos and page state.
//!
//! Everything here is generic over [`tj_rpc::Provider`], so the same
//! controller drives the browser page and the native tests.

pub mod bridge;
pub mod config;
pub mod contract;
pub mod controller;
mod error;
pub mod feed;
pub mod ledger;
pub mod state;

pub use bridge::WalletBridge;
pub use config::TipJarConfig;
pub use contract::{ARTIFACT, DEFAULT_CONTRACT_ADDRESS, TipContract};
pub use controller::{ChangeListener, MountReport, TipJar};
pub use error::TipError;
pub use feed::{FeedDriver, MemoFeed, RecordSink, Subscription};
pub use ledger::{LedgerClient, PaymentReceipt};
pub use state::{Action, DisplayMode, Store, TipJarState, reduce};
