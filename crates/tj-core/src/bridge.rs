//! Wallet access: silent account detection and explicit connection requests.

use serde_json::json;
use std::sync::Arc;
use tj_rpc::{Provider, call};
use tj_types::WalletAddress;
use tracing::{info, warn};

use crate::TipError;

pub struct WalletBridge<P: ?Sized> {
    provider: Option<Arc<P>>,
}

impl<P: Provider + ?Sized> WalletBridge<P> {
    pub fn new(provider: Option<Arc<P>>) -> Self {
        Self { provider }
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    /// Ask for already-authorized accounts without prompting the user.
    pub async fn detect_account(&self) -> Result<Option<WalletAddress>, TipError> {
        let Some(provider) = self.provider.as_deref() else {
            warn!("make sure you have a wallet installed");
            return Err(TipError::WalletUnavailable);
        };

        let accounts: Vec<String> = call(provider, "eth_accounts", json!([])).await?;
        match accounts.into_iter().next() {
            Some(account) => {
                info!(account = %account, "wallet is connected");
                Ok(Some(WalletAddress(account)))
            }
            None => {
                info!("make sure a wallet is connected");
                Ok(None)
            }
        }
    }

    /// Prompt the user to authorize an account. Returns the first one granted.
    pub async fn request_connection(&self) -> Result<WalletAddress, TipError> {
        let Some(provider) = self.provider.as_deref() else {
            warn!("please install a wallet");
            return Err(TipError::WalletUnavailable);
        };

        let accounts: Vec<String> = call(provider, "eth_requestAccounts", json!([])).await?;
        let account = accounts.into_iter().next().ok_or(TipError::NoAccounts)?;
        info!(account = %account, "wallet connected");
        Ok(WalletAddress(account))
    }
}
