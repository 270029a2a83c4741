use serde::{Deserialize, Serialize};
use std::time::Duration;
use tj_types::{EtherAmount, WalletAddress};

use crate::TipError;
use crate::contract::DEFAULT_CONTRACT_ADDRESS;

/// 0.01 ETH.
pub const DEFAULT_TIP_WEI: u128 = 10_000_000_000_000_000;
pub const DEFAULT_RECIPIENT: &str = "Amovane";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 4_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TipJarConfig {
    pub contract_address: WalletAddress,
    pub tip_amount: EtherAmount,
    /// Shown in the page title.
    pub recipient: String,
    pub poll_interval_ms: u64,
    pub receipt_poll_interval_ms: u64,
}

impl Default for TipJarConfig {
    fn default() -> Self {
        Self {
            contract_address: WalletAddress(DEFAULT_CONTRACT_ADDRESS.to_owned()),
            tip_amount: EtherAmount::from_wei(DEFAULT_TIP_WEI),
            recipient: DEFAULT_RECIPIENT.to_owned(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            receipt_poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl TipJarConfig {
    /// Parse a JSON override; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, TipError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| TipError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TipError> {
        if self.contract_address.0.trim().is_empty() {
            return Err(TipError::Config("contract_address is required".into()));
        }
        if self.poll_interval_ms == 0 || self.receipt_poll_interval_ms == 0 {
            return Err(TipError::Config("poll intervals must be positive".into()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}
