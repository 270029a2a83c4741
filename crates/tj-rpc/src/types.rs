//! Ethereum JSON-RPC payloads used by the tip jar.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: String,
    pub to: String,
    /// Hex quantity in wei.
    pub value: String,
    /// `0x`-prefixed call data.
    pub data: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl TransactionReceipt {
    /// Receipts without a status field predate EIP-658 and are treated as
    /// successful. A status that does not parse counts as a failure.
    pub fn succeeded(&self) -> bool {
        match self.status.as_deref() {
            None => true,
            Some(status) => parse_quantity(status) == Some(1),
        }
    }

    pub fn block(&self) -> Option<u64> {
        self.block_number.as_deref().and_then(parse_quantity)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LogFilter {
    pub address: String,
    pub topics: Vec<Option<String>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    #[serde(default)]
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub log_index: Option<String>,
    #[serde(default)]
    pub removed: bool,
}

/// Parse a JSON-RPC hex quantity such as `0x1b4`.
pub fn parse_quantity(quantity: &str) -> Option<u64> {
    let digits = quantity.strip_prefix("0x")?;
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}
