use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;
const ETHER_DECIMALS: usize = 18;

/// Account identifier exactly as the wallet reported it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WalletAddress(pub String);

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WalletAddress {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One tip as recorded by the contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Memo {
    pub from: String,
    /// Seconds since the Unix epoch, as stored on chain.
    pub timestamp: u64,
    pub name: String,
    pub message: String,
}

impl Memo {
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormDraft {
    pub name: String,
    pub message: String,
}

impl FormDraft {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.message.is_empty()
    }
}

// ── Ether amounts ──

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount '{0}' is not a decimal number")]
    Malformed(String),
    #[error("amount '{0}' has more than 18 decimal places")]
    TooPrecise(String),
    #[error("amount '{0}' does not fit in 128 bits of wei")]
    Overflow(String),
}

/// An amount of the native unit, held in wei.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EtherAmount {
    wei: u128,
}

impl EtherAmount {
    pub const fn from_wei(wei: u128) -> Self {
        Self { wei }
    }

    pub const fn wei(&self) -> u128 {
        self.wei
    }

    /// Hex quantity as expected in a JSON-RPC `value` field.
    pub fn to_quantity(&self) -> String {
        format!("{:#x}", self.wei)
    }
}

impl FromStr for EtherAmount {
    type Err = AmountError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(AmountError::Empty);
        }

        let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
            return Err(AmountError::Malformed(raw.to_owned()));
        }
        if fraction.len() > ETHER_DECIMALS {
            return Err(AmountError::TooPrecise(raw.to_owned()));
        }

        let overflow = || AmountError::Overflow(raw.to_owned());
        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let fraction_wei: u128 = if fraction.is_empty() {
            0
        } else {
            let scale = 10u128.pow((ETHER_DECIMALS - fraction.len()) as u32);
            fraction.parse::<u128>().map_err(|_| overflow())? * scale
        };

        whole
            .checked_mul(WEI_PER_ETHER)
            .and_then(|wei| wei.checked_add(fraction_wei))
            .map(Self::from_wei)
            .ok_or_else(overflow)
    }
}

impl fmt::Display for EtherAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.wei / WEI_PER_ETHER;
        let fraction = self.wei % WEI_PER_ETHER;
        if fraction == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{fraction:018}");
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl TryFrom<String> for EtherAmount {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EtherAmount> for String {
    fn from(value: EtherAmount) -> Self {
        value.to_string()
    }
}
