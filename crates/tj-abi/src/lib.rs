//! Contract ABI support for the tip jar.
//!
//! Parses an interface-description artifact, derives selectors and topics,
//! and encodes/decodes the Solidity ABI wire format for the types the
//! artifact uses.

pub mod codec;
pub mod interface;

pub use alloy_primitives::{Address, B256, U256};
pub use codec::{decode, decode_single, encode};
pub use interface::{Event, Function, Interface, Param, StateMutability};

#[derive(Debug, thiserror::Error)]
pub enum AbiError {
    #[error("unsupported abi type '{0}'")]
    UnsupportedType(String),
    #[error("expected {expected} values, got {found}")]
    ArityMismatch { expected: usize, found: usize },
    #[error("value does not match abi type {0}")]
    TypeMismatch(String),
    #[error("abi data is truncated at offset {0}")]
    Truncated(usize),
    #[error("abi offset or length out of range")]
    OffsetOutOfRange,
    #[error("string is not valid utf-8")]
    InvalidUtf8,
    #[error("function '{0}' is not in the interface")]
    UnknownFunction(String),
    #[error("event '{0}' is not in the interface")]
    UnknownEvent(String),
    #[error("log topic does not match event {0}")]
    TopicMismatch(String),
    #[error("log is missing the topic for indexed input {0}")]
    MissingTopic(usize),
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("invalid interface artifact: {0}")]
    Artifact(#[from] serde_json::Error),
    #[error("interface artifact has no abi array")]
    MissingAbi,
}

/// Solidity parameter types understood by the codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Address,
    Bool,
    Uint(usize),
    FixedBytes(usize),
    Bytes,
    String,
    Array(Box<ParamType>),
    FixedArray(Box<ParamType>, usize),
    Tuple(Vec<ParamType>),
}

impl ParamType {
    /// Parse an artifact type string such as `uint256`, `string` or `tuple[]`.
    ///
    /// `components` are the already-resolved members used when the base
    /// type is `tuple`.
    pub fn parse(kind: &str, components: &[ParamType]) -> Result<Self, AbiError> {
        let unsupported = || AbiError::UnsupportedType(kind.to_owned());

        if let Some(stripped) = kind.strip_suffix(']') {
            let open = stripped.rfind('[').ok_or_else(unsupported)?;
            let inner = Self::parse(&stripped[..open], components)?;
            let size = &stripped[open + 1..];
            if size.is_empty() {
                return Ok(Self::Array(Box::new(inner)));
            }
            let size: usize = size.parse().map_err(|_| unsupported())?;
            return Ok(Self::FixedArray(Box::new(inner), size));
        }

        match kind {
            "address" => Ok(Self::Address),
            "bool" => Ok(Self::Bool),
            "string" => Ok(Self::String),
            "bytes" => Ok(Self::Bytes),
            "tuple" => Ok(Self::Tuple(components.to_vec())),
            "uint" => Ok(Self::Uint(256)),
            _ => {
                if let Some(bits) = kind.strip_prefix("uint") {
                    let bits: usize = bits.parse().map_err(|_| unsupported())?;
                    if bits == 0 || bits > 256 || bits % 8 != 0 {
                        return Err(unsupported());
                    }
                    return Ok(Self::Uint(bits));
                }
                if let Some(len) = kind.strip_prefix("bytes") {
                    let len: usize = len.parse().map_err(|_| unsupported())?;
                    if len == 0 || len > 32 {
                        return Err(unsupported());
                    }
                    return Ok(Self::FixedBytes(len));
                }
                Err(unsupported())
            }
        }
    }

    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::Bytes | Self::String | Self::Array(_) => true,
            Self::FixedArray(inner, _) => inner.is_dynamic(),
            Self::Tuple(members) => members.iter().any(Self::is_dynamic),
            Self::Address | Self::Bool | Self::Uint(_) | Self::FixedBytes(_) => false,
        }
    }

    /// Bytes this type occupies in the head of an enclosing encoding.
    pub fn head_size(&self) -> usize {
        if self.is_dynamic() {
            return 32;
        }
        match self {
            Self::FixedArray(inner, len) => inner.head_size() * len,
            Self::Tuple(members) => members.iter().map(Self::head_size).sum(),
            _ => 32,
        }
    }

    /// Canonical form used in signatures, e.g. `(address,uint256)[]`.
    pub fn canonical(&self) -> String {
        match self {
            Self::Address => "address".to_owned(),
            Self::Bool => "bool".to_owned(),
            Self::Uint(bits) => format!("uint{bits}"),
            Self::FixedBytes(len) => format!("bytes{len}"),
            Self::Bytes => "bytes".to_owned(),
            Self::String => "string".to_owned(),
            Self::Array(inner) => format!("{}[]", inner.canonical()),
            Self::FixedArray(inner, len) => format!("{}[{len}]", inner.canonical()),
            Self::Tuple(members) => {
                let inner: Vec<String> = members.iter().map(Self::canonical).collect();
                format!("({})", inner.join(","))
            }
        }
    }
}

/// A decoded (or to-be-encoded) ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Address(Address),
    Bool(bool),
    Uint(U256),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<Token>),
    FixedArray(Vec<Token>),
    Tuple(Vec<Token>),
}

impl Token {
    pub fn into_address(self) -> Option<Address> {
        match self {
            Self::Address(address) => Some(address),
            _ => None,
        }
    }

    pub fn into_uint(self) -> Option<U256> {
        match self {
            Self::Uint(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<String> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_array(self) -> Option<Vec<Token>> {
        match self {
            Self::Array(items) | Self::FixedArray(items) => Some(items),
            _ => None,
        }
    }

    pub fn into_tuple(self) -> Option<Vec<Token>> {
        match self {
            Self::Tuple(members) => Some(members),
            _ => None,
        }
    }
}

/// `0x`-prefixed lowercase hex.
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode hex with or without a `0x` prefix.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, AbiError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    Ok(hex::decode(digits)?)
}
