//! Binding to the deployed BuyMeACoffee contract.

use tj_abi::{AbiError, B256, Event, Function, Interface, Token, decode_hex, encode_hex};
use tj_rpc::{Log, LogFilter};
use tj_types::{Memo, WalletAddress};

use crate::TipError;

/// Compiled artifact of the contract, embedded unchanged.
pub const ARTIFACT: &str = include_str!("../abi/BuyMeACoffee.json");

pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x134C96daAeBf0e99fb2ED69bB48E73EaCDc5aE61";

const MEMO_SHAPE: &str = "(address,uint256,string,string)";

/// The contract address plus the interface entries the page uses.
#[derive(Debug, Clone)]
pub struct TipContract {
    address: WalletAddress,
    buy_coffee: Function,
    get_memos: Function,
    new_memo: Event,
}

impl TipContract {
    pub fn bind(address: WalletAddress, artifact: &str) -> Result<Self, TipError> {
        let interface = Interface::from_json(artifact)?;
        Ok(Self {
            address,
            buy_coffee: interface.function("buyCoffee")?.clone(),
            get_memos: interface.function("getMemos")?.clone(),
            new_memo: interface.event("NewMemo")?.clone(),
        })
    }

    pub fn address(&self) -> &WalletAddress {
        &self.address
    }

    pub fn buy_coffee_calldata(&self, name: &str, message: &str) -> Result<String, TipError> {
        let data = self.buy_coffee.encode_input(&[
            Token::String(name.to_owned()),
            Token::String(message.to_owned()),
        ])?;
        Ok(encode_hex(&data))
    }

    pub fn get_memos_calldata(&self) -> Result<String, TipError> {
        Ok(encode_hex(&self.get_memos.encode_input(&[])?))
    }

    /// Decode the hex result of a `getMemos()` call.
    pub fn decode_memos(&self, output: &str) -> Result<Vec<Memo>, TipError> {
        let bytes = decode_hex(output)?;
        let list = self
            .get_memos
            .decode_output(&bytes)?
            .into_iter()
            .next()
            .and_then(Token::into_array)
            .ok_or_else(|| shape_error("getMemos output"))?;

        list.into_iter()
            .map(|entry| {
                entry
                    .into_tuple()
                    .ok_or_else(|| shape_error(MEMO_SHAPE))
                    .and_then(memo_from_tokens)
            })
            .collect()
    }

    /// Filter matching every `NewMemo` emitted by this contract.
    pub fn log_filter(&self) -> LogFilter {
        LogFilter {
            address: self.address.0.clone(),
            topics: vec![Some(encode_hex(self.new_memo.topic().as_slice()))],
        }
    }

    pub fn decode_new_memo(&self, log: &Log) -> Result<Memo, TipError> {
        let topics = log
            .topics
            .iter()
            .map(|topic| {
                let bytes = decode_hex(topic)?;
                B256::try_from(bytes.as_slice()).map_err(|_| AbiError::Truncated(bytes.len()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let data = decode_hex(&log.data)?;
        memo_from_tokens(self.new_memo.decode_log(&topics, &data)?)
    }
}

fn shape_error(expected: &str) -> TipError {
    TipError::Abi(AbiError::TypeMismatch(expected.to_owned()))
}

/// `(from, timestamp, name, message)` in declaration order.
fn memo_from_tokens(tokens: Vec<Token>) -> Result<Memo, TipError> {
    let [from, timestamp, name, message]: [Token; 4] =
        tokens.try_into().map_err(|_| shape_error(MEMO_SHAPE))?;

    let from = from.into_address().ok_or_else(|| shape_error("memo sender"))?;
    let timestamp = timestamp
        .into_uint()
        .and_then(|value| u64::try_from(value).ok())
        .ok_or_else(|| shape_error("memo timestamp"))?;

    Ok(Memo {
        from: from.to_checksum(None),
        timestamp,
        name: name.into_string().ok_or_else(|| shape_error("memo name"))?,
        message: message.into_string().ok_or_else(|| shape_error("memo message"))?,
    })
}
