//! Interface-description artifacts.
//!
//! Accepts either a compiler artifact object carrying an `abi` field or a
//! bare ABI array. Overloaded names are not supported; the last declaration
//! of a name wins.

use alloy_primitives::keccak256;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::codec::{decode, decode_single, encode};
use crate::{AbiError, B256, ParamType, Token};

#[derive(Debug, Deserialize)]
struct RawParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    components: Vec<RawParam>,
    #[serde(default)]
    indexed: bool,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<RawParam>,
    #[serde(default)]
    outputs: Vec<RawParam>,
    #[serde(default, rename = "stateMutability")]
    state_mutability: Option<String>,
    #[serde(default)]
    anonymous: bool,
}

impl RawParam {
    fn resolve(&self) -> Result<Param, AbiError> {
        let components = self
            .components
            .iter()
            .map(|c| c.resolve().map(|p| p.kind))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Param {
            name: self.name.clone(),
            kind: ParamType::parse(&self.kind, &components)?,
            indexed: self.indexed,
        })
    }
}

fn resolve_all(raw: &[RawParam]) -> Result<Vec<Param>, AbiError> {
    raw.iter().map(RawParam::resolve).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: ParamType,
    pub indexed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateMutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

impl StateMutability {
    fn from_artifact(value: Option<&str>) -> Self {
        match value {
            Some("pure") => Self::Pure,
            Some("view") => Self::View,
            Some("payable") => Self::Payable,
            _ => Self::NonPayable,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub inputs: Vec<Param>,
    pub outputs: Vec<Param>,
    pub state_mutability: StateMutability,
}

impl Function {
    pub fn signature(&self) -> String {
        signature(&self.name, &self.inputs)
    }

    pub fn selector(&self) -> [u8; 4] {
        let hash = keccak256(self.signature().as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    /// Selector followed by the encoded arguments.
    pub fn encode_input(&self, args: &[Token]) -> Result<Vec<u8>, AbiError> {
        let types: Vec<ParamType> = self.inputs.iter().map(|p| p.kind.clone()).collect();
        let mut out = self.selector().to_vec();
        out.extend(encode(&types, args)?);
        Ok(out)
    }

    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<Token>, AbiError> {
        let types: Vec<ParamType> = self.outputs.iter().map(|p| p.kind.clone()).collect();
        decode(&types, data)
    }
}

#[derive(Debug, Clone)]
pub struct Event {
    pub name: String,
    pub inputs: Vec<Param>,
    pub anonymous: bool,
}

impl Event {
    pub fn signature(&self) -> String {
        signature(&self.name, &self.inputs)
    }

    pub fn topic(&self) -> B256 {
        keccak256(self.signature().as_bytes())
    }

    /// Decode a log into its inputs, in declaration order.
    ///
    /// Indexed inputs come from the topics; indexed dynamic values are only
    /// available as their 32-byte hash and are returned as `FixedBytes`.
    pub fn decode_log(&self, topics: &[B256], data: &[u8]) -> Result<Vec<Token>, AbiError> {
        let mut topics = topics.iter();
        if !self.anonymous {
            match topics.next() {
                Some(first) if *first == self.topic() => {}
                _ => return Err(AbiError::TopicMismatch(self.name.clone())),
            }
        }

        let data_types: Vec<ParamType> = self
            .inputs
            .iter()
            .filter(|p| !p.indexed)
            .map(|p| p.kind.clone())
            .collect();
        let mut data_tokens = decode(&data_types, data)?.into_iter();

        let mut out = Vec::with_capacity(self.inputs.len());
        for (index, input) in self.inputs.iter().enumerate() {
            let token = if input.indexed {
                let topic = topics.next().ok_or(AbiError::MissingTopic(index))?;
                match input.kind {
                    ParamType::Address | ParamType::Bool | ParamType::Uint(_) | ParamType::FixedBytes(_) => {
                        decode_single(&input.kind, topic.as_slice())?
                    }
                    _ => Token::FixedBytes(topic.to_vec()),
                }
            } else {
                data_tokens.next().ok_or(AbiError::Truncated(data.len()))?
            };
            out.push(token);
        }
        Ok(out)
    }
}

fn signature(name: &str, inputs: &[Param]) -> String {
    let types: Vec<String> = inputs.iter().map(|p| p.kind.canonical()).collect();
    format!("{name}({})", types.join(","))
}

#[derive(Debug, Clone, Default)]
pub struct Interface {
    functions: BTreeMap<String, Function>,
    events: BTreeMap<String, Event>,
}

impl Interface {
    pub fn from_json(json: &str) -> Result<Self, AbiError> {
        let value: Value = serde_json::from_str(json)?;
        let abi = match value {
            Value::Array(_) => value,
            Value::Object(mut artifact) => artifact.remove("abi").ok_or(AbiError::MissingAbi)?,
            _ => return Err(AbiError::MissingAbi),
        };
        let items: Vec<RawItem> = serde_json::from_value(abi)?;

        let mut interface = Self::default();
        for item in items {
            match item.kind.as_str() {
                "function" => {
                    let function = Function {
                        name: item.name.clone(),
                        inputs: resolve_all(&item.inputs)?,
                        outputs: resolve_all(&item.outputs)?,
                        state_mutability: StateMutability::from_artifact(item.state_mutability.as_deref()),
                    };
                    interface.functions.insert(item.name, function);
                }
                "event" => {
                    let event = Event {
                        name: item.name.clone(),
                        inputs: resolve_all(&item.inputs)?,
                        anonymous: item.anonymous,
                    };
                    interface.events.insert(item.name, event);
                }
                // constructor, fallback, receive, error
                _ => {}
            }
        }
        Ok(interface)
    }

    pub fn function(&self, name: &str) -> Result<&Function, AbiError> {
        self.functions
            .get(name)
            .ok_or_else(|| AbiError::UnknownFunction(name.to_owned()))
    }

    pub fn event(&self, name: &str) -> Result<&Event, AbiError> {
        self.events
            .get(name)
            .ok_or_else(|| AbiError::UnknownEvent(name.to_owned()))
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.values()
    }
}
