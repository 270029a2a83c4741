//! Head/tail encoding of the Solidity ABI.

use crate::{AbiError, Address, ParamType, Token, U256};

const WORD: usize = 32;

pub fn encode(types: &[ParamType], tokens: &[Token]) -> Result<Vec<u8>, AbiError> {
    if types.len() != tokens.len() {
        return Err(AbiError::ArityMismatch {
            expected: types.len(),
            found: tokens.len(),
        });
    }
    encode_sequence(types, tokens)
}

pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, AbiError> {
    Decoder::new(data).sequence(types, 0)
}

/// Decode one value laid out at the start of `data` (e.g. an indexed topic).
pub fn decode_single(kind: &ParamType, data: &[u8]) -> Result<Token, AbiError> {
    Decoder::new(data).value(kind, 0)
}

fn encode_sequence(types: &[ParamType], tokens: &[Token]) -> Result<Vec<u8>, AbiError> {
    let head_len: usize = types.iter().map(ParamType::head_size).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for (kind, token) in types.iter().zip(tokens) {
        let encoded = encode_value(kind, token)?;
        if kind.is_dynamic() {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            tail.extend(encoded);
        } else {
            head.extend(encoded);
        }
    }

    head.extend(tail);
    Ok(head)
}

fn encode_value(kind: &ParamType, token: &Token) -> Result<Vec<u8>, AbiError> {
    let mismatch = || AbiError::TypeMismatch(kind.canonical());

    match (kind, token) {
        (ParamType::Address, Token::Address(address)) => {
            let mut word = [0u8; WORD];
            word[12..].copy_from_slice(address.as_slice());
            Ok(word.to_vec())
        }
        (ParamType::Bool, Token::Bool(flag)) => Ok(usize_word(usize::from(*flag)).to_vec()),
        (ParamType::Uint(bits), Token::Uint(value)) => {
            if value.bit_len() > *bits {
                return Err(mismatch());
            }
            Ok(value.to_be_bytes::<32>().to_vec())
        }
        (ParamType::FixedBytes(len), Token::FixedBytes(bytes)) => {
            if bytes.len() != *len {
                return Err(mismatch());
            }
            let mut word = [0u8; WORD];
            word[..bytes.len()].copy_from_slice(bytes);
            Ok(word.to_vec())
        }
        (ParamType::Bytes, Token::Bytes(bytes)) => Ok(encode_packed_bytes(bytes)),
        (ParamType::String, Token::String(text)) => Ok(encode_packed_bytes(text.as_bytes())),
        (ParamType::Array(inner), Token::Array(items)) => {
            let types = vec![(**inner).clone(); items.len()];
            let mut out = usize_word(items.len()).to_vec();
            out.extend(encode_sequence(&types, items)?);
            Ok(out)
        }
        (ParamType::FixedArray(inner, len), Token::FixedArray(items)) => {
            if items.len() != *len {
                return Err(AbiError::ArityMismatch {
                    expected: *len,
                    found: items.len(),
                });
            }
            let types = vec![(**inner).clone(); *len];
            encode_sequence(&types, items)
        }
        (ParamType::Tuple(members), Token::Tuple(items)) => encode(members, items),
        _ => Err(mismatch()),
    }
}

fn encode_packed_bytes(bytes: &[u8]) -> Vec<u8> {
    let padded = bytes.len().div_ceil(WORD) * WORD;
    let mut out = Vec::with_capacity(WORD + padded);
    out.extend_from_slice(&usize_word(bytes.len()));
    out.extend_from_slice(bytes);
    out.resize(WORD + padded, 0);
    out
}

fn usize_word(value: usize) -> [u8; WORD] {
    U256::from(value).to_be_bytes::<32>()
}

/// Walks `data` while charging every word and byte run it materialises
/// against a budget of `data.len()`. Well-formed data never overlaps, so
/// running out means offsets alias the same region.
struct Decoder<'a> {
    data: &'a [u8],
    budget: usize,
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            budget: data.len(),
        }
    }

    fn charge(&mut self, bytes: usize) -> Result<(), AbiError> {
        self.budget = self
            .budget
            .checked_sub(bytes)
            .ok_or(AbiError::OffsetOutOfRange)?;
        Ok(())
    }

    fn word(&mut self, at: usize) -> Result<[u8; WORD], AbiError> {
        let word = read_word(self.data, at)?;
        self.charge(WORD)?;
        Ok(word)
    }

    fn packed_bytes(&mut self, at: usize) -> Result<&'a [u8], AbiError> {
        let bytes = read_packed_bytes(self.data, at)?;
        self.charge(WORD + bytes.len().div_ceil(WORD) * WORD)?;
        Ok(bytes)
    }

    fn sequence(&mut self, types: &[ParamType], base: usize) -> Result<Vec<Token>, AbiError> {
        let mut cursor = base;
        let mut out = Vec::with_capacity(types.len());

        for kind in types {
            let token = if kind.is_dynamic() {
                let offset = read_usize(self.data, cursor)?;
                let at = base.checked_add(offset).ok_or(AbiError::OffsetOutOfRange)?;
                self.value(kind, at)?
            } else {
                self.value(kind, cursor)?
            };
            cursor += kind.head_size();
            out.push(token);
        }

        Ok(out)
    }

    fn value(&mut self, kind: &ParamType, at: usize) -> Result<Token, AbiError> {
        match kind {
            ParamType::Address => {
                let word = self.word(at)?;
                Ok(Token::Address(Address::from_slice(&word[12..])))
            }
            ParamType::Bool => Ok(Token::Bool(self.word(at)?[WORD - 1] != 0)),
            ParamType::Uint(_) => Ok(Token::Uint(U256::from_be_bytes(self.word(at)?))),
            ParamType::FixedBytes(len) => Ok(Token::FixedBytes(self.word(at)?[..*len].to_vec())),
            ParamType::Bytes => Ok(Token::Bytes(self.packed_bytes(at)?.to_vec())),
            ParamType::String => {
                let bytes = self.packed_bytes(at)?.to_vec();
                String::from_utf8(bytes)
                    .map(Token::String)
                    .map_err(|_| AbiError::InvalidUtf8)
            }
            ParamType::Array(inner) => {
                let len = read_usize(self.data, at)?;
                // every element takes at least one word, so a longer count cannot be valid
                if len > self.data.len() / WORD {
                    return Err(AbiError::OffsetOutOfRange);
                }
                let types = vec![(**inner).clone(); len];
                self.sequence(&types, at + WORD).map(Token::Array)
            }
            ParamType::FixedArray(inner, len) => {
                let types = vec![(**inner).clone(); *len];
                self.sequence(&types, at).map(Token::FixedArray)
            }
            ParamType::Tuple(members) => self.sequence(members, at).map(Token::Tuple),
        }
    }
}

fn read_word(data: &[u8], at: usize) -> Result<[u8; WORD], AbiError> {
    let end = at.checked_add(WORD).ok_or(AbiError::OffsetOutOfRange)?;
    let slice = data.get(at..end).ok_or(AbiError::Truncated(at))?;
    let mut word = [0u8; WORD];
    word.copy_from_slice(slice);
    Ok(word)
}

fn read_usize(data: &[u8], at: usize) -> Result<usize, AbiError> {
    let value = U256::from_be_bytes(read_word(data, at)?);
    u64::try_from(value)
        .ok()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or(AbiError::OffsetOutOfRange)
}

fn read_packed_bytes(data: &[u8], at: usize) -> Result<&[u8], AbiError> {
    let len = read_usize(data, at)?;
    let start = at + WORD;
    let end = start.checked_add(len).ok_or(AbiError::OffsetOutOfRange)?;
    data.get(start..end).ok_or(AbiError::Truncated(start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode_hex;

    fn memo_type() -> ParamType {
        ParamType::Tuple(vec![
            ParamType::Address,
            ParamType::Uint(256),
            ParamType::String,
            ParamType::String,
        ])
    }

    fn memo_token(byte: u8, timestamp: u64, name: &str, message: &str) -> Token {
        Token::Tuple(vec![
            Token::Address(Address::repeat_byte(byte)),
            Token::Uint(U256::from(timestamp)),
            Token::String(name.to_owned()),
            Token::String(message.to_owned()),
        ])
    }

    #[test]
    fn encodes_two_strings_with_offsets() {
        let encoded = encode(
            &[ParamType::String, ParamType::String],
            &[Token::String("Guy".into()), Token::String("Enjoy!".into())],
        )
        .unwrap();

        let expected = decode_hex(concat!(
            "0000000000000000000000000000000000000000000000000000000000000040",
            "0000000000000000000000000000000000000000000000000000000000000080",
            "0000000000000000000000000000000000000000000000000000000000000003",
            "4775790000000000000000000000000000000000000000000000000000000000",
            "0000000000000000000000000000000000000000000000000000000000000006",
            "456e6a6f79210000000000000000000000000000000000000000000000000000",
        ))
        .unwrap();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn static_values_sit_in_the_head() {
        let encoded = encode(
            &[ParamType::Address, ParamType::Uint(256), ParamType::Bool],
            &[
                Token::Address(Address::repeat_byte(0x11)),
                Token::Uint(U256::from(1_000u64)),
                Token::Bool(true),
            ],
        )
        .unwrap();
        assert_eq!(encoded.len(), 96);
        assert_eq!(&encoded[12..32], &[0x11; 20]);
        assert_eq!(&encoded[62..64], &[0x03, 0xe8]);
        assert_eq!(encoded[95], 1);
    }

    #[test]
    fn memo_array_survives_the_codec() {
        let kind = ParamType::Array(Box::new(memo_type()));
        let memos = Token::Array(vec![
            memo_token(0xaa, 1_650_000_000, "Guy", "Enjoy!"),
            memo_token(0xbb, 1_650_000_100, "", "a longer message that spills over a single thirty-two byte word"),
        ]);

        let encoded = encode(std::slice::from_ref(&kind), std::slice::from_ref(&memos)).unwrap();
        let decoded = decode(&[kind], &encoded).unwrap();
        assert_eq!(decoded, vec![memos]);
    }

    #[test]
    fn empty_array_decodes_to_nothing() {
        let kind = ParamType::Array(Box::new(memo_type()));
        let encoded = encode(std::slice::from_ref(&kind), &[Token::Array(Vec::new())]).unwrap();
        assert_eq!(encoded.len(), 64);
        assert_eq!(decode(&[kind], &encoded).unwrap(), vec![Token::Array(Vec::new())]);
    }

    #[test]
    fn rejects_mismatched_tokens() {
        assert!(matches!(
            encode(&[ParamType::String], &[Token::Bool(true)]),
            Err(AbiError::TypeMismatch(t)) if t == "string"
        ));
        assert!(matches!(
            encode(&[ParamType::String, ParamType::String], &[Token::String("only one".into())]),
            Err(AbiError::ArityMismatch { expected: 2, found: 1 })
        ));
        assert!(matches!(
            encode(&[ParamType::Uint(8)], &[Token::Uint(U256::from(256u64))]),
            Err(AbiError::TypeMismatch(_))
        ));
    }

    #[test]
    fn truncated_or_hostile_data_is_an_error() {
        let encoded = encode(&[ParamType::String], &[Token::String("hello".into())]).unwrap();
        assert!(matches!(
            decode(&[ParamType::String], &encoded[..40]),
            Err(AbiError::Truncated(_))
        ));

        // offset pointing far outside the buffer
        let mut hostile = encoded.clone();
        hostile[..32].copy_from_slice(&[0xff; 32]);
        assert!(matches!(
            decode(&[ParamType::String], &hostile),
            Err(AbiError::OffsetOutOfRange)
        ));

        // array claiming more elements than the data could hold
        let mut huge = vec![0u8; 64];
        huge[31] = 0x20;
        huge[32..64].copy_from_slice(&U256::from(1_000_000u64).to_be_bytes::<32>());
        assert!(matches!(
            decode(&[ParamType::Array(Box::new(ParamType::Uint(256)))], &huge),
            Err(AbiError::OffsetOutOfRange)
        ));
    }

    #[test]
    fn aliased_tails_are_rejected() {
        // an array of strings whose offsets all point at one long string
        let count = 64;
        let text = "x".repeat(32 * count);
        let mut data = Vec::new();
        data.extend_from_slice(&usize_word(0x20));
        data.extend_from_slice(&usize_word(count));
        for _ in 0..count {
            data.extend_from_slice(&usize_word(count * WORD));
        }
        data.extend_from_slice(&encode_packed_bytes(text.as_bytes()));

        let strings = ParamType::Array(Box::new(ParamType::String));
        assert!(matches!(
            decode(std::slice::from_ref(&strings), &data),
            Err(AbiError::OffsetOutOfRange)
        ));

        // the same strings laid out one after another decode fine
        let tokens = vec![Token::String("x".repeat(32)); count];
        let honest = encode(std::slice::from_ref(&strings), &[Token::Array(tokens.clone())]).unwrap();
        assert_eq!(decode(&[strings], &honest).unwrap(), vec![Token::Array(tokens)]);
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let encoded = encode(&[ParamType::Bytes], &[Token::Bytes(vec![0xff, 0xfe])]).unwrap();
        assert!(matches!(decode(&[ParamType::String], &encoded), Err(AbiError::InvalidUtf8)));
    }
}
