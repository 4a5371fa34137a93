// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Minimal ABI codec for a single value, as produced by `abi.encode(value)`.
//!
//! Static values occupy one 32-byte word. `string` and `bytes` are written as
//! an offset word, a length word and the data right-padded to a word boundary.

use alloc::string::String;
use alloc::vec::Vec;

use num_bigint::BigUint;
use sha3::{Digest, Keccak256};
use thiserror::Error;

use crate::symbols::ParamType;

const WORD: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("cannot encode or decode values of type {p_type}")]
    UnsupportedType { p_type: ParamType },

    #[error("value does not fit in {bits} bits")]
    Overflow { bits: u32 },

    #[error("encoded data is truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("invalid dynamic data offset {offset}")]
    InvalidOffset { offset: usize },

    #[error("invalid boolean word")]
    InvalidBool,

    #[error("string data is not valid UTF-8")]
    InvalidUtf8,
}

/// A single ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Address(BigUint),
    Uint(BigUint),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
}

impl AbiValue {
    pub const fn p_type(&self) -> ParamType {
        match self {
            AbiValue::Address(_) => ParamType::Address,
            AbiValue::Uint(_) => ParamType::Uint256,
            AbiValue::Bool(_) => ParamType::Bool,
            AbiValue::String(_) => ParamType::String,
            AbiValue::Bytes(_) => ParamType::Bytes,
        }
    }
}

fn word_from_uint(value: &BigUint, bits: u32) -> Result<[u8; WORD], AbiError> {
    if value.bits() > u64::from(bits) {
        return Err(AbiError::Overflow { bits });
    }
    let bytes = value.to_bytes_be();
    let mut word = [0u8; WORD];
    word[WORD - bytes.len()..].copy_from_slice(&bytes);
    Ok(word)
}

fn push_dynamic(out: &mut Vec<u8>, data: &[u8]) {
    let mut offset = [0u8; WORD];
    offset[WORD - 1] = WORD as u8;
    out.extend_from_slice(&offset);
    let mut len = [0u8; WORD];
    len[WORD - 8..].copy_from_slice(&(data.len() as u64).to_be_bytes());
    out.extend_from_slice(&len);
    out.extend_from_slice(data);
    let padding = (WORD - data.len() % WORD) % WORD;
    out.extend(core::iter::repeat(0u8).take(padding));
}

/// Encode one value the way `abi.encode(value)` does.
pub fn encode(value: &AbiValue) -> Result<Vec<u8>, AbiError> {
    let mut out = Vec::with_capacity(WORD);
    match value {
        AbiValue::Address(v) => out.extend_from_slice(&word_from_uint(v, 160)?),
        AbiValue::Uint(v) => out.extend_from_slice(&word_from_uint(v, 256)?),
        AbiValue::Bool(b) => {
            let mut word = [0u8; WORD];
            word[WORD - 1] = u8::from(*b);
            out.extend_from_slice(&word);
        }
        AbiValue::String(s) => push_dynamic(&mut out, s.as_bytes()),
        AbiValue::Bytes(b) => push_dynamic(&mut out, b),
    }
    Ok(out)
}

fn read_word(data: &[u8], at: usize) -> Result<&[u8], AbiError> {
    data.get(at..at + WORD).ok_or(AbiError::Truncated {
        needed: at + WORD,
        available: data.len(),
    })
}

fn word_to_usize(word: &[u8]) -> Option<usize> {
    let value = BigUint::from_bytes_be(word);
    num_traits::ToPrimitive::to_usize(&value)
}

/// Decode one value of `p_type` from `data`.
pub fn decode(p_type: ParamType, data: &[u8]) -> Result<AbiValue, AbiError> {
    match p_type {
        ParamType::Address => {
            let word = read_word(data, 0)?;
            if word[..WORD - 20].iter().any(|b| *b != 0) {
                return Err(AbiError::Overflow { bits: 160 });
            }
            Ok(AbiValue::Address(BigUint::from_bytes_be(word)))
        }
        ParamType::Uint256 => Ok(AbiValue::Uint(BigUint::from_bytes_be(read_word(data, 0)?))),
        ParamType::Bool => {
            let word = read_word(data, 0)?;
            match (word[..WORD - 1].iter().all(|b| *b == 0), word[WORD - 1]) {
                (true, 0) => Ok(AbiValue::Bool(false)),
                (true, 1) => Ok(AbiValue::Bool(true)),
                _ => Err(AbiError::InvalidBool),
            }
        }
        ParamType::String | ParamType::Bytes => {
            let offset = word_to_usize(read_word(data, 0)?)
                .ok_or(AbiError::InvalidOffset { offset: usize::MAX })?;
            let len_word = data
                .get(offset..)
                .ok_or(AbiError::InvalidOffset { offset })
                .and_then(|rest| read_word(rest, 0))?;
            let len = word_to_usize(len_word).ok_or(AbiError::Overflow { bits: 64 })?;
            let start = offset + WORD;
            let bytes = data
                .get(start..start.saturating_add(len))
                .ok_or(AbiError::Truncated {
                    needed: start.saturating_add(len),
                    available: data.len(),
                })?
                .to_vec();
            if p_type == ParamType::String {
                String::from_utf8(bytes)
                    .map(AbiValue::String)
                    .map_err(|_| AbiError::InvalidUtf8)
            } else {
                Ok(AbiValue::Bytes(bytes))
            }
        }
        ParamType::Void | ParamType::StaticTypeArray | ParamType::DynamicTypeArray => {
            Err(AbiError::UnsupportedType { p_type })
        }
    }
}

/// Instruction word standing in for a string or bytes literal:
/// `keccak256(abi.encode(value))`.
pub fn literal_digest(value: &AbiValue) -> Result<BigUint, AbiError> {
    let encoded = encode(value)?;
    let digest = Keccak256::digest(&encoded);
    Ok(BigUint::from_bytes_be(digest.as_slice()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing)]
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn static_values_take_one_word() {
        let encoded = encode(&AbiValue::Uint(BigUint::from(258u32))).unwrap();
        assert_eq!(encoded.len(), 32);
        assert_eq!(&encoded[30..], &[1, 2]);
        assert_eq!(
            decode(ParamType::Uint256, &encoded).unwrap(),
            AbiValue::Uint(BigUint::from(258u32))
        );

        let encoded = encode(&AbiValue::Bool(true)).unwrap();
        assert_eq!(decode(ParamType::Bool, &encoded).unwrap(), AbiValue::Bool(true));
    }

    #[test]
    fn string_layout() {
        let encoded = encode(&AbiValue::String("hello".to_string())).unwrap();
        // offset, length, one padded data word
        assert_eq!(encoded.len(), 96);
        assert_eq!(encoded[31], 0x20);
        assert_eq!(encoded[63], 5);
        assert_eq!(&encoded[64..69], b"hello");
        assert_eq!(
            decode(ParamType::String, &encoded).unwrap(),
            AbiValue::String("hello".to_string())
        );
    }

    #[test]
    fn address_overflow() {
        let too_big = BigUint::from(1u8) << 160;
        assert_eq!(
            encode(&AbiValue::Address(too_big)),
            Err(AbiError::Overflow { bits: 160 })
        );
    }

    #[test]
    fn truncated_input() {
        assert!(matches!(
            decode(ParamType::Uint256, &[0u8; 31]),
            Err(AbiError::Truncated { .. })
        ));
        let mut encoded = encode(&AbiValue::Bytes(alloc::vec![1, 2, 3])).unwrap();
        encoded.truncate(64);
        assert!(decode(ParamType::Bytes, &encoded).is_err());
    }

    #[test]
    fn bool_word_must_be_canonical() {
        let mut word = alloc::vec![0u8; 32];
        word[31] = 2;
        assert_eq!(decode(ParamType::Bool, &word), Err(AbiError::InvalidBool));
    }

    #[test]
    fn digest_is_deterministic() {
        let a = literal_digest(&AbiValue::String("admin".to_string())).unwrap();
        let b = literal_digest(&AbiValue::String("admin".to_string())).unwrap();
        let c = literal_digest(&AbiValue::String("user".to_string())).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.bits() <= 256);
    }
}
