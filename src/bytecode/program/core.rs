// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::string::String;
use alloc::vec::Vec;
use anyhow::Result as AnyResult;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::bytecode::errors::DecompileError;
use crate::bytecode::instructions::Instructions;
use crate::bytecode::placeholder::Placeholder;
use crate::symbols::ParamType;

/// Original text of a string or bytes literal whose instruction cell only
/// holds a digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDataReplacement {
    /// Flat position of the literal's value cell.
    pub instruction_set_index: usize,
    pub argument_type: ParamType,
    pub original_data: String,
}

/// Compiled condition or effect expression: the instruction set with its
/// placeholder table and raw data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    /// Flat opcode/operand cells
    #[serde(with = "words")]
    pub instruction_set: Vec<BigUint>,

    pub placeholders: Vec<Placeholder>,

    #[serde(default)]
    pub raw_data: Vec<RawDataReplacement>,
}

impl Program {
    pub fn is_empty(&self) -> bool {
        self.instruction_set.is_empty()
    }

    pub fn instructions(&self) -> Instructions<'_> {
        Instructions::new(&self.instruction_set)
    }

    pub fn placeholder(&self, index: usize) -> Result<&Placeholder, DecompileError> {
        self.placeholders
            .get(index)
            .ok_or(DecompileError::PlaceholderResolution {
                table: "placeholder",
                index,
            })
    }

    /// Raw data recorded for the literal cell at `position`.
    pub fn raw_data_at(&self, position: usize) -> Option<&RawDataReplacement> {
        self.raw_data
            .iter()
            .find(|raw| raw.instruction_set_index == position)
    }

    pub fn to_json(&self) -> AnyResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> AnyResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Instruction words travel as decimal strings; 256-bit values do not fit
/// JSON numbers. Small numbers are accepted on input.
mod words {
    use alloc::string::{String, ToString};
    use alloc::vec::Vec;
    use core::str::FromStr;
    use num_bigint::BigUint;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Word {
        Number(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(words: &[BigUint], serializer: S) -> Result<S::Ok, S::Error> {
        words
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<BigUint>, D::Error> {
        Vec::<Word>::deserialize(deserializer)?
            .into_iter()
            .map(|word| match word {
                Word::Number(n) => Ok(BigUint::from(n)),
                Word::Text(text) => BigUint::from_str(&text)
                    .map_err(|e| D::Error::custom(alloc::format!("invalid word '{text}': {e}"))),
            })
            .collect()
    }
}
