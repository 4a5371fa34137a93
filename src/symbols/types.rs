// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Parameter type tag shared with the execution engine.
///
/// The numeric codes are part of the bytecode surface and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParamType {
    Address,
    String,
    Uint256,
    Bool,
    Void,
    Bytes,
    StaticTypeArray,
    DynamicTypeArray,
}

impl ParamType {
    pub const ALL: [ParamType; 8] = [
        ParamType::Address,
        ParamType::String,
        ParamType::Uint256,
        ParamType::Bool,
        ParamType::Void,
        ParamType::Bytes,
        ParamType::StaticTypeArray,
        ParamType::DynamicTypeArray,
    ];

    pub const fn code(self) -> u8 {
        match self {
            ParamType::Address => 0,
            ParamType::String => 1,
            ParamType::Uint256 => 2,
            ParamType::Bool => 3,
            ParamType::Void => 4,
            ParamType::Bytes => 5,
            ParamType::StaticTypeArray => 6,
            ParamType::DynamicTypeArray => 7,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Map a Solidity type name (as written in signatures and re-typing
    /// suffixes) to its parameter type.
    ///
    /// `uintN`/`intN` collapse to `Uint256` and `bytesN` to `Bytes`.
    /// Returns `None` for names that have no representation.
    pub fn from_type_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if let Some(element) = name.strip_suffix(']') {
            let (element, size) = element.rsplit_once('[')?;
            Self::from_type_name(element)?;
            return match size {
                "" => Some(ParamType::DynamicTypeArray),
                _ if size.bytes().all(|b| b.is_ascii_digit()) => Some(ParamType::StaticTypeArray),
                _ => None,
            };
        }

        match name {
            "address" => Some(ParamType::Address),
            "string" => Some(ParamType::String),
            "bool" => Some(ParamType::Bool),
            "void" => Some(ParamType::Void),
            "bytes" => Some(ParamType::Bytes),
            _ => {
                if let Some(bits) = name
                    .strip_prefix("uint")
                    .or_else(|| name.strip_prefix("int"))
                {
                    return valid_width(bits, 8, 256).then_some(ParamType::Uint256);
                }
                if let Some(width) = name.strip_prefix("bytes") {
                    return valid_width(width, 1, 32).then_some(ParamType::Bytes);
                }
                None
            }
        }
    }

    /// Canonical type name, accepted back by [`ParamType::from_type_name`].
    pub const fn type_name(self) -> &'static str {
        match self {
            ParamType::Address => "address",
            ParamType::String => "string",
            ParamType::Uint256 => "uint256",
            ParamType::Bool => "bool",
            ParamType::Void => "void",
            ParamType::Bytes => "bytes",
            ParamType::StaticTypeArray => "uint256[1]",
            ParamType::DynamicTypeArray => "uint256[]",
        }
    }

    /// Whether values of this type are stored out of line in raw data.
    pub const fn is_dynamic(self) -> bool {
        matches!(self, ParamType::String | ParamType::Bytes)
    }
}

// An empty width means the full-size type (`uint` == `uint256`).
fn valid_width(digits: &str, step: u32, max: u32) -> bool {
    if digits.is_empty() {
        return step == 8;
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) || digits.starts_with('0') {
        return false;
    }
    match digits.parse::<u32>() {
        Ok(width) if step == 8 => width % 8 == 0 && width <= max,
        Ok(width) => width >= 1 && width <= max,
        Err(_) => false,
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
