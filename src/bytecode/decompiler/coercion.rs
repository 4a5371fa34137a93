// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::format;
use alloc::string::{String, ToString};
use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::bytecode::errors::{DecompileError, Result};
use crate::bytecode::placeholder::Retype;
use crate::symbols::ParamType;

const ADDRESS_BITS: u64 = 160;

/// Render a numeric literal compared against a re-typed reference.
///
/// Returns `None` when the re-typing does not affect literals.
pub(crate) fn coerce_literal(word: &BigUint, retype: &Retype) -> Result<Option<String>> {
    match retype {
        Retype::Bool if word.is_zero() => Ok(Some("false".to_string())),
        Retype::Bool if word.is_one() => Ok(Some("true".to_string())),
        Retype::Bool => Err(DecompileError::TypeCoercion {
            value: word.to_string(),
            target: ParamType::Bool,
        }),
        Retype::Address if word.bits() <= ADDRESS_BITS => Ok(Some(format!("0x{word:040x}"))),
        Retype::Address => Err(DecompileError::TypeCoercion {
            value: word.to_string(),
            target: ParamType::Address,
        }),
        Retype::Other(_) => Ok(None),
    }
}
