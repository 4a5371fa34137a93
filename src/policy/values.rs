// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::abi::{self, AbiError, AbiValue};
use crate::bytecode::Placeholder;
use crate::config::CodecLimits;
use crate::languages::rcl::ast::{Expr, Reference};
use crate::languages::rcl::compiler::{parse_bytes, parse_word, reference_placeholder, CompileError};
use crate::languages::rcl::parser::parse_expression_with_limits;
use crate::languages::rcl::references::{split_entries, validate_values_to_pass};
use crate::lexer::{Lexer, Source};
use crate::symbols::{ParamType, SymbolContext};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("'{text}' is not a valid {p_type} value")]
    Invalid { text: String, p_type: ParamType },

    #[error(transparent)]
    Abi(#[from] AbiError),
}

/// ABI encode a tracker initial value or a mapped-tracker key/value.
///
/// Addresses and numbers may be written in decimal or `0x` hex, booleans as
/// `true`/`false`, bytes as `0x..` with an optional `:bytes` suffix. Strings
/// are taken verbatim unless fully quoted.
pub fn encode_initial_value(p_type: ParamType, text: &str) -> Result<Vec<u8>, ValueError> {
    let text = text.trim();
    let invalid = || ValueError::Invalid {
        text: text.to_string(),
        p_type,
    };
    let value = match p_type {
        ParamType::Address => AbiValue::Address(parse_word(text).map_err(|_| invalid())?),
        ParamType::Uint256 => AbiValue::Uint(parse_word(text).map_err(|_| invalid())?),
        ParamType::Bool => match text {
            "true" => AbiValue::Bool(true),
            "false" => AbiValue::Bool(false),
            _ => return Err(invalid()),
        },
        ParamType::String => AbiValue::String(unquote(text).to_string()),
        ParamType::Bytes => {
            let hex = text.strip_suffix(":bytes").unwrap_or(text);
            AbiValue::Bytes(parse_bytes(hex).map_err(|_| invalid())?)
        }
        _ => return Err(AbiError::UnsupportedType { p_type }.into()),
    };
    Ok(abi::encode(&value)?)
}

fn unquote(text: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}

/// One argument handed to a foreign call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignCallArgument {
    pub placeholder: Placeholder,
    /// Key of a `TR:name(key)` argument
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_tracker_key: Option<Placeholder>,
}

/// Encode a comma separated values-to-pass list.
pub fn encode_values_to_pass(
    text: &str,
    ctx: &SymbolContext,
) -> Result<Vec<ForeignCallArgument>, CompileError> {
    validate_values_to_pass(text, ctx)?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let source = Source::from_contents("values".to_string(), text.to_string())
        .map_err(|e| CompileError::Unsupported(e.to_string()))?;
    let tokens = Lexer::tokenize(&source).map_err(|e| CompileError::Unsupported(e.to_string()))?;
    let limits = CodecLimits::default();

    let mut arguments = Vec::new();
    for entry in split_entries(&tokens) {
        let (Some(first), Some(last)) = (entry.first(), entry.last()) else {
            continue;
        };
        let entry_text = &text[first.1.start as usize..last.1.end as usize];
        let argument = match parse_expression_with_limits(entry_text, &limits)? {
            Expr::Reference(Reference::Tracker {
                name,
                key: Some(key),
                ..
            }) => {
                let symbol = ctx.mapped_tracker(&name).ok_or_else(|| {
                    CompileError::UnknownReference {
                        kind: "mapped tracker",
                        name: name.clone(),
                    }
                })?;
                let Expr::Reference(key) = *key else {
                    return Err(CompileError::Unsupported(alloc::format!(
                        "key of TR:{name} must be a single reference"
                    )));
                };
                ForeignCallArgument {
                    placeholder: Placeholder::mapped_tracker(symbol),
                    mapped_tracker_key: Some(reference_placeholder(ctx, &key)?),
                }
            }
            Expr::Reference(reference) => ForeignCallArgument {
                placeholder: reference_placeholder(ctx, &reference)?,
                mapped_tracker_key: None,
            },
            _ => {
                return Err(CompileError::Unsupported(alloc::format!(
                    "'{entry_text}' is not a single value"
                )))
            }
        };
        arguments.push(argument);
    }
    Ok(arguments)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing)]
    use super::*;
    use crate::bytecode::GlobalVar;
    use alloc::vec;
    use num_bigint::BigUint;

    fn ctx() -> SymbolContext {
        let mut ctx = SymbolContext::from_signature("transfer(address to, uint256 amount)").unwrap();
        ctx.add_foreign_call("Score", 4, ParamType::Uint256).unwrap();
        ctx.add_tracker("Total", 1, ParamType::Uint256).unwrap();
        ctx.add_mapped_tracker("Balances", 2, ParamType::Address, ParamType::Uint256)
            .unwrap();
        ctx
    }

    #[test]
    fn initial_values() {
        let encoded = encode_initial_value(ParamType::Uint256, "258").unwrap();
        assert_eq!(encoded.len(), 32);
        assert_eq!(&encoded[30..], &[1, 2]);
        assert_eq!(
            encode_initial_value(ParamType::Address, "0xab").unwrap(),
            abi::encode(&AbiValue::Address(BigUint::from(0xabu8))).unwrap()
        );
        assert_eq!(
            encode_initial_value(ParamType::String, "'hi'").unwrap(),
            encode_initial_value(ParamType::String, "hi").unwrap()
        );
        assert_eq!(
            encode_initial_value(ParamType::Bytes, "0xbeef:bytes").unwrap(),
            abi::encode(&AbiValue::Bytes(vec![0xbe, 0xef])).unwrap()
        );
        assert_eq!(
            encode_initial_value(ParamType::Bool, "yes"),
            Err(ValueError::Invalid {
                text: "yes".to_string(),
                p_type: ParamType::Bool
            })
        );
        assert!(matches!(
            encode_initial_value(ParamType::Address, &alloc::format!("0x1{}", "0".repeat(40))),
            Err(ValueError::Abi(AbiError::Overflow { .. }))
        ));
        assert!(matches!(
            encode_initial_value(ParamType::Void, "1"),
            Err(ValueError::Abi(AbiError::UnsupportedType { .. }))
        ));
    }

    #[test]
    fn values_to_pass() {
        let ctx = ctx();
        let arguments =
            encode_values_to_pass("to, FC:Score, TR:Balances(GV:MSG_SENDER), TR:Total", &ctx)
                .unwrap();
        assert_eq!(arguments.len(), 4);
        assert_eq!(
            arguments[0].placeholder,
            Placeholder::argument(ctx.argument("to").unwrap())
        );
        assert_eq!(
            arguments[2],
            ForeignCallArgument {
                placeholder: Placeholder::mapped_tracker(ctx.mapped_tracker("Balances").unwrap()),
                mapped_tracker_key: Some(Placeholder::global(GlobalVar::MsgSender)),
            }
        );
        assert_eq!(arguments[3].mapped_tracker_key, None);

        assert!(encode_values_to_pass("", &ctx).unwrap().is_empty());
        assert!(matches!(
            encode_values_to_pass("nobody", &ctx),
            Err(CompileError::References(_))
        ));
        assert!(matches!(
            encode_values_to_pass("TR:Balances(amount + 1)", &ctx),
            Err(CompileError::Unsupported(_))
        ));
    }
}
