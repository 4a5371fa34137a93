// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Rule effects: `revert(...)`, `emit ...` and expression effects.
//!
//! Revert and event messages travel as hex encoded UTF-8. An event may carry
//! one parameter, either a placeholder bound at execution time or a literal
//! stored ABI encoded. Expression effects own a private [`Program`].

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::abi::{self, AbiError, AbiValue};
use crate::bytecode::{decode_placeholder, decompile_with_limits, DecompileError, Program};
use crate::config::CodecLimits;
use crate::languages::rcl::ast::{Expr, Reference};
use crate::languages::rcl::compiler::{
    compile_condition_with_limits, reference_placeholder, CompileError,
};
use crate::languages::rcl::parser::parse_expression_with_limits;
use crate::languages::rcl::references::validate_effect_references;
use crate::symbols::{ParamType, SymbolContext};

const ADDRESS_DIGITS: usize = 40;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    #[error("invalid revert effect '{0}'")]
    InvalidRevert(String),

    #[error("invalid event effect '{0}'")]
    InvalidEvent(String),

    #[error("'{text}' is not valid hex")]
    InvalidHex { text: String },

    #[error("message is not valid UTF-8")]
    InvalidUtf8,

    #[error("unsupported event parameter '{0}'")]
    UnsupportedParam(String),

    #[error("dynamic event parameter has no placeholder")]
    MissingPlaceholder,

    #[error(transparent)]
    Abi(#[from] AbiError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Decompile(#[from] DecompileError),
}

pub type Result<T> = core::result::Result<T, EffectError>;

/// Event parameter as written in rule text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventParam {
    /// Reference resolved when the event fires (`amount`, `FC:Score`, ...)
    Dynamic(String),
    /// Literal known at compile time
    Static(AbiValue),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Revert {
        message: String,
    },
    Event {
        message: String,
        param: Option<EventParam>,
    },
    Expression {
        text: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectKind {
    Revert,
    Event,
    Expression,
}

/// Wire form of one effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedEffect {
    pub kind: EffectKind,
    /// `0x` prefixed hex of the UTF-8 message
    pub text: String,
    pub dynamic_param: bool,
    pub p_type: ParamType,
    /// `0x` prefixed hex of the ABI encoded static parameter
    pub param: String,
    #[serde(flatten)]
    pub program: Program,
}

impl Effect {
    /// Classify effect text. Anything that is not a revert or an event is an
    /// expression effect; its contents are checked when it is compiled.
    pub fn parse(text: &str) -> Result<Effect> {
        let text = text.trim();
        if let Some(rest) = keyword_rest(text, "revert") {
            return parse_revert(text, rest);
        }
        if let Some(rest) = keyword_rest(text, "emit") {
            return parse_event(text, rest);
        }
        Ok(Effect::Expression {
            text: text.to_string(),
        })
    }

    pub const fn kind(&self) -> EffectKind {
        match self {
            Effect::Revert { .. } => EffectKind::Revert,
            Effect::Event { .. } => EffectKind::Event,
            Effect::Expression { .. } => EffectKind::Expression,
        }
    }
}

// `keyword` must stand alone: `revertible == 1` is an expression.
fn keyword_rest<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(ch) if ch.is_whitespace() || ch == '(' => Some(rest.trim_start()),
        Some(_) => None,
    }
}

fn parse_revert(text: &str, rest: &str) -> Result<Effect> {
    let invalid = || EffectError::InvalidRevert(text.to_string());
    if rest.is_empty() {
        return Ok(Effect::Revert {
            message: String::new(),
        });
    }
    let inner = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(invalid)?
        .trim();
    let message = match split_quoted(inner) {
        Some((message, "")) => message.to_string(),
        _ if inner.is_empty() => String::new(),
        _ => return Err(invalid()),
    };
    Ok(Effect::Revert { message })
}

fn parse_event(text: &str, rest: &str) -> Result<Effect> {
    let invalid = || EffectError::InvalidEvent(text.to_string());
    let (message, tail) = match split_quoted(rest) {
        Some((message, tail)) => (message, tail.trim_start()),
        None => match rest.find(',') {
            Some(idx) => (rest[..idx].trim(), &rest[idx..]),
            None => (rest.trim(), ""),
        },
    };
    if message.is_empty() {
        return Err(invalid());
    }

    let param = match tail {
        "" => None,
        _ => {
            let param = tail.strip_prefix(',').ok_or_else(invalid)?.trim();
            if param.is_empty() {
                return Err(invalid());
            }
            Some(parse_event_param(param)?)
        }
    };
    Ok(Effect::Event {
        message: message.to_string(),
        param,
    })
}

/// Split a leading `'...'` or `"..."` off `text`.
fn split_quoted(text: &str) -> Option<(&str, &str)> {
    let quote = text.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let body = &text[1..];
    let end = body.find(quote)?;
    Some((&body[..end], &body[end + 1..]))
}

fn parse_event_param(param: &str) -> Result<EventParam> {
    if let Some((text, "")) = split_quoted(param) {
        return Ok(EventParam::Static(AbiValue::String(text.to_string())));
    }
    match param {
        "true" => return Ok(EventParam::Static(AbiValue::Bool(true))),
        "false" => return Ok(EventParam::Static(AbiValue::Bool(false))),
        _ => {}
    }

    if let Some(hex) = param.strip_suffix(":bytes") {
        let digits = strip_hex_prefix(hex.trim())
            .ok_or_else(|| EffectError::UnsupportedParam(param.to_string()))?;
        let bytes = decode_hex(digits)?;
        return Ok(EventParam::Static(AbiValue::Bytes(bytes)));
    }

    if let Some(digits) = strip_hex_prefix(param) {
        let value = BigUint::parse_bytes(digits.as_bytes(), 16)
            .ok_or_else(|| EffectError::InvalidHex {
                text: param.to_string(),
            })?;
        return Ok(EventParam::Static(if digits.len() == ADDRESS_DIGITS {
            AbiValue::Address(value)
        } else {
            AbiValue::Uint(value)
        }));
    }
    if param.bytes().all(|b| b.is_ascii_digit()) {
        let value = BigUint::parse_bytes(param.as_bytes(), 10)
            .ok_or_else(|| EffectError::UnsupportedParam(param.to_string()))?;
        return Ok(EventParam::Static(AbiValue::Uint(value)));
    }

    Ok(EventParam::Dynamic(param.to_string()))
}

fn strip_hex_prefix(text: &str) -> Option<&str> {
    text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
}

fn decode_hex(digits: &str) -> Result<Vec<u8>> {
    HEXLOWER_PERMISSIVE
        .decode(digits.as_bytes())
        .map_err(|_| EffectError::InvalidHex {
            text: digits.to_string(),
        })
}

fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", HEXLOWER.encode(bytes))
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    if text.contains('\'') {
        write!(f, "\"{text}\"")
    } else {
        write!(f, "'{text}'")
    }
}

impl fmt::Display for EventParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventParam::Dynamic(text) => f.write_str(text),
            EventParam::Static(AbiValue::Address(value)) => write!(f, "0x{value:040x}"),
            EventParam::Static(AbiValue::Uint(value)) => write!(f, "{value}"),
            EventParam::Static(AbiValue::Bool(value)) => write!(f, "{value}"),
            EventParam::Static(AbiValue::String(text)) => write_quoted(f, text),
            EventParam::Static(AbiValue::Bytes(bytes)) => {
                write!(f, "0x{}:bytes", HEXLOWER.encode(bytes))
            }
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Revert { message } if message.is_empty() => f.write_str("revert"),
            Effect::Revert { message } => {
                f.write_str("revert(")?;
                write_quoted(f, message)?;
                f.write_str(")")
            }
            Effect::Event { message, param } => {
                f.write_str("emit ")?;
                if message.contains(',') || message.starts_with(['\'', '"']) {
                    write_quoted(f, message)?;
                } else {
                    f.write_str(message)?;
                }
                match param {
                    Some(param) => write!(f, ", {param}"),
                    None => Ok(()),
                }
            }
            Effect::Expression { text } => f.write_str(text),
        }
    }
}

/// Encode effect text with the default limits.
pub fn encode_effect(text: &str, ctx: &SymbolContext) -> Result<EncodedEffect> {
    encode_effect_with_limits(text, ctx, &CodecLimits::default())
}

pub fn encode_effect_with_limits(
    text: &str,
    ctx: &SymbolContext,
    limits: &CodecLimits,
) -> Result<EncodedEffect> {
    validate_effect_references(text, ctx).map_err(CompileError::from)?;

    let effect = Effect::parse(text)?;
    let mut encoded = EncodedEffect {
        kind: effect.kind(),
        text: String::from("0x"),
        dynamic_param: false,
        p_type: ParamType::Void,
        param: String::from("0x"),
        program: Program::default(),
    };

    match &effect {
        Effect::Revert { message } => encoded.text = encode_hex(message.as_bytes()),
        Effect::Event { message, param } => {
            encoded.text = encode_hex(message.as_bytes());
            match param {
                None => {}
                Some(EventParam::Static(value)) => {
                    encoded.p_type = value.p_type();
                    encoded.param = encode_hex(&abi::encode(value)?);
                }
                Some(EventParam::Dynamic(param)) => {
                    let placeholder = match parse_expression_with_limits(param, limits)
                        .map_err(CompileError::from)?
                    {
                        Expr::Reference(reference @ Reference::Tracker { key: Some(_), .. }) => {
                            return Err(EffectError::UnsupportedParam(format!(
                                "TR:{}(...)",
                                reference.name()
                            )))
                        }
                        Expr::Reference(reference) => reference_placeholder(ctx, &reference)?,
                        _ => return Err(EffectError::UnsupportedParam(param.clone())),
                    };
                    encoded.dynamic_param = true;
                    encoded.p_type = placeholder.p_type;
                    encoded.program.placeholders = vec![placeholder];
                }
            }
        }
        Effect::Expression { text } => {
            encoded.program = compile_condition_with_limits(text, ctx, limits)?;
        }
    }

    log::debug!("encoded {:?} effect", encoded.kind);
    Ok(encoded)
}

impl EncodedEffect {
    pub fn decode(&self, ctx: &SymbolContext) -> Result<Effect> {
        self.decode_with_limits(ctx, &CodecLimits::default())
    }

    pub fn decode_with_limits(&self, ctx: &SymbolContext, limits: &CodecLimits) -> Result<Effect> {
        let effect = match self.kind {
            EffectKind::Revert => Effect::Revert {
                message: decode_message(&self.text)?,
            },
            EffectKind::Event => {
                let message = decode_message(&self.text)?;
                let param = if self.dynamic_param {
                    let placeholder = self
                        .program
                        .placeholders
                        .first()
                        .ok_or(EffectError::MissingPlaceholder)?;
                    let decoded = decode_placeholder(placeholder, 0, ctx)?;
                    Some(EventParam::Dynamic(decoded.text))
                } else if self.p_type == ParamType::Void {
                    None
                } else {
                    let data = decode_hex(strip_hex_prefix(&self.param).unwrap_or(&self.param))?;
                    Some(EventParam::Static(abi::decode(self.p_type, &data)?))
                };
                Effect::Event { message, param }
            }
            EffectKind::Expression => Effect::Expression {
                text: decompile_with_limits(&self.program, ctx, limits)?,
            },
        };
        Ok(effect)
    }
}

/// Decode an effect back into RCL text.
pub fn decode_effect(encoded: &EncodedEffect, ctx: &SymbolContext) -> Result<String> {
    Ok(encoded.decode(ctx)?.to_string())
}

// Messages may arrive padded to a fixed width with NULs.
fn decode_message(hex: &str) -> Result<String> {
    let bytes = decode_hex(strip_hex_prefix(hex).unwrap_or(hex))?;
    let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |idx| idx + 1);
    String::from_utf8(bytes[..end].to_vec()).map_err(|_| EffectError::InvalidUtf8)
}
