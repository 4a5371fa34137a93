// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Resolution of every name in rule text against a [`SymbolContext`].
//!
//! Validation fails closed: all unresolved names are collected and any one
//! of them rejects the text.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use thiserror::Error;

use crate::bytecode::GlobalVar;
use crate::lexer::{Lexer, RefPrefix, Source, Token, TokenKind};
use crate::symbols::SymbolContext;

use super::effects::{Effect, EventParam};

/// Identifiers that never name an argument.
const KEYWORDS: &[&str] = &["AND", "OR", "NOT", "true", "false"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("{0}")]
    Syntax(String),

    #[error("unknown foreign call 'FC:{name}'")]
    ForeignCall { name: String },

    #[error("unknown tracker 'TR:{name}'")]
    Tracker { name: String },

    #[error("unknown mapped tracker 'TR:{name}'")]
    MappedTracker { name: String },

    #[error("unknown global value 'GV:{name}'")]
    Global { name: String },

    #[error("'{name}' is not an argument of '{function}'")]
    Argument { name: String, function: String },

    #[error("empty entry in values to pass")]
    EmptyValue,

    #[error("'{entry}' is not a single value")]
    InvalidValue { entry: String },
}

/// Every unresolved name found in one piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceErrors(pub Vec<ReferenceError>);

impl core::error::Error for ReferenceErrors {}

impl fmt::Display for ReferenceErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, error) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl ReferenceErrors {
    fn push(&mut self, error: ReferenceError) {
        if !self.0.contains(&error) {
            self.0.push(error);
        }
    }

    fn into_result(self) -> Result<(), ReferenceErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, ReferenceError> {
    let source = Source::from_contents("rule".to_string(), text.to_string())
        .map_err(|e| ReferenceError::Syntax(e.to_string()))?;
    Lexer::tokenize(&source).map_err(|e| ReferenceError::Syntax(e.to_string()))
}

fn scan(tokens: &[Token], ctx: &SymbolContext, errors: &mut ReferenceErrors) {
    for (idx, token) in tokens.iter().enumerate() {
        let name = token.reference_name();
        match token.0 {
            TokenKind::Reference(RefPrefix::ForeignCall) => {
                if ctx.foreign_call(name).is_none() {
                    errors.push(ReferenceError::ForeignCall {
                        name: name.to_string(),
                    });
                }
            }
            TokenKind::Reference(RefPrefix::Tracker | RefPrefix::TrackerUpdate) => {
                let mapped = tokens.get(idx + 1).is_some_and(|next| next.is_symbol("("));
                if mapped && ctx.mapped_tracker(name).is_none() {
                    errors.push(ReferenceError::MappedTracker {
                        name: name.to_string(),
                    });
                } else if !mapped && ctx.tracker(name).is_none() {
                    errors.push(ReferenceError::Tracker {
                        name: name.to_string(),
                    });
                }
            }
            TokenKind::Reference(RefPrefix::Global) => {
                if GlobalVar::from_name(name).is_none() {
                    errors.push(ReferenceError::Global {
                        name: name.to_string(),
                    });
                }
            }
            TokenKind::Ident => {
                // Type suffixes (`x!bool`) and `:bytes` are not names.
                let suffix = idx
                    .checked_sub(1)
                    .and_then(|prev| tokens.get(prev))
                    .is_some_and(|prev| prev.is_symbol("!") || prev.is_symbol(":"));
                if !suffix && !KEYWORDS.contains(&name) && ctx.argument(name).is_none() {
                    errors.push(ReferenceError::Argument {
                        name: name.to_string(),
                        function: ctx.calling_function().to_string(),
                    });
                }
            }
            _ => {}
        }
    }
}

fn scan_text(text: &str, ctx: &SymbolContext, errors: &mut ReferenceErrors) {
    match tokenize(text) {
        Ok(tokens) => scan(&tokens, ctx, errors),
        Err(err) => errors.push(err),
    }
}

/// Validate the names used by a rule condition.
pub fn validate_condition_references(
    text: &str,
    ctx: &SymbolContext,
) -> Result<(), ReferenceErrors> {
    let mut errors = ReferenceErrors::default();
    scan_text(text, ctx, &mut errors);
    errors.into_result()
}

/// Validate the names used by one effect. Revert messages and static event
/// parameters contain no names.
pub fn validate_effect_references(text: &str, ctx: &SymbolContext) -> Result<(), ReferenceErrors> {
    let mut errors = ReferenceErrors::default();
    match Effect::parse(text) {
        Ok(Effect::Expression { text }) => scan_text(&text, ctx, &mut errors),
        Ok(Effect::Event {
            param: Some(EventParam::Dynamic(param)),
            ..
        }) => scan_text(&param, ctx, &mut errors),
        Ok(_) => {}
        Err(err) => errors.push(ReferenceError::Syntax(err.to_string())),
    }
    errors.into_result()
}

/// Validate a comma separated list of values passed to a foreign call.
///
/// Each entry is an argument name or a single `FC:`, `TR:`, `TR:name(key)`
/// or `GV:` reference.
pub fn validate_values_to_pass(text: &str, ctx: &SymbolContext) -> Result<(), ReferenceErrors> {
    let mut errors = ReferenceErrors::default();
    if text.trim().is_empty() {
        return Ok(());
    }
    let tokens = match tokenize(text) {
        Ok(tokens) => tokens,
        Err(err) => {
            errors.push(err);
            return errors.into_result();
        }
    };

    for entry in split_entries(&tokens) {
        match entry {
            [] => errors.push(ReferenceError::EmptyValue),
            [single] if matches!(single.0, TokenKind::Ident | TokenKind::Reference(_)) => {
                scan(entry, ctx, &mut errors)
            }
            [head, open, .., close]
                if matches!(
                    head.0,
                    TokenKind::Reference(RefPrefix::Tracker | RefPrefix::TrackerUpdate)
                ) && open.is_symbol("(")
                    && close.is_symbol(")") =>
            {
                scan(entry, ctx, &mut errors)
            }
            _ => errors.push(ReferenceError::InvalidValue {
                entry: entry_text(entry),
            }),
        }
    }
    errors.into_result()
}

/// Split tokens on top-level commas, dropping the trailing `Eof`.
pub(crate) fn split_entries(tokens: &[Token]) -> Vec<&[Token]> {
    let tokens = match tokens.last() {
        Some(last) if last.0 == TokenKind::Eof => &tokens[..tokens.len() - 1],
        _ => tokens,
    };
    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, token) in tokens.iter().enumerate() {
        if token.is_symbol("(") {
            depth += 1;
        } else if token.is_symbol(")") {
            depth = depth.saturating_sub(1);
        } else if token.is_symbol(",") && depth == 0 {
            entries.push(&tokens[start..idx]);
            start = idx + 1;
        }
    }
    entries.push(&tokens[start..]);
    entries
}

fn entry_text(entry: &[Token]) -> String {
    entry
        .iter()
        .map(|token| token.text())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::symbols::ParamType;
    use alloc::vec;

    fn ctx() -> SymbolContext {
        let mut ctx = SymbolContext::from_signature("transfer(address to, uint256 amount)").unwrap();
        ctx.add_foreign_call("IsActive", 3, ParamType::Bool).unwrap();
        ctx.add_tracker("Total", 1, ParamType::Uint256).unwrap();
        ctx.add_mapped_tracker("Balances", 2, ParamType::Address, ParamType::Uint256)
            .unwrap();
        ctx
    }

    #[test]
    fn foreign_calls() {
        let ctx = ctx();
        assert!(validate_condition_references("FC:IsActive == 1", &ctx).is_ok());

        let empty = SymbolContext::from_signature("transfer(address to)").unwrap();
        let err = validate_condition_references("FC:IsActive == 1", &empty).unwrap_err();
        assert_eq!(
            err.0,
            vec![ReferenceError::ForeignCall {
                name: "IsActive".to_string()
            }]
        );
        assert!(err.to_string().contains("IsActive"));
    }

    #[test]
    fn all_violations_are_collected() {
        let err = validate_condition_references(
            "(TR:Missing > 1 AND TR:Total(to) == 2) OR GV:NOW == sender",
            &ctx(),
        )
        .unwrap_err();
        assert_eq!(
            err.0,
            vec![
                ReferenceError::Tracker {
                    name: "Missing".to_string()
                },
                ReferenceError::MappedTracker {
                    name: "Total".to_string()
                },
                ReferenceError::Global {
                    name: "NOW".to_string()
                },
                ReferenceError::Argument {
                    name: "sender".to_string(),
                    function: "transfer".to_string()
                },
            ]
        );
    }

    #[test]
    fn suffixes_and_keywords_are_not_names() {
        let ctx = ctx();
        assert!(validate_condition_references(
            "NOT (to!address == 0x01 AND FC:IsActive!bool == true) OR 0x12:bytes == 1",
            &ctx
        )
        .is_ok());
        assert!(validate_condition_references("TRU:Balances(to) += amount", &ctx).is_ok());
    }

    #[test]
    fn effects() {
        let ctx = ctx();
        assert!(validate_effect_references("revert('no access')", &ctx).is_ok());
        assert!(validate_effect_references("emit Transfer, amount", &ctx).is_ok());
        assert!(validate_effect_references("emit Transfer, 'literal'", &ctx).is_ok());
        assert!(validate_effect_references("TRU:Total += amount", &ctx).is_ok());
        assert_eq!(
            validate_effect_references("emit Transfer, FC:Nope", &ctx)
                .unwrap_err()
                .0,
            vec![ReferenceError::ForeignCall {
                name: "Nope".to_string()
            }]
        );
        assert!(validate_effect_references("TRU:Unknown = 1", &ctx).is_err());
    }

    #[test]
    fn values_to_pass() {
        let ctx = ctx();
        assert!(validate_values_to_pass("", &ctx).is_ok());
        assert!(validate_values_to_pass("to, amount, TR:Balances(to), GV:MSG_SENDER", &ctx).is_ok());
        assert_eq!(
            validate_values_to_pass("to, , nobody", &ctx).unwrap_err().0,
            vec![
                ReferenceError::EmptyValue,
                ReferenceError::Argument {
                    name: "nobody".to_string(),
                    function: "transfer".to_string()
                }
            ]
        );
        assert_eq!(
            validate_values_to_pass("amount + 1", &ctx).unwrap_err().0,
            vec![ReferenceError::InvalidValue {
                entry: "amount + 1".to_string()
            }]
        );
    }
}
