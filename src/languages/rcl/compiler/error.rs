// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.
#![allow(clippy::pattern_type_mismatch)]

use alloc::string::String;

use crate::abi::AbiError;
use crate::languages::rcl::grammar::GrammarError;
use crate::languages::rcl::parser::ParseError;
use crate::languages::rcl::references::ReferenceErrors;
use crate::symbols::ParamType;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error("unresolved references: {0}")]
    References(#[from] ReferenceErrors),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("unknown type '{type_name}' in re-typing suffix")]
    TypeCoercion { type_name: String },

    #[error("cannot compare {literal} with {target}: value is not representable")]
    LiteralCoercion { literal: String, target: ParamType },

    #[error("invalid literal '{literal}': {reason}")]
    InvalidLiteral {
        literal: String,
        reason: &'static str,
    },

    #[error("unknown {kind} '{name}'")]
    UnknownReference { kind: &'static str, name: String },

    #[error("{0}")]
    Unsupported(String),

    #[error("instruction set exceeds the limit of {limit} words")]
    InstructionLimitExceeded { limit: usize },

    #[error(transparent)]
    Abi(#[from] AbiError),
}

pub type Result<T> = core::result::Result<T, CompileError>;
