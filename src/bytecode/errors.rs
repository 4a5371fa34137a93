// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::string::String;
use thiserror::Error;

use crate::symbols::ParamType;

/// Decompilation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecompileError {
    #[error("unknown opcode {opcode} at position {position}")]
    UnknownOpcode { opcode: String, position: usize },

    #[error("{table} placeholder index {index} out of range")]
    PlaceholderResolution { table: &'static str, index: usize },

    #[error("cannot render {value} as {target}")]
    TypeCoercion { value: String, target: ParamType },

    #[error("instruction {opcode} at position {position} is missing operands")]
    TruncatedInstruction { opcode: &'static str, position: usize },

    #[error("invalid operand {operand} at position {position}: {reason}")]
    InvalidOperand {
        operand: String,
        position: usize,
        reason: &'static str,
    },

    #[error("invalid tracker update at position {position}: {reason}")]
    InvalidTrackerUpdate {
        position: usize,
        reason: &'static str,
    },

    #[error("instruction set must reduce to exactly one value, found {count}")]
    ResidualValue { count: usize },

    #[error("instruction set of {len} words exceeds the limit of {limit}")]
    InstructionLimitExceeded { len: usize, limit: usize },
}

pub type Result<T> = core::result::Result<T, DecompileError>;
