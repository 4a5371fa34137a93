// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.
#![allow(clippy::pattern_type_mismatch)]

use alloc::string::String;

/// Error types for RCL expression parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    InvalidExpression(String),
    UnsupportedExpression(String),
    NestingTooDeep(usize),
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ParseError::InvalidExpression(msg) => {
                write!(f, "Invalid expression: {}", msg)
            }
            ParseError::UnsupportedExpression(expr) => {
                write!(f, "Unsupported expression: {}", expr)
            }
            ParseError::NestingTooDeep(limit) => {
                write!(f, "Expression nests deeper than {} levels", limit)
            }
        }
    }
}

impl core::error::Error for ParseError {}
