// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.
#![allow(clippy::missing_const_for_fn)]

use serde::{Deserialize, Serialize};

use crate::bytecode::Opcode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            _ => None,
        }
    }

    pub const fn opcode(self) -> Opcode {
        match self {
            Self::And => Opcode::And,
            Self::Or => Opcode::Or,
        }
    }
}

/// Arithmetic, comparison and plain assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Eq,
    Gte,
    Lte,
    Neq,
    Assign,
}

impl BinaryOperator {
    pub fn from_arithmetic_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Add),
            "-" => Some(Self::Sub),
            "*" => Some(Self::Mul),
            "/" => Some(Self::Div),
            _ => None,
        }
    }

    pub fn from_relation_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(Self::Lt),
            ">" => Some(Self::Gt),
            "==" => Some(Self::Eq),
            ">=" => Some(Self::Gte),
            "<=" => Some(Self::Lte),
            "!=" => Some(Self::Neq),
            "=" => Some(Self::Assign),
            _ => None,
        }
    }

    pub const fn opcode(self) -> Opcode {
        match self {
            Self::Add => Opcode::Add,
            Self::Sub => Opcode::Sub,
            Self::Mul => Opcode::Mul,
            Self::Div => Opcode::Div,
            Self::Lt => Opcode::Lt,
            Self::Gt => Opcode::Gt,
            Self::Eq => Opcode::Eq,
            Self::Gte => Opcode::Gte,
            Self::Lte => Opcode::Lte,
            Self::Neq => Opcode::Neq,
            Self::Assign => Opcode::Assign,
        }
    }
}

/// Operators that may follow a `TRU:` target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateOperator {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

impl UpdateOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Self::Assign),
            "+=" => Some(Self::AddAssign),
            "-=" => Some(Self::SubAssign),
            "*=" => Some(Self::MulAssign),
            "/=" => Some(Self::DivAssign),
            _ => None,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::AddAssign => "+=",
            Self::SubAssign => "-=",
            Self::MulAssign => "*=",
            Self::DivAssign => "/=",
        }
    }

    /// Opcode computing the new value from the current one.
    pub const fn opcode(self) -> Opcode {
        match self {
            Self::Assign => Opcode::Assign,
            Self::AddAssign => Opcode::Add,
            Self::SubAssign => Opcode::Sub,
            Self::MulAssign => Opcode::Mul,
            Self::DivAssign => Opcode::Div,
        }
    }
}
