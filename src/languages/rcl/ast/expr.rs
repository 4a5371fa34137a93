// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::boxed::Box;
use alloc::string::String;
use serde::{Deserialize, Serialize};

use super::literals::Literal;
use super::operators::{BinaryOperator, LogicalOperator, UpdateOperator};
use super::references::Reference;

/// RCL expression node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expr {
    Logical(LogicalExpression),
    Not(NotExpression),
    Binary(BinaryExpression),
    Update(UpdateExpression),
    Reference(Reference),
    Literal(Literal),
}

/// `left AND right`, `left OR right`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalExpression {
    pub operator: LogicalOperator,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotExpression {
    pub operand: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryExpression {
    pub operator: BinaryOperator,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

/// `TRU:name op value` or `TRU:name(key) op value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateExpression {
    pub tracker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Box<Expr>>,
    pub operator: UpdateOperator,
    pub value: Box<Expr>,
}
