// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::string::String;
use serde::{Deserialize, Serialize};

/// Literal value as written in the rule text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Literal {
    /// Decimal or `0x` hex number, kept in its raw form
    Number(String),
    Bool(bool),
    /// Quoted string without its quotes
    String(String),
    /// `0x..:bytes`, kept as the `0x` hex text
    Bytes(String),
}
