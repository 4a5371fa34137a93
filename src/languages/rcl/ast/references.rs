// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::boxed::Box;
use alloc::string::String;
use serde::{Deserialize, Serialize};

use super::expr::Expr;

/// A named value resolved through the symbol tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Reference {
    /// `FC:name`
    ForeignCall {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        retype: Option<String>,
    },
    /// `TR:name`, `TR:name(key)`; `update` is set for the `TRU:` spelling
    Tracker {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<Box<Expr>>,
        #[serde(default)]
        update: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        retype: Option<String>,
    },
    /// `GV:NAME`
    Global {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        retype: Option<String>,
    },
    /// Calling-function argument
    Argument {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        retype: Option<String>,
    },
}

impl Reference {
    pub fn name(&self) -> &str {
        match self {
            Reference::ForeignCall { name, .. }
            | Reference::Tracker { name, .. }
            | Reference::Global { name, .. }
            | Reference::Argument { name, .. } => name,
        }
    }

    /// Re-typing suffix written after the reference (`!bool`).
    pub fn retype(&self) -> Option<&str> {
        match self {
            Reference::ForeignCall { retype, .. }
            | Reference::Tracker { retype, .. }
            | Reference::Global { retype, .. }
            | Reference::Argument { retype, .. } => retype.as_deref(),
        }
    }

    pub(crate) fn set_retype(&mut self, type_name: String) {
        match self {
            Reference::ForeignCall { retype, .. }
            | Reference::Tracker { retype, .. }
            | Reference::Global { retype, .. }
            | Reference::Argument { retype, .. } => *retype = Some(type_name),
        }
    }
}
