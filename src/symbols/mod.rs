// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Symbol tables scoped to one calling function.
//!
//! Placeholder indices in compiled bytecode are only meaningful relative to
//! the [`SymbolContext`] they were compiled against.

mod signature;
mod types;

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use thiserror::Error;

pub use signature::{FunctionSignature, SignatureParameter};
pub(crate) use signature::is_identifier;
pub use types::ParamType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("invalid function signature '{signature}': {reason}")]
    InvalidSignature { signature: String, reason: String },

    #[error("invalid symbol name '{name}'")]
    InvalidName { name: String },

    #[error("duplicate {kind} '{name}'")]
    Duplicate { kind: &'static str, name: String },

    #[error("duplicate {kind} index {index} (used by '{name}')")]
    DuplicateIndex {
        kind: &'static str,
        index: u32,
        name: String,
    },

    #[error("unknown type '{type_name}' for '{name}'")]
    UnknownType { name: String, type_name: String },
}

/// A calling-function argument addressed by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSymbol {
    pub name: String,
    pub position: u32,
    /// Type as written in the signature, e.g. `uint8`.
    pub raw_type: String,
    pub p_type: ParamType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignCallSymbol {
    pub name: String,
    pub index: u32,
    pub return_type: ParamType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSymbol {
    pub name: String,
    pub index: u32,
    pub p_type: ParamType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedTrackerSymbol {
    pub name: String,
    pub index: u32,
    pub key_type: ParamType,
    pub value_type: ParamType,
}

/// Names visible to the rules attached to one calling function.
///
/// Trackers and mapped trackers share one index space: a placeholder flagged
/// as a tracker resolves against both tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolContext {
    calling_function: String,
    arguments: Vec<ArgumentSymbol>,
    foreign_calls: BTreeMap<String, ForeignCallSymbol>,
    trackers: BTreeMap<String, TrackerSymbol>,
    mapped_trackers: BTreeMap<String, MappedTrackerSymbol>,
}

impl SymbolContext {
    pub fn new(calling_function: impl Into<String>) -> Self {
        Self {
            calling_function: calling_function.into(),
            ..Self::default()
        }
    }

    /// Build a context whose arguments come from a calling function signature.
    pub fn from_signature(signature: &str) -> Result<Self, SymbolError> {
        let parsed = FunctionSignature::parse(signature)?;
        let mut ctx = Self::new(parsed.name);
        for param in parsed.parameters {
            ctx.arguments.push(ArgumentSymbol {
                position: ctx.arguments.len() as u32,
                name: param.name,
                raw_type: param.raw_type,
                p_type: param.p_type,
            });
        }
        Ok(ctx)
    }

    pub fn calling_function(&self) -> &str {
        &self.calling_function
    }

    /// Append an argument; its position is the number of arguments declared before it.
    pub fn add_argument(&mut self, name: &str, raw_type: &str) -> Result<(), SymbolError> {
        check_name(name)?;
        if self.argument(name).is_some() {
            return Err(SymbolError::Duplicate {
                kind: "argument",
                name: name.to_string(),
            });
        }
        let p_type = ParamType::from_type_name(raw_type).ok_or_else(|| {
            SymbolError::UnknownType {
                name: name.to_string(),
                type_name: raw_type.to_string(),
            }
        })?;
        self.arguments.push(ArgumentSymbol {
            name: name.to_string(),
            position: self.arguments.len() as u32,
            raw_type: raw_type.to_string(),
            p_type,
        });
        Ok(())
    }

    pub fn add_foreign_call(
        &mut self,
        name: &str,
        index: u32,
        return_type: ParamType,
    ) -> Result<(), SymbolError> {
        check_name(name)?;
        if self.foreign_calls.contains_key(name) {
            return Err(SymbolError::Duplicate {
                kind: "foreign call",
                name: name.to_string(),
            });
        }
        if let Some(existing) = self.foreign_call_by_index(index) {
            return Err(SymbolError::DuplicateIndex {
                kind: "foreign call",
                index,
                name: existing.name.clone(),
            });
        }
        self.foreign_calls.insert(
            name.to_string(),
            ForeignCallSymbol {
                name: name.to_string(),
                index,
                return_type,
            },
        );
        Ok(())
    }

    pub fn add_tracker(
        &mut self,
        name: &str,
        index: u32,
        p_type: ParamType,
    ) -> Result<(), SymbolError> {
        self.check_tracker_slot(name, index)?;
        self.trackers.insert(
            name.to_string(),
            TrackerSymbol {
                name: name.to_string(),
                index,
                p_type,
            },
        );
        Ok(())
    }

    pub fn add_mapped_tracker(
        &mut self,
        name: &str,
        index: u32,
        key_type: ParamType,
        value_type: ParamType,
    ) -> Result<(), SymbolError> {
        self.check_tracker_slot(name, index)?;
        self.mapped_trackers.insert(
            name.to_string(),
            MappedTrackerSymbol {
                name: name.to_string(),
                index,
                key_type,
                value_type,
            },
        );
        Ok(())
    }

    fn check_tracker_slot(&self, name: &str, index: u32) -> Result<(), SymbolError> {
        check_name(name)?;
        if self.trackers.contains_key(name) || self.mapped_trackers.contains_key(name) {
            return Err(SymbolError::Duplicate {
                kind: "tracker",
                name: name.to_string(),
            });
        }
        let existing = self
            .tracker_by_index(index)
            .map(|t| t.name.clone())
            .or_else(|| self.mapped_tracker_by_index(index).map(|t| t.name.clone()));
        if let Some(existing) = existing {
            return Err(SymbolError::DuplicateIndex {
                kind: "tracker",
                index,
                name: existing,
            });
        }
        Ok(())
    }

    pub fn arguments(&self) -> &[ArgumentSymbol] {
        &self.arguments
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentSymbol> {
        self.arguments.iter().find(|a| a.name == name)
    }

    pub fn argument_at(&self, position: u32) -> Option<&ArgumentSymbol> {
        self.arguments.get(position as usize)
    }

    pub fn foreign_call(&self, name: &str) -> Option<&ForeignCallSymbol> {
        self.foreign_calls.get(name)
    }

    pub fn foreign_call_by_index(&self, index: u32) -> Option<&ForeignCallSymbol> {
        self.foreign_calls.values().find(|fc| fc.index == index)
    }

    pub fn tracker(&self, name: &str) -> Option<&TrackerSymbol> {
        self.trackers.get(name)
    }

    pub fn tracker_by_index(&self, index: u32) -> Option<&TrackerSymbol> {
        self.trackers.values().find(|t| t.index == index)
    }

    pub fn mapped_tracker(&self, name: &str) -> Option<&MappedTrackerSymbol> {
        self.mapped_trackers.get(name)
    }

    pub fn mapped_tracker_by_index(&self, index: u32) -> Option<&MappedTrackerSymbol> {
        self.mapped_trackers.values().find(|t| t.index == index)
    }
}

fn check_name(name: &str) -> Result<(), SymbolError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(SymbolError::InvalidName {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn arguments_from_signature() {
        let ctx = SymbolContext::from_signature("transfer(address to, uint8 amount)").unwrap();
        assert_eq!(ctx.calling_function(), "transfer");
        let amount = ctx.argument("amount").unwrap();
        assert_eq!(amount.position, 1);
        assert_eq!(amount.raw_type, "uint8");
        assert_eq!(amount.p_type, ParamType::Uint256);
        assert_eq!(ctx.argument_at(0).unwrap().name, "to");
        assert!(ctx.argument_at(2).is_none());
    }

    #[test]
    fn trackers_share_index_space() {
        let mut ctx = SymbolContext::new("f");
        ctx.add_tracker("total", 1, ParamType::Uint256).unwrap();
        let err = ctx
            .add_mapped_tracker("balances", 1, ParamType::Address, ParamType::Uint256)
            .unwrap_err();
        assert!(matches!(err, SymbolError::DuplicateIndex { index: 1, .. }));
        ctx.add_mapped_tracker("balances", 2, ParamType::Address, ParamType::Uint256)
            .unwrap();
        assert_eq!(ctx.mapped_tracker_by_index(2).unwrap().name, "balances");
        assert!(ctx.tracker_by_index(2).is_none());
    }

    #[test]
    fn rejects_bad_names() {
        let mut ctx = SymbolContext::new("f");
        assert!(ctx.add_foreign_call("1bad", 0, ParamType::Bool).is_err());
        assert!(ctx.add_argument("x", "float").is_err());
    }
}
