// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Placeholder records and their conversion to and from RCL references.

use alloc::format;
use alloc::string::{String, ToString};
use serde::{Deserialize, Serialize};

use crate::symbols::{
    ArgumentSymbol, ForeignCallSymbol, MappedTrackerSymbol, ParamType, SymbolContext,
    TrackerSymbol,
};

use super::errors::DecompileError;

pub const FLAG_FOREIGN_CALL: u8 = 0x01;
pub const FLAG_TRACKER: u8 = 0x02;

/// One of the five fixed values the engine exposes to every rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalVar {
    MsgSender,
    BlockTimestamp,
    MsgData,
    BlockNumber,
    TxOrigin,
}

impl GlobalVar {
    pub const ALL: [GlobalVar; 5] = [
        GlobalVar::MsgSender,
        GlobalVar::BlockTimestamp,
        GlobalVar::MsgData,
        GlobalVar::BlockNumber,
        GlobalVar::TxOrigin,
    ];

    pub const fn flags(self) -> u8 {
        match self {
            GlobalVar::MsgSender => 0x04,
            GlobalVar::BlockTimestamp => 0x08,
            GlobalVar::MsgData => 0x0c,
            GlobalVar::BlockNumber => 0x10,
            GlobalVar::TxOrigin => 0x14,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            GlobalVar::MsgSender => "MSG_SENDER",
            GlobalVar::BlockTimestamp => "BLOCK_TIMESTAMP",
            GlobalVar::MsgData => "MSG_DATA",
            GlobalVar::BlockNumber => "BLOCK_NUMBER",
            GlobalVar::TxOrigin => "TX_ORIGIN",
        }
    }

    pub const fn p_type(self) -> ParamType {
        match self {
            GlobalVar::MsgSender | GlobalVar::TxOrigin => ParamType::Address,
            GlobalVar::BlockTimestamp | GlobalVar::BlockNumber => ParamType::Uint256,
            GlobalVar::MsgData => ParamType::Bytes,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|gv| gv.name() == name)
    }

    pub fn from_flags(flags: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|gv| gv.flags() == flags)
    }
}

/// Placeholder record as stored next to an instruction set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placeholder {
    pub p_type: ParamType,
    pub type_specific_index: u32,
    pub flags: u8,
}

/// What a placeholder addresses, read from its flags alone.
///
/// Trackers and mapped trackers share a flag; telling them apart needs the
/// symbol tables (see [`Placeholder::resolve`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderTarget {
    Argument { position: u32 },
    ForeignCall { index: u32 },
    Tracker { index: u32 },
    Global(GlobalVar),
}

/// A placeholder resolved against a [`SymbolContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedPlaceholder<'ctx> {
    Argument(&'ctx ArgumentSymbol),
    ForeignCall(&'ctx ForeignCallSymbol),
    Tracker(&'ctx TrackerSymbol),
    MappedTracker(&'ctx MappedTrackerSymbol),
    Global(GlobalVar),
}

impl Placeholder {
    pub fn argument(symbol: &ArgumentSymbol) -> Self {
        Self {
            p_type: symbol.p_type,
            type_specific_index: symbol.position,
            flags: 0,
        }
    }

    pub fn foreign_call(symbol: &ForeignCallSymbol) -> Self {
        Self {
            p_type: symbol.return_type,
            type_specific_index: symbol.index,
            flags: FLAG_FOREIGN_CALL,
        }
    }

    pub fn tracker(symbol: &TrackerSymbol) -> Self {
        Self {
            p_type: symbol.p_type,
            type_specific_index: symbol.index,
            flags: FLAG_TRACKER,
        }
    }

    pub fn mapped_tracker(symbol: &MappedTrackerSymbol) -> Self {
        Self {
            p_type: symbol.value_type,
            type_specific_index: symbol.index,
            flags: FLAG_TRACKER,
        }
    }

    pub fn global(gv: GlobalVar) -> Self {
        Self {
            p_type: gv.p_type(),
            type_specific_index: 0,
            flags: gv.flags(),
        }
    }

    pub fn target(&self) -> PlaceholderTarget {
        match self.flags {
            FLAG_FOREIGN_CALL => PlaceholderTarget::ForeignCall {
                index: self.type_specific_index,
            },
            FLAG_TRACKER => PlaceholderTarget::Tracker {
                index: self.type_specific_index,
            },
            flags => match GlobalVar::from_flags(flags) {
                Some(gv) => PlaceholderTarget::Global(gv),
                None => PlaceholderTarget::Argument {
                    position: self.type_specific_index,
                },
            },
        }
    }

    /// Resolve against the symbol tables; a dangling index is an error,
    /// never a silently substituted name.
    pub fn resolve<'ctx>(
        &self,
        ctx: &'ctx SymbolContext,
    ) -> Result<ResolvedPlaceholder<'ctx>, DecompileError> {
        let missing = |table: &'static str, index: u32| DecompileError::PlaceholderResolution {
            table,
            index: index as usize,
        };
        match self.target() {
            PlaceholderTarget::Argument { position } => ctx
                .argument_at(position)
                .map(ResolvedPlaceholder::Argument)
                .ok_or_else(|| missing("argument", position)),
            PlaceholderTarget::ForeignCall { index } => ctx
                .foreign_call_by_index(index)
                .map(ResolvedPlaceholder::ForeignCall)
                .ok_or_else(|| missing("foreign call", index)),
            PlaceholderTarget::Tracker { index } => ctx
                .tracker_by_index(index)
                .map(ResolvedPlaceholder::Tracker)
                .or_else(|| {
                    ctx.mapped_tracker_by_index(index)
                        .map(ResolvedPlaceholder::MappedTracker)
                })
                .ok_or_else(|| missing("tracker", index)),
            PlaceholderTarget::Global(gv) => Ok(ResolvedPlaceholder::Global(gv)),
        }
    }
}

/// Re-typing hint carried by a decoded reference (`FC:name!bool`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retype {
    Bool,
    Address,
    Other(String),
}

impl Retype {
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "bool" => Retype::Bool,
            "address" => Retype::Address,
            other => Retype::Other(other.to_string()),
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Retype::Bool => "bool",
            Retype::Address => "address",
            Retype::Other(name) => name,
        }
    }
}

/// Text of a decoded placeholder plus what the decompiler needs to know about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPlaceholder {
    pub text: String,
    pub retype: Option<Retype>,
    /// Tracker id when the placeholder reads a plain tracker.
    pub tracker: Option<u32>,
}

/// Render placeholder `index` of the placeholder table as RCL text.
pub fn decode_placeholder(
    placeholder: &Placeholder,
    index: usize,
    ctx: &SymbolContext,
) -> Result<DecodedPlaceholder, DecompileError> {
    let decoded = match placeholder.resolve(ctx)? {
        ResolvedPlaceholder::ForeignCall(fc) => {
            let retype = match fc.return_type {
                ParamType::Address => Some(Retype::Address),
                ParamType::Bool => Some(Retype::Bool),
                _ => None,
            };
            let text = match &retype {
                Some(retype) => format!("FC:{}!{}", fc.name, retype.type_name()),
                None => format!("FC:{}", fc.name),
            };
            DecodedPlaceholder {
                text,
                retype,
                tracker: None,
            }
        }
        ResolvedPlaceholder::Tracker(tracker) => DecodedPlaceholder {
            text: format!("TR:{}", tracker.name),
            retype: None,
            tracker: Some(tracker.index),
        },
        ResolvedPlaceholder::MappedTracker(tracker) => DecodedPlaceholder {
            text: format!("TR:{}~{}", tracker.name, index),
            retype: None,
            tracker: None,
        },
        ResolvedPlaceholder::Global(gv) => DecodedPlaceholder {
            text: format!("GV:{}", gv.name()),
            retype: None,
            tracker: None,
        },
        ResolvedPlaceholder::Argument(arg) => {
            let retype = Retype::from_type_name(&arg.raw_type);
            DecodedPlaceholder {
                text: format!("{}!{}", arg.name, arg.raw_type),
                retype: Some(retype),
                tracker: None,
            }
        }
    };
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn ctx() -> SymbolContext {
        let mut ctx = SymbolContext::from_signature("transfer(address to, uint256 amount)").unwrap();
        ctx.add_foreign_call("IsActive", 3, ParamType::Bool).unwrap();
        ctx.add_foreign_call("Score", 4, ParamType::Uint256).unwrap();
        ctx.add_tracker("Total", 1, ParamType::Uint256).unwrap();
        ctx.add_mapped_tracker("Balances", 2, ParamType::Address, ParamType::Uint256)
            .unwrap();
        ctx
    }

    fn text(p: Placeholder, index: usize) -> String {
        decode_placeholder(&p, index, &ctx()).unwrap().text
    }

    #[test]
    fn flags_select_target() {
        for gv in GlobalVar::ALL {
            let p = Placeholder::global(gv);
            assert_eq!(p.target(), PlaceholderTarget::Global(gv));
            assert_eq!(GlobalVar::from_name(gv.name()), Some(gv));
        }
        let p = Placeholder {
            p_type: ParamType::Uint256,
            type_specific_index: 7,
            flags: 0x40,
        };
        assert_eq!(p.target(), PlaceholderTarget::Argument { position: 7 });
    }

    #[test]
    fn decoded_text() {
        let ctx = ctx();
        assert_eq!(
            text(Placeholder::foreign_call(ctx.foreign_call("IsActive").unwrap()), 0),
            "FC:IsActive!bool"
        );
        assert_eq!(
            text(Placeholder::foreign_call(ctx.foreign_call("Score").unwrap()), 0),
            "FC:Score"
        );
        assert_eq!(
            text(Placeholder::tracker(ctx.tracker("Total").unwrap()), 0),
            "TR:Total"
        );
        assert_eq!(
            text(
                Placeholder::mapped_tracker(ctx.mapped_tracker("Balances").unwrap()),
                5
            ),
            "TR:Balances~5"
        );
        assert_eq!(
            text(Placeholder::argument(ctx.argument("to").unwrap()), 0),
            "to!address"
        );
        assert_eq!(
            text(Placeholder::global(GlobalVar::BlockNumber), 0),
            "GV:BLOCK_NUMBER"
        );
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let p = Placeholder {
            p_type: ParamType::Uint256,
            type_specific_index: 9,
            flags: FLAG_TRACKER,
        };
        assert_eq!(
            p.resolve(&ctx()),
            Err(DecompileError::PlaceholderResolution {
                table: "tracker",
                index: 9
            })
        );
    }
}
