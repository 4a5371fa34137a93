// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Instruction sets, placeholders and the decompiler.

pub mod decompiler;
pub mod errors;
pub mod instructions;
pub mod placeholder;
pub mod program;

pub use decompiler::{decompile, decompile_with_limits};
pub use errors::DecompileError;
pub use instructions::{Instruction, Instructions, Opcode, OperandKind};
pub use placeholder::{
    decode_placeholder, DecodedPlaceholder, GlobalVar, Placeholder, PlaceholderTarget,
    ResolvedPlaceholder, Retype,
};
pub use program::{Program, RawDataReplacement};
#[cfg(feature = "listing")]
pub use program::{generate_listing, ListingConfig};

#[cfg(test)]
pub(crate) mod tests;
