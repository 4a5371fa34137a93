// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]
#![no_std]

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod abi;
pub mod bytecode;
mod config;
mod engine;
pub mod languages;
mod lexer;
pub mod policy;
pub mod symbols;

pub use bytecode::{decompile, decompile_with_limits, DecompileError, Opcode, Placeholder, Program};
pub use config::CodecLimits;
pub use engine::Codec;
pub use languages::rcl::{
    compile_condition, compile_condition_with_limits, decode_effect, encode_effect,
    is_valid_grammar, validate_condition_references, validate_effect_references,
    validate_grammar, validate_values_to_pass, CompileError, Effect, EffectError, EncodedEffect,
    GrammarError, ReferenceErrors,
};
pub use policy::{validate_policy, PolicyDocument, RuleDocument, ValidationErrors};
pub use symbols::{ParamType, SymbolContext};

#[cfg(feature = "listing")]
pub use bytecode::{generate_listing, ListingConfig};

/// Items in `unstable` are likely to change.
pub mod unstable {
    pub use crate::languages::rcl::ast::*;
    pub use crate::languages::rcl::parser::*;
    pub use crate::lexer::*;
}
