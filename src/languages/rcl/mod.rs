// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The Rule Condition Language: grammar and reference validation, parsing,
//! compilation and effects.

pub mod ast;
pub mod compiler;
pub mod effects;
pub mod grammar;
pub mod parser;
pub mod references;

pub use compiler::{compile_condition, compile_condition_with_limits, CompileError};
pub use effects::{
    decode_effect, encode_effect, encode_effect_with_limits, Effect, EffectError, EffectKind,
    EncodedEffect, EventParam,
};
pub use grammar::{is_valid_grammar, validate_grammar, GrammarError};
pub use parser::{parse_expression, ParseError};
pub use references::{
    validate_condition_references, validate_effect_references, validate_values_to_pass,
    ReferenceError, ReferenceErrors,
};
