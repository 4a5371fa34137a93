// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Policy documents: the declarations rules are written against, and the
//! rules themselves.

mod context;
mod documents;
mod rules;
mod validation;
mod values;

pub use documents::{
    CallingFunctionDeclaration, ForeignCallDeclaration, MappedTrackerDeclaration, PolicyDocument,
    RuleDocument, TrackerDeclaration,
};
pub use rules::{compile_rule, decompile_rule, CompiledRule};
pub use validation::{validate_policy, validate_policy_with_limits, ValidationErrors, Violation};
pub use values::{encode_initial_value, encode_values_to_pass, ForeignCallArgument, ValueError};
