// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Whole-document validation.
//!
//! Every string field holding RCL text or a literal is checked and all
//! violations are reported together, each naming the field it came from.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::config::CodecLimits;
use crate::languages::rcl::compiler::compile_condition_with_limits;
use crate::languages::rcl::effects::encode_effect_with_limits;
use crate::languages::rcl::references::validate_values_to_pass;
use crate::symbols::{is_identifier, ParamType, SymbolContext};

use super::context::{build_context, declared_type};
use super::documents::PolicyDocument;
use super::values::encode_initial_value;

/// One problem found in a policy document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Path of the offending field, e.g. `Rules[0].Condition`
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<Violation>);

impl ValidationErrors {
    fn push(&mut self, violation: Violation) {
        if !self.0.contains(&violation) {
            self.0.push(violation);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, violation) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl core::error::Error for ValidationErrors {}

/// Validate a policy document with the default limits.
pub fn validate_policy(policy: &PolicyDocument) -> Result<(), ValidationErrors> {
    validate_policy_with_limits(policy, &CodecLimits::default())
}

pub fn validate_policy_with_limits(
    policy: &PolicyDocument,
    limits: &CodecLimits,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    // One context per calling function; `Err` keeps the reason it failed.
    let mut contexts: BTreeMap<String, Result<SymbolContext, Violation>> = BTreeMap::new();
    let mut context = |name: &str| -> Result<SymbolContext, Violation> {
        contexts
            .entry(name.to_string())
            .or_insert_with(|| build_context(policy, name))
            .clone()
    };

    for (idx, cf) in policy.calling_functions.iter().enumerate() {
        if let Err(violation) = context(&cf.name) {
            errors.push(violation);
        }
        if policy.calling_functions[..idx]
            .iter()
            .any(|other| other.name == cf.name)
        {
            errors.push(Violation::new(
                &format!("CallingFunctions[{idx}].Name"),
                format!("duplicate calling function '{}'", cf.name),
            ));
        }
    }

    for (idx, fc) in policy.foreign_calls.iter().enumerate() {
        if !is_external_signature(&fc.signature) {
            errors.push(Violation::new(
                &format!("ForeignCalls[{idx}].Signature"),
                format!("'{}' is not a function signature", fc.signature),
            ));
        }
        if let Err(violation) = declared_type(&format!("ForeignCalls[{idx}].ReturnType"), &fc.return_type)
        {
            errors.push(violation);
        }
        if policy.calling_function(&fc.calling_function).is_none() {
            errors.push(Violation::new(
                &format!("ForeignCalls[{idx}].CallingFunction"),
                format!("calling function '{}' is not declared", fc.calling_function),
            ));
            continue;
        }
        match context(&fc.calling_function) {
            Ok(ctx) => {
                if let Err(e) = validate_values_to_pass(&fc.values_to_pass, &ctx) {
                    errors.push(Violation::new(
                        &format!("ForeignCalls[{idx}].ValuesToPass"),
                        e.to_string(),
                    ));
                }
            }
            Err(violation) => errors.push(violation),
        }
    }

    for (idx, tracker) in policy.trackers.iter().enumerate() {
        match declared_type(&format!("Trackers[{idx}].Type"), &tracker.type_name) {
            Ok(p_type) if !tracker.initial_value.trim().is_empty() => {
                if let Err(e) = encode_initial_value(p_type, &tracker.initial_value) {
                    errors.push(Violation::new(
                        &format!("Trackers[{idx}].InitialValue"),
                        e.to_string(),
                    ));
                }
            }
            Ok(_) => {}
            Err(violation) => errors.push(violation),
        }
    }

    for (idx, tracker) in policy.mapped_trackers.iter().enumerate() {
        if tracker.initial_keys.len() != tracker.initial_values.len() {
            errors.push(Violation::new(
                &format!("MappedTrackers[{idx}].InitialValues"),
                format!(
                    "{} initial keys but {} initial values",
                    tracker.initial_keys.len(),
                    tracker.initial_values.len()
                ),
            ));
        }
        let columns = [
            ("KeyType", "InitialKeys", &tracker.key_type, &tracker.initial_keys),
            ("ValueType", "InitialValues", &tracker.value_type, &tracker.initial_values),
        ];
        for (type_field, values_field, type_name, values) in columns {
            match declared_type(&format!("MappedTrackers[{idx}].{type_field}"), type_name) {
                Ok(p_type) => {
                    for (pos, value) in values.iter().enumerate() {
                        if let Err(e) = encode_initial_value(p_type, value) {
                            errors.push(Violation::new(
                                &format!("MappedTrackers[{idx}].{values_field}[{pos}]"),
                                e.to_string(),
                            ));
                        }
                    }
                }
                Err(violation) => errors.push(violation),
            }
        }
        let mut seen = Vec::new();
        for (pos, key) in tracker.initial_keys.iter().enumerate() {
            let key = key.trim();
            if seen.contains(&key) {
                errors.push(Violation::new(
                    &format!("MappedTrackers[{idx}].InitialKeys[{pos}]"),
                    format!("duplicate key '{key}'"),
                ));
            }
            seen.push(key);
        }
    }

    for (idx, rule) in policy.rules.iter().enumerate() {
        let ctx = match context(&rule.calling_function) {
            Ok(ctx) => ctx,
            Err(violation) => {
                errors.push(Violation::new(
                    &format!("Rules[{idx}].CallingFunction"),
                    violation.to_string(),
                ));
                continue;
            }
        };

        if let Err(e) = compile_condition_with_limits(&rule.condition, &ctx, limits) {
            errors.push(Violation::new(
                &format!("Rules[{idx}].Condition"),
                e.to_string(),
            ));
        }
        let effects = [
            ("PositiveEffects", &rule.positive_effects),
            ("NegativeEffects", &rule.negative_effects),
        ];
        for (field, effects) in effects {
            for (pos, effect) in effects.iter().enumerate() {
                if let Err(e) = encode_effect_with_limits(effect, &ctx, limits) {
                    errors.push(Violation::new(
                        &format!("Rules[{idx}].{field}[{pos}]"),
                        e.to_string(),
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        log::debug!("policy has {} violation(s)", errors.0.len());
        Err(errors)
    }
}

// `name(type,type)`: parameter types only, names optional.
fn is_external_signature(signature: &str) -> bool {
    let Some((name, rest)) = signature.trim().split_once('(') else {
        return false;
    };
    let Some(params) = rest.strip_suffix(')') else {
        return false;
    };
    is_identifier(name.trim())
        && (params.trim().is_empty()
            || params.split(',').all(|param| {
                param
                    .split_whitespace()
                    .next()
                    .and_then(ParamType::from_type_name)
                    .is_some()
            }))
}
