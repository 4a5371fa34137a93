// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::format;
use alloc::string::ToString;

use crate::symbols::{ParamType, SymbolContext};

use super::documents::PolicyDocument;
use super::validation::Violation;

impl SymbolContext {
    /// Build the symbol tables seen by rules attached to `calling_function`,
    /// named either by its declared name or by its signature.
    ///
    /// Trackers and mapped trackers are shared by every calling function;
    /// foreign calls only by the one they are declared for.
    pub fn from_policy(policy: &PolicyDocument, calling_function: &str) -> anyhow::Result<Self> {
        build_context(policy, calling_function).map_err(|violation| anyhow::anyhow!("{violation}"))
    }
}

pub(super) fn declared_type(field: &str, type_name: &str) -> Result<ParamType, Violation> {
    ParamType::from_type_name(type_name)
        .ok_or_else(|| Violation::new(field, format!("unknown type '{type_name}'")))
}

pub(super) fn build_context(
    policy: &PolicyDocument,
    calling_function: &str,
) -> Result<SymbolContext, Violation> {
    let (index, declaration) = policy
        .calling_functions
        .iter()
        .enumerate()
        .find(|(_, cf)| cf.name == calling_function || cf.function_signature == calling_function)
        .ok_or_else(|| {
            Violation::new(
                "CallingFunctions",
                format!("calling function '{calling_function}' is not declared"),
            )
        })?;

    let mut ctx = SymbolContext::from_signature(&declaration.function_signature).map_err(|e| {
        Violation::new(
            &format!("CallingFunctions[{index}].FunctionSignature"),
            e.to_string(),
        )
    })?;

    for (idx, fc) in policy.foreign_calls.iter().enumerate() {
        if fc.calling_function != declaration.name
            && fc.calling_function != declaration.function_signature
        {
            continue;
        }
        let return_type = declared_type(&format!("ForeignCalls[{idx}].ReturnType"), &fc.return_type)?;
        ctx.add_foreign_call(&fc.name, fc.id, return_type)
            .map_err(|e| Violation::new(&format!("ForeignCalls[{idx}]"), e.to_string()))?;
    }

    for (idx, tracker) in policy.trackers.iter().enumerate() {
        let p_type = declared_type(&format!("Trackers[{idx}].Type"), &tracker.type_name)?;
        ctx.add_tracker(&tracker.name, tracker.id, p_type)
            .map_err(|e| Violation::new(&format!("Trackers[{idx}]"), e.to_string()))?;
    }

    for (idx, tracker) in policy.mapped_trackers.iter().enumerate() {
        let key_type = declared_type(&format!("MappedTrackers[{idx}].KeyType"), &tracker.key_type)?;
        let value_type =
            declared_type(&format!("MappedTrackers[{idx}].ValueType"), &tracker.value_type)?;
        ctx.add_mapped_tracker(&tracker.name, tracker.id, key_type, value_type)
            .map_err(|e| Violation::new(&format!("MappedTrackers[{idx}]"), e.to_string()))?;
    }

    Ok(ctx)
}
