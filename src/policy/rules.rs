// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::bytecode::{decompile_with_limits, Program};
use crate::config::CodecLimits;
use crate::languages::rcl::compiler::compile_condition_with_limits;
use crate::languages::rcl::effects::{encode_effect_with_limits, EncodedEffect};
use crate::symbols::SymbolContext;

use super::documents::RuleDocument;

/// A rule with its condition and every effect in wire form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledRule {
    pub calling_function: String,
    pub condition: Program,
    #[serde(default)]
    pub positive_effects: Vec<EncodedEffect>,
    #[serde(default)]
    pub negative_effects: Vec<EncodedEffect>,
}

pub fn compile_rule(
    rule: &RuleDocument,
    ctx: &SymbolContext,
    limits: &CodecLimits,
) -> Result<CompiledRule> {
    let condition = compile_condition_with_limits(&rule.condition, ctx, limits)
        .map_err(|e| anyhow!("Condition: {e}"))?;
    let encode = |field: &str, effects: &[String]| -> Result<Vec<EncodedEffect>> {
        effects
            .iter()
            .enumerate()
            .map(|(idx, effect)| {
                encode_effect_with_limits(effect, ctx, limits)
                    .map_err(|e| anyhow!("{field}[{idx}]: {e}"))
            })
            .collect()
    };

    Ok(CompiledRule {
        calling_function: rule.calling_function.clone(),
        condition,
        positive_effects: encode("PositiveEffects", &rule.positive_effects)?,
        negative_effects: encode("NegativeEffects", &rule.negative_effects)?,
    })
}

/// Recover rule text from a compiled rule. Each part decodes independently
/// against the same symbol context.
pub fn decompile_rule(
    rule: &CompiledRule,
    ctx: &SymbolContext,
    limits: &CodecLimits,
) -> Result<RuleDocument> {
    let condition =
        decompile_with_limits(&rule.condition, ctx, limits).map_err(|e| anyhow!("Condition: {e}"))?;
    let decode = |field: &str, effects: &[EncodedEffect]| -> Result<Vec<String>> {
        effects
            .iter()
            .enumerate()
            .map(|(idx, effect)| {
                effect
                    .decode_with_limits(ctx, limits)
                    .map(|effect| effect.to_string())
                    .map_err(|e| anyhow!("{field}[{idx}]: {e}"))
            })
            .collect()
    };

    Ok(RuleDocument {
        condition,
        positive_effects: decode("PositiveEffects", &rule.positive_effects)?,
        negative_effects: decode("NegativeEffects", &rule.negative_effects)?,
        calling_function: rule.calling_function.clone(),
    })
}
