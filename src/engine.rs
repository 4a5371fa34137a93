// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::bytecode::{decompile_with_limits, Program};
use crate::config::CodecLimits;
use crate::languages::rcl::compiler::compile_condition_with_limits;
use crate::languages::rcl::effects::{encode_effect_with_limits, EncodedEffect};
use crate::languages::rcl::grammar::{is_valid_grammar, validate_grammar};
use crate::languages::rcl::references::validate_condition_references;
use crate::policy::{
    compile_rule, decompile_rule, encode_values_to_pass, CompiledRule, ForeignCallArgument,
    PolicyDocument, RuleDocument,
};
use crate::symbols::SymbolContext;

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use anyhow::Result;

/// The RCL codec, bound to the symbols of one calling function.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    symbols: SymbolContext,
    limits: CodecLimits,
}

impl Codec {
    pub fn new(symbols: SymbolContext) -> Self {
        Self {
            symbols,
            limits: CodecLimits::default(),
        }
    }

    /// Codec for the rules attached to `calling_function` in `policy`.
    pub fn from_policy(policy: &PolicyDocument, calling_function: &str) -> Result<Self> {
        Ok(Self::new(SymbolContext::from_policy(policy, calling_function)?))
    }

    pub fn with_limits(mut self, limits: CodecLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn set_limits(&mut self, limits: CodecLimits) {
        self.limits = limits;
    }

    pub fn limits(&self) -> &CodecLimits {
        &self.limits
    }

    pub fn symbols(&self) -> &SymbolContext {
        &self.symbols
    }

    pub fn is_valid_grammar(&self, condition: &str) -> bool {
        is_valid_grammar(condition)
    }

    /// Check grammar and references without compiling.
    pub fn validate_condition(&self, condition: &str) -> Result<()> {
        validate_grammar(condition)?;
        validate_condition_references(condition, &self.symbols)?;
        Ok(())
    }

    pub fn compile_condition(&self, condition: &str) -> Result<Program> {
        Ok(compile_condition_with_limits(
            condition,
            &self.symbols,
            &self.limits,
        )?)
    }

    pub fn decompile(&self, program: &Program) -> Result<String> {
        Ok(decompile_with_limits(program, &self.symbols, &self.limits)?)
    }

    pub fn encode_effect(&self, effect: &str) -> Result<EncodedEffect> {
        Ok(encode_effect_with_limits(effect, &self.symbols, &self.limits)?)
    }

    pub fn decode_effect(&self, effect: &EncodedEffect) -> Result<String> {
        Ok(effect
            .decode_with_limits(&self.symbols, &self.limits)?
            .to_string())
    }

    pub fn compile_rule(&self, rule: &RuleDocument) -> Result<CompiledRule> {
        compile_rule(rule, &self.symbols, &self.limits)
    }

    pub fn decompile_rule(&self, rule: &CompiledRule) -> Result<RuleDocument> {
        decompile_rule(rule, &self.symbols, &self.limits)
    }

    pub fn encode_values_to_pass(&self, values: &str) -> Result<Vec<ForeignCallArgument>> {
        Ok(encode_values_to_pass(values, &self.symbols)?)
    }

    /// Annotated listing of `program` with the default layout.
    #[cfg(feature = "listing")]
    pub fn listing(&self, program: &Program) -> String {
        crate::bytecode::generate_listing(
            program,
            Some(&self.symbols),
            &crate::bytecode::ListingConfig::default(),
        )
    }
}
