// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Compilation of RCL text into [`Program`]s.
//!
//! Text is checked for grammar and references before it is parsed, so the
//! errors a rule author sees first are the cheap structural ones.

mod core;
mod error;
mod expressions;

pub use core::Compiler;
pub use error::{CompileError, Result};
pub(crate) use expressions::{parse_bytes, parse_word, reference_placeholder};

use crate::bytecode::Program;
use crate::config::CodecLimits;
use crate::languages::rcl::ast::Expr;
use crate::languages::rcl::grammar::validate_grammar;
use crate::languages::rcl::parser::parse_expression_with_limits;
use crate::languages::rcl::references::validate_condition_references;
use crate::symbols::SymbolContext;

/// Compile a rule condition with the default limits.
pub fn compile_condition(text: &str, ctx: &SymbolContext) -> Result<Program> {
    compile_condition_with_limits(text, ctx, &CodecLimits::default())
}

pub fn compile_condition_with_limits(
    text: &str,
    ctx: &SymbolContext,
    limits: &CodecLimits,
) -> Result<Program> {
    validate_grammar(text)?;
    validate_condition_references(text, ctx)?;
    let expr = parse_expression_with_limits(text, limits)?;
    let program = compile_expression(&expr, ctx, limits)?;
    log::debug!(
        "compiled condition into {} words and {} placeholders",
        program.instruction_set.len(),
        program.placeholders.len()
    );
    Ok(program)
}

/// Compile an already parsed expression.
pub fn compile_expression(expr: &Expr, ctx: &SymbolContext, limits: &CodecLimits) -> Result<Program> {
    let mut compiler = Compiler::new(ctx, limits);
    compiler.compile_expr(expr)?;
    Ok(compiler.finish())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing)]
    use super::*;
    use crate::abi::{literal_digest, AbiValue};
    use crate::bytecode::tests::assemble;
    use crate::bytecode::{decompile, Placeholder};
    use crate::symbols::ParamType;
    use alloc::string::ToString;
    use alloc::vec;
    use num_bigint::BigUint;

    fn ctx() -> SymbolContext {
        let mut ctx =
            SymbolContext::from_signature("transfer(address to, uint256 amount, bool flag)").unwrap();
        ctx.add_foreign_call("IsActive", 3, ParamType::Bool).unwrap();
        ctx.add_tracker("Total", 1, ParamType::Uint256).unwrap();
        ctx.add_tracker("Owner", 5, ParamType::Address).unwrap();
        ctx.add_mapped_tracker("Balances", 2, ParamType::Address, ParamType::Uint256)
            .unwrap();
        ctx
    }

    #[test]
    fn comparison() {
        let ctx = ctx();
        let program = compile_condition("amount > 100", &ctx).unwrap();
        assert_eq!(program.instruction_set, assemble("PLH 0  N 100  > 0 1"));
        assert_eq!(
            program.placeholders,
            vec![Placeholder::argument(ctx.argument("amount").unwrap())]
        );
        assert!(program.raw_data.is_empty());
    }

    #[test]
    fn placeholders_are_shared() {
        let program = compile_condition("(amount > 1) AND (amount < 10)", &ctx()).unwrap();
        assert_eq!(program.placeholders.len(), 1);
        assert_eq!(
            program.instruction_set,
            assemble("PLH 0  N 1  > 0 1  PLH 0  N 10  < 3 4  AND 2 5")
        );
    }

    #[test]
    fn literals() {
        let ctx = ctx();
        let program = compile_condition("flag == true AND amount != 0x10", &ctx).unwrap();
        assert_eq!(
            program.instruction_set,
            assemble("PLH 0  N 1  == 0 1  PLH 1  N 16  != 3 4  AND 2 5")
        );

        let program = compile_condition("FC:IsActive == 'gold'", &ctx).unwrap();
        let digest = literal_digest(&AbiValue::String("gold".to_string())).unwrap();
        assert_eq!(program.instruction_set[3], digest);
        assert_eq!(program.raw_data.len(), 1);
        assert_eq!(program.raw_data[0].instruction_set_index, 3);
        assert_eq!(program.raw_data[0].argument_type, ParamType::String);
        assert_eq!(program.raw_data[0].original_data, "gold");

        let program = compile_condition("0xabcd:bytes == to", &ctx).unwrap();
        let digest = literal_digest(&AbiValue::Bytes(vec![0xab, 0xcd])).unwrap();
        assert_eq!(program.instruction_set[1], digest);
        assert_eq!(program.raw_data[0].argument_type, ParamType::Bytes);
        assert_eq!(program.raw_data[0].original_data, "0xabcd");
    }

    #[test]
    fn tracker_updates() {
        let ctx = ctx();
        let program = compile_condition("TRU:Total += amount * 2", &ctx).unwrap();
        assert_eq!(
            program.instruction_set,
            assemble("PLH 0  PLH 1  N 2  * 1 2  + 0 3  TRU 1 4 0")
        );

        let program = compile_condition("TRU:Balances(to) -= 5", &ctx).unwrap();
        assert_eq!(
            program.instruction_set,
            assemble("PLH 0  PLHM 1 0  N 5  - 1 2  TRUM 2 3 0 0")
        );
        assert_eq!(decompile(&program, &ctx).unwrap(), "TRU:Balances(to!address) -= 5");
    }

    #[test]
    fn mapped_reads() {
        let ctx = ctx();
        let program = compile_condition("TR:Balances(to) > 10", &ctx).unwrap();
        assert_eq!(
            program.instruction_set,
            assemble("PLH 0  PLHM 1 0  N 10  > 1 2")
        );
    }

    #[test]
    fn rejections() {
        let ctx = ctx();
        assert!(matches!(
            compile_condition("A AND B OR C", &ctx),
            Err(CompileError::Grammar(_))
        ));
        assert!(matches!(
            compile_condition("FC:Missing == 1", &ctx),
            Err(CompileError::References(_))
        ));
        assert!(matches!(
            compile_condition("amount!wibble > 1", &ctx),
            Err(CompileError::TypeCoercion { .. })
        ));
        assert!(matches!(
            compile_condition("TR:Balances > 1", &ctx),
            Err(CompileError::References(_))
        ));
        assert!(matches!(
            compile_condition("TRU:Total > 1", &ctx),
            Err(CompileError::Parse(_))
        ));
        assert!(matches!(
            compile_condition("amount == 0x1:bytes", &ctx),
            Err(CompileError::InvalidLiteral { .. })
        ));
        let too_big = alloc::format!("amount == 0x1{}", "0".repeat(64));
        assert!(matches!(
            compile_condition(&too_big, &ctx),
            Err(CompileError::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn literals_must_fit_retyped_references() {
        let ctx = ctx();
        let wide = alloc::format!("0x1{}", "0".repeat(40));
        let wide_address = alloc::format!("to == {wide}");
        for condition in ["flag == 5", "FC:IsActive == 2", wide_address.as_str()] {
            assert!(
                matches!(
                    compile_condition(condition, &ctx),
                    Err(CompileError::LiteralCoercion { .. })
                ),
                "{condition}"
            );
        }
        assert_eq!(
            compile_condition("7 != flag", &ctx),
            Err(CompileError::LiteralCoercion {
                literal: "7".to_string(),
                target: ParamType::Bool
            })
        );

        // Untyped references and keyed reads take any word.
        let wide_key = alloc::format!("TR:Balances(to) == {wide}");
        for condition in ["TR:Owner == 2", wide_key.as_str()] {
            let program = compile_condition(condition, &ctx).unwrap();
            let text = decompile(&program, &ctx).unwrap();
            assert_eq!(compile_condition(&text, &ctx).unwrap(), program);
        }
        let program = compile_condition("flag == 0 AND to == 0xab", &ctx).unwrap();
        assert_eq!(
            decompile(&program, &ctx).unwrap(),
            "flag!bool == false AND to!address == 0x00000000000000000000000000000000000000ab"
        );
    }

    #[test]
    fn keyed_references_need_mapped_trackers() {
        let ctx = ctx();
        let limits = CodecLimits::default();
        let expr = crate::languages::rcl::parser::parse_expression("TR:Balances > 1").unwrap();
        assert!(matches!(
            compile_expression(&expr, &ctx, &limits),
            Err(CompileError::Unsupported(_))
        ));
        let expr = crate::languages::rcl::parser::parse_expression("TR:Total(to) > 1").unwrap();
        assert!(matches!(
            compile_expression(&expr, &ctx, &limits),
            Err(CompileError::Unsupported(_))
        ));
    }

    #[test]
    fn instruction_limit() {
        let limits = CodecLimits {
            max_instructions: 4,
            ..CodecLimits::default()
        };
        assert_eq!(
            compile_condition_with_limits("amount > 100", &ctx(), &limits),
            Err(CompileError::InstructionLimitExceeded { limit: 4 })
        );
    }

    #[test]
    fn round_trip() {
        let ctx = ctx();
        for text in [
            "amount!uint256 > 100 OR flag!bool == true",
            "NOT (FC:IsActive!bool == true)",
            "amount!uint256 * (2 + 1) >= 10",
            "TRU:Total += amount!uint256 * 2",
        ] {
            let program = compile_condition(text, &ctx).unwrap();
            let decoded = decompile(&program, &ctx).unwrap();
            assert_eq!(decoded, text);
            assert_eq!(compile_condition(&decoded, &ctx).unwrap(), program);
        }
        assert_eq!(
            compile_condition("TR:Owner == 1", &ctx).unwrap().instruction_set[3],
            BigUint::from(1u8)
        );
    }
}
