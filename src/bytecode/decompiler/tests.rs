// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::unwrap_used)]

use super::*;
use crate::bytecode::placeholder::{GlobalVar, Placeholder, FLAG_TRACKER};
use crate::bytecode::program::RawDataReplacement;
use crate::bytecode::tests::assemble;
use alloc::vec;

fn ctx() -> SymbolContext {
    let mut ctx =
        SymbolContext::from_signature("transfer(address to, uint256 amount, bool flag)").unwrap();
    ctx.add_foreign_call("IsActive", 3, ParamType::Bool).unwrap();
    ctx.add_foreign_call("Score", 4, ParamType::Uint256).unwrap();
    ctx.add_tracker("Total", 1, ParamType::Uint256).unwrap();
    ctx.add_tracker("Owner", 5, ParamType::Address).unwrap();
    ctx.add_mapped_tracker("Balances", 2, ParamType::Address, ParamType::Uint256)
        .unwrap();
    ctx
}

fn arg(ctx: &SymbolContext, name: &str) -> Placeholder {
    Placeholder::argument(ctx.argument(name).unwrap())
}

fn program(code: &str, placeholders: Vec<Placeholder>) -> Program {
    Program {
        instruction_set: assemble(code),
        placeholders,
        raw_data: vec![],
    }
}

fn run(code: &str, placeholders: Vec<Placeholder>) -> Result<String> {
    decompile(&program(code, placeholders), &ctx())
}

#[test]
fn retyping_suffix_controls_literal_rendering() {
    let ctx = ctx();
    let owner = Placeholder::tracker(ctx.tracker("Owner").unwrap());
    assert_eq!(owner.p_type, ParamType::Address);
    assert_eq!(run("PLH 0  N 1  == 0 1", vec![owner]).unwrap(), "TR:Owner == 1");

    let mut active = Placeholder::foreign_call(ctx.foreign_call("IsActive").unwrap());
    active.p_type = ParamType::Address;
    assert_eq!(
        run("PLH 0  N 1  == 0 1", vec![active]).unwrap(),
        "FC:IsActive!bool == true"
    );

    assert_eq!(
        run("N 171  PLH 0  != 0 1", vec![arg(&ctx, "to")]).unwrap(),
        "0x00000000000000000000000000000000000000ab != to!address"
    );
}

#[test]
fn unrepresentable_coercion() {
    let ctx = ctx();
    assert!(matches!(
        run("PLH 0  N 2  == 0 1", vec![arg(&ctx, "flag")]),
        Err(DecompileError::TypeCoercion {
            target: ParamType::Bool,
            ..
        })
    ));
}

#[test]
fn out_of_range_indices() {
    let ctx = ctx();
    assert_eq!(
        run("PLH 3  N 1  == 0 1", vec![arg(&ctx, "amount")]),
        Err(DecompileError::PlaceholderResolution {
            table: "placeholder",
            index: 3
        })
    );
    let dangling = Placeholder {
        p_type: ParamType::Uint256,
        type_specific_index: 42,
        flags: FLAG_TRACKER,
    };
    assert_eq!(
        run("PLH 0  N 1  == 0 1", vec![dangling]),
        Err(DecompileError::PlaceholderResolution {
            table: "tracker",
            index: 42
        })
    );
}

#[test]
fn logical_groups() {
    let ctx = ctx();
    let placeholders = vec![
        arg(&ctx, "amount"),
        Placeholder::foreign_call(ctx.foreign_call("Score").unwrap()),
        arg(&ctx, "flag"),
    ];
    let code = "PLH 0  N 100  > 0 1  PLH 1  N 5  < 3 4  AND 2 5";
    assert_eq!(
        run(code, placeholders.clone()).unwrap(),
        "amount!uint256 > 100 AND FC:Score < 5"
    );

    let code = "PLH 0  N 100  > 0 1  PLH 1  N 5  < 3 4  AND 2 5  PLH 2  N 1  == 7 8  OR 6 9";
    assert_eq!(
        run(code, placeholders.clone()).unwrap(),
        "(amount!uint256 > 100 AND FC:Score < 5) OR flag!bool == true"
    );

    let code = "PLH 2  N 0  == 0 1  PLH 0  N 3  > 3 4  PLH 1  N 4  < 6 7  OR 5 8  AND 2 9";
    assert_eq!(
        run(code, placeholders).unwrap(),
        "flag!bool == false AND (amount!uint256 > 3 OR FC:Score < 4)"
    );
}

#[test]
fn operands_keep_their_grouping() {
    let ctx = ctx();
    let amount = vec![arg(&ctx, "amount")];
    assert_eq!(
        run("PLH 0  N 2  N 3  - 1 2  - 0 3  N 10  > 4 5", amount.clone()).unwrap(),
        "amount!uint256 - (2 - 3) > 10"
    );
    assert_eq!(
        run("PLH 0  N 2  - 0 1  N 3  * 2 3  N 10  > 4 5", amount.clone()).unwrap(),
        "amount!uint256 - 2 * 3 > 10"
    );
    assert_eq!(
        run("PLH 0  N 1  > 0 1  N 1  == 2 3", amount).unwrap(),
        "(amount!uint256 > 1) == 1"
    );
    assert_eq!(
        run("PLH 0  N 1  == 0 1  NOT 2", vec![arg(&ctx, "flag")]).unwrap(),
        "NOT (flag!bool == true)"
    );
}

#[test]
fn globals() {
    assert_eq!(
        run(
            "PLH 0  PLH 1  == 0 1",
            vec![
                Placeholder::global(GlobalVar::MsgSender),
                Placeholder::global(GlobalVar::TxOrigin)
            ]
        )
        .unwrap(),
        "GV:MSG_SENDER == GV:TX_ORIGIN"
    );
}

#[test]
fn raw_data_literals() {
    let ctx = ctx();
    let mut program = program(
        "PLH 0  N 77  == 0 1  PLH 0  N 78  != 3 4  AND 2 5",
        vec![Placeholder::foreign_call(ctx.foreign_call("Score").unwrap())],
    );
    program.raw_data = vec![
        RawDataReplacement {
            instruction_set_index: 3,
            argument_type: ParamType::String,
            original_data: "it's".to_string(),
        },
        RawDataReplacement {
            instruction_set_index: 10,
            argument_type: ParamType::Bytes,
            original_data: "0x1234".to_string(),
        },
    ];
    assert_eq!(
        decompile(&program, &ctx).unwrap(),
        "FC:Score == \"it's\" AND FC:Score != 0x1234:bytes"
    );
}

#[test]
fn tracker_updates() {
    let ctx = ctx();
    let total = Placeholder::tracker(ctx.tracker("Total").unwrap());
    assert_eq!(
        run("PLH 0  N 1  + 0 1  TRU 1 2 0", vec![total.clone()]).unwrap(),
        "TRU:Total += 1"
    );
    assert_eq!(
        run("PLH 0  PLH 1  = 0 1  TRU 1 2 0", vec![total.clone(), arg(&ctx, "amount")]).unwrap(),
        "TRU:Total = amount!uint256"
    );

    let balances = Placeholder::mapped_tracker(ctx.mapped_tracker("Balances").unwrap());
    assert_eq!(
        run(
            "PLH 1  PLHM 0 0  N 5  - 1 2  TRUM 2 3 0 0",
            vec![balances, arg(&ctx, "to")]
        )
        .unwrap(),
        "TRU:Balances(to!address) -= 5"
    );

    assert!(matches!(
        run("PLH 0  N 1  + 0 1  TRU 9 2 0", vec![total.clone()]),
        Err(DecompileError::InvalidTrackerUpdate { position: 7, .. })
    ));
    assert!(matches!(
        run("PLH 0  N 1  > 0 1  TRU 1 2 0", vec![total.clone()]),
        Err(DecompileError::InvalidTrackerUpdate { .. })
    ));
    assert!(matches!(
        run("PLH 0  N 1  + 0 1  TRU 1 2 7", vec![total]),
        Err(DecompileError::InvalidOperand { position: 10, .. })
    ));
}

#[test]
fn mapped_placeholder_reads() {
    let ctx = ctx();
    let balances = Placeholder::mapped_tracker(ctx.mapped_tracker("Balances").unwrap());
    assert_eq!(
        run(
            "PLH 1  PLHM 0 0  N 10  > 1 2",
            vec![balances, Placeholder::global(GlobalVar::MsgSender)]
        )
        .unwrap(),
        "TR:Balances(GV:MSG_SENDER) > 10"
    );

    assert!(matches!(
        run("N 1  PLHM 0 0  N 10  > 1 2", vec![arg(&ctx, "to")]),
        Err(DecompileError::InvalidOperand {
            reason: "placeholder is not a mapped tracker",
            ..
        })
    ));
}

#[test]
fn malformed_instruction_sets() {
    assert_eq!(run("", vec![]), Err(DecompileError::ResidualValue { count: 0 }));
    assert_eq!(
        run("N 1  N 2", vec![]),
        Err(DecompileError::ResidualValue { count: 2 })
    );
    assert!(matches!(
        run("N 1  NOT 1", vec![]),
        Err(DecompileError::InvalidOperand { position: 3, .. })
    ));
    assert_eq!(
        run("N 1  19 0", vec![]),
        Err(DecompileError::UnknownOpcode {
            opcode: "19".to_string(),
            position: 2
        })
    );
    assert!(matches!(
        run("N 1  N 2  ==  0", vec![]),
        Err(DecompileError::TruncatedInstruction { .. })
    ));

    let limits = CodecLimits::new(64, 4);
    assert_eq!(
        decompile_with_limits(&program("N 1  N 2  == 0 1", vec![]), &ctx(), &limits),
        Err(DecompileError::InstructionLimitExceeded { len: 7, limit: 4 })
    );
}

#[test]
fn deterministic() {
    let ctx = ctx();
    let program = program(
        "PLH 0  N 100  > 0 1  PLH 1  N 1  == 3 4  OR 2 5",
        vec![arg(&ctx, "amount"), arg(&ctx, "flag")],
    );
    let first = decompile(&program, &ctx).unwrap();
    let second = decompile(&program, &ctx).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, "amount!uint256 > 100 OR flag!bool == true");
}
