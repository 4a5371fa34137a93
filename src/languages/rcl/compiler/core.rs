// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.
#![allow(missing_debug_implementations)]

use alloc::vec::Vec;
use num_bigint::BigUint;

use crate::bytecode::{Opcode, Placeholder, Program, RawDataReplacement};
use crate::config::CodecLimits;
use crate::symbols::{ParamType, SymbolContext};

use super::error::{CompileError, Result};

/// Emits the instruction set for one expression.
///
/// Every emitted group writes the next memory cell; `emit` returns its address.
pub struct Compiler<'a> {
    pub(super) ctx: &'a SymbolContext,
    limits: CodecLimits,
    program: Program,
    cells: usize,
}

impl<'a> Compiler<'a> {
    pub fn new(ctx: &'a SymbolContext, limits: &CodecLimits) -> Self {
        Self {
            ctx,
            limits: *limits,
            program: Program::default(),
            cells: 0,
        }
    }

    pub(super) fn emit(&mut self, opcode: Opcode, operands: &[BigUint]) -> Result<usize> {
        debug_assert_eq!(operands.len(), opcode.arity());
        let len = self.program.instruction_set.len() + 1 + operands.len();
        if len > self.limits.max_instructions {
            return Err(CompileError::InstructionLimitExceeded {
                limit: self.limits.max_instructions,
            });
        }

        self.program
            .instruction_set
            .push(BigUint::from(opcode.code()));
        self.program.instruction_set.extend_from_slice(operands);
        let address = self.cells;
        self.cells += 1;
        Ok(address)
    }

    pub(super) fn emit_address(&mut self, opcode: Opcode, addresses: &[usize]) -> Result<usize> {
        let operands: Vec<BigUint> = addresses.iter().map(|a| BigUint::from(*a)).collect();
        self.emit(opcode, &operands)
    }

    /// `N` group for a string or bytes literal, remembering its original text.
    pub(super) fn emit_raw_literal(
        &mut self,
        digest: BigUint,
        argument_type: ParamType,
        original_data: &str,
    ) -> Result<usize> {
        let instruction_set_index = self.program.instruction_set.len() + 1;
        let address = self.emit(Opcode::Number, &[digest])?;
        self.program.raw_data.push(RawDataReplacement {
            instruction_set_index,
            argument_type,
            original_data: original_data.into(),
        });
        Ok(address)
    }

    /// Index of `placeholder` in the placeholder table; equal placeholders share an index.
    pub(super) fn placeholder_index(&mut self, placeholder: Placeholder) -> usize {
        match self
            .program
            .placeholders
            .iter()
            .position(|p| *p == placeholder)
        {
            Some(index) => index,
            None => {
                self.program.placeholders.push(placeholder);
                self.program.placeholders.len() - 1
            }
        }
    }

    pub fn finish(self) -> Program {
        self.program
    }
}
