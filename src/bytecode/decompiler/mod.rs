// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Bytecode to RCL text.
//!
//! The decompiler simulates the engine's memory: every opcode group writes one
//! cell holding the rendered text of its value, and later groups address
//! earlier cells. The last cell is the result. Rendering inserts exactly the
//! parentheses the parser needs to rebuild the same instruction set.

mod coercion;
mod memory;

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::bytecode::errors::{DecompileError, Result};
use crate::bytecode::instructions::{Instruction, Opcode};
use crate::bytecode::placeholder::{decode_placeholder, ResolvedPlaceholder};
use crate::bytecode::program::Program;
use crate::config::CodecLimits;
use crate::symbols::{ParamType, SymbolContext};

pub(crate) use coercion::coerce_literal;
use memory::{Cell, Form, Value};

/// Decompile `program` into RCL text using the default limits.
pub fn decompile(program: &Program, ctx: &SymbolContext) -> Result<String> {
    decompile_with_limits(program, ctx, &CodecLimits::default())
}

pub fn decompile_with_limits(
    program: &Program,
    ctx: &SymbolContext,
    limits: &CodecLimits,
) -> Result<String> {
    let len = program.instruction_set.len();
    if len > limits.max_instructions {
        return Err(DecompileError::InstructionLimitExceeded {
            len,
            limit: limits.max_instructions,
        });
    }

    let mut machine = Machine::new(program, ctx);
    for group in program.instructions() {
        let group = group?;
        let cell = machine.step(&group)?;
        log::trace!("@{} {} => {}", machine.memory.len(), group, cell.text);
        machine.push(cell);
    }
    let text = machine.finish()?;
    log::debug!(
        "decompiled {} words with {} placeholders",
        len,
        program.placeholders.len()
    );
    Ok(text)
}

struct Machine<'a> {
    program: &'a Program,
    ctx: &'a SymbolContext,
    memory: Vec<Cell>,
    consumed: Vec<bool>,
}

impl<'a> Machine<'a> {
    fn new(program: &'a Program, ctx: &'a SymbolContext) -> Self {
        Self {
            program,
            ctx,
            memory: Vec::new(),
            consumed: Vec::new(),
        }
    }

    fn push(&mut self, cell: Cell) {
        self.memory.push(cell);
        self.consumed.push(false);
    }

    fn finish(self) -> Result<String> {
        let count = self.consumed.iter().filter(|used| !**used).count();
        match self.memory.last() {
            Some(cell) if count == 1 => Ok(cell.bare().to_string()),
            _ => Err(DecompileError::ResidualValue { count }),
        }
    }

    fn invalid(group: &Instruction<'_>, n: usize, reason: &'static str) -> DecompileError {
        DecompileError::InvalidOperand {
            operand: group
                .operands
                .get(n)
                .map(|w| w.to_string())
                .unwrap_or_default(),
            position: group.operand_position(n),
            reason,
        }
    }

    /// Read operand `n` as the address of an earlier cell and mark it consumed.
    fn address(&mut self, group: &Instruction<'_>, n: usize) -> Result<usize> {
        let address = group
            .operands
            .get(n)
            .and_then(BigUint::to_usize)
            .filter(|a| *a < self.memory.len())
            .ok_or_else(|| Self::invalid(group, n, "address does not precede the instruction"))?;
        self.consumed[address] = true;
        Ok(address)
    }

    fn index(group: &Instruction<'_>, n: usize) -> Result<usize> {
        group
            .operands
            .get(n)
            .and_then(BigUint::to_usize)
            .ok_or_else(|| Self::invalid(group, n, "index out of range"))
    }

    fn step(&mut self, group: &Instruction<'_>) -> Result<Cell> {
        match group.opcode {
            Opcode::Number => Ok(self.literal(group)),
            Opcode::Not => {
                let a = self.address(group, 0)?;
                let text = format!("NOT {}", self.memory[a].operand(Form::Unary));
                Ok(Cell::new(text, Form::Unary, Value::Other))
            }
            Opcode::Placeholder => self.placeholder(group),
            Opcode::MappedPlaceholder => self.mapped_placeholder(group),
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => {
                let (lhs, rhs) = (self.address(group, 0)?, self.address(group, 1)?);
                let text = format!(
                    "{} {} {}",
                    self.memory[lhs].operand(Form::Arithmetic),
                    group.opcode.mnemonic(),
                    self.memory[rhs].operand(Form::Unary)
                );
                Ok(Cell::new(
                    text,
                    Form::Arithmetic,
                    Value::Binary {
                        op: group.opcode,
                        lhs,
                        rhs,
                    },
                ))
            }
            Opcode::Assign
            | Opcode::Lt
            | Opcode::Gt
            | Opcode::Eq
            | Opcode::Gte
            | Opcode::Lte
            | Opcode::Neq => {
                let (lhs, rhs) = (self.address(group, 0)?, self.address(group, 1)?);
                let text = format!(
                    "{} {} {}",
                    self.relation_operand(lhs, rhs)?,
                    group.opcode.mnemonic(),
                    self.relation_operand(rhs, lhs)?
                );
                Ok(Cell::new(
                    text,
                    Form::Relation,
                    Value::Binary {
                        op: group.opcode,
                        lhs,
                        rhs,
                    },
                ))
            }
            Opcode::And | Opcode::Or => {
                let (lhs, rhs) = (self.address(group, 0)?, self.address(group, 1)?);
                let text = format!(
                    "({} {} {})",
                    self.memory[lhs].text,
                    group.opcode.mnemonic(),
                    self.memory[rhs].text
                );
                Ok(Cell::new(text, Form::Group, Value::Other))
            }
            Opcode::TrackerUpdate | Opcode::MappedTrackerUpdate => self.tracker_update(group),
        }
    }

    fn literal(&self, group: &Instruction<'_>) -> Cell {
        let word = group.operands.first().cloned().unwrap_or_default();
        match self.program.raw_data_at(group.operand_position(0)) {
            Some(raw) => {
                let text = match raw.argument_type {
                    ParamType::String if raw.original_data.contains('\'') => {
                        format!("\"{}\"", raw.original_data)
                    }
                    ParamType::String => format!("'{}'", raw.original_data),
                    ParamType::Bytes => format!("{}:bytes", raw.original_data),
                    _ => raw.original_data.clone(),
                };
                Cell::new(text, Form::Atom, Value::Literal { word, raw: true })
            }
            None => Cell::new(
                word.to_string(),
                Form::Atom,
                Value::Literal { word, raw: false },
            ),
        }
    }

    fn placeholder(&self, group: &Instruction<'_>) -> Result<Cell> {
        let index = Self::index(group, 0)?;
        let placeholder = self.program.placeholder(index)?;
        let decoded = decode_placeholder(placeholder, index, self.ctx)?;
        Ok(Cell::new(
            decoded.text,
            Form::Atom,
            Value::Reference {
                retype: decoded.retype,
                tracker: decoded.tracker,
            },
        ))
    }

    fn mapped_placeholder(&mut self, group: &Instruction<'_>) -> Result<Cell> {
        let index = Self::index(group, 0)?;
        let key = self.address(group, 1)?;
        let placeholder = self.program.placeholder(index)?;
        let ResolvedPlaceholder::MappedTracker(tracker) = placeholder.resolve(self.ctx)? else {
            return Err(Self::invalid(group, 0, "placeholder is not a mapped tracker"));
        };
        let text = format!("TR:{}({})", tracker.name, self.memory[key].bare());
        Ok(Cell::new(
            text,
            Form::Atom,
            Value::MappedReference {
                tracker: tracker.index,
                key,
            },
        ))
    }

    /// Operand of a relation, with a numeric literal coerced to the re-typing
    /// of the reference on the other side.
    fn relation_operand(&self, this: usize, other: usize) -> Result<String> {
        let cell = &self.memory[this];
        if let (
            Value::Literal { word, raw: false },
            Value::Reference {
                retype: Some(retype),
                ..
            },
        ) = (&cell.value, &self.memory[other].value)
        {
            if let Some(text) = coerce_literal(word, retype)? {
                return Ok(text);
            }
        }
        Ok(cell.operand(Form::Arithmetic).into_owned())
    }

    fn tracker_update(&mut self, group: &Instruction<'_>) -> Result<Cell> {
        let position = group.position;
        let fail = |reason| DecompileError::InvalidTrackerUpdate { position, reason };

        let id = group
            .operands
            .first()
            .and_then(BigUint::to_u32)
            .ok_or_else(|| Self::invalid(group, 0, "tracker id out of range"))?;
        let value = self.address(group, 1)?;
        let mapped = group.opcode == Opcode::MappedTrackerUpdate;
        let key = if mapped {
            Some(self.address(group, 2)?)
        } else {
            None
        };
        let reserved = group.opcode.arity() - 1;
        if group.operands.get(reserved).map_or(true, |w| *w != BigUint::default()) {
            return Err(Self::invalid(group, reserved, "reserved operand must be zero"));
        }

        if value + 1 != self.memory.len() {
            return Err(fail("value is not the most recent cell"));
        }
        let Value::Binary { op, lhs, rhs } = self.memory[value].value else {
            return Err(fail("value is not an update expression"));
        };
        let compound = match op {
            Opcode::Assign => "=",
            Opcode::Add => "+=",
            Opcode::Sub => "-=",
            Opcode::Mul => "*=",
            Opcode::Div => "/=",
            _ => return Err(fail("value is not an update expression")),
        };
        let head_matches = match (&self.memory[lhs].value, key) {
            (Value::Reference { tracker, .. }, None) => *tracker == Some(id),
            (Value::MappedReference { tracker, key: k }, Some(key)) => *tracker == id && *k == key,
            _ => false,
        };
        if !head_matches {
            return Err(fail("update is not headed by the updated tracker"));
        }

        let target = &self.memory[lhs].text;
        let name = target.strip_prefix("TR:").unwrap_or(target);
        let text = format!(
            "TRU:{} {} {}",
            name,
            compound,
            self.memory[rhs].operand(Form::Arithmetic)
        );
        Ok(Cell::new(text, Form::Relation, Value::Other))
    }
}

#[cfg(test)]
mod tests;
