// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use num_bigint::BigUint;

use crate::abi::{literal_digest, AbiValue};
use crate::bytecode::decompiler::coerce_literal;
use crate::bytecode::{decode_placeholder, GlobalVar, Opcode, Placeholder, Retype};
use crate::languages::rcl::ast::{Expr, Literal, Reference, UpdateExpression};
use crate::symbols::{ParamType, SymbolContext};

use super::core::Compiler;
use super::error::{CompileError, Result};

const WORD_BITS: u64 = 256;

impl Compiler<'_> {
    /// Compile `expr`, returning the memory address of its value.
    pub fn compile_expr(&mut self, expr: &Expr) -> Result<usize> {
        match expr {
            Expr::Literal(literal) => self.compile_literal(literal),
            Expr::Reference(reference) => self.compile_reference(reference),
            Expr::Not(not) => {
                let operand = self.compile_expr(&not.operand)?;
                self.emit_address(Opcode::Not, &[operand])
            }
            Expr::Binary(binary) => {
                let opcode = binary.operator.opcode();
                if opcode.is_comparison() || opcode == Opcode::Assign {
                    self.check_coercion(&binary.left, &binary.right)?;
                    self.check_coercion(&binary.right, &binary.left)?;
                }
                let left = self.compile_expr(&binary.left)?;
                let right = self.compile_expr(&binary.right)?;
                self.emit_address(binary.operator.opcode(), &[left, right])
            }
            Expr::Logical(logical) => {
                let left = self.compile_expr(&logical.left)?;
                let right = self.compile_expr(&logical.right)?;
                self.emit_address(logical.operator.opcode(), &[left, right])
            }
            Expr::Update(update) => self.compile_update(update),
        }
    }

    fn compile_literal(&mut self, literal: &Literal) -> Result<usize> {
        match literal {
            Literal::Number(raw) => {
                let word = parse_word(raw)?;
                self.emit(Opcode::Number, &[word])
            }
            Literal::Bool(value) => self.emit(Opcode::Number, &[BigUint::from(u8::from(*value))]),
            Literal::String(text) => {
                let digest = literal_digest(&AbiValue::String(text.clone()))?;
                self.emit_raw_literal(digest, ParamType::String, text)
            }
            Literal::Bytes(raw) => {
                let bytes = parse_bytes(raw)?;
                let digest = literal_digest(&AbiValue::Bytes(bytes))?;
                self.emit_raw_literal(digest, ParamType::Bytes, raw)
            }
        }
    }

    /// A number compared against a `!bool` or `!address` reference must be
    /// representable in that type, or its decompiled text could not be read back.
    fn check_coercion(&self, literal: &Expr, other: &Expr) -> Result<()> {
        let Expr::Literal(Literal::Number(raw)) = literal else {
            return Ok(());
        };
        let Some(retype) = self.placeholder_retype(other) else {
            return Ok(());
        };
        let target = match retype {
            Retype::Bool => ParamType::Bool,
            Retype::Address => ParamType::Address,
            Retype::Other(_) => return Ok(()),
        };
        match coerce_literal(&parse_word(raw)?, &retype) {
            Ok(_) => Ok(()),
            Err(_) => Err(CompileError::LiteralCoercion {
                literal: raw.clone(),
                target,
            }),
        }
    }

    // Re-typing the decompiler will attach to `expr`; keyed reads carry none.
    fn placeholder_retype(&self, expr: &Expr) -> Option<Retype> {
        match expr {
            Expr::Reference(Reference::Tracker { key: Some(_), .. }) => None,
            Expr::Reference(reference) => {
                let placeholder = reference_placeholder(self.ctx, reference).ok()?;
                decode_placeholder(&placeholder, 0, self.ctx).ok()?.retype
            }
            _ => None,
        }
    }

    fn compile_reference(&mut self, reference: &Reference) -> Result<usize> {
        check_retype(reference)?;
        match reference {
            Reference::Tracker { update: true, name, .. } => Err(CompileError::Unsupported(
                format!("TRU:{name} may only be the target of an update"),
            )),
            Reference::Tracker {
                name,
                key: Some(key),
                ..
            } => {
                let symbol = self.ctx.mapped_tracker(name).ok_or_else(|| {
                    if self.ctx.tracker(name).is_some() {
                        CompileError::Unsupported(format!("tracker '{name}' takes no key"))
                    } else {
                        unknown("mapped tracker", name)
                    }
                })?;
                let placeholder = Placeholder::mapped_tracker(symbol);
                let key = self.compile_expr(key)?;
                let index = self.placeholder_index(placeholder);
                self.emit(
                    Opcode::MappedPlaceholder,
                    &[BigUint::from(index), BigUint::from(key)],
                )
            }
            _ => {
                let placeholder = reference_placeholder(self.ctx, reference)?;
                let index = self.placeholder_index(placeholder);
                self.emit(Opcode::Placeholder, &[BigUint::from(index)])
            }
        }
    }

    /// `TRU:x op v` compiles to `PLH x; v; op; TRU`, and the mapped form to
    /// `key; PLHM x key; v; op; TRUM`.
    fn compile_update(&mut self, update: &UpdateExpression) -> Result<usize> {
        let name = &update.tracker;
        let (head, id, key) = match &update.key {
            None => {
                let symbol = self
                    .ctx
                    .tracker(name)
                    .ok_or_else(|| unknown("tracker", name))?;
                let index = self.placeholder_index(Placeholder::tracker(symbol));
                let head = self.emit(Opcode::Placeholder, &[BigUint::from(index)])?;
                (head, symbol.index, None)
            }
            Some(key) => {
                let symbol = self
                    .ctx
                    .mapped_tracker(name)
                    .ok_or_else(|| unknown("mapped tracker", name))?;
                let (id, placeholder) = (symbol.index, Placeholder::mapped_tracker(symbol));
                let key = self.compile_expr(key)?;
                let index = self.placeholder_index(placeholder);
                let head = self.emit(
                    Opcode::MappedPlaceholder,
                    &[BigUint::from(index), BigUint::from(key)],
                )?;
                (head, id, Some(key))
            }
        };

        let value = self.compile_expr(&update.value)?;
        let result = self.emit_address(update.operator.opcode(), &[head, value])?;

        let zero = BigUint::default();
        match key {
            None => self.emit(
                Opcode::TrackerUpdate,
                &[BigUint::from(id), BigUint::from(result), zero],
            ),
            Some(key) => self.emit(
                Opcode::MappedTrackerUpdate,
                &[
                    BigUint::from(id),
                    BigUint::from(result),
                    BigUint::from(key),
                    zero,
                ],
            ),
        }
    }
}

fn unknown(kind: &'static str, name: &str) -> CompileError {
    CompileError::UnknownReference {
        kind,
        name: name.to_string(),
    }
}

fn check_retype(reference: &Reference) -> Result<()> {
    match reference.retype() {
        Some(type_name) if ParamType::from_type_name(type_name).is_none() => {
            Err(CompileError::TypeCoercion {
                type_name: type_name.to_string(),
            })
        }
        _ => Ok(()),
    }
}

/// Placeholder for a reference that needs no key.
pub(crate) fn reference_placeholder(ctx: &SymbolContext, reference: &Reference) -> Result<Placeholder> {
    check_retype(reference)?;
    match reference {
        Reference::ForeignCall { name, .. } => ctx
            .foreign_call(name)
            .map(Placeholder::foreign_call)
            .ok_or_else(|| unknown("foreign call", name)),
        Reference::Tracker { name, key: None, .. } => match ctx.tracker(name) {
            Some(symbol) => Ok(Placeholder::tracker(symbol)),
            None if ctx.mapped_tracker(name).is_some() => Err(CompileError::Unsupported(
                format!("mapped tracker '{name}' needs a key"),
            )),
            None => Err(unknown("tracker", name)),
        },
        Reference::Tracker { name, .. } => Err(CompileError::Unsupported(format!(
            "TR:{name}(...) cannot be used here"
        ))),
        Reference::Global { name, .. } => GlobalVar::from_name(name)
            .map(Placeholder::global)
            .ok_or_else(|| unknown("global value", name)),
        Reference::Argument { name, .. } => ctx
            .argument(name)
            .map(Placeholder::argument)
            .ok_or_else(|| unknown("argument", name)),
    }
}

/// Parse a decimal or `0x` hex literal into one instruction word.
pub(crate) fn parse_word(raw: &str) -> Result<BigUint> {
    let invalid = |reason| CompileError::InvalidLiteral {
        literal: raw.to_string(),
        reason,
    };
    let word = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => BigUint::parse_bytes(hex.as_bytes(), 16),
        None => BigUint::parse_bytes(raw.as_bytes(), 10),
    }
    .ok_or_else(|| invalid("not a number"))?;
    if word.bits() > WORD_BITS {
        return Err(invalid("does not fit in 256 bits"));
    }
    Ok(word)
}

/// Decode the hex digits of a `0x..:bytes` literal.
pub(crate) fn parse_bytes(raw: &str) -> Result<Vec<u8>> {
    let invalid = |reason| CompileError::InvalidLiteral {
        literal: raw.to_string(),
        reason,
    };
    let digits: String = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| invalid("bytes must be written in hex"))?
        .to_ascii_lowercase();
    data_encoding::HEXLOWER
        .decode(digits.as_bytes())
        .map_err(|_| invalid("odd number of hex digits"))
}
