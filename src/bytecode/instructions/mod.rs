// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod display;

pub use display::OperandKind;

use alloc::string::ToString;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::errors::DecompileError;

/// Opcodes understood by the execution engine.
///
/// The numeric codes and operand counts are the wire format. Older instruction
/// sets spelled opcodes with their mnemonics (`"PLH"`, `"=="`, ...);
/// [`Opcode::from_mnemonic`] accepts that spelling.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// Numeric literal, or the digest of a string/bytes literal
    Number = 0,
    Not = 1,
    /// Load placeholder by index
    Placeholder = 2,
    Assign = 3,
    /// Placeholder index, memory address of the key
    MappedPlaceholder = 4,
    Add = 5,
    Sub = 6,
    Mul = 7,
    Div = 8,
    Lt = 9,
    Gt = 10,
    Eq = 11,
    And = 12,
    Or = 13,
    Gte = 14,
    Lte = 15,
    Neq = 16,
    /// Tracker id, memory address of the new value, 0
    TrackerUpdate = 17,
    /// Tracker id, memory address of the new value, memory address of the key, 0
    MappedTrackerUpdate = 18,
}

impl Opcode {
    pub const ALL: [Opcode; 19] = [
        Opcode::Number,
        Opcode::Not,
        Opcode::Placeholder,
        Opcode::Assign,
        Opcode::MappedPlaceholder,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Lt,
        Opcode::Gt,
        Opcode::Eq,
        Opcode::And,
        Opcode::Or,
        Opcode::Gte,
        Opcode::Lte,
        Opcode::Neq,
        Opcode::TrackerUpdate,
        Opcode::MappedTrackerUpdate,
    ];

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn from_word(word: &BigUint) -> Option<Self> {
        word.to_u8().and_then(Self::from_code)
    }

    /// Number of operand cells following the opcode cell.
    pub const fn arity(self) -> usize {
        match self {
            Opcode::Number | Opcode::Not | Opcode::Placeholder => 1,
            Opcode::TrackerUpdate => 3,
            Opcode::MappedTrackerUpdate => 4,
            _ => 2,
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Number => "N",
            Opcode::Not => "NOT",
            Opcode::Placeholder => "PLH",
            Opcode::Assign => "=",
            Opcode::MappedPlaceholder => "PLHM",
            Opcode::Add => "+",
            Opcode::Sub => "-",
            Opcode::Mul => "*",
            Opcode::Div => "/",
            Opcode::Lt => "<",
            Opcode::Gt => ">",
            Opcode::Eq => "==",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Gte => ">=",
            Opcode::Lte => "<=",
            Opcode::Neq => "!=",
            Opcode::TrackerUpdate => "TRU",
            Opcode::MappedTrackerUpdate => "TRUM",
        }
    }

    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.mnemonic() == mnemonic)
    }

    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Opcode::Lt | Opcode::Gt | Opcode::Eq | Opcode::Gte | Opcode::Lte | Opcode::Neq
        )
    }
}

/// One opcode with its operand cells, borrowed from a flat instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction<'a> {
    pub opcode: Opcode,
    /// Flat position of the opcode cell.
    pub position: usize,
    pub operands: &'a [BigUint],
}

impl Instruction<'_> {
    /// Flat position of operand `n`.
    pub const fn operand_position(&self, n: usize) -> usize {
        self.position + 1 + n
    }
}

/// Splits a flat instruction set into opcode groups.
///
/// Yields an error and stops at the first unknown opcode or truncated group.
#[derive(Debug, Clone)]
pub struct Instructions<'a> {
    words: &'a [BigUint],
    position: usize,
}

impl<'a> Instructions<'a> {
    pub fn new(words: &'a [BigUint]) -> Self {
        Self { words, position: 0 }
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<Instruction<'a>, DecompileError>;

    fn next(&mut self) -> Option<Self::Item> {
        let position = self.position;
        let word = self.words.get(position)?;
        let Some(opcode) = Opcode::from_word(word) else {
            self.position = self.words.len();
            log::error!("unknown opcode {word} at position {position}");
            return Some(Err(DecompileError::UnknownOpcode {
                opcode: word.to_string(),
                position,
            }));
        };

        let end = position + 1 + opcode.arity();
        let Some(operands) = self.words.get(position + 1..end) else {
            self.position = self.words.len();
            return Some(Err(DecompileError::TruncatedInstruction {
                opcode: opcode.mnemonic(),
                position,
            }));
        };

        self.position = end;
        Some(Ok(Instruction {
            opcode,
            position,
            operands,
        }))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use alloc::vec::Vec;

    fn words(cells: &[u32]) -> Vec<BigUint> {
        cells.iter().map(|c| BigUint::from(*c)).collect()
    }

    #[test]
    fn opcode_table() {
        for (code, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(op.code() as usize, code);
            assert_eq!(Opcode::from_mnemonic(op.mnemonic()), Some(*op));
        }
        let comparisons: Vec<&str> = Opcode::ALL
            .iter()
            .filter(|op| op.is_comparison())
            .map(|op| op.mnemonic())
            .collect();
        assert_eq!(comparisons, ["<", ">", "==", ">=", "<=", "!="]);
        assert_eq!(Opcode::from_code(19), None);
        assert_eq!(Opcode::from_word(&(BigUint::from(1u8) << 200)), None);
        let arities: Vec<usize> = Opcode::ALL.iter().map(|op| op.arity()).collect();
        assert_eq!(
            arities,
            [1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 3, 4]
        );
    }

    #[test]
    fn groups() {
        let set = words(&[2, 0, 0, 1, 11, 0, 1]);
        let groups: Vec<_> = Instructions::new(&set).map(|g| g.unwrap()).collect();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[1].opcode, Opcode::Number);
        assert_eq!(groups[1].position, 2);
        assert_eq!(groups[1].operand_position(0), 3);
        assert_eq!(groups[2].opcode, Opcode::Eq);
    }

    #[test]
    fn unknown_and_truncated() {
        let set = words(&[2, 0, 42, 1]);
        let mut it = Instructions::new(&set);
        assert!(it.next().unwrap().is_ok());
        assert!(matches!(
            it.next(),
            Some(Err(DecompileError::UnknownOpcode { position: 2, .. }))
        ));
        assert!(it.next().is_none());

        let set = words(&[11, 0]);
        assert!(matches!(
            Instructions::new(&set).next(),
            Some(Err(DecompileError::TruncatedInstruction { opcode: "==", .. }))
        ));
    }
}
