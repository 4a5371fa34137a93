// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt;

use super::{Instruction, Opcode};

/// How an operand cell is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// Literal word
    Value,
    /// Memory address of an earlier result
    Address,
    /// Index into the placeholder table
    Placeholder,
    /// Tracker id
    Tracker,
    /// Reserved cell, always zero
    Reserved,
}

impl Opcode {
    pub const fn operand_kinds(self) -> &'static [OperandKind] {
        use OperandKind::*;
        match self {
            Opcode::Number => &[Value],
            Opcode::Not => &[Address],
            Opcode::Placeholder => &[Placeholder],
            Opcode::MappedPlaceholder => &[Placeholder, Address],
            Opcode::TrackerUpdate => &[Tracker, Address, Reserved],
            Opcode::MappedTrackerUpdate => &[Tracker, Address, Address, Reserved],
            _ => &[Address, Address],
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl fmt::Display for Instruction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        for (operand, kind) in self.operands.iter().zip(self.opcode.operand_kinds()) {
            match kind {
                OperandKind::Address => write!(f, " @{operand}")?,
                OperandKind::Placeholder => write!(f, " P({operand})")?,
                OperandKind::Tracker => write!(f, " T({operand})")?,
                OperandKind::Value | OperandKind::Reserved => write!(f, " {operand}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::super::{Instructions, Opcode};
    use alloc::string::ToString;
    use alloc::vec::Vec;
    use num_bigint::BigUint;

    #[test]
    fn operand_kinds_match_arity() {
        for op in Opcode::ALL {
            assert_eq!(op.operand_kinds().len(), op.arity(), "{op}");
        }
    }

    #[test]
    fn display_group() {
        let set: Vec<BigUint> = [18u32, 1, 4, 2, 0].iter().map(|c| BigUint::from(*c)).collect();
        let group = Instructions::new(&set).next().unwrap().unwrap();
        assert_eq!(group.to_string(), "TRUM T(1) @4 @2 0");
    }
}
