// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::borrow::Cow;
use alloc::format;
use alloc::string::String;
use num_bigint::BigUint;

use crate::bytecode::instructions::Opcode;
use crate::bytecode::placeholder::Retype;

/// How tightly a rendered cell binds, weakest first.
///
/// The parser reads `NOT` tighter than arithmetic, arithmetic tighter than
/// relations, and relations tighter than `AND`/`OR`. Logical cells render
/// their own parentheses and therefore bind like an atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) enum Form {
    Relation,
    Arithmetic,
    Unary,
    Atom,
    Group,
}

/// What a cell holds, as far as later groups need to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Value {
    Literal { word: BigUint, raw: bool },
    Reference { retype: Option<Retype>, tracker: Option<u32> },
    MappedReference { tracker: u32, key: usize },
    Binary { op: Opcode, lhs: usize, rhs: usize },
    Other,
}

/// One memory cell of the simulated machine.
#[derive(Debug, Clone)]
pub(super) struct Cell {
    pub text: String,
    pub form: Form,
    pub value: Value,
}

impl Cell {
    pub fn new(text: String, form: Form, value: Value) -> Self {
        Self { text, form, value }
    }

    /// Text to embed as an operand where at least `min` binding is needed.
    pub fn operand(&self, min: Form) -> Cow<'_, str> {
        if self.form < min {
            Cow::Owned(format!("({})", self.text))
        } else {
            Cow::Borrowed(&self.text)
        }
    }

    /// Text without the parentheses of a logical group.
    pub fn bare(&self) -> &str {
        if self.form == Form::Group {
            if let Some(inner) = self
                .text
                .strip_prefix('(')
                .and_then(|t| t.strip_suffix(')'))
            {
                return inner;
            }
        }
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn operand_wrapping() {
        let sum = Cell::new("a + b".to_string(), Form::Arithmetic, Value::Other);
        assert_eq!(sum.operand(Form::Arithmetic), "a + b");
        assert_eq!(sum.operand(Form::Unary), "(a + b)");

        let group = Cell::new("(a AND b)".to_string(), Form::Group, Value::Other);
        assert_eq!(group.operand(Form::Unary), "(a AND b)");
        assert_eq!(group.bare(), "a AND b");
        assert_eq!(sum.bare(), "a + b");
    }
}
