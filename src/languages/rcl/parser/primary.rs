// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::{String, ToString};

use crate::languages::rcl::ast::{Expr, Literal, LogicalOperator, Reference};
use crate::lexer::{RefPrefix, TokenKind};

use super::condition_parser::RclParser;
use super::ParseError;

impl<'source> RclParser<'source> {
    /// Parse primary expression (literals, references, parentheses)
    pub(super) fn parse_primary_expression(&mut self) -> Result<Expr, ParseError> {
        match self.current.0 {
            // Parenthesized expression
            TokenKind::Symbol if self.current_text() == "(" => {
                self.enter()?;
                self.advance()?;
                let expr = self.parse_logical_expression()?;
                self.expect_symbol(")")?;
                self.leave(1);
                Ok(expr)
            }

            TokenKind::Reference(prefix) => self.parse_reference(prefix),

            TokenKind::String => {
                let value = self.current_text().to_string();
                self.advance()?;
                Ok(Expr::Literal(Literal::String(value)))
            }

            TokenKind::Number => self.parse_number_literal(),

            TokenKind::Ident => {
                let text = self.current_text();
                match text {
                    "true" | "false" => {
                        let value = text == "true";
                        self.advance()?;
                        Ok(Expr::Literal(Literal::Bool(value)))
                    }
                    "NOT" => Err(self.error("Operator 'NOT' missing operand")),
                    _ if LogicalOperator::from_keyword(text).is_some() => {
                        Err(self.error(&format!("Operator '{text}' missing operands")))
                    }
                    _ => {
                        let name = text.to_string();
                        self.advance()?;
                        let mut reference = Reference::Argument { name, retype: None };
                        self.parse_retype(&mut reference)?;
                        Ok(Expr::Reference(reference))
                    }
                }
            }

            _ => Err(self.unexpected("where an operand was expected")),
        }
    }

    /// Parse `FC:name`, `TR:name`, `TR:name(key)`, `TRU:...` and `GV:NAME`
    fn parse_reference(&mut self, prefix: RefPrefix) -> Result<Expr, ParseError> {
        let name = self.current.reference_name().to_string();
        self.advance()?;

        let mut reference = match prefix {
            RefPrefix::ForeignCall => Reference::ForeignCall { name, retype: None },
            RefPrefix::Global => Reference::Global { name, retype: None },
            RefPrefix::Tracker | RefPrefix::TrackerUpdate => {
                let key = if self.current.is_symbol("(") {
                    self.enter()?;
                    self.advance()?;
                    let key = self.parse_logical_expression()?;
                    self.expect_symbol(")")?;
                    self.leave(1);
                    Some(Box::new(key))
                } else {
                    None
                };
                Reference::Tracker {
                    name,
                    key,
                    update: prefix == RefPrefix::TrackerUpdate,
                    retype: None,
                }
            }
        };

        self.parse_retype(&mut reference)?;
        Ok(Expr::Reference(reference))
    }

    /// Parse an optional `!type` suffix such as `!bool` or `!uint256[]`
    fn parse_retype(&mut self, reference: &mut Reference) -> Result<(), ParseError> {
        if !self.current.is_symbol("!") {
            return Ok(());
        }
        self.advance()?;
        if self.current.0 != TokenKind::Ident {
            return Err(self.unexpected("where a type name was expected"));
        }
        let mut type_name = self.current_text().to_string();
        self.advance()?;

        if self.current.is_symbol("[") {
            self.advance()?;
            type_name.push('[');
            if self.current.0 == TokenKind::Number {
                type_name.push_str(self.current_text());
                self.advance()?;
            }
            self.expect_symbol("]")?;
            type_name.push(']');
        }

        reference.set_retype(type_name);
        Ok(())
    }

    /// Parse a number, or a `0x..:bytes` literal
    fn parse_number_literal(&mut self) -> Result<Expr, ParseError> {
        let raw: String = self.current_text().to_string();
        self.advance()?;

        if !self.current.is_symbol(":") {
            return Ok(Expr::Literal(Literal::Number(raw)));
        }
        self.advance()?;
        if !self.current.is_keyword("bytes") {
            return Err(self.unexpected("where 'bytes' was expected"));
        }
        if !(raw.starts_with("0x") || raw.starts_with("0X")) {
            return Err(self.error(&format!("Bytes literal '{raw}' must be written in hex")));
        }
        self.advance()?;
        Ok(Expr::Literal(Literal::Bytes(raw)))
    }

    /// Expect a specific symbol
    pub(super) fn expect_symbol(&mut self, expected: &str) -> Result<(), ParseError> {
        if !self.current.is_symbol(expected) {
            return Err(self.error(&format!(
                "Expected '{}', found '{}'",
                expected,
                self.current_text()
            )));
        }
        self.advance()?;
        Ok(())
    }
}
