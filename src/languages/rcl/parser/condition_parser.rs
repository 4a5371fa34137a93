// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.
#![allow(missing_debug_implementations)] // parser structs are internal; Debug not required

use alloc::boxed::Box;
use alloc::format;
use alloc::string::ToString;

use crate::config::CodecLimits;
use crate::languages::rcl::ast::{
    BinaryExpression, BinaryOperator, Expr, LogicalExpression, LogicalOperator, NotExpression,
    Reference, UpdateExpression, UpdateOperator,
};
use crate::lexer::{Lexer, Source, Token, TokenKind};

use super::error::ParseError;

/// Parse an RCL expression with the default limits
pub fn parse_expression(text: &str) -> Result<Expr, ParseError> {
    parse_expression_with_limits(text, &CodecLimits::default())
}

pub fn parse_expression_with_limits(text: &str, limits: &CodecLimits) -> Result<Expr, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::UnsupportedExpression(
            "Empty expression".to_string(),
        ));
    }

    let source = Source::from_contents("rule".to_string(), text.to_string())
        .map_err(|e| ParseError::InvalidExpression(e.to_string()))?;
    RclParser::parse(&source, limits)
}

/// Recursive-descent parser for RCL expressions.
///
/// AND/OR bind loosest and may appear once per parenthesized group. Below
/// them sit relations (`==`, `=`, `+=`, ...), then left-associative
/// arithmetic, then `NOT`, then primaries.
pub struct RclParser<'source> {
    pub(super) lexer: Lexer<'source>,
    pub(super) current: Token,
    depth: usize,
    max_depth: usize,
}

impl<'source> RclParser<'source> {
    /// Parse an expression from source
    pub fn parse(source: &'source Source, limits: &CodecLimits) -> Result<Expr, ParseError> {
        let mut lexer = Lexer::new(source);
        let current = lexer
            .next_token()
            .map_err(|e| ParseError::InvalidExpression(e.to_string()))?;

        let mut parser = Self {
            lexer,
            current,
            depth: 0,
            max_depth: limits.max_nesting_depth,
        };
        let expression = parser.parse_logical_expression()?;

        if parser.current.0 != TokenKind::Eof {
            return Err(parser.unexpected("after expression"));
        }

        Ok(expression)
    }

    /// Get current token text
    pub(super) fn current_text(&self) -> &str {
        self.current.1.text()
    }

    /// Advance to next token
    pub(super) fn advance(&mut self) -> Result<(), ParseError> {
        self.current = self
            .lexer
            .next_token()
            .map_err(|e| ParseError::InvalidExpression(e.to_string()))?;
        Ok(())
    }

    pub(super) fn error(&self, msg: &str) -> ParseError {
        ParseError::UnsupportedExpression(format!(
            "{} at line {}, column {}",
            msg, self.current.1.line, self.current.1.col
        ))
    }

    pub(super) fn unexpected(&self, context: &str) -> ParseError {
        match self.current.0 {
            TokenKind::Eof => self.error(&format!("Unexpected end of input {context}")),
            kind => self.error(&format!(
                "Unexpected {:?} '{}' {}",
                kind,
                self.current_text(),
                context
            )),
        }
    }

    pub(super) fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::NestingTooDeep(self.max_depth));
        }
        Ok(())
    }

    pub(super) fn leave(&mut self, levels: usize) {
        self.depth = self.depth.saturating_sub(levels);
    }

    fn logical_operator(&self) -> Option<LogicalOperator> {
        match self.current.0 {
            TokenKind::Ident => LogicalOperator::from_keyword(self.current_text()),
            _ => None,
        }
    }

    /// Parse `relation [AND|OR relation]` (lowest precedence)
    pub(super) fn parse_logical_expression(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_relation_expression()?;

        let Some(operator) = self.logical_operator() else {
            return Ok(left);
        };
        self.advance()?;
        let right = self.parse_relation_expression()?;

        if self.logical_operator().is_some() {
            return Err(self.error("AND/OR may appear only once per group; use parentheses"));
        }

        Ok(Expr::Logical(LogicalExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }))
    }

    /// Parse a comparison, assignment or tracker update
    pub(super) fn parse_relation_expression(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_additive_expression()?;

        if let Expr::Reference(Reference::Tracker { update: true, .. }) = &left {
            return self.parse_update_expression(left);
        }

        if self.current.0 != TokenKind::Symbol {
            return Ok(left);
        }
        let symbol = self.current_text();
        if let Some(operator) = BinaryOperator::from_relation_symbol(symbol) {
            self.advance()?;
            let right = self.parse_additive_expression()?;
            return Ok(Expr::Binary(BinaryExpression {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            }));
        }
        if UpdateOperator::from_symbol(symbol).is_some() {
            return Err(self.error(&format!("'{symbol}' requires a TRU: target")));
        }

        Ok(left)
    }

    fn parse_update_expression(&mut self, target: Expr) -> Result<Expr, ParseError> {
        let operator = match self.current.0 {
            TokenKind::Symbol => UpdateOperator::from_symbol(self.current_text()),
            _ => None,
        };
        let Some(operator) = operator else {
            return Err(self.error("TRU: reference must be followed by =, +=, -=, *= or /="));
        };

        let Expr::Reference(Reference::Tracker {
            name, key, retype, ..
        }) = target
        else {
            return Err(self.error("Invalid update target"));
        };
        if retype.is_some() {
            return Err(self.error("TRU: target cannot carry a type suffix"));
        }

        self.advance()?;
        let value = self.parse_additive_expression()?;
        Ok(Expr::Update(UpdateExpression {
            tracker: name,
            key,
            operator,
            value: Box::new(value),
        }))
    }

    /// Parse left-associative `+ - * /` chains
    pub(super) fn parse_additive_expression(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary_expression()?;
        let mut levels = 0;

        while self.current.0 == TokenKind::Symbol {
            let Some(operator) = BinaryOperator::from_arithmetic_symbol(self.current_text())
            else {
                break;
            };
            self.enter()?;
            levels += 1;
            self.advance()?;
            let right = self.parse_unary_expression()?;
            left = Expr::Binary(BinaryExpression {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        self.leave(levels);
        Ok(left)
    }

    /// Parse `NOT` chains
    pub(super) fn parse_unary_expression(&mut self) -> Result<Expr, ParseError> {
        if self.current.is_keyword("NOT") {
            self.enter()?;
            self.advance()?;
            let operand = self.parse_unary_expression()?;
            self.leave(1);
            return Ok(Expr::Not(NotExpression {
                operand: Box::new(operand),
            }));
        }

        self.parse_primary_expression()
    }
}
