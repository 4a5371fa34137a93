// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Parenthesis grouping and AND/OR arity checks over condition text.
//!
//! Precedence between AND and OR is never inferred: every group, including
//! the implicit outermost one, holds at most one logical operator.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use thiserror::Error;

use crate::lexer::{Lexer, RefPrefix, Source, Token, TokenKind};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("{0}")]
    Lex(String),

    #[error("condition is empty")]
    Empty,

    #[error("')' at line {line}, column {col} closes no group")]
    UnbalancedClose { line: u32, col: u32 },

    #[error("{count} group(s) left unclosed")]
    Unclosed { count: usize },

    #[error("empty parentheses at line {line}, column {col}")]
    EmptyGroup { line: u32, col: u32 },

    #[error("group '{group}' mixes AND and OR; add parentheses")]
    MixedLogical { group: String },

    #[error("group '{group}' repeats {operator}; add parentheses")]
    RepeatedLogical {
        operator: &'static str,
        group: String,
    },

    #[error("{operator} in group '{group}' is missing an operand")]
    MissingOperand {
        operator: &'static str,
        group: String,
    },
}

/// One element of a group after folding.
#[derive(Debug, Clone)]
enum Term {
    Token(Token),
    /// A closed inner group or a `TR:name(key)` call
    Folded(&'static str),
}

impl Term {
    fn logical(&self) -> Option<&'static str> {
        match self {
            Term::Token(token) if token.is_keyword("AND") => Some("AND"),
            Term::Token(token) if token.is_keyword("OR") => Some("OR"),
            _ => None,
        }
    }

    fn text(&self) -> &str {
        match self {
            Term::Token(token) => token.text(),
            Term::Folded(text) => text,
        }
    }
}

fn group_text(terms: &[Term]) -> String {
    terms.iter().map(Term::text).collect::<Vec<_>>().join(" ")
}

/// Returns whether `text` is a well-formed condition. Never panics.
pub fn is_valid_grammar(text: &str) -> bool {
    validate_grammar(text).is_ok()
}

pub fn validate_grammar(text: &str) -> Result<(), GrammarError> {
    let source = Source::from_contents("condition".to_string(), text.to_string())
        .map_err(|e| GrammarError::Lex(e.to_string()))?;
    let tokens = Lexer::tokenize(&source).map_err(|e| GrammarError::Lex(e.to_string()))?;

    let mut finalized = Vec::new();
    // The outermost group is implicit.
    let mut open: Vec<Vec<Term>> = alloc::vec![Vec::new()];
    let mut tokens = tokens.into_iter().peekable();

    while let Some(token) = tokens.next() {
        match token.0 {
            TokenKind::Eof => break,
            TokenKind::Reference(RefPrefix::Tracker | RefPrefix::TrackerUpdate)
                if tokens.peek().is_some_and(|next| next.is_symbol("(")) =>
            {
                // Parentheses of a mapped-tracker key are data, not grouping.
                let mut depth = 0usize;
                for inner in tokens.by_ref() {
                    if inner.0 == TokenKind::Eof {
                        return Err(GrammarError::Unclosed { count: depth });
                    }
                    if inner.is_symbol("(") {
                        depth += 1;
                    } else if inner.is_symbol(")") {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                }
                push(&mut open, Term::Folded("TRACKER_CALL"));
            }
            TokenKind::Symbol if token.is_symbol("(") => open.push(Vec::new()),
            TokenKind::Symbol if token.is_symbol(")") => {
                if open.len() < 2 {
                    return Err(GrammarError::UnbalancedClose {
                        line: token.1.line,
                        col: token.1.col,
                    });
                }
                let group = open.pop().unwrap_or_default();
                if group.is_empty() {
                    return Err(GrammarError::EmptyGroup {
                        line: token.1.line,
                        col: token.1.col,
                    });
                }
                finalized.push(group);
                push(&mut open, Term::Folded("PAREN_GROUP"));
            }
            _ => push(&mut open, Term::Token(token)),
        }
    }

    if open.len() > 1 {
        return Err(GrammarError::Unclosed {
            count: open.len() - 1,
        });
    }
    match open.pop() {
        Some(outer) if !outer.is_empty() => finalized.push(outer),
        _ => return Err(GrammarError::Empty),
    }

    finalized.iter().try_for_each(|group| check_group(group))
}

fn push(open: &mut [Vec<Term>], term: Term) {
    if let Some(current) = open.last_mut() {
        current.push(term);
    }
}

fn check_group(group: &[Term]) -> Result<(), GrammarError> {
    let operators: Vec<(usize, &'static str)> = group
        .iter()
        .enumerate()
        .filter_map(|(idx, term)| term.logical().map(|op| (idx, op)))
        .collect();

    match operators.as_slice() {
        [] => Ok(()),
        [(idx, operator)] => {
            if *idx == 0 || *idx + 1 == group.len() {
                return Err(GrammarError::MissingOperand {
                    operator: *operator,
                    group: group_text(group),
                });
            }
            Ok(())
        }
        [(_, first), rest @ ..] => {
            if rest.iter().any(|(_, op)| op != first) {
                Err(GrammarError::MixedLogical {
                    group: group_text(group),
                })
            } else {
                Err(GrammarError::RepeatedLogical {
                    operator: *first,
                    group: group_text(group),
                })
            }
        }
    }
}
