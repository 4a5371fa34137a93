// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tokenizer for RCL conditions, effects and value lists.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt::{self, Debug, Formatter};
use core::iter::Peekable;
use core::str::CharIndices;

use anyhow::{anyhow, bail, Result};

// Rule text is addressed with u32 offsets.
const MAX_TEXT_LEN: usize = u32::MAX as usize - 2;

#[derive(Debug)]
struct Text {
    name: String,
    contents: String,
    // Byte offset of the first character of every line.
    line_starts: Vec<usize>,
}

/// RCL text together with its line table, shared by every span cut from it.
#[derive(Clone)]
pub struct Source {
    text: Rc<Text>,
}

impl PartialEq for Source {
    fn eq(&self, other: &Source) -> bool {
        Rc::ptr_eq(&self.text, &other.text)
    }
}

impl Eq for Source {}

impl Debug for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.text.name)
    }
}

impl Source {
    /// `name` labels the text in diagnostics, e.g. `rule` or `values`.
    pub fn from_contents(name: String, contents: String) -> Result<Source> {
        if contents.len() > MAX_TEXT_LEN {
            bail!("{name} is longer than {MAX_TEXT_LEN} bytes");
        }
        let line_starts = core::iter::once(0)
            .chain(contents.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        Ok(Self {
            text: Rc::new(Text {
                name,
                contents,
                line_starts,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.text.name
    }

    pub fn contents(&self) -> &str {
        &self.text.contents
    }

    /// Text of the 1-based `line`, without its terminator.
    pub fn line(&self, line: u32) -> &str {
        let starts = &self.text.line_starts;
        let Some(&start) = (line as usize).checked_sub(1).and_then(|idx| starts.get(idx)) else {
            return "";
        };
        let rest = &self.text.contents[start..];
        let line = rest.split('\n').next().unwrap_or_default();
        line.strip_suffix('\r').unwrap_or(line)
    }

    /// Diagnostic with the offending line and a caret under `col`.
    pub fn message(&self, line: u32, col: u32, msg: &str) -> String {
        if line == 0 || line as usize > self.text.line_starts.len() {
            return format!("{}: {msg}", self.text.name);
        }
        let gutter = " ".repeat(line.to_string().len());
        let indent = " ".repeat((col as usize).saturating_sub(1));
        format!(
            "{msg}\n{gutter} --> {}:{line}:{col}\n{line} | {}\n{gutter} | {indent}^",
            self.text.name,
            self.line(line),
        )
    }

    pub fn error(&self, line: u32, col: u32, msg: &str) -> anyhow::Error {
        anyhow!(self.message(line, col, msg))
    }
}

#[derive(Clone)]
pub struct Span {
    pub source: Source,
    pub line: u32,
    pub col: u32,
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn text(&self) -> &str {
        &self.source.contents()[self.start as usize..self.end as usize]
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {:?}", self.line, self.col, self.text())
    }
}

/// Prefix of a symbol reference such as `FC:name`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RefPrefix {
    ForeignCall,
    Tracker,
    TrackerUpdate,
    Global,
}

impl RefPrefix {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "FC" => Some(Self::ForeignCall),
            "TR" => Some(Self::Tracker),
            "TRU" => Some(Self::TrackerUpdate),
            "GV" => Some(Self::Global),
            _ => None,
        }
    }

    pub const fn keyword(self) -> &'static str {
        match self {
            Self::ForeignCall => "FC",
            Self::Tracker => "TR",
            Self::TrackerUpdate => "TRU",
            Self::Global => "GV",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    Symbol,
    String,
    Number,
    Ident,
    Reference(RefPrefix),
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token(pub TokenKind, pub Span);

impl Token {
    pub fn text(&self) -> &str {
        self.1.text()
    }

    pub fn is_symbol(&self, symbol: &str) -> bool {
        self.0 == TokenKind::Symbol && self.text() == symbol
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.0 == TokenKind::Ident && self.text() == keyword
    }

    /// Name part of a reference token, i.e. `IsActive` for `FC:IsActive`.
    pub fn reference_name(&self) -> &str {
        match self.0 {
            TokenKind::Reference(_) => self
                .text()
                .split_once(':')
                .map(|(_, name)| name)
                .unwrap_or_default(),
            _ => self.text(),
        }
    }
}

#[derive(Clone)]
pub struct Lexer<'source> {
    source: Source,
    iter: Peekable<CharIndices<'source>>,
    line: u32,
    col: u32,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source Source) -> Self {
        Self {
            source: source.clone(),
            iter: source.contents().char_indices().peekable(),
            line: 1,
            col: 1,
        }
    }

    /// Lex the whole source. The returned vector always ends with an `Eof` token.
    pub fn tokenize(source: &'source Source) -> Result<Vec<Token>> {
        let mut lexer = Self::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let eof = token.0 == TokenKind::Eof;
            tokens.push(token);
            if eof {
                return Ok(tokens);
            }
        }
    }

    fn peek(&mut self) -> (usize, char) {
        match self.iter.peek() {
            Some((index, chr)) => (*index, *chr),
            _ => (self.source.contents().len(), '\x00'),
        }
    }

    fn peekahead(&mut self, n: usize) -> (usize, char) {
        match self.iter.clone().nth(n) {
            Some((index, chr)) => (index, chr),
            _ => (self.source.contents().len(), '\x00'),
        }
    }

    fn span(&self, col: u32, start: usize, end: usize) -> Span {
        Span {
            source: self.source.clone(),
            line: self.line,
            col,
            start: start as u32,
            end: end as u32,
        }
    }

    fn read_name(&mut self) {
        loop {
            let ch = self.peek().1;
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.iter.next();
            } else {
                break;
            }
        }
    }

    fn read_ident(&mut self) -> Result<Token> {
        let start = self.peek().0;
        let col = self.col;
        self.read_name();

        // FC:, TR:, TRU: and GV: introduce a symbol reference.
        let name_end = self.peek().0;
        let keyword = &self.source.contents()[start..name_end];
        let mut kind = TokenKind::Ident;
        if let Some(prefix) = RefPrefix::from_keyword(keyword) {
            let next = self.peekahead(1).1;
            if self.peek().1 == ':' {
                if !(next.is_ascii_alphabetic() || next == '_') {
                    let col = self.col + (self.peek().0 - start) as u32 + 1;
                    return Err(self.source.error(
                        self.line,
                        col,
                        &format!("expected a name after {}:", prefix.keyword()),
                    ));
                }
                self.iter.next();
                self.read_name();
                kind = TokenKind::Reference(prefix);
            }
        }

        let end = self.peek().0;
        self.col += (end - start) as u32;
        Ok(Token(kind, self.span(col, start, end)))
    }

    fn read_number(&mut self) -> Result<Token> {
        let (start, chr) = self.peek();
        let col = self.col;
        self.iter.next();

        if chr == '0' && matches!(self.peek().1, 'x' | 'X') {
            self.iter.next();
            if !self.peek().1.is_ascii_hexdigit() {
                return Err(self.source.error(self.line, col, "invalid hex number"));
            }
            while self.peek().1.is_ascii_hexdigit() {
                self.iter.next();
            }
        } else {
            while self.peek().1.is_ascii_digit() {
                self.iter.next();
            }
        }

        let end = self.peek().0;
        self.col += (end - start) as u32;

        // A valid number cannot be followed by these characters.
        let ch = self.peek().1;
        if ch == '_' || ch == '.' || ch.is_ascii_alphanumeric() {
            return Err(self.source.error(self.line, self.col, "invalid number"));
        }

        Ok(Token(TokenKind::Number, self.span(col, start, end)))
    }

    fn read_string(&mut self, quote: char) -> Result<Token> {
        let (line, col) = (self.line, self.col);
        self.iter.next();
        self.col += 1;
        let (start, _) = self.peek();
        loop {
            let (_, ch) = self.peek();
            match ch {
                '\x00' | '\n' => {
                    return Err(self.source.error(line, col, &format!("unmatched {quote}")));
                }
                _ if ch == quote => break,
                _ => {
                    self.iter.next();
                }
            }
        }
        let end = self.peek().0;
        self.iter.next();
        self.col += self.source.contents()[start..end].chars().count() as u32 + 1;

        Ok(Token(
            TokenKind::String,
            Span {
                source: self.source.clone(),
                line,
                col: col + 1,
                start: start as u32,
                end: end as u32,
            },
        ))
    }

    fn skip_ws(&mut self) -> Result<()> {
        loop {
            match self.peek().1 {
                ' ' => self.col += 1,
                '\t' => self.col += 4,
                '\r' => {
                    if self.peekahead(1).1 != '\n' {
                        return Err(self.source.error(
                            self.line,
                            self.col,
                            "\\r must be followed by \\n",
                        ));
                    }
                }
                '\n' => {
                    self.col = 1;
                    self.line += 1;
                }
                _ => break,
            }
            self.iter.next();
        }
        Ok(())
    }

    fn read_symbol(&mut self, start: usize, col: u32, width: usize) -> Result<Token> {
        for _ in 0..width {
            self.iter.next();
        }
        self.col += width as u32;
        Ok(Token(TokenKind::Symbol, self.span(col, start, start + width)))
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_ws()?;

        let (start, chr) = self.peek();
        let col = self.col;

        match chr {
            // grouping characters and separators
            '(' | ')' | '[' | ']' | ',' | ':' => self.read_symbol(start, col, 1),
            // arithmetic operators and their compound forms
            '+' | '-' | '*' | '/' | '<' | '>' | '=' | '!' => {
                let width = if self.peekahead(1).1 == '=' { 2 } else { 1 };
                self.read_symbol(start, col, width)
            }
            '\'' | '"' => self.read_string(chr),
            '\x00' if start >= self.source.contents().len() => {
                Ok(Token(TokenKind::Eof, self.span(col, start, start)))
            }
            _ if chr.is_ascii_digit() => self.read_number(),
            _ if chr.is_ascii_alphabetic() || chr == '_' => self.read_ident(),
            _ => Err(self.source.error(self.line, self.col, "invalid character")),
        }
    }
}
