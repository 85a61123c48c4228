//! Engine-native token types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque source position: a global offset into the session's source map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position(u32);

impl Position {
    pub const fn new(offset: u32) -> Self {
        Self(offset)
    }

    pub fn offset(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Lexical category of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Identifier,
    /// A preprocessing number (`42`, `0x1f`, `1.5e+3f`)
    Number,
    StringLiteral,
    CharLiteral,
    Punctuator,
    /// Only produced when comments are kept
    Comment,
    /// Empty token standing in for an empty macro argument
    Placemarker,
    /// A character no other category accepts
    Other,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::StringLiteral => "string_literal",
            TokenKind::CharLiteral => "char_literal",
            TokenKind::Punctuator => "punctuator",
            TokenKind::Comment => "comment",
            TokenKind::Placemarker => "placemarker",
            TokenKind::Other => "other",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable preprocessing token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub spelling: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, spelling: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            spelling: spelling.into(),
            position,
        }
    }

    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    /// Whether this is the punctuator `p`
    pub fn is_punct(&self, p: &str) -> bool {
        self.kind == TokenKind::Punctuator && self.spelling == p
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spelling)
    }
}

/// Render tokens as text, separated by single spaces.
pub fn spell(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Placemarker)
        .map(|t| t.spelling.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
