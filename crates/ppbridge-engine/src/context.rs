//! Tokenization context shared by a session and its callbacks
//!
//! Holds the lexer settings and the source map. Borrows of the map never
//! outlive a single call, so a callback may tokenize while an expansion of
//! the same context is in progress.

use ppbridge_core::{Error, LexOptions, Location, Position, Result, Token};
use std::cell::RefCell;
use tracing::trace;

use crate::lexer::Lexer;
use crate::source_map::SourceMap;

/// Lexer plus source map
#[derive(Debug, Default)]
pub struct SourceContext {
    lexer: Lexer,
    map: RefCell<SourceMap>,
}

impl SourceContext {
    pub fn new(options: LexOptions) -> Self {
        Self {
            lexer: Lexer::new(options),
            map: RefCell::new(SourceMap::new()),
        }
    }

    pub fn lexer(&self) -> &Lexer {
        &self.lexer
    }

    /// Register `text` as a new buffer called `name` and tokenize it
    pub fn tokenize(&self, name: &str, text: &str) -> Result<Vec<Token>> {
        let (_, base) = self.map.borrow_mut().add_buffer(name, text)?;
        trace!("Tokenizing {} bytes of '{}' at {}", text.len(), name, base);

        self.lexer.tokenize(text, base).map_err(|e| Error::Lex {
            location: self.describe(Position::new(base.offset() + e.offset as u32)),
            message: e.message,
        })
    }

    /// Resolve a position against the source map
    pub fn resolve(&self, position: Position) -> Result<Location> {
        self.map.borrow().resolve(position)
    }

    /// Human readable location, falling back to the raw position
    pub fn describe(&self, position: Position) -> String {
        self.resolve(position)
            .map(|loc| loc.to_string())
            .unwrap_or_else(|_| position.to_string())
    }

    /// Close the buffer containing `position`
    pub fn close_buffer_at(&self, position: Position) -> bool {
        let mut map = self.map.borrow_mut();
        match map.buffer_of(position) {
            Some(id) => map.close(id),
            None => false,
        }
    }

    /// Number of buffers registered so far
    pub fn buffer_count(&self) -> usize {
        self.map.borrow().len()
    }
}
