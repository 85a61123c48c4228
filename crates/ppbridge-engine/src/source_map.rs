//! Source map
//!
//! Every piece of text the session tokenizes is registered as a buffer that
//! owns a contiguous range of global offsets. A [`Position`] is resolved back
//! to a buffer name, line and column through this map.

use ppbridge_core::{Error, Location, Position, Result};
use std::fmt;

/// Identifier of a buffer in the source map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(usize);

impl BufferId {
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferId({})", self.0)
    }
}

#[derive(Debug)]
struct Buffer {
    name: String,
    start: u32,
    len: u32,
    line_starts: Vec<u32>,
    open: bool,
}

impl Buffer {
    /// Line and column (both 1-based) for an offset local to this buffer
    fn line_col(&self, local: u32) -> (u32, u32) {
        let line_index = match self.line_starts.binary_search(&local) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line_index).copied().unwrap_or(0);
        (line_index as u32 + 1, local - line_start + 1)
    }
}

/// Maps global offsets to buffers
#[derive(Debug, Default)]
pub struct SourceMap {
    buffers: Vec<Buffer>,
    next_offset: u32,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a buffer, returning its id and the position of its first byte.
    ///
    /// Each buffer reserves one extra offset so the end-of-buffer position
    /// still resolves.
    pub fn add_buffer(&mut self, name: &str, text: &str) -> Result<(BufferId, Position)> {
        let len = u32::try_from(text.len())
            .map_err(|_| Error::ResourceExhausted(format!("buffer '{}' is too large", name)))?;
        let start = self.next_offset;
        self.next_offset = start
            .checked_add(len)
            .and_then(|end| end.checked_add(1))
            .ok_or_else(|| Error::ResourceExhausted("source map offsets exhausted".to_string()))?;

        let id = BufferId(self.buffers.len());
        self.buffers.push(Buffer {
            name: name.to_string(),
            start,
            len,
            line_starts: compute_line_starts(text),
            open: true,
        });

        Ok((id, Position::new(start)))
    }

    /// Close a buffer. Positions inside it no longer resolve.
    pub fn close(&mut self, id: BufferId) -> bool {
        match self.buffers.get_mut(id.0) {
            Some(buffer) if buffer.open => {
                buffer.open = false;
                true
            }
            _ => false,
        }
    }

    /// Find the buffer containing a position, open or not
    pub fn buffer_of(&self, position: Position) -> Option<BufferId> {
        let offset = position.offset();
        let index = match self.buffers.binary_search_by_key(&offset, |b| b.start) {
            Ok(i) => i,
            Err(0) => return None,
            Err(i) => i - 1,
        };
        let buffer = &self.buffers[index];
        (offset <= buffer.start + buffer.len).then_some(BufferId(index))
    }

    /// Name of a buffer
    pub fn name(&self, id: BufferId) -> Option<&str> {
        self.buffers.get(id.0).map(|b| b.name.as_str())
    }

    /// Resolve a position to a file/line/column location
    pub fn resolve(&self, position: Position) -> Result<Location> {
        let id = self.buffer_of(position).ok_or_else(|| Error::Resolution {
            position,
            reason: "position is outside every buffer".to_string(),
        })?;
        let buffer = &self.buffers[id.0];
        if !buffer.open {
            return Err(Error::Resolution {
                position,
                reason: format!("buffer '{}' has been closed", buffer.name),
            });
        }

        let (line, column) = buffer.line_col(position.offset() - buffer.start);
        Ok(Location::new(buffer.name.clone(), line, column))
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

fn compute_line_starts(source: &str) -> Vec<u32> {
    let mut line_starts = vec![0];
    for (i, byte) in source.bytes().enumerate() {
        if byte == b'\n' {
            line_starts.push(i as u32 + 1);
        }
    }
    line_starts
}
