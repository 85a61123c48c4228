//! Host-visible source locations

use ppbridge_core::{Location, Position, Result};
use ppbridge_engine::SourceContext;
use std::fmt;

/// File, line and column of a position, resolved at conversion time
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostLocation(Location);

impl HostLocation {
    pub fn file(&self) -> &str {
        &self.0.file
    }

    pub fn line(&self) -> u32 {
        self.0.line
    }

    pub fn column(&self) -> u32 {
        self.0.column
    }

    pub fn as_location(&self) -> &Location {
        &self.0
    }
}

impl From<Location> for HostLocation {
    fn from(location: Location) -> Self {
        Self(location)
    }
}

impl fmt::Display for HostLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Resolve an engine position to a host location.
///
/// Fails with `Error::Resolution` if the position is outside every buffer
/// or its buffer has been closed.
pub fn to_host_location(position: Position, source: &SourceContext) -> Result<HostLocation> {
    source.resolve(position).map(HostLocation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppbridge_core::Error;

    #[test]
    fn test_resolves_line_and_column() {
        let source = SourceContext::default();
        let tokens = source.tokenize("loc.c", "a\n  bc").unwrap();

        let loc = to_host_location(tokens[1].position, &source).unwrap();
        assert_eq!((loc.file(), loc.line(), loc.column()), ("loc.c", 2, 3));
        assert_eq!(loc.to_string(), "loc.c:2:3");
    }

    #[test]
    fn test_unresolvable_positions() {
        let source = SourceContext::default();
        let err = to_host_location(Position::new(1000), &source).unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));

        let tokens = source.tokenize("gone.c", "x").unwrap();
        source.close_buffer_at(tokens[0].position);
        let err = to_host_location(tokens[0].position, &source).unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));
    }
}
