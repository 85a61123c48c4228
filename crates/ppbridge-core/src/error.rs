//! Error types for ppbridge

use thiserror::Error;

use crate::token::Position;

/// ppbridge error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: String },

    #[error("Cannot resolve source position {position}: {reason}")]
    Resolution { position: Position, reason: String },

    #[error("Macro callback '{name}' failed: {message}")]
    CallbackFailed { name: String, message: String },

    #[error("Invalid macro result: {0}")]
    InvalidMacroResult(String),

    #[error("Token '{spelling}' belongs to session {origin}, not session {session}")]
    CrossSessionToken {
        spelling: String,
        origin: u64,
        session: u64,
    },

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("{location}: lex error: {message}")]
    Lex { location: String, message: String },

    #[error("{location}: unterminated invocation of macro '{name}'")]
    UnterminatedInvocation { name: String, location: String },

    #[error("Macro '{name}' expects {expected} argument(s), found {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Expansion of '{name}' exceeded depth limit {limit}")]
    ExpansionDepth { name: String, limit: usize },

    #[error("{location}: error expanding '{name}': {source}")]
    Expansion {
        name: String,
        location: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// The innermost error, looking through `Expansion` wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Expansion { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type alias for ppbridge
pub type Result<T> = std::result::Result<T, Error>;
