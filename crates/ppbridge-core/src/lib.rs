//! ppbridge Core
//!
//! Core types shared by the preprocessing engine and the host bridge.

pub mod config;
pub mod error;
pub mod location;
pub mod token;

pub use config::{CallbackConfig, IncludePathConfig, LexOptions, SessionConfig};
pub use error::{Error, Result};
pub use location::Location;
pub use token::{Position, Token, TokenKind};
