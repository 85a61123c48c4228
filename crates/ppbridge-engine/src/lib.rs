//! ppbridge Engine
//!
//! The preprocessing engine the host bridge drives.
//!
//! ## Modules
//!
//! - `lexer` - C preprocessing tokenizer
//! - `source_map` - Buffer registry resolving positions to locations
//! - `context` - Lexer plus source map, shared with callbacks
//! - `preprocessor` - Macro table, include paths and lazy expansion

pub mod context;
pub mod lexer;
pub mod preprocessor;
pub mod source_map;

pub use context::SourceContext;
pub use lexer::{LexError, Lexer};
pub use preprocessor::{
    Expansion, FunctionMacro, IncludePaths, MacroDefinition, MacroEntry, MacroTable, PlainMacro,
    Preprocessor,
};
pub use source_map::{BufferId, SourceMap};
