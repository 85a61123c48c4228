//! Macro Preprocessor
//!
//! The engine service: macro registration, include paths and the lazy
//! expansion run. Directives and conditional compilation are not handled;
//! the input is a token stream to be macro-expanded.

pub mod definition;
pub mod expander;
pub mod includes;
pub mod table;

pub use definition::{is_identifier, MacroDefinition};
pub use expander::Expansion;
pub use includes::IncludePaths;
pub use table::{FunctionMacro, MacroEntry, MacroTable, PlainMacro};

use ppbridge_core::Token;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, warn};

use crate::context::SourceContext;

/// Default limit on nested macro expansions
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Macro table and include paths of one preprocessing session
#[derive(Debug)]
pub struct Preprocessor {
    macros: MacroTable,
    includes: IncludePaths,
    max_depth: usize,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            macros: MacroTable::new(),
            includes: IncludePaths::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Add an include path. Returns false if it can not be registered.
    pub fn add_include_path(&mut self, path: &Path, system: bool) -> bool {
        self.includes.add(path, system)
    }

    /// Define a plain macro from definition text
    pub fn define(&mut self, source: &SourceContext, text: &str, predefined: bool) -> bool {
        match MacroDefinition::parse(text) {
            Some(definition) => self.define_macro(source, definition, predefined),
            None => {
                warn!("Malformed macro definition: {:?}", text);
                false
            }
        }
    }

    /// Define a plain macro, tokenizing its body in `source`
    pub fn define_macro(
        &mut self,
        source: &SourceContext,
        definition: MacroDefinition,
        predefined: bool,
    ) -> bool {
        if self.macros.contains(&definition.name) {
            debug!("Macro '{}' is already defined", definition.name);
            return false;
        }
        let buffer = format!("<define:{}>", definition.name);
        let body = match source.tokenize(&buffer, &definition.body) {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to tokenize body of '{}': {}", definition.name, e);
                return false;
            }
        };

        let defined = self.macros.define_plain(PlainMacro {
            name: definition.name.clone(),
            params: definition.params,
            variadic: definition.variadic,
            body,
            predefined,
        });
        if defined {
            debug!("Defined macro '{}' (predefined: {})", definition.name, predefined);
        } else {
            debug!("Macro '{}' is already defined", definition.name);
        }
        defined
    }

    /// Bind a function macro to an external callable
    pub fn define_function(&mut self, name: &str, callback: Rc<dyn FunctionMacro>) -> bool {
        if !is_identifier(name) {
            warn!("Invalid function macro name: {:?}", name);
            return false;
        }
        let defined = self.macros.define_callback(name, callback);
        if defined {
            debug!("Bound function macro '{}'", name);
        } else {
            debug!("Function macro '{}' conflicts with a permanent definition", name);
        }
        defined
    }

    pub fn undefine(&mut self, name: &str) -> bool {
        self.macros.undefine(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.macros.contains(name)
    }

    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    pub fn includes(&self) -> &IncludePaths {
        &self.includes
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Expand `input` lazily
    pub fn run<'a>(&'a self, source: &'a SourceContext, input: Vec<Token>) -> Expansion<'a> {
        Expansion::new(&self.macros, source, self.max_depth, input)
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
