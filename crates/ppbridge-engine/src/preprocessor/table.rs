//! Macro Registration Table

use ppbridge_core::{Position, Result, Token};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A function macro whose expansion is computed by an external callable.
///
/// The engine calls [`FunctionMacro::expand`] once per invocation with the
/// raw tokens of every argument and substitutes the returned tokens, which
/// are then rescanned.
pub trait FunctionMacro {
    fn expand(
        &self,
        name: &str,
        expansion: Position,
        arguments: Vec<Vec<Token>>,
    ) -> Result<Vec<Token>>;
}

/// A plain substitution macro
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainMacro {
    pub name: String,
    /// `None` for object-like macros
    pub params: Option<Vec<String>>,
    pub variadic: bool,
    pub body: Vec<Token>,
    /// Predefined macros can not be undefined or redefined
    pub predefined: bool,
}

/// An entry of the macro table
#[derive(Clone)]
pub enum MacroEntry {
    Plain(Rc<PlainMacro>),
    Callback(Rc<dyn FunctionMacro>),
}

impl MacroEntry {
    /// Whether the entry may be undefined or replaced
    pub fn is_undefinable(&self) -> bool {
        matches!(self, MacroEntry::Plain(m) if !m.predefined)
    }

    pub fn is_function_like(&self) -> bool {
        match self {
            MacroEntry::Plain(m) => m.params.is_some(),
            MacroEntry::Callback(_) => true,
        }
    }
}

impl fmt::Debug for MacroEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroEntry::Plain(m) => f.debug_tuple("Plain").field(m).finish(),
            MacroEntry::Callback(_) => f.write_str("Callback"),
        }
    }
}

/// Name to macro mapping
#[derive(Debug, Default)]
pub struct MacroTable {
    entries: HashMap<String, MacroEntry>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a plain macro. Names are write-once: returns false if the
    /// name is already defined.
    pub fn define_plain(&mut self, plain: PlainMacro) -> bool {
        if self.entries.contains_key(&plain.name) {
            return false;
        }
        self.entries
            .insert(plain.name.clone(), MacroEntry::Plain(Rc::new(plain)));
        true
    }

    /// Bind a callback, replacing an ordinary plain macro of the same name.
    ///
    /// Returns false if the name is held by a non-undefinable entry.
    /// Callback bindings can not be undefined afterwards.
    pub fn define_callback(&mut self, name: &str, callback: Rc<dyn FunctionMacro>) -> bool {
        if self.entries.get(name).is_some_and(|e| !e.is_undefinable()) {
            return false;
        }
        self.entries
            .insert(name.to_string(), MacroEntry::Callback(callback));
        true
    }

    /// Remove a non-predefined plain macro
    pub fn undefine(&mut self, name: &str) -> bool {
        match self.entries.get(name) {
            Some(entry) if entry.is_undefinable() => {
                self.entries.remove(name);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&MacroEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Defined names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
