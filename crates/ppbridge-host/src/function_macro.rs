//! Host callables as function macros
//!
//! `CallbackMacro` is what the engine sees when a host callable is bound to
//! a macro name. On each invocation it converts the raw argument tokens to
//! host values, calls the host, and converts the result back into engine
//! tokens. Every host value created along the way holds a session handle,
//! so the session's external reference count returns to where it started
//! once the invocation is over, whether or not the callable succeeded.

use ppbridge_core::{Error, Position, Result, Token};
use ppbridge_engine::FunctionMacro;
use std::rc::Rc;
use tracing::{debug, trace};

use crate::handle::SessionHandle;
use crate::host::{HostCallable, HostValue};
use crate::location::{to_host_location, HostLocation};
use crate::token_value::{from_host_value_in, to_host_value};

/// What a callable can see about the invocation it is serving
#[derive(Debug, Clone)]
pub struct InvocationContext {
    name: String,
    location: HostLocation,
    session: SessionHandle,
}

impl InvocationContext {
    /// Name the macro was invoked under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Location of the macro name at the expansion site
    pub fn location(&self) -> &HostLocation {
        &self.location
    }

    /// The session the expansion runs in
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn location_value(&self) -> HostValue {
        HostValue::Location(Rc::new(self.location.clone()))
    }

    pub fn session_value(&self) -> HostValue {
        HostValue::Session(self.session.clone())
    }
}

/// Accepted shapes of a callable's return value
#[derive(Debug, Clone)]
pub enum MacroResult {
    /// The invocation expands to nothing
    Empty,
    /// Source text, tokenized in the current session
    Text(String),
    /// Host tokens, all from the current session
    Tokens(Rc<[HostValue]>),
}

impl TryFrom<HostValue> for MacroResult {
    type Error = Error;

    fn try_from(value: HostValue) -> Result<Self> {
        match value {
            HostValue::None => Ok(MacroResult::Empty),
            HostValue::Str(text) => Ok(MacroResult::Text(text.to_string())),
            HostValue::Seq(items) => Ok(MacroResult::Tokens(items)),
            other => Err(Error::InvalidMacroResult(format!(
                "expected none, str or a token sequence, got {}",
                other.type_name()
            ))),
        }
    }
}

/// A host callable bound to a macro name in one session
pub struct CallbackMacro {
    callable: Rc<dyn HostCallable>,
    session: SessionHandle,
}

impl CallbackMacro {
    pub fn new(callable: Rc<dyn HostCallable>, session: SessionHandle) -> Self {
        Self { callable, session }
    }

    /// Convert the raw argument token lists to host values
    fn host_arguments(&self, arguments: &[Vec<Token>]) -> Result<Vec<HostValue>> {
        let exhausted = |what: &str| Error::ResourceExhausted(format!("allocating {}", what));

        let mut values = Vec::new();
        values
            .try_reserve_exact(arguments.len())
            .map_err(|_| exhausted("macro arguments"))?;

        for argument in arguments {
            let mut tokens = Vec::new();
            tokens
                .try_reserve_exact(argument.len())
                .map_err(|_| exhausted("argument tokens"))?;
            tokens.extend(argument.iter().map(|t| to_host_value(t, &self.session)));
            values.push(HostValue::Seq(Rc::from(tokens)));
        }
        Ok(values)
    }

    /// Turn a callable's result into replacement tokens
    fn replacement(&self, name: &str, result: MacroResult) -> Result<Vec<Token>> {
        match result {
            MacroResult::Empty => Ok(Vec::new()),
            MacroResult::Text(text) => {
                trace!("Tokenizing text result of '{}': {:?}", name, text);
                self.session
                    .source()
                    .tokenize(&format!("<callback:{}>", name), &text)
            }
            MacroResult::Tokens(items) => items
                .iter()
                .map(|item| match item {
                    HostValue::Token(_) => from_host_value_in(item, &self.session),
                    other => Err(Error::InvalidMacroResult(format!(
                        "sequence element of type {} is not a token",
                        other.type_name()
                    ))),
                })
                .collect(),
        }
    }
}

impl FunctionMacro for CallbackMacro {
    fn expand(&self, name: &str, expansion: Position, arguments: Vec<Vec<Token>>) -> Result<Vec<Token>> {
        let cx = InvocationContext {
            name: name.to_string(),
            location: to_host_location(expansion, self.session.source())?,
            session: self.session.clone(),
        };
        let args = self.host_arguments(&arguments)?;

        let result = self
            .callable
            .call(&cx, &args)
            .map_err(|e| Error::CallbackFailed {
                name: name.to_string(),
                message: e.message().to_string(),
            })?;
        debug!("Callback '{}' returned {}", name, result.type_name());

        self.replacement(name, MacroResult::try_from(result)?)
    }
}
