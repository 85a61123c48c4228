//! Host value model
//!
//! The values a host callable receives and returns. Shared values are
//! reference counted; a value that wraps a session handle keeps the
//! session's external reference count raised for as long as it lives.

use std::fmt;
use std::rc::Rc;
use thiserror::Error;

use crate::function_macro::InvocationContext;
use crate::handle::SessionHandle;
use crate::location::HostLocation;
use crate::token_value::HostToken;

/// A value visible to the host
#[derive(Debug, Clone)]
pub enum HostValue {
    None,
    Bool(bool),
    Int(i64),
    Str(Rc<str>),
    Seq(Rc<[HostValue]>),
    Token(Rc<HostToken>),
    Location(Rc<HostLocation>),
    Session(SessionHandle),
}

impl HostValue {
    /// Name of the value's type, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::None => "none",
            HostValue::Bool(_) => "bool",
            HostValue::Int(_) => "int",
            HostValue::Str(_) => "str",
            HostValue::Seq(_) => "sequence",
            HostValue::Token(_) => "token",
            HostValue::Location(_) => "location",
            HostValue::Session(_) => "session",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, HostValue::None)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[HostValue]> {
        match self {
            HostValue::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_token(&self) -> Option<&HostToken> {
        match self {
            HostValue::Token(token) => Some(token),
            _ => None,
        }
    }

    pub fn as_location(&self) -> Option<&HostLocation> {
        match self {
            HostValue::Location(location) => Some(location),
            _ => None,
        }
    }

    pub fn as_session(&self) -> Option<&SessionHandle> {
        match self {
            HostValue::Session(handle) => Some(handle),
            _ => None,
        }
    }

    /// Host tokens of a sequence argument, skipping anything else
    pub fn tokens(&self) -> Vec<&HostToken> {
        self.as_seq()
            .map(|items| items.iter().filter_map(HostValue::as_token).collect())
            .unwrap_or_default()
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::Str(Rc::from(s))
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::Str(Rc::from(s))
    }
}

impl From<i64> for HostValue {
    fn from(n: i64) -> Self {
        HostValue::Int(n)
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(items: Vec<HostValue>) -> Self {
        HostValue::Seq(Rc::from(items))
    }
}

impl FromIterator<HostValue> for HostValue {
    fn from_iter<I: IntoIterator<Item = HostValue>>(iter: I) -> Self {
        HostValue::Seq(iter.into_iter().collect())
    }
}

/// An error raised by a host callable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HostError {
    message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ppbridge_core::Error> for HostError {
    fn from(e: ppbridge_core::Error) -> Self {
        HostError::new(e.to_string())
    }
}

/// A host function bound as a function macro.
///
/// Each positional argument is a sequence of host tokens, one per macro
/// argument. The expansion site and owning session come in through `cx`.
pub trait HostCallable {
    fn call(&self, cx: &InvocationContext, args: &[HostValue]) -> Result<HostValue, HostError>;
}

impl<F> HostCallable for F
where
    F: Fn(&InvocationContext, &[HostValue]) -> Result<HostValue, HostError>,
{
    fn call(&self, cx: &InvocationContext, args: &[HostValue]) -> Result<HostValue, HostError> {
        self(cx, args)
    }
}

/// Wrap a closure as a shareable host callable
pub fn host_fn<F>(f: F) -> Rc<dyn HostCallable>
where
    F: Fn(&InvocationContext, &[HostValue]) -> Result<HostValue, HostError> + 'static,
{
    Rc::new(f)
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::None => f.write_str("None"),
            HostValue::Bool(b) => write!(f, "{}", b),
            HostValue::Int(n) => write!(f, "{}", n),
            HostValue::Str(s) => write!(f, "{:?}", s),
            HostValue::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            HostValue::Token(token) => write!(f, "Token({:?})", token.spelling()),
            HostValue::Location(location) => write!(f, "Location({})", location),
            HostValue::Session(handle) => write!(f, "Session({})", handle.id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions_and_accessors() {
        let s = HostValue::from("abc");
        assert_eq!(s.as_str(), Some("abc"));
        assert_eq!(s.type_name(), "str");
        assert!(s.as_seq().is_none());

        let seq: HostValue = vec![HostValue::from(1i64), HostValue::None].into();
        assert_eq!(seq.as_seq().map(<[HostValue]>::len), Some(2));
        assert!(seq.tokens().is_empty());
        assert_eq!(seq.to_string(), "[1, None]");

        assert!(HostValue::None.is_none());
        assert_eq!(HostValue::from(true).type_name(), "bool");
    }

    #[test]
    fn test_host_error_from_core_error() {
        let err: HostError = ppbridge_core::Error::InvalidMacroResult("x".into()).into();
        assert!(err.message().contains("Invalid macro result"));
    }
}
