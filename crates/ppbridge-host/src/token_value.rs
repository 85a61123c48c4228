//! Token conversion between the engine and the host

use ppbridge_core::{Error, Position, Result, Token, TokenKind};
use std::rc::Rc;

use crate::handle::SessionHandle;
use crate::host::HostValue;
use crate::location::{to_host_location, HostLocation};
use crate::session::SessionId;

/// An engine token copied out to the host, tagged with its session
#[derive(Debug, Clone)]
pub struct HostToken {
    token: Token,
    session: SessionHandle,
}

impl HostToken {
    pub fn kind(&self) -> TokenKind {
        self.token.kind
    }

    pub fn spelling(&self) -> &str {
        &self.token.spelling
    }

    pub fn position(&self) -> Position {
        self.token.position
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn session_id(&self) -> SessionId {
        self.session.id()
    }

    /// Where the token was spelled, if its buffer is still open
    pub fn location(&self) -> Result<HostLocation> {
        to_host_location(self.token.position, self.session.source())
    }
}

/// Wrap an engine token for the host
pub fn to_host_value(token: &Token, session: &SessionHandle) -> HostValue {
    HostValue::Token(Rc::new(HostToken {
        token: token.clone(),
        session: session.clone(),
    }))
}

/// Extract the engine token from a host value
pub fn from_host_value(value: &HostValue) -> Result<Token> {
    match value {
        HostValue::Token(host) => Ok(host.token.clone()),
        other => Err(Error::TypeMismatch {
            expected: "token",
            found: other.type_name().to_string(),
        }),
    }
}

/// Like `from_host_value`, but the token must belong to `session`
pub(crate) fn from_host_value_in(value: &HostValue, session: &SessionHandle) -> Result<Token> {
    let token = from_host_value(value)?;
    if let HostValue::Token(host) = value {
        if !host.session.same_session(session) {
            return Err(Error::CrossSessionToken {
                spelling: token.spelling,
                origin: host.session_id().as_u64(),
                session: session.id().as_u64(),
            });
        }
    }
    Ok(token)
}
