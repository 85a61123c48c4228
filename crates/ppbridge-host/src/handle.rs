//! Session handles
//!
//! A `SessionHandle` is the host's view of a session. Every live handle
//! holds one external reference on the session core: it is taken when the
//! handle is created or cloned and given back when the handle drops, on
//! every path, including unwinding out of a failed callback.

use ppbridge_core::{Position, Result};
use ppbridge_engine::SourceContext;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use tracing::{trace, warn};

use crate::host::HostValue;
use crate::location::{to_host_location, HostLocation};
use crate::session::{SessionCore, SessionId};
use crate::token_value::to_host_value;

/// External reference count of a session
#[derive(Debug, Default)]
pub(crate) struct ExternalRefs(Cell<usize>);

impl ExternalRefs {
    fn acquire(&self) -> usize {
        let count = self.0.get() + 1;
        self.0.set(count);
        count
    }

    /// Give back one reference. `None` means the count was already zero,
    /// i.e. something released twice; the count stays at zero.
    fn release(&self) -> Option<usize> {
        let count = self.0.get().checked_sub(1)?;
        self.0.set(count);
        Some(count)
    }

    pub(crate) fn get(&self) -> usize {
        self.0.get()
    }
}

/// Counted reference to a session, safe to hand to host code
pub struct SessionHandle {
    core: Rc<SessionCore>,
}

impl SessionHandle {
    pub(crate) fn acquire(core: &Rc<SessionCore>) -> Self {
        let count = core.refs.acquire();
        trace!("Session {} external refs: {}", core.id, count);
        Self { core: core.clone() }
    }

    pub fn id(&self) -> SessionId {
        self.core.id
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Whether both handles refer to the same session
    pub fn same_session(&self, other: &SessionHandle) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }

    /// Current number of outstanding external references
    pub fn external_refs(&self) -> usize {
        self.core.refs.get()
    }

    /// Tokenize `text` as a new buffer of this session
    pub fn tokenize(&self, text: &str) -> Result<Vec<HostValue>> {
        self.tokenize_named("<host>", text)
    }

    pub fn tokenize_named(&self, name: &str, text: &str) -> Result<Vec<HostValue>> {
        let tokens = self.core.source.tokenize(name, text)?;
        Ok(tokens.iter().map(|t| to_host_value(t, self)).collect())
    }

    pub fn resolve(&self, position: Position) -> Result<HostLocation> {
        to_host_location(position, &self.core.source)
    }

    pub(crate) fn source(&self) -> &SourceContext {
        &self.core.source
    }
}

impl Clone for SessionHandle {
    fn clone(&self) -> Self {
        Self::acquire(&self.core)
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        match self.core.refs.release() {
            Some(count) => trace!("Session {} external refs: {}", self.core.id, count),
            None => warn!("Session {} released more handles than it gave out", self.core.id),
        }
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.core.id)
            .field("name", &self.core.name)
            .finish()
    }
}
