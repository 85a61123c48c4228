//! Preprocessor sessions
//!
//! A `Session` owns the engine's macro table together with a shared core
//! (lexer settings, source map, external reference count). Bound callbacks
//! and host values only ever hold handles to the core, never to the
//! engine, so a session and its callbacks do not keep each other alive.

use ppbridge_core::token::spell;
use ppbridge_core::{Error, Position, Result, SessionConfig, Token};
use ppbridge_engine::preprocessor::is_identifier;
use ppbridge_engine::{Expansion, Preprocessor, SourceContext};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use crate::function_macro::CallbackMacro;
use crate::handle::{ExternalRefs, SessionHandle};
use crate::host::HostCallable;
use crate::location::{to_host_location, HostLocation};

/// Process-unique session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State shared between a session and the handles it gives out
#[derive(Debug)]
pub(crate) struct SessionCore {
    pub(crate) id: SessionId,
    pub(crate) name: String,
    pub(crate) source: SourceContext,
    pub(crate) refs: ExternalRefs,
}

/// A preprocessing session
pub struct Session {
    core: Rc<SessionCore>,
    engine: Preprocessor,
    input_name: String,
}

impl Session {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, &SessionConfig::default())
    }

    /// Create a session with the paths and plain macros of `config`.
    ///
    /// Entries that can not be registered are logged and skipped. Callbacks
    /// named in the config are bound separately with `bind_callbacks`.
    pub fn with_config(name: impl Into<String>, config: &SessionConfig) -> Self {
        let core = Rc::new(SessionCore {
            id: SessionId::next(),
            name: name.into(),
            source: SourceContext::new(config.lex.clone()),
            refs: ExternalRefs::default(),
        });
        let mut session = Self {
            core,
            engine: Preprocessor::with_max_depth(config.max_expansion_depth),
            input_name: config.input_name.clone(),
        };
        info!("Created session {} '{}'", session.id(), session.name());

        for include in &config.include_paths {
            if !session.add_include_path(&include.path, include.system) {
                warn!("Ignoring include path {}", include.path.display());
            }
        }
        for (defines, predefined) in [(&config.predefined, true), (&config.defines, false)] {
            for text in defines {
                if !session.engine.define(&session.core.source, text, predefined) {
                    warn!("Ignoring macro definition {:?}", text);
                }
            }
        }
        session
    }

    /// Bind every callback listed in `config`, looking callables up by name
    pub fn bind_callbacks<F>(&mut self, config: &SessionConfig, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<Rc<dyn HostCallable>>,
    {
        for callback in &config.callbacks {
            let callable = lookup(&callback.callable).ok_or_else(|| {
                Error::Config(format!("unknown callable '{}'", callback.callable))
            })?;
            if !self.define_function_macro(&callback.name, callable) {
                return Err(Error::Config(format!(
                    "cannot bind callback macro '{}'",
                    callback.name
                )));
            }
        }
        Ok(())
    }

    pub fn id(&self) -> SessionId {
        self.core.id
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// A new counted handle to this session
    pub fn handle(&self) -> SessionHandle {
        SessionHandle::acquire(&self.core)
    }

    /// Outstanding handles, including those held by bound callbacks and
    /// live host tokens
    pub fn external_refs(&self) -> usize {
        self.core.refs.get()
    }

    pub fn add_include_path(&mut self, path: &Path, system: bool) -> bool {
        self.engine.add_include_path(path, system)
    }

    /// Search the include paths for `header`
    pub fn find_include(&self, header: &str, system: bool, from_file: Option<&Path>) -> Option<PathBuf> {
        self.engine.includes().resolve(header, system, from_file)
    }

    /// Define a plain macro from definition text (`NAME`, `NAME=body`,
    /// `NAME(a,b)=body`)
    pub fn define_plain_macro(&mut self, text: &str, predefined: bool) -> bool {
        self.engine.define(&self.core.source, text, predefined)
    }

    /// Bind a host callable to `name` as a function macro.
    ///
    /// Returns false if the name is not an identifier or conflicts with a
    /// predefined macro or an existing function macro.
    pub fn define_function_macro(&mut self, name: &str, callable: Rc<dyn HostCallable>) -> bool {
        if !is_identifier(name) {
            warn!("Invalid function macro name: {:?}", name);
            return false;
        }
        let callback = CallbackMacro::new(callable, self.handle());
        self.engine.define_function(name, Rc::new(callback))
    }

    pub fn define_callback<C: HostCallable + 'static>(&mut self, name: &str, callable: C) -> bool {
        self.define_function_macro(name, Rc::new(callable))
    }

    pub fn undefine(&mut self, name: &str) -> bool {
        self.engine.undefine(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.engine.is_defined(name)
    }

    /// Defined macro names, sorted
    pub fn macro_names(&self) -> Vec<&str> {
        self.engine.macros().names()
    }

    /// Tokenize `text` as a new host buffer
    pub fn tokenize(&self, text: &str) -> Result<Vec<Token>> {
        self.tokenize_named("<host>", text)
    }

    pub fn tokenize_named(&self, name: &str, text: &str) -> Result<Vec<Token>> {
        self.core.source.tokenize(name, text)
    }

    /// Expand a token stream lazily
    pub fn run(&self, input: Vec<Token>) -> Expansion<'_> {
        self.engine.run(&self.core.source, input)
    }

    /// Tokenize `text` as the session input and expand it lazily
    pub fn preprocess(&self, text: &str) -> Result<Expansion<'_>> {
        let input = self.tokenize_named(&self.input_name, text)?;
        debug!("Preprocessing {} token(s) in session {}", input.len(), self.id());
        Ok(self.run(input))
    }

    /// Fully expand `text` and spell the result
    pub fn preprocess_to_string(&self, text: &str) -> Result<String> {
        let tokens = self.preprocess(text)?.collect::<Result<Vec<_>>>()?;
        Ok(spell(&tokens))
    }

    pub fn resolve(&self, position: Position) -> Result<HostLocation> {
        to_host_location(position, &self.core.source)
    }

    /// Close the buffer holding `position`; its positions stop resolving
    pub fn close_buffer_at(&self, position: Position) -> bool {
        self.core.source.close_buffer_at(position)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.core.id)
            .field("name", &self.core.name)
            .field("macros", &self.engine.macros().len())
            .finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!(
            "Dropping session {} with {} external ref(s)",
            self.core.id,
            self.core.refs.get()
        );
    }
}
