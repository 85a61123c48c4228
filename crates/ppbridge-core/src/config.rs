//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Buffer name used for the main input
    pub input_name: String,

    /// Lexical settings applied to every tokenize call in the session
    pub lex: LexOptions,

    /// Include search paths
    pub include_paths: Vec<IncludePathConfig>,

    /// Plain macro definitions (`NAME`, `NAME=body`, `NAME(a,b)=body`)
    pub defines: Vec<String>,

    /// Plain macro definitions that can not be undefined
    pub predefined: Vec<String>,

    /// Host callables to bind as function macros
    pub callbacks: Vec<CallbackConfig>,

    /// Maximum nesting of macro expansions
    pub max_expansion_depth: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            input_name: "<input>".to_string(),
            lex: LexOptions::default(),
            include_paths: Vec::new(),
            defines: Vec::new(),
            predefined: Vec::new(),
            callbacks: Vec::new(),
            max_expansion_depth: 256,
        }
    }
}

impl SessionConfig {
    /// Load a configuration file, choosing the format by extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            other => Err(Error::Config(format!(
                "unsupported config format {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }
}

/// Lexer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexOptions {
    /// Accept `$` inside identifiers (GNU extension)
    pub dollar_in_identifiers: bool,

    /// Emit comments as tokens instead of skipping them
    pub keep_comments: bool,
}

impl Default for LexOptions {
    fn default() -> Self {
        Self {
            dollar_in_identifiers: true,
            keep_comments: false,
        }
    }
}

/// An include search path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncludePathConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub system: bool,
}

/// A function macro bound to a named host callable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackConfig {
    /// Macro name
    pub name: String,
    /// Name of the callable in the embedder's catalog
    pub callable: String,
}
