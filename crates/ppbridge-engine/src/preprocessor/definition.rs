//! Macro Definition Text
//!
//! Parses the command-line style definition forms accepted by
//! `define`: `NAME`, `NAME=body`, `NAME(a,b)=body` and `NAME(fmt,...)=body`.

use regex::Regex;
use std::sync::OnceLock;

fn definition_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)^\s*([A-Za-z_$][A-Za-z0-9_$]*)(\(([^)]*)\))?(?:=(.*))?$")
            .expect("definition pattern is valid")
    })
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern is valid")
    })
}

/// Whether `name` can be used as a macro or parameter name
pub fn is_identifier(name: &str) -> bool {
    identifier_pattern().is_match(name)
}

/// A parsed plain macro definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDefinition {
    pub name: String,
    /// `None` for object-like macros
    pub params: Option<Vec<String>>,
    /// Whether the parameter list ends in `...`
    pub variadic: bool,
    pub body: String,
}

impl MacroDefinition {
    /// Create a macro that is simply defined (as `1`)
    pub fn defined(name: &str) -> Self {
        Self::with_value(name, "1")
    }

    /// Create an object-like macro with a specific value
    pub fn with_value(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            params: None,
            variadic: false,
            body: value.to_string(),
        }
    }

    /// Create a function-like macro
    pub fn function(name: &str, params: &[&str], body: &str) -> Self {
        Self {
            name: name.to_string(),
            params: Some(params.iter().map(|p| p.to_string()).collect()),
            variadic: false,
            body: body.to_string(),
        }
    }

    /// Parse definition text. Returns `None` if the text is malformed.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = definition_pattern().captures(text)?;
        let name = caps.get(1)?.as_str().to_string();
        let body = match caps.get(4) {
            Some(body) => body.as_str().to_string(),
            None => "1".to_string(),
        };

        let (params, variadic) = match caps.get(3) {
            Some(list) => {
                let (params, variadic) = parse_params(list.as_str())?;
                (Some(params), variadic)
            }
            None => (None, false),
        };

        Some(Self {
            name,
            params,
            variadic,
            body,
        })
    }

    pub fn is_function_like(&self) -> bool {
        self.params.is_some()
    }

    /// Convert back to definition text
    pub fn to_define_text(&self) -> String {
        match &self.params {
            Some(params) => {
                let mut list = params.clone();
                if self.variadic {
                    list.push("...".to_string());
                }
                format!("{}({})={}", self.name, list.join(","), self.body)
            }
            None => format!("{}={}", self.name, self.body),
        }
    }
}

fn parse_params(list: &str) -> Option<(Vec<String>, bool)> {
    let list = list.trim();
    if list.is_empty() {
        return Some((Vec::new(), false));
    }

    let mut params: Vec<String> = Vec::new();
    let mut variadic = false;
    for param in list.split(',').map(str::trim) {
        if variadic {
            // `...` must be last
            return None;
        }
        if param == "..." {
            variadic = true;
        } else if is_identifier(param)
            && param != "__VA_ARGS__"
            && !params.iter().any(|p| p == param)
        {
            params.push(param.to_string());
        } else {
            return None;
        }
    }
    Some((params, variadic))
}
