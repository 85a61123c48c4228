//! Built-in host callables
//!
//! The catalog `--callback NAME=BUILTIN` and config files bind from.

use ppbridge_host::{host_fn, HostCallable, HostError, HostValue, InvocationContext};
use std::rc::Rc;

/// Names accepted by `lookup`, with a short description
pub const BUILTINS: &[(&str, &str)] = &[
    ("stringify", "string literal of the arguments"),
    ("concat", "paste all argument tokens into one"),
    ("count", "number of arguments"),
    ("discard", "expand to nothing"),
    ("reverse", "argument tokens in reverse order"),
    ("location", "string literal of the expansion site"),
];

/// Find a built-in callable by name
pub fn lookup(name: &str) -> Option<Rc<dyn HostCallable>> {
    let callable = match name {
        "stringify" => host_fn(stringify),
        "concat" => host_fn(concat),
        "count" => host_fn(count),
        "discard" => host_fn(|_, _| Ok(HostValue::None)),
        "reverse" => host_fn(reverse),
        "location" => host_fn(location),
        _ => return None,
    };
    Some(callable)
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn spell_argument(arg: &HostValue) -> String {
    arg.tokens()
        .iter()
        .map(|t| t.spelling())
        .collect::<Vec<_>>()
        .join(" ")
}

fn stringify(_: &InvocationContext, args: &[HostValue]) -> Result<HostValue, HostError> {
    let text = args.iter().map(spell_argument).collect::<Vec<_>>().join(", ");
    Ok(quote(&text).into())
}

fn concat(cx: &InvocationContext, args: &[HostValue]) -> Result<HostValue, HostError> {
    let text: String = args
        .iter()
        .flat_map(|arg| arg.tokens())
        .map(|t| t.spelling().to_string())
        .collect();
    if text.is_empty() {
        return Err(HostError::new(format!("{}: nothing to concatenate", cx.name())));
    }
    Ok(text.into())
}

fn count(_: &InvocationContext, args: &[HostValue]) -> Result<HostValue, HostError> {
    Ok(args.len().to_string().into())
}

fn reverse(_: &InvocationContext, args: &[HostValue]) -> Result<HostValue, HostError> {
    let mut tokens: Vec<HostValue> = args
        .iter()
        .flat_map(|arg| arg.as_seq().unwrap_or_default().iter().cloned())
        .collect();
    tokens.reverse();
    Ok(tokens.into())
}

fn location(cx: &InvocationContext, _: &[HostValue]) -> Result<HostValue, HostError> {
    Ok(quote(&cx.location().to_string()).into())
}
