//! Macro Expansion
//!
//! A lazy, single-pass iterator over the fully macro-expanded token stream.
//! Every token carries a hide set: the names of the macros whose expansion
//! produced it. A name in a token's own hide set is never expanded again,
//! which terminates self-referential macros. Tokens produced by an
//! expansion also remember the outermost site they were expanded at.

use ppbridge_core::{Error, Position, Result, Token, TokenKind};
use std::collections::{HashSet, VecDeque};
use std::iter::{FusedIterator, Peekable};
use std::rc::Rc;
use std::vec;
use tracing::{debug, trace, warn};

use super::table::{MacroEntry, MacroTable, PlainMacro};
use crate::context::SourceContext;

type HideSet = Rc<HashSet<String>>;

#[derive(Debug, Clone)]
struct PpToken {
    token: Token,
    hide: HideSet,
    /// Position of the outermost invocation this token was expanded from
    site: Option<Position>,
    /// A `##` from a macro body; only these paste
    paste_op: bool,
}

impl PpToken {
    fn fresh(token: Token) -> Self {
        Self {
            token,
            hide: HideSet::default(),
            site: None,
            paste_op: false,
        }
    }

    /// A token copied from a macro body
    fn body(token: Token) -> Self {
        let paste_op = token.is_punct("##");
        Self {
            paste_op,
            ..Self::fresh(token)
        }
    }

    /// Where an invocation named by this token counts as expanded
    fn site(&self) -> Position {
        self.site.unwrap_or(self.token.position)
    }
}

/// Output of a preprocessing run.
///
/// Yields each output token once, in order. After the first error the
/// iterator yields that error and then ends.
pub struct Expansion<'a> {
    table: &'a MacroTable,
    source: &'a SourceContext,
    max_depth: usize,
    /// Nesting of argument pre-expansions this run is serving
    nesting: usize,
    /// Replacement tokens waiting to be rescanned, ahead of `input`
    pending: VecDeque<PpToken>,
    input: Peekable<vec::IntoIter<Token>>,
    failed: bool,
}

impl<'a> Expansion<'a> {
    pub(crate) fn new(
        table: &'a MacroTable,
        source: &'a SourceContext,
        max_depth: usize,
        input: Vec<Token>,
    ) -> Self {
        Self {
            table,
            source,
            max_depth,
            nesting: 0,
            pending: VecDeque::new(),
            input: input.into_iter().peekable(),
            failed: false,
        }
    }

    /// Nested expansion over already hide-set-tagged tokens
    fn over(&self, tokens: Vec<PpToken>) -> Self {
        Self {
            table: self.table,
            source: self.source,
            max_depth: self.max_depth,
            nesting: self.nesting + 1,
            pending: tokens.into(),
            input: Vec::new().into_iter().peekable(),
            failed: false,
        }
    }

    fn next_raw(&mut self) -> Option<PpToken> {
        self.pending
            .pop_front()
            .or_else(|| self.input.next().map(PpToken::fresh))
    }

    fn peek_is_lparen(&mut self) -> bool {
        match self.pending.front() {
            Some(pp) => pp.token.is_punct("("),
            None => self.input.peek().is_some_and(|t| t.is_punct("(")),
        }
    }

    /// Produce the next fully expanded token
    fn step(&mut self) -> Result<Option<PpToken>> {
        let table = self.table;
        loop {
            let Some(pp) = self.next_raw() else {
                return Ok(None);
            };
            if pp.token.kind == TokenKind::Placemarker {
                continue;
            }
            if !pp.token.is_identifier() || pp.hide.contains(&pp.token.spelling) {
                return Ok(Some(pp));
            }
            let Some(entry) = table.get(&pp.token.spelling) else {
                return Ok(Some(pp));
            };
            if entry.is_function_like() && !self.peek_is_lparen() {
                return Ok(Some(pp));
            }
            if pp.hide.len() >= self.max_depth {
                return Err(Error::ExpansionDepth {
                    name: pp.token.spelling.clone(),
                    limit: self.max_depth,
                });
            }

            let replacement = self.invoke(entry, &pp)?;
            trace!(
                "Expanded '{}' into {} token(s)",
                pp.token.spelling,
                replacement.len()
            );

            let mut base = (*pp.hide).clone();
            base.insert(pp.token.spelling.clone());
            let site = pp.site();
            for mut item in replacement.into_iter().rev() {
                let mut hide = (*item.hide).clone();
                hide.extend(base.iter().cloned());
                item.hide = Rc::new(hide);
                item.site = Some(site);
                item.paste_op = false;
                self.pending.push_front(item);
            }
        }
    }

    fn invoke(&mut self, entry: &MacroEntry, pp: &PpToken) -> Result<Vec<PpToken>> {
        let name = &pp.token.spelling;
        match entry {
            MacroEntry::Plain(plain) => match &plain.params {
                None => {
                    let body = plain.body.iter().cloned().map(PpToken::body).collect();
                    self.paste(body)
                }
                Some(params) => {
                    self.next_raw();
                    let args = self.collect_arguments(pp)?;
                    let args = self.bind_arguments(plain, params.len(), args, pp)?;
                    self.substitute(plain, args, pp)
                }
            },
            MacroEntry::Callback(callback) => {
                self.next_raw();
                let mut args = self.collect_arguments(pp)?;
                if args.len() == 1 && args[0].is_empty() {
                    args.clear();
                }
                let args: Vec<Vec<Token>> = args
                    .into_iter()
                    .map(|arg| arg.into_iter().map(|pp| pp.token).collect())
                    .collect();

                debug!("Invoking callback macro '{}' with {} argument(s)", name, args.len());
                let tokens = callback
                    .expand(name, pp.site(), args)
                    .map_err(|source| self.failure(pp, source))?;
                Ok(tokens.into_iter().map(PpToken::fresh).collect())
            }
        }
    }

    fn failure(&self, pp: &PpToken, source: Error) -> Error {
        Error::Expansion {
            name: pp.token.spelling.clone(),
            location: self.source.describe(pp.site()),
            source: Box::new(source),
        }
    }

    /// Collect arguments up to the matching `)`; the `(` is already consumed
    fn collect_arguments(&mut self, pp: &PpToken) -> Result<Vec<Vec<PpToken>>> {
        let mut args: Vec<Vec<PpToken>> = vec![Vec::new()];
        let mut depth = 0usize;

        loop {
            let Some(next) = self.next_raw() else {
                return Err(Error::UnterminatedInvocation {
                    name: pp.token.spelling.clone(),
                    location: self.source.describe(pp.site()),
                });
            };

            if next.token.is_punct("(") {
                depth += 1;
            } else if next.token.is_punct(")") {
                if depth == 0 {
                    return Ok(args);
                }
                depth -= 1;
            } else if next.token.is_punct(",") && depth == 0 {
                args.push(Vec::new());
                continue;
            }

            if let Some(current) = args.last_mut() {
                current.push(next);
            }
        }
    }

    /// Match arguments to parameters, folding variadic extras into one argument
    fn bind_arguments(
        &self,
        plain: &PlainMacro,
        named: usize,
        mut args: Vec<Vec<PpToken>>,
        pp: &PpToken,
    ) -> Result<Vec<Vec<PpToken>>> {
        if named == 0 && args.len() == 1 && args[0].is_empty() {
            args.clear();
        }

        let count_error = |found: usize| {
            self.failure(
                pp,
                Error::ArgumentCount {
                    name: plain.name.clone(),
                    expected: named,
                    found,
                },
            )
        };

        if !plain.variadic {
            if args.len() != named {
                return Err(count_error(args.len()));
            }
            return Ok(args);
        }

        if args.len() < named {
            return Err(count_error(args.len()));
        }
        let extra = args.split_off(named);
        let mut va_args = Vec::new();
        for (i, arg) in extra.into_iter().enumerate() {
            if i > 0 {
                va_args.push(PpToken::fresh(Token::new(
                    TokenKind::Punctuator,
                    ",",
                    pp.token.position,
                )));
            }
            va_args.extend(arg);
        }
        args.push(va_args);
        Ok(args)
    }

    /// Replace parameters in the body of a function-like macro
    fn substitute(
        &self,
        plain: &PlainMacro,
        args: Vec<Vec<PpToken>>,
        pp: &PpToken,
    ) -> Result<Vec<PpToken>> {
        let params = plain.params.as_deref().unwrap_or_default();
        let param_index = |token: &Token| {
            if !token.is_identifier() {
                return None;
            }
            if plain.variadic && token.spelling == "__VA_ARGS__" {
                return Some(params.len());
            }
            params.iter().position(|p| *p == token.spelling)
        };

        let body = &plain.body;
        let mut out = Vec::with_capacity(body.len());
        let mut i = 0;
        while i < body.len() {
            let token = &body[i];

            if token.is_punct("#") {
                if let Some(index) = body.get(i + 1).and_then(param_index) {
                    out.push(PpToken::fresh(stringify(&args[index], token)));
                    i += 2;
                    continue;
                }
            }

            if let Some(index) = param_index(token) {
                let pasted = (i > 0 && body[i - 1].is_punct("##"))
                    || body.get(i + 1).is_some_and(|t| t.is_punct("##"));
                if !pasted {
                    out.extend(self.expand_argument(&args[index], pp)?);
                } else if args[index].is_empty() {
                    out.push(PpToken::fresh(Token::new(
                        TokenKind::Placemarker,
                        "",
                        token.position,
                    )));
                } else {
                    out.extend(args[index].iter().cloned());
                }
                i += 1;
                continue;
            }

            out.push(PpToken::body(token.clone()));
            i += 1;
        }

        self.paste(out)
    }

    /// Fully expand one argument in isolation.
    ///
    /// Each nested pre-expansion recurses, so its nesting is bounded by the
    /// same limit as the hide sets.
    fn expand_argument(&self, arg: &[PpToken], pp: &PpToken) -> Result<Vec<PpToken>> {
        if self.nesting >= self.max_depth {
            return Err(Error::ExpansionDepth {
                name: pp.token.spelling.clone(),
                limit: self.max_depth,
            });
        }
        let mut nested = self.over(arg.to_vec());
        let mut out = Vec::with_capacity(arg.len());
        while let Some(pp) = nested.step()? {
            out.push(pp);
        }
        Ok(out)
    }

    /// Apply the `##` operators of a macro body and drop placemarkers
    fn paste(&self, tokens: Vec<PpToken>) -> Result<Vec<PpToken>> {
        let mut out: Vec<PpToken> = Vec::with_capacity(tokens.len());
        let mut iter = tokens.into_iter().peekable();

        while let Some(pp) = iter.next() {
            if pp.paste_op && !out.is_empty() && iter.peek().is_some() {
                if let (Some(left), Some(right)) = (out.pop(), iter.next()) {
                    out.push(self.paste_pair(left, right)?);
                }
                continue;
            }
            out.push(pp);
        }

        out.retain(|pp| pp.token.kind != TokenKind::Placemarker);
        Ok(out)
    }

    fn paste_pair(&self, left: PpToken, right: PpToken) -> Result<PpToken> {
        if right.token.kind == TokenKind::Placemarker {
            return Ok(left);
        }
        if left.token.kind == TokenKind::Placemarker {
            return Ok(right);
        }

        let text = format!("{}{}", left.token.spelling, right.token.spelling);
        let invalid = || Error::Lex {
            location: self.source.describe(left.token.position),
            message: format!(
                "pasting \"{}\" and \"{}\" does not give a valid preprocessing token",
                left.token.spelling, right.token.spelling
            ),
        };

        let lexed = self
            .source
            .lexer()
            .tokenize(&text, left.token.position)
            .map_err(|_| invalid())?;
        match lexed.as_slice() {
            [single] if single.spelling == text => Ok(PpToken {
                token: Token::new(single.kind, text, left.token.position),
                hide: left.hide,
                site: left.site,
                paste_op: false,
            }),
            _ => Err(invalid()),
        }
    }
}

/// Build the string literal for `#param`
fn stringify(arg: &[PpToken], hash: &Token) -> Token {
    let mut text = String::from("\"");
    let spelled = arg.iter().filter(|pp| pp.token.kind != TokenKind::Placemarker);
    for (i, pp) in spelled.enumerate() {
        if i > 0 {
            text.push(' ');
        }
        match pp.token.kind {
            TokenKind::StringLiteral | TokenKind::CharLiteral => {
                for c in pp.token.spelling.chars() {
                    if c == '"' || c == '\\' {
                        text.push('\\');
                    }
                    text.push(c);
                }
            }
            _ => text.push_str(&pp.token.spelling),
        }
    }
    text.push('"');
    Token::new(TokenKind::StringLiteral, text, hash.position)
}

impl Iterator for Expansion<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.step() {
            Ok(Some(pp)) => Some(Ok(pp.token)),
            Ok(None) => None,
            Err(e) => {
                warn!("Preprocessing failed: {}", e);
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for Expansion<'_> {}
