//! Preprocessing tokenizer
//!
//! Splits text into C preprocessing tokens. Whitespace and line splices are
//! dropped; comments are dropped unless [`LexOptions::keep_comments`] is set.

use ppbridge_core::{LexOptions, Position, Token, TokenKind};

/// Punctuators, longest first so the first match is the longest one
const PUNCTUATORS: &[&str] = &[
    "...", "<<=", ">>=", "->", "++", "--", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "*=",
    "/=", "%=", "+=", "-=", "&=", "^=", "|=", "##", "[", "]", "(", ")", "{", "}", ".", "&", "*",
    "+", "-", "~", "!", "/", "%", "<", ">", "^", "|", "?", ":", ";", "=", ",", "#",
];

/// A tokenizer failure at a byte offset of the lexed text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub offset: usize,
    pub message: String,
}

/// C preprocessing tokenizer
#[derive(Debug, Clone, Default)]
pub struct Lexer {
    options: LexOptions,
}

impl Lexer {
    pub fn new(options: LexOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LexOptions {
        &self.options
    }

    /// Tokenize `text`, numbering positions from `base`
    pub fn tokenize(&self, text: &str, base: Position) -> Result<Vec<Token>, LexError> {
        let bytes = text.as_bytes();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < bytes.len() {
            let start = i;
            let b = bytes[i];

            if b.is_ascii_whitespace() || b == 0x0b {
                i += 1;
                continue;
            }

            // Line splice
            if b == b'\\' && next_is_newline(bytes, i + 1) {
                i += if bytes.get(i + 1) == Some(&b'\r') { 3 } else { 2 };
                continue;
            }

            let kind = if b == b'/' && bytes.get(i + 1) == Some(&b'/') {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                TokenKind::Comment
            } else if b == b'/' && bytes.get(i + 1) == Some(&b'*') {
                i = match text[i + 2..].find("*/") {
                    Some(end) => i + 2 + end + 2,
                    None => return Err(error(start, "unterminated comment")),
                };
                TokenKind::Comment
            } else if self.is_ident_start(b) {
                while i < bytes.len() && self.is_ident_continue(bytes[i]) {
                    i += 1;
                }
                match (&text[start..i], bytes.get(i)) {
                    ("L" | "u" | "U" | "u8", Some(&(q @ (b'"' | b'\'')))) => {
                        i = scan_quoted(bytes, i, q)?;
                        quoted_kind(q)
                    }
                    _ => TokenKind::Identifier,
                }
            } else if b.is_ascii_digit()
                || (b == b'.' && bytes.get(i + 1).is_some_and(|c| c.is_ascii_digit()))
            {
                i = scan_number(bytes, i);
                TokenKind::Number
            } else if b == b'"' || b == b'\'' {
                i = scan_quoted(bytes, i, b)?;
                quoted_kind(b)
            } else if let Some(p) = PUNCTUATORS.iter().find(|p| text[i..].starts_with(**p)) {
                i += p.len();
                TokenKind::Punctuator
            } else {
                i += 1;
                TokenKind::Other
            };

            if kind == TokenKind::Comment && !self.options.keep_comments {
                continue;
            }

            tokens.push(Token::new(
                kind,
                &text[start..i],
                Position::new(base.offset() + start as u32),
            ));
        }

        Ok(tokens)
    }

    fn is_ident_start(&self, b: u8) -> bool {
        b.is_ascii_alphabetic()
            || b == b'_'
            || b >= 0x80
            || (b == b'$' && self.options.dollar_in_identifiers)
    }

    fn is_ident_continue(&self, b: u8) -> bool {
        self.is_ident_start(b) || b.is_ascii_digit()
    }
}

fn error(offset: usize, message: &str) -> LexError {
    LexError {
        offset,
        message: message.to_string(),
    }
}

fn next_is_newline(bytes: &[u8], i: usize) -> bool {
    match bytes.get(i) {
        Some(b'\n') => true,
        Some(b'\r') => bytes.get(i + 1) == Some(&b'\n'),
        _ => false,
    }
}

fn quoted_kind(quote: u8) -> TokenKind {
    if quote == b'"' {
        TokenKind::StringLiteral
    } else {
        TokenKind::CharLiteral
    }
}

/// Scan a quoted literal whose opening quote is at `i`; returns the end offset
fn scan_quoted(bytes: &[u8], i: usize, quote: u8) -> Result<usize, LexError> {
    let mut j = i + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'\n' => break,
            c if c == quote => return Ok(j + 1),
            _ => j += 1,
        }
    }
    let what = if quote == b'"' { "string" } else { "character" };
    Err(error(i, &format!("unterminated {} literal", what)))
}

/// Scan a preprocessing number starting at `i`
fn scan_number(bytes: &[u8], mut i: usize) -> usize {
    i += 1;
    while i < bytes.len() {
        let c = bytes[i];
        if matches!(c, b'+' | b'-') && matches!(bytes[i - 1], b'e' | b'E' | b'p' | b'P') {
            i += 1;
        } else if c.is_ascii_alphanumeric() || c == b'_' || c == b'.' || c == b'\'' {
            i += 1;
        } else {
            break;
        }
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lex(text: &str) -> Vec<(TokenKind, String)> {
        Lexer::default()
            .tokenize(text, Position::new(0))
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.spelling))
            .collect()
    }

    #[test]
    fn test_basic_expression() {
        assert_eq!(
            lex("x = a<<=1;"),
            vec![
                (TokenKind::Identifier, "x".to_string()),
                (TokenKind::Punctuator, "=".to_string()),
                (TokenKind::Identifier, "a".to_string()),
                (TokenKind::Punctuator, "<<=".to_string()),
                (TokenKind::Number, "1".to_string()),
                (TokenKind::Punctuator, ";".to_string()),
            ]
        );
    }

    #[test]
    fn test_literals_and_prefixes() {
        assert_eq!(
            lex(r#"L"wide" u8"utf" 'c' "a\"b""#),
            vec![
                (TokenKind::StringLiteral, r#"L"wide""#.to_string()),
                (TokenKind::StringLiteral, r#"u8"utf""#.to_string()),
                (TokenKind::CharLiteral, "'c'".to_string()),
                (TokenKind::StringLiteral, r#""a\"b""#.to_string()),
            ]
        );
    }

    #[test]
    fn test_pp_numbers() {
        assert_eq!(
            lex("0x1F 1.5e+3f .5 1'000"),
            vec![
                (TokenKind::Number, "0x1F".to_string()),
                (TokenKind::Number, "1.5e+3f".to_string()),
                (TokenKind::Number, ".5".to_string()),
                (TokenKind::Number, "1'000".to_string()),
            ]
        );
    }

    #[test]
    fn test_comments_and_splices() {
        assert_eq!(
            lex("a /* x */ b // y\nc\\\nd"),
            vec![
                (TokenKind::Identifier, "a".to_string()),
                (TokenKind::Identifier, "b".to_string()),
                (TokenKind::Identifier, "c".to_string()),
                (TokenKind::Identifier, "d".to_string()),
            ]
        );

        let lexer = Lexer::new(LexOptions {
            keep_comments: true,
            ..LexOptions::default()
        });
        let tokens = lexer.tokenize("a /* x */", Position::new(0)).unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Comment);
        assert_eq!(tokens[1].spelling, "/* x */");
    }

    #[test]
    fn test_dollar_identifiers_follow_options() {
        assert_eq!(lex("$x").len(), 1);

        let strict = Lexer::new(LexOptions {
            dollar_in_identifiers: false,
            ..LexOptions::default()
        });
        let tokens = strict.tokenize("$x", Position::new(0)).unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::Other);
    }

    #[test]
    fn test_positions_are_offset_from_base() {
        let tokens = Lexer::default().tokenize("a  bb", Position::new(10)).unwrap();
        assert_eq!(tokens[0].position, Position::new(10));
        assert_eq!(tokens[1].position, Position::new(13));
    }

    #[test]
    fn test_unterminated_literals() {
        let lexer = Lexer::default();
        let err = lexer.tokenize("x = \"abc\n", Position::new(0)).unwrap_err();
        assert_eq!(err.offset, 4);
        assert!(err.message.contains("string"));

        assert!(lexer.tokenize("/* open", Position::new(0)).is_err());
        assert!(lexer.tokenize("'a", Position::new(0)).is_err());
    }
}
