//! Lexer for filter expressions
//!
//! Produces a flat token stream with source locations; the parser consumes
//! tokens and carries the locations into error reports. Keywords are
//! classified case-insensitively after maximal-munch identifier lexing,
//! which is what gives them their word boundary (identifiers may contain
//! `-`, so `android` and `or-else` are plain identifiers).

use winnow::ascii::digit1;
use winnow::combinator::{alt, opt};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

use crate::error::ParseError;

type PResult<T> = winnow::ModalResult<T>;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Field or segment name
    Ident(String),
    /// Double-quoted string literal, unescaped
    Str(String),
    /// Numeric literal
    Num(f64),

    // Keywords (case-insensitive in the source)
    And,
    Or,
    Not,
    True,
    False,
    Null,
    Contains,
    StartsWith,
    EndsWith,
    Any,
    All,
    NoneKw,

    // Operators and punctuation
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Colon,
    Comma,
    Dot,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The source slice this token was lexed from.
    pub lexeme: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

/// Lex the full input; any character that begins no token is an error.
pub fn lex(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut rest = input;
    let mut tokens = Vec::new();
    let mut position = Position::start();
    loop {
        let before_ws = rest;
        let _ = ws(&mut rest);
        position.advance(&before_ws[..before_ws.len() - rest.len()]);
        if rest.is_empty() {
            break;
        }
        let offset = input.len() - rest.len();
        let Position { line, column } = position;
        let before = rest;
        match token_kind(&mut rest) {
            Ok(kind) => {
                let lexeme = &before[..before.len() - rest.len()];
                position.advance(lexeme);
                tokens.push(Token {
                    kind,
                    lexeme: lexeme.to_string(),
                    offset,
                    line,
                    column,
                });
            }
            Err(_) => return Err(lex_error(before, line, column)),
        }
    }
    Ok(tokens)
}

/// Line/column cursor, advanced incrementally over each consumed slice of
/// source text rather than recomputed from the start of the input.
#[derive(Clone, Copy)]
struct Position {
    line: usize,
    column: usize,
}

impl Position {
    fn start() -> Self {
        Self { line: 1, column: 1 }
    }

    fn advance(&mut self, consumed: &str) {
        for ch in consumed.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }
}

fn lex_error(rest: &str, line: usize, column: usize) -> ParseError {
    match rest.chars().next() {
        Some('"') => ParseError::generic_at(
            format!("Invalid or unterminated string literal at {line}:{column}."),
            line,
            column,
            Some("\"".to_string()),
        ),
        Some(ch) => ParseError::unexpected_token(&ch.to_string(), line, column),
        None => ParseError::generic("Unexpected end of input."),
    }
}

// ============ Token parsers ============

fn token_kind(input: &mut &str) -> PResult<TokenKind> {
    alt((word, number, string, operator)).parse_next(input)
}

fn word(input: &mut &str) -> PResult<TokenKind> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| {
            c.is_ascii_alphanumeric() || c == '_' || c == '-'
        }),
    )
        .take()
        .map(classify_word)
        .parse_next(input)
}

fn classify_word(word: &str) -> TokenKind {
    match word.to_ascii_lowercase().as_str() {
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        "contains" => TokenKind::Contains,
        "startswith" => TokenKind::StartsWith,
        "endswith" => TokenKind::EndsWith,
        "any" => TokenKind::Any,
        "all" => TokenKind::All,
        "none" => TokenKind::NoneKw,
        _ => TokenKind::Ident(word.to_string()),
    }
}

/// True when `word` would lex as a keyword rather than an identifier.
pub(crate) fn is_reserved_word(word: &str) -> bool {
    !matches!(classify_word(word), TokenKind::Ident(_))
}

fn number(input: &mut &str) -> PResult<TokenKind> {
    (
        opt(one_of(['+', '-'])),
        digit1,
        opt(('.', digit1)),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
    )
        .take()
        .try_map(|s: &str| s.parse::<f64>())
        .map(TokenKind::Num)
        .parse_next(input)
}

fn string(input: &mut &str) -> PResult<TokenKind> {
    let _ = '"'.parse_next(input)?;
    let mut value = String::new();
    loop {
        let Some(c) = input.chars().next() else {
            return Err(backtrack());
        };
        if c == '"' {
            *input = &input[1..];
            break;
        }
        if c == '\\' {
            *input = &input[1..];
            let Some(escaped) = input.chars().next() else {
                return Err(backtrack());
            };
            *input = &input[escaped.len_utf8()..];
            match escaped {
                'b' => value.push('\u{0008}'),
                'f' => value.push('\u{000C}'),
                'n' => value.push('\n'),
                'r' => value.push('\r'),
                't' => value.push('\t'),
                'v' => value.push('\u{000B}'),
                'u' => value.push(unicode_escape(input)?),
                // '"', '\\', '/', and unknown escapes pass through
                other => value.push(other),
            }
        } else {
            value.push(c);
            *input = &input[c.len_utf8()..];
        }
    }
    Ok(TokenKind::Str(value))
}

fn unicode_escape(input: &mut &str) -> PResult<char> {
    let digits = take_while(4..=4, |c: char| c.is_ascii_hexdigit()).parse_next(input)?;
    let code = u32::from_str_radix(digits, 16).map_err(|_| backtrack())?;
    char::from_u32(code).ok_or_else(backtrack)
}

fn backtrack() -> winnow::error::ErrMode<winnow::error::ContextError> {
    winnow::error::ErrMode::Backtrack(winnow::error::ContextError::new())
}

fn operator(input: &mut &str) -> PResult<TokenKind> {
    // Multi-character operators before their single-character prefixes
    alt((
        ">=".value(TokenKind::Gte),
        "<=".value(TokenKind::Lte),
        "!=".value(TokenKind::Neq),
        '='.value(TokenKind::Eq),
        '>'.value(TokenKind::Gt),
        '<'.value(TokenKind::Lt),
        ':'.value(TokenKind::Colon),
        ','.value(TokenKind::Comma),
        '.'.value(TokenKind::Dot),
        '('.value(TokenKind::LParen),
        ')'.value(TokenKind::RParen),
    ))
    .parse_next(input)
}

// ============ Whitespace ============

fn ws(input: &mut &str) -> PResult<()> {
    take_while(0.., |c: char| c.is_whitespace())
        .void()
        .parse_next(input)
}

// ============ Sanity tests ============
