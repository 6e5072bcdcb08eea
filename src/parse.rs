//! Parser for filter expressions
//!
//! Produces `surface::Expr` which is then normalized to `core::Expr`.
//!
//! Recursive descent over the token stream with one token of lookahead.
//! The grammar's central ambiguity — an identifier can start a comparison,
//! a `:` shorthand, or stand alone as a truthy path — is resolved by
//! committing to the path-based branch only when the lookahead token is an
//! identifier, then peeking once more after the path. No backtracking.

use crate::ast::surface::{Expr, Func, ListItem, ShorthandRhs};
use crate::ast::{CmpOp, Literal, LogicalOp, Path};
use crate::error::ParseError;
use crate::lex::{lex, Token, TokenKind};

/// Parse a filter expression, returning the surface tree together with the
/// token stream it was built from.
pub fn parse(input: &str) -> Result<(Expr, Vec<Token>), ParseError> {
    let tokens = lex(input)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
    };
    let expr = parser.expression()?;
    if parser.peek().is_some() {
        return Err(parser.unexpected("end of input"));
    }
    Ok((expr, tokens))
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// Structural-mismatch error at the current token (or end of input).
    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::generic_at(
                format!(
                    "Unexpected token '{}' at {}:{}; expected {}.",
                    token.lexeme, token.line, token.column, expected
                ),
                token.line,
                token.column,
                Some(token.lexeme.clone()),
            ),
            None => ParseError::generic(format!("Unexpected end of input; expected {expected}.")),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<&'a Token, ParseError> {
        match self.peek() {
            Some(token) if token.kind == kind => Ok(self.advance().unwrap_or(token)),
            _ => Err(self.unexpected(expected)),
        }
    }

    // ============ Precedence layers (low to high) ============

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.and_expr()?;
        while matches!(self.peek_kind(), Some(TokenKind::Or)) {
            self.advance();
            let right = self.and_expr()?;
            left = Expr::Logical(Box::new(left), LogicalOp::Or, Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.not_expr()?;
        while matches!(self.peek_kind(), Some(TokenKind::And)) {
            self.advance();
            let right = self.not_expr()?;
            left = Expr::Logical(Box::new(left), LogicalOp::And, Box::new(right));
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.peek_kind(), Some(TokenKind::Not)) {
            self.advance();
            let inner = self.not_expr()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.atomic()
    }

    // ============ Atoms ============

    fn atomic(&mut self) -> Result<Expr, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::LParen) => self.group(),
            Some(
                TokenKind::Contains
                | TokenKind::StartsWith
                | TokenKind::EndsWith
                | TokenKind::Any
                | TokenKind::All
                | TokenKind::NoneKw,
            ) => self.call(),
            Some(
                TokenKind::Str(_)
                | TokenKind::Num(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null,
            ) => Ok(Expr::Literal(self.literal()?)),
            // Committed: only an identifier can start a path
            Some(TokenKind::Ident(_)) => self.path_based(),
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn group(&mut self) -> Result<Expr, ParseError> {
        self.advance();
        let inner = self.expression()?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Expr::Group(Box::new(inner)))
    }

    fn call(&mut self) -> Result<Expr, ParseError> {
        let func = match self.peek_kind() {
            Some(TokenKind::Contains) => Func::Contains,
            Some(TokenKind::StartsWith) => Func::StartsWith,
            Some(TokenKind::EndsWith) => Func::EndsWith,
            Some(TokenKind::Any) => Func::Any,
            Some(TokenKind::All) => Func::All,
            Some(TokenKind::NoneKw) => Func::None,
            _ => return Err(self.unexpected("a function name")),
        };
        self.advance();
        self.expect(TokenKind::LParen, "'('")?;

        let mut args = vec![self.expression()?];
        if matches!(self.peek_kind(), Some(TokenKind::Comma)) {
            self.advance();
            args.push(self.expression()?);
        }
        self.expect(TokenKind::RParen, "')'")?;

        if func.is_quantifier() && args.len() != 2 {
            return Err(ParseError::generic(format!(
                "Quantifier '{}' takes exactly two arguments.",
                func.name()
            )));
        }
        Ok(Expr::Call { func, args })
    }

    /// `fieldPath ( cmpOp literal | ':' shortRHS )?` — at most one suffix,
    /// so comparisons and shorthands are not chainable.
    fn path_based(&mut self) -> Result<Expr, ParseError> {
        let path = self.field_path()?;
        match self.peek_kind() {
            Some(
                TokenKind::Eq
                | TokenKind::Neq
                | TokenKind::Gt
                | TokenKind::Gte
                | TokenKind::Lt
                | TokenKind::Lte,
            ) => {
                let op = self.cmp_op()?;
                let value = self.literal()?;
                Ok(Expr::Comparison { path, op, value })
            }
            Some(TokenKind::Colon) => {
                self.advance();
                let rhs = self.short_rhs()?;
                Ok(Expr::Shorthand { path, rhs })
            }
            _ => Ok(Expr::Path(path)),
        }
    }

    fn field_path(&mut self) -> Result<Path, ParseError> {
        let first = match self.peek_kind() {
            Some(TokenKind::Ident(name)) => {
                let name = name.clone();
                self.advance();
                name
            }
            _ => return Err(self.unexpected("an identifier")),
        };
        let mut segments = vec![first];
        while matches!(self.peek_kind(), Some(TokenKind::Dot)) {
            self.advance();
            // Quoted segments are only legal after the first dot
            match self.peek_kind() {
                Some(TokenKind::Ident(name)) => {
                    segments.push(name.clone());
                    self.advance();
                }
                Some(TokenKind::Str(name)) => {
                    segments.push(name.clone());
                    self.advance();
                }
                _ => return Err(self.unexpected("an identifier or quoted segment after '.'")),
            }
        }
        Ok(Path::new(segments))
    }

    fn cmp_op(&mut self) -> Result<CmpOp, ParseError> {
        let op = match self.peek_kind() {
            Some(TokenKind::Eq) => CmpOp::Eq,
            Some(TokenKind::Neq) => CmpOp::Neq,
            Some(TokenKind::Gt) => CmpOp::Gt,
            Some(TokenKind::Gte) => CmpOp::Gte,
            Some(TokenKind::Lt) => CmpOp::Lt,
            Some(TokenKind::Lte) => CmpOp::Lte,
            _ => return Err(self.unexpected("a comparison operator")),
        };
        self.advance();
        Ok(op)
    }

    fn literal(&mut self) -> Result<Literal, ParseError> {
        let lit = match self.peek_kind() {
            Some(TokenKind::Str(s)) => Literal::Str(s.clone()),
            Some(TokenKind::Num(n)) => Literal::Num(*n),
            Some(TokenKind::True) => Literal::Bool(true),
            Some(TokenKind::False) => Literal::Bool(false),
            Some(TokenKind::Null) => Literal::Null,
            _ => return Err(self.unexpected("a literal")),
        };
        self.advance();
        Ok(lit)
    }

    // ============ `:` shorthand right-hand sides ============

    fn short_rhs(&mut self) -> Result<ShorthandRhs, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::LParen) => self.value_list(),
            Some(TokenKind::Gt | TokenKind::Gte | TokenKind::Lt | TokenKind::Lte) => {
                let op = self.cmp_op()?;
                let value = self.literal()?;
                Ok(ShorthandRhs::Comparison { op, value })
            }
            Some(
                TokenKind::Str(_)
                | TokenKind::Num(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null,
            ) => Ok(ShorthandRhs::Literal(self.literal()?)),
            _ => Err(self.unexpected("a literal, comparison, or value list after ':'")),
        }
    }

    /// Items are separated by `,` (default combinator) or by an explicit
    /// `AND`/`OR` keyword; mixing the two keywords in one list is an error.
    fn value_list(&mut self) -> Result<ShorthandRhs, ParseError> {
        self.advance();
        let mut items = vec![self.list_item()?];
        let mut combinator: Option<LogicalOp> = None;
        loop {
            match self.peek_kind() {
                Some(TokenKind::RParen) => {
                    self.advance();
                    break;
                }
                Some(TokenKind::Comma) => {
                    self.advance();
                    items.push(self.list_item()?);
                }
                Some(TokenKind::And) => {
                    if combinator == Some(LogicalOp::Or) {
                        return Err(self.unexpected("a single combinator per value list"));
                    }
                    combinator = Some(LogicalOp::And);
                    self.advance();
                    items.push(self.list_item()?);
                }
                Some(TokenKind::Or) => {
                    if combinator == Some(LogicalOp::And) {
                        return Err(self.unexpected("a single combinator per value list"));
                    }
                    combinator = Some(LogicalOp::Or);
                    self.advance();
                    items.push(self.list_item()?);
                }
                _ => return Err(self.unexpected("',' or ')' in value list")),
            }
        }
        Ok(ShorthandRhs::ValueList { items, combinator })
    }

    fn list_item(&mut self) -> Result<ListItem, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Gt | TokenKind::Gte | TokenKind::Lt | TokenKind::Lte) => {
                let op = self.cmp_op()?;
                let value = self.literal()?;
                Ok(ListItem::Comparison { op, value })
            }
            Some(
                TokenKind::Str(_)
                | TokenKind::Num(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null,
            ) => Ok(ListItem::Literal(self.literal()?)),
            _ => Err(self.unexpected("a literal or comparison in value list")),
        }
    }
}

// ============ Sanity tests ============
// Full pipeline coverage lives in tests/integration.rs
