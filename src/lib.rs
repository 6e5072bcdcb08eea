//! siftql - a filter query engine for tree-shaped records
//!
//! A compact filter expression is parsed into a surface tree, normalized
//! into a canonical tree, and then either evaluated in-process as a
//! predicate over records or handed to a translator that emits a query for
//! a storage backend.
//!
//! ## Quick Start
//!
//! ```
//! use siftql::{compile, EvalOptions, NormalizeOptions};
//! use serde_json::json;
//!
//! let predicate = compile(
//!     r#"category: "Spirits" AND year > 1990"#,
//!     &NormalizeOptions::new(),
//!     EvalOptions::new(),
//! )?;
//!
//! let record = json!({"category": "Spirits", "year": 2000});
//! assert!(predicate.matches(&record)?);
//! # Ok::<(), siftql::SiftError>(())
//! ```
//!
//! ## Surface syntax
//!
//! - `path op literal` with `=`, `!=`, `>`, `>=`, `<`, `<=`
//! - `path: "text"` (contains), `path: 42` (equals), `path: >= 10`,
//!   `path: ("a", "b")` (value lists, `AND`/`OR` as explicit combinators)
//! - `contains`/`startsWith`/`endsWith(path, "needle")`, or one-argument
//!   forms searching the configured text-search targets
//! - `any`/`all`/`none(path, predicate)`, with `value` naming the current
//!   sequence element inside the predicate
//! - `AND`, `OR`, `NOT`, parentheses; keywords are case-insensitive
//!
//! ## Pipeline stages
//!
//! Each stage is a pure function and can be driven separately:
//! [`parse`] → [`normalize`] → [`build_predicate`] (or a [`Translate`]
//! implementation in place of evaluation). Errors carry a stable
//! [`ErrorCode`] per stage; nothing is logged and nothing is cached.

pub mod ast;
mod error;
mod eval;
mod lex;
mod normalize;
mod parse;
mod pretty;
mod text;
pub mod translate;

use thiserror::Error;

// ============ Primary public API ============

pub use ast::{CmpOp, Literal, LogicalOp, Path, Quantifier, TextOp};
pub use error::{AdapterError, ErrorCode, ErrorKind, EvalError, NormalizeError, ParseError};
pub use eval::{build_predicate, evaluate, EvalOptions, Predicate, Record, Scalar};
pub use lex::{Token, TokenKind};
pub use normalize::{normalize, NormalizeOptions};
pub use parse::parse;
pub use translate::{SqlTranslator, Translate};

/// Parse, normalize, and build a predicate in one step.
pub fn compile(
    query: &str,
    normalize_options: &NormalizeOptions,
    eval_options: EvalOptions,
) -> Result<Predicate, SiftError> {
    let (surface, _tokens) = parse(query)?;
    let canonical = normalize(&surface, normalize_options)?;
    Ok(build_predicate(canonical, eval_options))
}

// ============ Errors ============

/// Any pipeline error; the supertype callers match on by kind or code.
#[derive(Error, Debug)]
pub enum SiftError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Normalize error: {0}")]
    Normalize(#[from] NormalizeError),
    #[error("Eval error: {0}")]
    Eval(#[from] EvalError),
    #[error("Translate error: {0}")]
    Adapter(#[from] AdapterError),
}

impl SiftError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SiftError::Parse(e) => e.code,
            SiftError::Normalize(e) => e.code,
            SiftError::Eval(e) => e.code,
            SiftError::Adapter(e) => e.code,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.code().kind()
    }
}
