//! Predicate evaluation of canonical trees against in-memory records
//!
//! Records are inspected only through the [`Record`] trait, so any
//! tree-shaped value type can be queried; a `serde_json::Value` binding is
//! bundled. Evaluation is pure: neither the tree nor the record is mutated,
//! and a [`Predicate`] can be shared freely across threads.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::ast::core::Expr;
use crate::ast::{CmpOp, Literal, Path, Quantifier, TextOp};
use crate::error::EvalError;
use crate::text;

/// Options captured by a predicate at build time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvalOptions {
    /// Case-insensitive text matching.
    pub ignore_case: bool,
    /// Strip diacritical marks before matching.
    pub fold_diacritics: bool,
    /// BCP-47-ish locale tag steering the lowercase mapping, e.g. `tr-TR`.
    pub locale: Option<String>,
}

impl EvalOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ignore_case(mut self, on: bool) -> Self {
        self.ignore_case = on;
        self
    }

    pub fn with_fold_diacritics(mut self, on: bool) -> Self {
        self.fold_diacritics = on;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}

/// Scalar view over a record value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Str(&'a str),
    Num(f64),
    Bool(bool),
}

/// Binding between the evaluator and a concrete record representation.
///
/// The evaluator only ever looks up mapping fields, views sequences, views
/// scalars, and tests for null; implement these for any native value type to
/// make it queryable.
pub trait Record {
    /// Child value under `segment` when this value is a mapping.
    fn field(&self, segment: &str) -> Option<&Self>;

    /// Element slice when this value is an ordered sequence.
    fn items(&self) -> Option<&[Self]>
    where
        Self: Sized;

    /// Scalar view when this value is a string, number, or boolean.
    fn scalar(&self) -> Option<Scalar<'_>>;

    /// True for an explicit null.
    fn is_null(&self) -> bool;

    /// Type name used in diagnostics.
    fn type_name(&self) -> &'static str;
}

impl Record for serde_json::Value {
    fn field(&self, segment: &str) -> Option<&Self> {
        self.as_object()?.get(segment)
    }

    fn items(&self) -> Option<&[Self]> {
        self.as_array().map(Vec::as_slice)
    }

    fn scalar(&self) -> Option<Scalar<'_>> {
        match self {
            serde_json::Value::String(s) => Some(Scalar::Str(s)),
            serde_json::Value::Number(n) => n.as_f64().map(Scalar::Num),
            serde_json::Value::Bool(b) => Some(Scalar::Bool(*b)),
            _ => None,
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, serde_json::Value::Null)
    }

    fn type_name(&self) -> &'static str {
        match self {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "boolean",
            serde_json::Value::Number(_) => "number",
            serde_json::Value::String(_) => "string",
            serde_json::Value::Array(_) => "array",
            serde_json::Value::Object(_) => "object",
        }
    }
}

/// A compiled filter: a canonical tree plus the evaluation options it
/// captured. Immutable; apply it to as many records as needed.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    expr: Expr,
    options: EvalOptions,
}

impl Predicate {
    pub fn new(expr: Expr, options: EvalOptions) -> Self {
        Self { expr, options }
    }

    pub fn matches<R: Record>(&self, record: &R) -> Result<bool, EvalError> {
        evaluate(&self.expr, record, &self.options)
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }
}

/// Build a reusable predicate from a canonical tree.
pub fn build_predicate(expr: Expr, options: EvalOptions) -> Predicate {
    Predicate::new(expr, options)
}

/// Evaluate a canonical tree against a single record.
pub fn evaluate<R: Record>(
    expr: &Expr,
    record: &R,
    options: &EvalOptions,
) -> Result<bool, EvalError> {
    eval_expr(expr, record, false, options)
}

fn eval_expr<R: Record>(
    expr: &Expr,
    record: &R,
    in_quantifier: bool,
    options: &EvalOptions,
) -> Result<bool, EvalError> {
    match expr {
        Expr::And(children) => {
            for child in children {
                if !eval_expr(child, record, in_quantifier, options)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Expr::Or(children) => {
            for child in children {
                if eval_expr(child, record, in_quantifier, options)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Expr::Not(inner) => Ok(!eval_expr(inner, record, in_quantifier, options)?),
        Expr::Comparison { path, op, value } => {
            eval_comparison(path, *op, value, record, in_quantifier, options)
        }
        Expr::Text { path, op, needle } => {
            eval_text(path, *op, needle, record, in_quantifier, options)
        }
        Expr::Quantified {
            quantifier,
            path,
            predicate,
        } => eval_quantified(*quantifier, path, predicate, record, in_quantifier, options),
    }
}

// ============ Path resolution ============

/// Walk the path; null or a missing field at any step yields absent. Inside
/// a quantifier predicate, a leading `value` segment names the current
/// sequence element itself.
fn resolve<'r, R: Record>(record: &'r R, path: &Path, in_quantifier: bool) -> Option<&'r R> {
    let mut segments = path.segments().iter();
    if in_quantifier && path.head() == "value" {
        segments.next();
    }
    let mut current = record;
    for segment in segments {
        current = current.field(segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

// ============ Comparisons ============

fn eval_comparison<R: Record>(
    path: &Path,
    op: CmpOp,
    value: &Literal,
    record: &R,
    in_quantifier: bool,
    options: &EvalOptions,
) -> Result<bool, EvalError> {
    let left = resolve(record, path, in_quantifier);
    match op {
        CmpOp::Eq => Ok(literal_eq(left, value)),
        CmpOp::Neq => Ok(!literal_eq(left, value)),
        CmpOp::Gt | CmpOp::Gte | CmpOp::Lt | CmpOp::Lte => {
            match (left.and_then(Record::scalar), value) {
                (Some(Scalar::Num(l)), Literal::Num(r)) => Ok(match l.partial_cmp(r) {
                    Some(ordering) => op_matches(op, ordering),
                    // NaN on either side never satisfies an ordering
                    None => false,
                }),
                (Some(Scalar::Str(l)), Literal::Str(r)) => {
                    // Byte-lexicographic on the post-processed form; locale
                    // collation is deliberately not applied
                    let l = text::process(l, options);
                    let r = text::process(r, options);
                    Ok(op_matches(op, l.as_ref().cmp(r.as_ref())))
                }
                _ => {
                    let left_name = left.map_or("null", Record::type_name);
                    Err(EvalError::type_mismatch(
                        op.name(),
                        left_name,
                        value.type_name(),
                    ))
                }
            }
        }
    }
}

fn op_matches(op: CmpOp, ordering: Ordering) -> bool {
    match op {
        CmpOp::Eq => ordering == Ordering::Equal,
        CmpOp::Neq => ordering != Ordering::Equal,
        CmpOp::Gt => ordering == Ordering::Greater,
        CmpOp::Gte => ordering != Ordering::Less,
        CmpOp::Lt => ordering == Ordering::Less,
        CmpOp::Lte => ordering != Ordering::Greater,
    }
}

/// Strict equality; absent and null coincide, NaN is never equal.
fn literal_eq<R: Record>(left: Option<&R>, value: &Literal) -> bool {
    let Some(actual) = left else {
        return matches!(value, Literal::Null);
    };
    match (actual.scalar(), value) {
        (_, Literal::Null) => false,
        (Some(Scalar::Str(l)), Literal::Str(r)) => l == r.as_str(),
        (Some(Scalar::Num(l)), Literal::Num(r)) => l == *r,
        (Some(Scalar::Bool(l)), Literal::Bool(r)) => l == *r,
        _ => false,
    }
}

// ============ Text matching ============

fn eval_text<R: Record>(
    path: &Path,
    op: TextOp,
    needle: &str,
    record: &R,
    in_quantifier: bool,
    options: &EvalOptions,
) -> Result<bool, EvalError> {
    let Some(value) = resolve(record, path, in_quantifier) else {
        return Ok(false);
    };
    let Some(Scalar::Str(raw)) = value.scalar() else {
        // Non-string left values never match; this is not an error
        return Ok(false);
    };
    let haystack = text::process(raw, options);
    let needle = text::process(needle, options);
    Ok(match op {
        TextOp::Contains => haystack.contains(needle.as_ref()),
        TextOp::StartsWith => haystack.starts_with(needle.as_ref()),
        TextOp::EndsWith => haystack.ends_with(needle.as_ref()),
    })
}

// ============ Quantifiers ============

fn eval_quantified<R: Record>(
    quantifier: Quantifier,
    path: &Path,
    predicate: &Expr,
    record: &R,
    in_quantifier: bool,
    options: &EvalOptions,
) -> Result<bool, EvalError> {
    // Absent => empty sequence; a single value acts as a one-element sequence
    let elements: Vec<&R> = match resolve(record, path, in_quantifier) {
        None => Vec::new(),
        Some(value) => match value.items() {
            Some(items) => items.iter().collect(),
            None => vec![value],
        },
    };

    match quantifier {
        Quantifier::Any => {
            for element in elements {
                if eval_expr(predicate, element, true, options)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        // An empty universe does not witness universality
        Quantifier::All => {
            if elements.is_empty() {
                return Ok(false);
            }
            for element in elements {
                if !eval_expr(predicate, element, true, options)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Quantifier::None => {
            for element in elements {
                if eval_expr(predicate, element, true, options)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

// ============ Sanity tests ============
// Scenario-level coverage lives in tests/integration.rs
