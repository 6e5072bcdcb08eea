//! Normalize surface trees into canonical trees
//!
//! This pass:
//! - Expands `:` shorthands and value lists into explicit text/comparison
//!   leaves combined with `And`/`Or`
//! - Rewrites bare paths in boolean position as `path != null`
//! - Lifts multi-segment leaf paths into nested `any` quantifiers
//! - Pushes negation to the leaves (comparison inversion before De Morgan,
//!   quantifier flipping; `NOT` over a text leaf is preserved)
//! - Flattens associative connectives and collapses singletons
//!
//! The result is equivalence-closed: surface trees denoting the same boolean
//! function (up to these rules) normalize to structurally equal canonical
//! trees, and normalizing a canonical tree's printed form reproduces it.

use crate::ast::core::Expr as CoreExpr;
use crate::ast::surface::{Expr as SurfaceExpr, Func, ListItem, ShorthandRhs};
use crate::ast::{CmpOp, Literal, LogicalOp, Path, Quantifier, TextOp};
use crate::error::NormalizeError;

/// Options for normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeOptions {
    /// Paths searched by one-argument text functions such as `contains("x")`.
    pub text_search_targets: Vec<Path>,
}

impl NormalizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text-search target.
    pub fn with_target(mut self, target: impl Into<Path>) -> Self {
        self.text_search_targets.push(target.into());
        self
    }
}

/// Normalize a surface tree into a canonical tree.
///
/// Pure: the input is never mutated, and equal inputs produce structurally
/// equal outputs.
pub fn normalize(
    expr: &SurfaceExpr,
    options: &NormalizeOptions,
) -> Result<CoreExpr, NormalizeError> {
    normalize_expr(expr, options)
}

fn normalize_expr(
    expr: &SurfaceExpr,
    options: &NormalizeOptions,
) -> Result<CoreExpr, NormalizeError> {
    match expr {
        // Grouping only exists to carry author intent through parsing
        SurfaceExpr::Group(inner) => normalize_expr(inner, options),

        SurfaceExpr::Logical(left, op, right) => {
            let left = normalize_expr(left, options)?;
            let right = normalize_expr(right, options)?;
            Ok(combine(*op, vec![left, right]))
        }

        SurfaceExpr::Not(inner) => Ok(apply_not(normalize_expr(inner, options)?)),

        SurfaceExpr::Comparison { path, op, value } => {
            Ok(lift_array_shorthand(CoreExpr::Comparison {
                path: path.clone(),
                op: *op,
                value: value.clone(),
            }))
        }

        // Bare path in boolean position: truthy means present and non-null
        SurfaceExpr::Path(path) => Ok(lift_array_shorthand(CoreExpr::Comparison {
            path: path.clone(),
            op: CmpOp::Neq,
            value: Literal::Null,
        })),

        SurfaceExpr::Literal(_) => Err(NormalizeError::generic(
            "Literal truthiness is not defined.",
        )),

        SurfaceExpr::Shorthand { path, rhs } => normalize_shorthand(path, rhs, options),

        SurfaceExpr::Call { func, args } => match func {
            Func::Contains => normalize_text_call(TextOp::Contains, args, options),
            Func::StartsWith => normalize_text_call(TextOp::StartsWith, args, options),
            Func::EndsWith => normalize_text_call(TextOp::EndsWith, args, options),
            Func::Any => normalize_quantifier_call(Quantifier::Any, args, options),
            Func::All => normalize_quantifier_call(Quantifier::All, args, options),
            Func::None => normalize_quantifier_call(Quantifier::None, args, options),
        },
    }
}

// ============ Shorthand and value-list expansion ============

fn normalize_shorthand(
    path: &Path,
    rhs: &ShorthandRhs,
    _options: &NormalizeOptions,
) -> Result<CoreExpr, NormalizeError> {
    match rhs {
        ShorthandRhs::Literal(Literal::Str(needle)) => Ok(lift_array_shorthand(CoreExpr::Text {
            path: path.clone(),
            op: TextOp::Contains,
            needle: needle.clone(),
        })),
        ShorthandRhs::Literal(Literal::Num(n)) => Ok(lift_array_shorthand(CoreExpr::Comparison {
            path: path.clone(),
            op: CmpOp::Eq,
            value: Literal::Num(*n),
        })),
        ShorthandRhs::Literal(other) => Err(NormalizeError::unsupported(
            "literal",
            format!(
                "Shorthand ':' does not support {} literals.",
                other.type_name()
            ),
        )),
        ShorthandRhs::Comparison { op, value } => Ok(lift_array_shorthand(CoreExpr::Comparison {
            path: path.clone(),
            op: *op,
            value: value.clone(),
        })),
        ShorthandRhs::ValueList { items, combinator } => {
            normalize_value_list(path, items, *combinator)
        }
    }
}

fn normalize_value_list(
    path: &Path,
    items: &[ListItem],
    combinator: Option<LogicalOp>,
) -> Result<CoreExpr, NormalizeError> {
    if items.is_empty() {
        // Unreachable through the parser; hand-built trees still get a
        // deterministic error
        return Err(NormalizeError::generic("Value list must not be empty."));
    }

    let mut strings = Vec::new();
    let mut numbers = Vec::new();
    let mut comparisons = Vec::new();
    for item in items {
        match item {
            ListItem::Literal(Literal::Str(s)) => strings.push(s.clone()),
            ListItem::Literal(Literal::Num(n)) => numbers.push(*n),
            ListItem::Literal(other) => {
                return Err(NormalizeError::unsupported(
                    "literal",
                    format!("Value lists do not support {} items.", other.type_name()),
                ))
            }
            ListItem::Comparison { op, value } => comparisons.push((*op, value.clone())),
        }
    }

    let populated = [!strings.is_empty(), !numbers.is_empty(), !comparisons.is_empty()]
        .into_iter()
        .filter(|present| *present)
        .count();
    if populated > 1 {
        return Err(NormalizeError::unsupported(
            "value-list",
            "Mixed types in a value list are not supported.",
        ));
    }

    let (op, leaves) = if !comparisons.is_empty() {
        let leaves = comparisons
            .into_iter()
            .map(|(op, value)| {
                lift_array_shorthand(CoreExpr::Comparison {
                    path: path.clone(),
                    op,
                    value,
                })
            })
            .collect();
        (combinator.unwrap_or(LogicalOp::And), leaves)
    } else if !numbers.is_empty() {
        let leaves = numbers
            .into_iter()
            .map(|n| {
                lift_array_shorthand(CoreExpr::Comparison {
                    path: path.clone(),
                    op: CmpOp::Eq,
                    value: Literal::Num(n),
                })
            })
            .collect();
        (combinator.unwrap_or(LogicalOp::Or), leaves)
    } else {
        let leaves = strings
            .into_iter()
            .map(|needle| {
                lift_array_shorthand(CoreExpr::Text {
                    path: path.clone(),
                    op: TextOp::Contains,
                    needle,
                })
            })
            .collect();
        (combinator.unwrap_or(LogicalOp::Or), leaves)
    };
    Ok(combine(op, leaves))
}

// ============ Function-call normalization ============

fn normalize_text_call(
    op: TextOp,
    args: &[SurfaceExpr],
    options: &NormalizeOptions,
) -> Result<CoreExpr, NormalizeError> {
    match args {
        [needle] => {
            let needle = expect_needle(
                needle,
                "Text functions require a string literal as the argument.",
            )?;
            if options.text_search_targets.is_empty() {
                return Err(NormalizeError::generic(
                    "Full-text search targets not configured.",
                ));
            }
            let leaves = options
                .text_search_targets
                .iter()
                .map(|target| {
                    lift_array_shorthand(CoreExpr::Text {
                        path: target.clone(),
                        op,
                        needle: needle.clone(),
                    })
                })
                .collect();
            Ok(combine(LogicalOp::Or, leaves))
        }
        [path_arg, needle_arg] => {
            let path = expect_path(path_arg)?;
            let needle = expect_needle(
                needle_arg,
                "Text functions require a string literal as the second argument.",
            )?;
            Ok(lift_array_shorthand(CoreExpr::Text { path, op, needle }))
        }
        _ => Err(NormalizeError::generic(
            "Text functions take one or two arguments.",
        )),
    }
}

fn normalize_quantifier_call(
    quantifier: Quantifier,
    args: &[SurfaceExpr],
    options: &NormalizeOptions,
) -> Result<CoreExpr, NormalizeError> {
    match args {
        [path_arg, predicate] => {
            let path = expect_path(path_arg)?;
            let predicate = normalize_expr(predicate, options)?;
            Ok(CoreExpr::Quantified {
                quantifier,
                path,
                predicate: Box::new(predicate),
            })
        }
        _ => Err(NormalizeError::generic(
            "Quantifier functions take exactly two arguments.",
        )),
    }
}

fn expect_path(expr: &SurfaceExpr) -> Result<Path, NormalizeError> {
    match expr {
        SurfaceExpr::Group(inner) => expect_path(inner),
        SurfaceExpr::Path(path) => Ok(path.clone()),
        other => Err(NormalizeError::unsupported(
            other.tag(),
            format!("Expected a field path as the first argument, got {}.", other.tag()),
        )),
    }
}

fn expect_needle(expr: &SurfaceExpr, message: &str) -> Result<String, NormalizeError> {
    match expr {
        SurfaceExpr::Group(inner) => expect_needle(inner, message),
        SurfaceExpr::Literal(Literal::Str(s)) => Ok(s.clone()),
        _ => Err(NormalizeError::generic(message)),
    }
}

// ============ Canonical-side rewrites ============

/// Flatten same-operator children and collapse singletons.
fn combine(op: LogicalOp, children: Vec<CoreExpr>) -> CoreExpr {
    let mut flat = Vec::with_capacity(children.len());
    for child in children {
        match (op, child) {
            (LogicalOp::And, CoreExpr::And(grandchildren)) => flat.extend(grandchildren),
            (LogicalOp::Or, CoreExpr::Or(grandchildren)) => flat.extend(grandchildren),
            (_, child) => flat.push(child),
        }
    }
    if flat.len() == 1 {
        return flat.remove(0);
    }
    match op {
        LogicalOp::And => CoreExpr::And(flat),
        LogicalOp::Or => CoreExpr::Or(flat),
    }
}

/// Array-shorthand lift, re-checked at every point a leaf is emitted: a
/// multi-segment path on a `Text`/`Comparison` becomes nested `any`
/// quantifiers over each leading segment.
fn lift_array_shorthand(expr: CoreExpr) -> CoreExpr {
    match expr {
        CoreExpr::Comparison { path, op, value } => match path.tail() {
            Some(tail) => CoreExpr::Quantified {
                quantifier: Quantifier::Any,
                path: Path::single(path.head()),
                predicate: Box::new(lift_array_shorthand(CoreExpr::Comparison {
                    path: tail,
                    op,
                    value,
                })),
            },
            None => CoreExpr::Comparison { path, op, value },
        },
        CoreExpr::Text { path, op, needle } => match path.tail() {
            Some(tail) => CoreExpr::Quantified {
                quantifier: Quantifier::Any,
                path: Path::single(path.head()),
                predicate: Box::new(lift_array_shorthand(CoreExpr::Text {
                    path: tail,
                    op,
                    needle,
                })),
            },
            None => CoreExpr::Text { path, op, needle },
        },
        other => other,
    }
}

/// Negation push-down over an already-canonical subtree. Comparison
/// inversion fires before De Morgan reaches the node, so `Not(Comparison)`
/// never survives; quantifiers flip; only `Not(Text)` is preserved.
fn apply_not(expr: CoreExpr) -> CoreExpr {
    match expr {
        CoreExpr::Not(inner) => *inner,
        CoreExpr::And(children) => combine(
            LogicalOp::Or,
            children.into_iter().map(apply_not).collect(),
        ),
        CoreExpr::Or(children) => combine(
            LogicalOp::And,
            children.into_iter().map(apply_not).collect(),
        ),
        CoreExpr::Comparison { path, op, value } => CoreExpr::Comparison {
            path,
            op: op.inverse(),
            value,
        },
        CoreExpr::Quantified {
            quantifier,
            path,
            predicate,
        } => match quantifier {
            Quantifier::Any => CoreExpr::Quantified {
                quantifier: Quantifier::None,
                path,
                predicate,
            },
            Quantifier::None => CoreExpr::Quantified {
                quantifier: Quantifier::Any,
                path,
                predicate,
            },
            Quantifier::All => CoreExpr::Quantified {
                quantifier: Quantifier::Any,
                path,
                predicate: Box::new(apply_not(*predicate)),
            },
        },
        text @ CoreExpr::Text { .. } => CoreExpr::Not(Box::new(text)),
    }
}

// ============ Sanity tests ============
// Scenario-level coverage lives in tests/integration.rs and tests/property.rs
