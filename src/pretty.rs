//! Display implementations for surface and canonical trees
//!
//! Canonical trees print as valid surface syntax: parsing and normalizing a
//! printed canonical tree reproduces the identical structure. The property
//! tests lean on this round trip to check normalization idempotence.

use std::fmt::{self, Display};

use crate::ast::core::Expr as CoreExpr;
use crate::ast::surface::{Expr as SurfaceExpr, Func, ListItem, ShorthandRhs};
use crate::ast::{CmpOp, Literal, LogicalOp, Path, Quantifier, TextOp};
use crate::lex::is_reserved_word;

// ============ Shared leaf types ============

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) => write!(f, "\"{}\"", escape_string(s)),
            Literal::Num(n) => write!(f, "{n}"),
            Literal::Bool(true) => write!(f, "true"),
            Literal::Bool(false) => write!(f, "false"),
            Literal::Null => write!(f, "null"),
        }
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments().iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            // The head must be a plain identifier; later segments fall back
            // to their quoted form when they would not re-lex as one
            if i == 0 || is_plain_segment(segment) {
                f.write_str(segment)?;
            } else {
                write!(f, "\"{}\"", escape_string(segment))?;
            }
        }
        Ok(())
    }
}

fn is_plain_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    head_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && !is_reserved_word(segment)
}

impl Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        })
    }
}

impl Display for TextOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.func_name())
    }
}

impl Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.func_name())
    }
}

impl Display for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============ Surface tree ============

impl Display for SurfaceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceExpr::Path(path) => write!(f, "{path}"),
            SurfaceExpr::Literal(lit) => write!(f, "{lit}"),
            SurfaceExpr::Logical(left, op, right) => {
                // Parenthesize children whose printed form would re-bind
                let left_parens = matches!(
                    left.as_ref(),
                    SurfaceExpr::Logical(_, child_op, _) if binds_looser(*child_op, *op)
                );
                let right_parens = matches!(
                    right.as_ref(),
                    SurfaceExpr::Logical(_, child_op, _) if !binds_tighter(*child_op, *op)
                );
                if left_parens {
                    write!(f, "({left})")?;
                } else {
                    write!(f, "{left}")?;
                }
                write!(f, " {op} ")?;
                if right_parens {
                    write!(f, "({right})")
                } else {
                    write!(f, "{right}")
                }
            }
            SurfaceExpr::Not(inner) => {
                if matches!(inner.as_ref(), SurfaceExpr::Logical(..)) {
                    write!(f, "NOT ({inner})")
                } else {
                    write!(f, "NOT {inner}")
                }
            }
            SurfaceExpr::Comparison { path, op, value } => write!(f, "{path} {op} {value}"),
            SurfaceExpr::Shorthand { path, rhs } => write!(f, "{path}: {rhs}"),
            SurfaceExpr::Call { func, args } => {
                write!(f, "{func}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            SurfaceExpr::Group(inner) => write!(f, "({inner})"),
        }
    }
}

fn binds_tighter(child: LogicalOp, parent: LogicalOp) -> bool {
    child == LogicalOp::And && parent == LogicalOp::Or
}

fn binds_looser(child: LogicalOp, parent: LogicalOp) -> bool {
    child == LogicalOp::Or && parent == LogicalOp::And
}

impl Display for ShorthandRhs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShorthandRhs::Literal(lit) => write!(f, "{lit}"),
            ShorthandRhs::Comparison { op, value } => write!(f, "{op} {value}"),
            ShorthandRhs::ValueList { items, combinator } => {
                let separator = match combinator {
                    Some(op) => format!(" {op} "),
                    None => ", ".to_string(),
                };
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(&separator)?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl Display for ListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListItem::Literal(lit) => write!(f, "{lit}"),
            ListItem::Comparison { op, value } => write!(f, "{op} {value}"),
        }
    }
}

// ============ Canonical tree ============

impl Display for CoreExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreExpr::And(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" AND ")?;
                    }
                    // An Or child must keep its grouping under AND
                    if matches!(child, CoreExpr::Or(_)) {
                        write!(f, "({child})")?;
                    } else {
                        write!(f, "{child}")?;
                    }
                }
                Ok(())
            }
            CoreExpr::Or(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" OR ")?;
                    }
                    write!(f, "{child}")?;
                }
                Ok(())
            }
            CoreExpr::Not(inner) => {
                if matches!(inner.as_ref(), CoreExpr::And(_) | CoreExpr::Or(_)) {
                    write!(f, "NOT ({inner})")
                } else {
                    write!(f, "NOT {inner}")
                }
            }
            CoreExpr::Comparison { path, op, value } => write!(f, "{path} {op} {value}"),
            CoreExpr::Text { path, op, needle } => {
                write!(f, "{op}({path}, \"{}\")", escape_string(needle))
            }
            CoreExpr::Quantified {
                quantifier,
                path,
                predicate,
            } => write!(f, "{quantifier}({path}, {predicate})"),
        }
    }
}

// ============ String escaping ============

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{000B}' => out.push_str("\\v"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04X}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

// ============ Sanity tests ============
