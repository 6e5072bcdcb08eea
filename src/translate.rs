//! Translating canonical trees into backend query languages
//!
//! A translator consumes the same canonical invariants the evaluator does
//! and raises `E_ADAPTER_UNSUPPORTED_FEATURE` for anything its backend
//! cannot express. The SQL translator below is the reference
//! implementation; production translators live outside this crate.

use crate::ast::core::Expr;
use crate::ast::{CmpOp, Literal, Path, TextOp};
use crate::error::AdapterError;

/// A translator from canonical trees to some backend query representation.
pub trait Translate {
    type Output;

    fn translate(&self, expr: &Expr) -> Result<Self::Output, AdapterError>;
}

/// Reference translator emitting an ANSI-ish SQL `WHERE` fragment.
///
/// Known discrepancies with the in-process evaluator, accepted by design:
/// case-insensitive matching is approximated with `LOWER(..)`, which ignores
/// the locale-specific lowercase rules the evaluator applies, and diacritic
/// folding has no rendering at all. Quantifiers require schema knowledge
/// this translator does not have and are rejected.
#[derive(Debug, Clone, Default)]
pub struct SqlTranslator {
    ignore_case: bool,
}

const TARGET: &str = "sql";

impl SqlTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ignore_case(mut self, on: bool) -> Self {
        self.ignore_case = on;
        self
    }

    fn render(&self, expr: &Expr, out: &mut String) -> Result<(), AdapterError> {
        match expr {
            Expr::And(children) | Expr::Or(children) => {
                let separator = if matches!(expr, Expr::And(_)) {
                    " AND "
                } else {
                    " OR "
                };
                out.push('(');
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        out.push_str(separator);
                    }
                    self.render(child, out)?;
                }
                out.push(')');
                Ok(())
            }
            Expr::Not(inner) => {
                out.push_str("NOT (");
                self.render(inner, out)?;
                out.push(')');
                Ok(())
            }
            Expr::Comparison { path, op, value } => self.render_comparison(path, *op, value, out),
            Expr::Text { path, op, needle } => self.render_text(path, *op, needle, out),
            Expr::Quantified { quantifier, .. } => Err(AdapterError::unsupported_feature(
                TARGET,
                format!("quantifier:{}", quantifier.func_name()),
                format!(
                    "Quantifier '{}' has no SQL rendering without sequence schema knowledge.",
                    quantifier.func_name()
                ),
            )),
        }
    }

    fn render_comparison(
        &self,
        path: &Path,
        op: CmpOp,
        value: &Literal,
        out: &mut String,
    ) -> Result<(), AdapterError> {
        let column = column_name(path)?;
        match (op, value) {
            (CmpOp::Eq, Literal::Null) => {
                out.push_str(&format!("{column} IS NULL"));
                Ok(())
            }
            (CmpOp::Neq, Literal::Null) => {
                out.push_str(&format!("{column} IS NOT NULL"));
                Ok(())
            }
            (op, Literal::Null) => Err(AdapterError::unsupported_feature(
                TARGET,
                "null-ordering",
                format!("Ordering comparison '{}' against null has no SQL rendering.", op.name()),
            )),
            (op, Literal::Bool(_)) if op.is_ordering() => Err(AdapterError::unsupported_feature(
                TARGET,
                "boolean-ordering",
                format!(
                    "Ordering comparison '{}' against a boolean has no SQL rendering.",
                    op.name()
                ),
            )),
            (op, value) => {
                let symbol = match op {
                    CmpOp::Eq => "=",
                    CmpOp::Neq => "<>",
                    CmpOp::Gt => ">",
                    CmpOp::Gte => ">=",
                    CmpOp::Lt => "<",
                    CmpOp::Lte => "<=",
                };
                out.push_str(&format!("{column} {symbol} {}", sql_literal(value)));
                Ok(())
            }
        }
    }

    fn render_text(
        &self,
        path: &Path,
        op: TextOp,
        needle: &str,
        out: &mut String,
    ) -> Result<(), AdapterError> {
        let column = column_name(path)?;
        let escaped = escape_like(needle);
        let pattern = match op {
            TextOp::Contains => format!("%{escaped}%"),
            TextOp::StartsWith => format!("{escaped}%"),
            TextOp::EndsWith => format!("%{escaped}"),
        };
        if self.ignore_case {
            out.push_str(&format!(
                "LOWER({column}) LIKE '{}' ESCAPE '\\'",
                escape_sql_str(&pattern.to_lowercase())
            ));
        } else {
            out.push_str(&format!(
                "{column} LIKE '{}' ESCAPE '\\'",
                escape_sql_str(&pattern)
            ));
        }
        Ok(())
    }
}

impl Translate for SqlTranslator {
    type Output = String;

    fn translate(&self, expr: &Expr) -> Result<String, AdapterError> {
        let mut out = String::new();
        self.render(expr, &mut out)?;
        Ok(out)
    }
}

fn column_name(path: &Path) -> Result<String, AdapterError> {
    // Canonical leaves carry single-segment paths; anything else means the
    // tree was built by hand
    if path.len() != 1 {
        return Err(AdapterError::generic(
            TARGET,
            format!("Multi-segment path '{path}' cannot name a SQL column."),
        ));
    }
    Ok(format!("\"{}\"", path.head().replace('"', "\"\"")))
}

fn sql_literal(value: &Literal) -> String {
    match value {
        Literal::Str(s) => format!("'{}'", escape_sql_str(s)),
        Literal::Num(n) => format!("{n}"),
        Literal::Bool(true) => "TRUE".to_string(),
        Literal::Bool(false) => "FALSE".to_string(),
        Literal::Null => "NULL".to_string(),
    }
}

fn escape_sql_str(s: &str) -> String {
    s.replace('\'', "''")
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// ============ Sanity tests ============

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::normalize::{normalize, NormalizeOptions};
    use crate::parse::parse;

    fn canonical(input: &str) -> Expr {
        let (surface, _) = parse(input).unwrap();
        normalize(&surface, &NormalizeOptions::new()).unwrap()
    }

    #[test]
    fn renders_comparisons_and_connectives() {
        let sql = SqlTranslator::new()
            .translate(&canonical(r#"year > 1990 AND brand = "Bacardi""#))
            .unwrap();
        assert_eq!(sql, r#"("year" > 1990 AND "brand" = 'Bacardi')"#);
    }

    #[test]
    fn renders_null_checks_with_is_null() {
        let sql = SqlTranslator::new().translate(&canonical("archived")).unwrap();
        assert_eq!(sql, r#""archived" IS NOT NULL"#);

        let sql = SqlTranslator::new()
            .translate(&canonical("NOT archived"))
            .unwrap();
        assert_eq!(sql, r#""archived" IS NULL"#);
    }

    #[test]
    fn renders_text_as_like_with_escapes() {
        let sql = SqlTranslator::new()
            .translate(&canonical(r#"name: "50%_off""#))
            .unwrap();
        assert_eq!(sql, r#""name" LIKE '%50\%\_off%' ESCAPE '\'"#);

        let sql = SqlTranslator::new()
            .translate(&canonical(r#"startsWith(name, "O'Hara")"#))
            .unwrap();
        assert_eq!(sql, r#""name" LIKE 'O''Hara%' ESCAPE '\'"#);
    }

    #[test]
    fn ignore_case_lowers_both_sides() {
        let sql = SqlTranslator::new()
            .with_ignore_case(true)
            .translate(&canonical(r#"name: "Gin""#))
            .unwrap();
        assert_eq!(sql, r#"LOWER("name") LIKE '%gin%' ESCAPE '\'"#);
    }

    #[test]
    fn quantifiers_are_unsupported() {
        let err = SqlTranslator::new()
            .translate(&canonical(r#"any(tags, value: "gin")"#))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AdapterUnsupportedFeature);
        assert_eq!(err.target.as_deref(), Some("sql"));
        assert_eq!(err.feature.as_deref(), Some("quantifier:any"));
    }

    #[test]
    fn ordering_against_bool_is_unsupported() {
        let err = SqlTranslator::new()
            .translate(&canonical("flag > true"))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AdapterUnsupportedFeature);
        assert_eq!(err.feature.as_deref(), Some("boolean-ordering"));
    }
}
