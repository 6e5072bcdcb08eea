//! Error taxonomy shared by every pipeline stage
//!
//! Each stage raises its own error type; all of them carry a stable,
//! machine-matchable [`ErrorCode`] plus a human-readable message whose first
//! sentence starts with the precise cause. Callers match on code for
//! machine-driven handling and on [`ErrorKind`] for grouped handling.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// The pipeline stage (or external translator) an error originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Parse,
    Normalize,
    Evaluation,
    Translator,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Parse => "parse",
            ErrorKind::Normalize => "normalize",
            ErrorKind::Evaluation => "evaluation",
            ErrorKind::Translator => "translator",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable error codes; the string form never changes between releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ParseUnexpectedToken,
    ParseGeneric,
    NormalizeUnsupportedNode,
    NormalizeGeneric,
    EvalTypeMismatch,
    EvalGeneric,
    AdapterUnsupportedFeature,
    AdapterGeneric,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ParseUnexpectedToken => "E_PARSE_UNEXPECTED_TOKEN",
            ErrorCode::ParseGeneric => "E_PARSE_GENERIC",
            ErrorCode::NormalizeUnsupportedNode => "E_NORMALIZE_UNSUPPORTED_NODE",
            ErrorCode::NormalizeGeneric => "E_NORMALIZE_GENERIC",
            ErrorCode::EvalTypeMismatch => "E_EVAL_TYPE_MISMATCH",
            ErrorCode::EvalGeneric => "E_EVAL_GENERIC",
            ErrorCode::AdapterUnsupportedFeature => "E_ADAPTER_UNSUPPORTED_FEATURE",
            ErrorCode::AdapterGeneric => "E_ADAPTER_GENERIC",
        }
    }

    pub const fn kind(self) -> ErrorKind {
        match self {
            ErrorCode::ParseUnexpectedToken | ErrorCode::ParseGeneric => ErrorKind::Parse,
            ErrorCode::NormalizeUnsupportedNode | ErrorCode::NormalizeGeneric => {
                ErrorKind::Normalize
            }
            ErrorCode::EvalTypeMismatch | ErrorCode::EvalGeneric => ErrorKind::Evaluation,
            ErrorCode::AdapterUnsupportedFeature | ErrorCode::AdapterGeneric => {
                ErrorKind::Translator
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Lexing or structural parsing failure.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub code: ErrorCode,
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
    /// The offending lexeme, when one was identified.
    pub lexeme: Option<String>,
}

impl ParseError {
    pub(crate) fn unexpected_token(lexeme: &str, line: usize, column: usize) -> Self {
        Self {
            code: ErrorCode::ParseUnexpectedToken,
            message: format!("Unexpected token '{lexeme}' at {line}:{column}."),
            line: Some(line),
            column: Some(column),
            lexeme: Some(lexeme.to_string()),
        }
    }

    pub(crate) fn generic(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ParseGeneric,
            message: message.into(),
            line: None,
            column: None,
            lexeme: None,
        }
    }

    pub(crate) fn generic_at(
        message: impl Into<String>,
        line: usize,
        column: usize,
        lexeme: Option<String>,
    ) -> Self {
        Self {
            code: ErrorCode::ParseGeneric,
            message: message.into(),
            line: Some(line),
            column: Some(column),
            lexeme,
        }
    }
}

/// Failure rewriting a surface tree into canonical form.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct NormalizeError {
    pub code: ErrorCode,
    pub message: String,
    /// Tag of the node that triggered the error.
    pub node: Option<&'static str>,
}

impl NormalizeError {
    pub(crate) fn generic(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::NormalizeGeneric,
            message: message.into(),
            node: None,
        }
    }

    pub(crate) fn unsupported(node: &'static str, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::NormalizeUnsupportedNode,
            message: message.into(),
            node: Some(node),
        }
    }
}

/// Failure evaluating a canonical tree against a record.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct EvalError {
    pub code: ErrorCode,
    pub message: String,
    /// Canonical operator name (`gt`, `lte`, ...) when one is involved.
    pub operator: Option<&'static str>,
}

impl EvalError {
    pub(crate) fn type_mismatch(operator: &'static str, left: &str, right: &str) -> Self {
        Self {
            code: ErrorCode::EvalTypeMismatch,
            message: format!(
                "Type mismatch for '{operator}': expected number|string, got {left}/{right}."
            ),
            operator: Some(operator),
        }
    }
}

/// Failure translating a canonical tree into a backend query.
///
/// Constructors are public: external translators raise these too.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct AdapterError {
    pub code: ErrorCode,
    pub message: String,
    /// Backend name, e.g. `sql`.
    pub target: Option<String>,
    /// Feature the backend cannot express.
    pub feature: Option<String>,
}

impl AdapterError {
    pub fn unsupported_feature(
        target: impl Into<String>,
        feature: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: ErrorCode::AdapterUnsupportedFeature,
            message: message.into(),
            target: Some(target.into()),
            feature: Some(feature.into()),
        }
    }

    pub fn generic(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::AdapterGeneric,
            message: message.into(),
            target: Some(target.into()),
            feature: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_have_stable_string_forms() {
        assert_eq!(
            ErrorCode::ParseUnexpectedToken.as_str(),
            "E_PARSE_UNEXPECTED_TOKEN"
        );
        assert_eq!(
            ErrorCode::NormalizeUnsupportedNode.as_str(),
            "E_NORMALIZE_UNSUPPORTED_NODE"
        );
        assert_eq!(ErrorCode::EvalTypeMismatch.as_str(), "E_EVAL_TYPE_MISMATCH");
        assert_eq!(
            ErrorCode::AdapterUnsupportedFeature.as_str(),
            "E_ADAPTER_UNSUPPORTED_FEATURE"
        );
    }

    #[test]
    fn codes_map_to_kinds() {
        assert_eq!(ErrorCode::ParseGeneric.kind(), ErrorKind::Parse);
        assert_eq!(ErrorCode::NormalizeGeneric.kind(), ErrorKind::Normalize);
        assert_eq!(ErrorCode::EvalGeneric.kind(), ErrorKind::Evaluation);
        assert_eq!(ErrorCode::AdapterGeneric.kind(), ErrorKind::Translator);
    }

    #[test]
    fn codes_serialize_as_stable_strings() {
        let json = serde_json::to_string(&ErrorCode::EvalTypeMismatch).unwrap();
        assert_eq!(json, "\"E_EVAL_TYPE_MISMATCH\"");
    }

    #[test]
    fn type_mismatch_message_shape() {
        let err = EvalError::type_mismatch("gt", "null", "number");
        assert_eq!(
            err.message,
            "Type mismatch for 'gt': expected number|string, got null/number."
        );
        assert_eq!(err.operator, Some("gt"));
    }
}
