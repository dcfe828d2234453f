//! Errors raised by the value and schema algebra.

use crate::kind::Kind;

/// An error raised by a value or schema operation. `cl-eval` wraps these
/// in `EvalError` to attach a source position and cause chain.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("cannot merge {left} with {right}")]
    MergeKindMismatch { left: Kind, right: Kind },

    #[error("unknown field `{key}`")]
    UnknownField { key: String },

    #[error("missing required keys: {}", .keys.join(", "))]
    MissingRequiredKeys { keys: Vec<String> },

    #[error("value does not satisfy constraint: {message}")]
    UnmatchedConstraint { message: String },

    #[error("invalid regular expression `{pattern}`: {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("operator `{op}` requires {expected}, found {found}")]
    OperatorKindMismatch {
        op: &'static str,
        expected: &'static str,
        found: Kind,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("value is not callable (kind {kind})")]
    NotCallable { kind: Kind },

    #[error("{message}")]
    Contract { message: String },
}
