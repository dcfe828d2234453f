//! Evaluation errors (spec §6.4, §7).

use cl_tokenizer::Span;
use cl_value::{Kind, ValueError};
use std::fmt;

/// The typed error taxonomy surfaced by evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalErrorKind {
    #[error("path not found: {key}")]
    PathNotFound { key: String },
    #[error("unknown field `{key}`")]
    UnknownField { key: String },
    #[error("missing required keys: {}", .keys.join(", "))]
    MissingRequiredKeys { keys: Vec<String> },
    #[error("key `{key}` is undefined")]
    KeyUndefined { key: String },
    #[error("unmatched constraint: {message}")]
    UnmatchedConstraint { message: String },
    #[error("cannot merge {left} with {right}")]
    MergeKindMismatch { left: Kind, right: Kind },
    #[error("value is not callable")]
    CallNotCallable,
    #[error("call depth exceeded (max 100)")]
    CallDepthExceeded,
    #[error("context is closed")]
    ContextCancelled,
    #[error("path exceeds 500 characters")]
    PathTooDeep,
    #[error("computed key must evaluate to a string")]
    ExpectedStringKey,
    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Map a `ValueError` onto the closest-matching `EvalErrorKind` variant,
/// so merge/constraint failures bubbling up from `cl-value` slot into the
/// same flat taxonomy as scope/call errors (spec §6.4).
pub fn from_value_error(e: ValueError) -> EvalErrorKind {
    match e {
        ValueError::UnknownField { key } => EvalErrorKind::UnknownField { key },
        ValueError::MissingRequiredKeys { keys } => EvalErrorKind::MissingRequiredKeys { keys },
        ValueError::UnmatchedConstraint { message } => EvalErrorKind::UnmatchedConstraint { message },
        ValueError::MergeKindMismatch { left, right } => EvalErrorKind::MergeKindMismatch { left, right },
        ValueError::NotCallable { .. } => EvalErrorKind::CallNotCallable,
        other => EvalErrorKind::Value(other),
    }
}

/// An evaluation error with source position and cause chain (spec §7).
#[derive(Debug, Clone, PartialEq)]
pub struct EvalError {
    pub pos: Option<Span>,
    pub kind: EvalErrorKind,
    pub source: Option<Box<EvalError>>,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, pos: Option<Span>) -> Self {
        Self {
            pos,
            kind,
            source: None,
        }
    }

    pub fn wrap(kind: EvalErrorKind, pos: Option<Span>, cause: EvalError) -> Self {
        Self {
            pos,
            kind,
            source: Some(Box::new(cause)),
        }
    }

    pub fn from_value(e: ValueError, pos: Option<Span>) -> Self {
        Self::new(from_value_error(e), pos)
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pos {
            Some(pos) => write!(f, "{} at {}..{}", self.kind, pos.start, pos.end),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for EvalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

pub type EvalResult<T> = Result<T, EvalError>;
