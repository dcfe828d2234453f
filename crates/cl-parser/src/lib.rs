//! Recursive-descent parser for the CL configuration language.
//!
//! Produces an [`ast::File`] from source text. Parsing is a pure syntax
//! step: it knows nothing about scopes, merging, or schema mode — that
//! belongs to `cl-eval`'s `Build` step, which walks this tree into an
//! `Expression`/`Field` tree ready for evaluation.

pub mod ast;
mod error;
mod parser;

pub use error::{sanitize_parser_errors, ParseError, ParseErrorKind};
pub use parser::parse;
