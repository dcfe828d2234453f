//! Tokenizer for the CL configuration language.
//!
//! Splits source text into a flat stream of [`Token`]s. Whitespace and
//! line comments are emitted as trivia tokens rather than dropped, so
//! that downstream consumers (the parser's doc-comment attachment,
//! formatters) can recover exact source layout.

mod span;
pub use span::Span;

mod token;
pub use token::{Token, TokenKind};

mod tokenizer;
pub use tokenizer::Tokenizer;
