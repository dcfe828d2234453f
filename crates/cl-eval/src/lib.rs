//! Evaluator for the CL configuration language: the scope chain, the
//! expression/field tree `Build` produces from `cl_parser`'s AST, structs
//! and functions (the two `cl_value` trait objects this crate supplies),
//! and the top-level `File` entry point.

pub mod build;
pub mod builtin;
pub mod close;
pub mod error;
pub mod expr;
pub mod field;
pub mod file;
pub mod function;
pub mod scope;
pub mod struct_;

pub use close::close;
pub use error::{EvalError, EvalErrorKind, EvalResult};
pub use file::{File, LoadError};
pub use function::{Function, FunctionDefinition};
pub use scope::{CallContext, Scope, ScopeLookup};
pub use struct_::Struct;
