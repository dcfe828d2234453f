//! Pretty-printer from `cl_value::Value` back to CL source text.
//!
//! There's no CST here to normalize through: `cl_value::Value` carries
//! no separator or span metadata, so there's nothing to preserve from an
//! original document. Formatting is always the same house style (see
//! [`writer::Writer`]).

mod scalar;
mod value_format;
mod writer;

pub use value_format::{format_expr, format_value};
