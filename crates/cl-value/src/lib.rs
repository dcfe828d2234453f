//! Value and schema algebra for the CL configuration language.
//!
//! This crate has no dependency on the evaluator: `Value::Func` and
//! `SchemaValue::Object` wrap `Caller`/`Contract` trait objects so that
//! `cl-eval` can supply the closures and lazily-evaluated struct contracts
//! without creating a dependency cycle.

mod error;
mod kind;
mod merge;
mod schema;
mod value;

pub use error::ValueError;
pub use kind::Kind;
pub use merge::{describe_field_type, merge};
pub use schema::{
    Caller, Constraint, ConstraintDesc, ConstraintOp, Contract, FieldDesc, FieldType,
    ObjectSchemaValue, SchemaArray, SchemaContext, SchemaObject, SchemaValue, TypeSchema,
};
pub use value::{CallArgument, Entry, NativeValue, Value};
