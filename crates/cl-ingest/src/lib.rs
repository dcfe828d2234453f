//! JSON/YAML conversion helpers for `cl_value::Value` (spec §6.6).
//!
//! These exist purely to make `Value` interoperate with the host
//! ecosystem; a decoded JSON/YAML document is always a plain concrete
//! value, never a `schema` — conversion carries no unification semantics.

mod error;
mod json;
mod yaml;

pub use error::{IngestError, Result};
pub use json::{from_json, to_json};
pub use yaml::{from_yaml, to_yaml};
