//! The closed kind enumeration.

use std::fmt;

/// A value's kind tag. Closed enumeration per the value model: every
/// evaluation result belongs to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
    Func,
    Schema,
    Undefined,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
            Kind::Func => "func",
            Kind::Schema => "schema",
            Kind::Undefined => "undefined",
        };
        f.write_str(s)
    }
}

impl Kind {
    /// A scalar kind is merged by replacement rather than recursion.
    pub fn is_simple(&self) -> bool {
        matches!(self, Kind::Null | Kind::Bool | Kind::Number | Kind::String)
    }
}
