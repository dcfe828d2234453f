//! The root scope: built-in schema type names available to every program,
//! the way CUE/AML predeclared identifiers work.

use cl_value::{Kind, SchemaValue, TypeSchema, Value};

use crate::scope::{CallContext, Scope};

fn type_name(kind: Kind) -> (String, Value) {
    let name = match kind {
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
    (
        name.to_string(),
        Value::Schema(SchemaValue::Type(Box::new(TypeSchema::new(kind)))),
    )
}

/// A fresh root scope: a new call context plus the built-in type-name
/// bindings (`string`, `number`, `bool`, `array`, `object`).
pub fn root_scope() -> Scope {
    let builtins = vec![
        type_name(Kind::Bool),
        type_name(Kind::Number),
        type_name(Kind::String),
        type_name(Kind::Array),
        type_name(Kind::Object),
    ];
    Scope::root(CallContext::new(), builtins)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_scope_resolves_builtin_type_names() {
        let scope = root_scope();
        assert!(matches!(
            scope.get("string").unwrap(),
            Some(Value::Schema(SchemaValue::Type(_)))
        ));
        assert_eq!(scope.get("nope").unwrap(), None);
    }
}
