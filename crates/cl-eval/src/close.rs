//! Closing: collapsing a (possibly still schema-valued) evaluation result
//! into its final concrete form. Struct literals always evaluate to an
//! `ObjectSchema` (spec §4.1 rule 5/7 compose structurally); closing is
//! what resolves that into the concrete document a caller actually wants,
//! by merging each unresolved schema against an empty object and
//! recursing into the result.

use cl_value::{SchemaValue, Value, ValueError};

pub fn close(value: &Value) -> Result<Value, ValueError> {
    match value {
        Value::Schema(SchemaValue::Object(_)) => {
            let resolved = cl_value::merge(value, &Value::Object(Vec::new()))?;
            close(&resolved)
        }
        // A bare `Value::Schema(Type(_))` only reaches `close` through a
        // direct `lookup_value` call that bypasses the usual
        // `merge_object_schema` defaulting fold (e.g. a function's
        // shorthand `return` lookup) — collapse it to its marked default
        // the same way that fold would.
        Value::Schema(SchemaValue::Type(ts)) => match ts.marked_default() {
            Some(default) => close(&default),
            None => Ok(value.clone()),
        },
        Value::Object(entries) => {
            let mut out = Vec::with_capacity(entries.len());
            for e in entries {
                out.push(cl_value::Entry::new(e.key.clone(), close(&e.value)?));
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(close(item)?);
            }
            Ok(Value::Array(out))
        }
        other => Ok(other.clone()),
    }
}
