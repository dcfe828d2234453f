//! JSON ⇄ `Value` conversion.

use cl_value::{Entry, Value};

use crate::error::{IngestError, Result};

pub fn from_json(text: &str) -> Result<Value> {
    let parsed: serde_json::Value = serde_json::from_str(text)?;
    Ok(json_to_value(&parsed))
}

pub fn to_json(value: &Value) -> Result<serde_json::Value> {
    let native = value.to_native().ok_or_else(|| IngestError::NotRepresentable {
        format: "JSON",
        message: format!("{:?} has no concrete native projection", value.kind()),
    })?;
    Ok(native_to_json(&native))
}

fn json_to_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(json_number_to_bigdecimal(n)),
        serde_json::Value::String(s) => Value::string(s.clone()),
        serde_json::Value::Array(items) => Value::Array(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(map) => {
            Value::Object(map.iter().map(|(k, v)| Entry::new(k.clone(), json_to_value(v))).collect())
        }
    }
}

fn json_number_to_bigdecimal(n: &serde_json::Number) -> bigdecimal::BigDecimal {
    n.to_string().parse().expect("JSON number is always valid decimal text")
}

fn native_to_json(v: &cl_value::NativeValue) -> serde_json::Value {
    use cl_value::NativeValue as N;
    match v {
        N::Null => serde_json::Value::Null,
        N::Bool(b) => serde_json::Value::Bool(*b),
        N::Number(n) => bigdecimal_to_json_number(n),
        N::String(s) => serde_json::Value::String(s.clone()),
        N::Array(items) => serde_json::Value::Array(items.iter().map(native_to_json).collect()),
        N::Object(entries) => {
            serde_json::Value::Object(entries.iter().map(|(k, v)| (k.clone(), native_to_json(v))).collect())
        }
    }
}

fn bigdecimal_to_json_number(n: &bigdecimal::BigDecimal) -> serde_json::Value {
    match serde_json::Number::from_f64(num_traits::ToPrimitive::to_f64(n).unwrap_or(0.0)) {
        Some(num) => serde_json::Value::Number(num),
        None => serde_json::Value::String(n.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_simple_object() {
        let value = from_json(r#"{"host": "localhost", "port": 8080, "tags": [1, 2]}"#).unwrap();
        assert_eq!(value.lookup("host"), Some(&Value::string("localhost")));
        assert_eq!(value.lookup("port"), Some(&Value::Number(8080.into())));

        let back = to_json(&value).unwrap();
        assert_eq!(back["host"], serde_json::json!("localhost"));
        assert_eq!(back["port"], serde_json::json!(8080.0));
    }

    #[test]
    fn schema_values_are_not_json_representable() {
        let schema = Value::Schema(cl_value::SchemaValue::Type(Box::new(cl_value::TypeSchema::new(
            cl_value::Kind::Number,
        ))));
        assert!(to_json(&schema).is_err());
    }
}
