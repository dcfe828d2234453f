//! YAML ⇄ `Value` conversion.

use cl_value::{Entry, Value};

use crate::error::{IngestError, Result};

pub fn from_yaml(text: &str) -> Result<Value> {
    let parsed: serde_yaml::Value = serde_yaml::from_str(text)?;
    Ok(yaml_to_value(&parsed))
}

pub fn to_yaml(value: &Value) -> Result<String> {
    let native = value.to_native().ok_or_else(|| IngestError::NotRepresentable {
        format: "YAML",
        message: format!("{:?} has no concrete native projection", value.kind()),
    })?;
    let yaml_value = native_to_yaml(&native);
    Ok(serde_yaml::to_string(&yaml_value)?)
}

fn yaml_to_value(v: &serde_yaml::Value) -> Value {
    match v {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(*b),
        serde_yaml::Value::Number(n) => Value::Number(yaml_number_to_bigdecimal(n)),
        serde_yaml::Value::String(s) => Value::string(s.clone()),
        serde_yaml::Value::Sequence(items) => Value::Array(items.iter().map(yaml_to_value).collect()),
        serde_yaml::Value::Mapping(map) => Value::Object(
            map.iter()
                .filter_map(|(k, v)| k.as_str().map(|key| Entry::new(key, yaml_to_value(v))))
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => yaml_to_value(&tagged.value),
    }
}

fn yaml_number_to_bigdecimal(n: &serde_yaml::Number) -> bigdecimal::BigDecimal {
    n.to_string().parse().expect("YAML number is always valid decimal text")
}

fn native_to_yaml(v: &cl_value::NativeValue) -> serde_yaml::Value {
    use cl_value::NativeValue as N;
    match v {
        N::Null => serde_yaml::Value::Null,
        N::Bool(b) => serde_yaml::Value::Bool(*b),
        N::Number(n) => serde_yaml::Value::Number(bigdecimal_to_yaml_number(n)),
        N::String(s) => serde_yaml::Value::String(s.clone()),
        N::Array(items) => serde_yaml::Value::Sequence(items.iter().map(native_to_yaml).collect()),
        N::Object(entries) => serde_yaml::Value::Mapping(
            entries
                .iter()
                .map(|(k, v)| (serde_yaml::Value::String(k.clone()), native_to_yaml(v)))
                .collect(),
        ),
    }
}

fn bigdecimal_to_yaml_number(n: &bigdecimal::BigDecimal) -> serde_yaml::Number {
    match num_traits::ToPrimitive::to_i64(n) {
        Some(i) if bigdecimal::BigDecimal::from(i) == *n => i.into(),
        _ => num_traits::ToPrimitive::to_f64(n).unwrap_or(0.0).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_simple_mapping() {
        let value = from_yaml("host: localhost\nport: 8080\n").unwrap();
        assert_eq!(value.lookup("host"), Some(&Value::string("localhost")));
        assert_eq!(value.lookup("port"), Some(&Value::Number(8080.into())));

        let back = to_yaml(&value).unwrap();
        assert!(back.contains("host: localhost"));
        assert!(back.contains("port: 8080"));
    }
}
