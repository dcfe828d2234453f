//! The `Value` type: CL's unified runtime representation of concrete data,
//! schemas, functions, and the cycle-breaking `undefined` sentinel.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use cl_tokenizer::Span;
use regex::Regex;

use crate::error::ValueError;
use crate::kind::Kind;
use crate::schema::{Caller, SchemaValue};

/// One `(key, value)` entry in an object, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    pub value: Value,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// A positional or named argument passed to a call.
#[derive(Debug, Clone)]
pub struct CallArgument {
    pub value: Value,
    pub is_positional: bool,
    /// The name under which this argument was supplied, for named args.
    pub key: Option<String>,
}

/// CL's unified value: concrete data, schema, function, or `undefined`.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(BigDecimal),
    String(String),
    Array(Vec<Value>),
    Object(Vec<Entry>),
    Func(Arc<dyn Caller>),
    Schema(SchemaValue),
    /// A cycle sentinel carrying the source position of the re-entrant lookup.
    Undefined(Option<Span>),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Array(items) => f.debug_list().entries(items).finish(),
            Value::Object(entries) => f.debug_map().entries(entries.iter().map(|e| (&e.key, &e.value))).finish(),
            Value::Func(_) => write!(f, "Func(..)"),
            Value::Schema(s) => write!(f, "Schema({s:?})"),
            Value::Undefined(pos) => write!(f, "Undefined({pos:?})"),
        }
    }
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(items)
    }

    pub fn object(entries: Vec<Entry>) -> Self {
        Value::Object(entries)
    }

    /// This value's kind tag.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
            Value::Func(_) => Kind::Func,
            Value::Schema(_) => Kind::Schema,
            Value::Undefined(_) => Kind::Undefined,
        }
    }

    /// The kind this value validates as, if used as a schema. For plain
    /// values this is simply `kind()`; for `Value::Schema` it is the
    /// schema's target kind.
    pub fn target_kind(&self) -> Kind {
        match self {
            Value::Schema(s) => s.target_kind(),
            other => other.kind(),
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&BigDecimal> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[Entry]> {
        match self {
            Value::Object(entries) => Some(entries),
            _ => None,
        }
    }

    /// `object.lookup(key)` — iterate entries in order, return the first match.
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(entries) => entries.iter().find(|e| e.key == key).map(|e| &e.value),
            _ => None,
        }
    }

    /// Keys in insertion order. Only meaningful for objects.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Value::Object(entries) => entries.iter().map(|e| e.key.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// `array.index(n)`: `0 <= n < len` returns the element; out-of-range
    /// is a clean miss, not an error.
    pub fn index(&self, n: i64) -> Option<&Value> {
        match self {
            Value::Array(items) => {
                if n < 0 {
                    return None;
                }
                items.get(n as usize)
            }
            _ => None,
        }
    }

    /// `array.slice(a, b)`: invalid bounds (`a > b`, negative, past end)
    /// return `None` rather than erroring.
    pub fn slice(&self, start: Option<i64>, end: Option<i64>) -> Option<Value> {
        match self {
            Value::Array(items) => {
                let len = items.len() as i64;
                let a = start.unwrap_or(0);
                let b = end.unwrap_or(len);
                if a < 0 || b < 0 || a > b || b > len {
                    return None;
                }
                Some(Value::Array(items[a as usize..b as usize].to_vec()))
            }
            _ => None,
        }
    }

    /// Structural equality used by `==`, `!=`, and `Eq`/`Ne` constraints.
    pub fn value_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.value_eq(y))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|e| b.iter().any(|f| f.key == e.key && f.value.value_eq(&e.value)))
            }
            _ => false,
        }
    }

    /// Numeric ordering for `<`, `<=`, `>`, `>=`.
    pub fn compare(&self, other: &Value) -> Result<Ordering, ValueError> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(a.cmp(b)),
            (a, _) => Err(ValueError::OperatorKindMismatch {
                op: "<",
                expected: "number",
                found: a.kind(),
            }),
        }
    }

    pub fn add(&self, other: &Value) -> Result<Value, ValueError> {
        numeric_op(self, other, "+", |a, b| Ok(a + b))
    }

    pub fn sub(&self, other: &Value) -> Result<Value, ValueError> {
        numeric_op(self, other, "-", |a, b| Ok(a - b))
    }

    pub fn mul(&self, other: &Value) -> Result<Value, ValueError> {
        numeric_op(self, other, "*", |a, b| Ok(a * b))
    }

    pub fn div(&self, other: &Value) -> Result<Value, ValueError> {
        numeric_op(self, other, "/", |a, b| {
            if b == BigDecimal::from(0) {
                Err(ValueError::DivisionByZero)
            } else {
                Ok(a / b)
            }
        })
    }

    pub fn and(&self, other: &Value) -> Result<Value, ValueError> {
        let a = self.truthy()?;
        let b = other.truthy()?;
        Ok(Value::Bool(a && b))
    }

    pub fn or(&self, other: &Value) -> Result<Value, ValueError> {
        let a = self.truthy()?;
        let b = other.truthy()?;
        Ok(Value::Bool(a || b))
    }

    /// `&&`/`||` coerce to bool.
    pub fn truthy(&self) -> Result<bool, ValueError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(ValueError::OperatorKindMismatch {
                op: "&&/||",
                expected: "bool",
                found: other.kind(),
            }),
        }
    }

    pub fn negate(&self) -> Result<Value, ValueError> {
        match self {
            Value::Number(n) => Ok(Value::Number(-n.clone())),
            other => Err(ValueError::OperatorKindMismatch {
                op: "-",
                expected: "number",
                found: other.kind(),
            }),
        }
    }

    pub fn not(&self) -> Result<Value, ValueError> {
        match self {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(ValueError::OperatorKindMismatch {
                op: "!",
                expected: "bool",
                found: other.kind(),
            }),
        }
    }

    /// `=~`/`!~`: compile `self` as an anchored, full-string regular
    /// expression and test it against `pattern`'s right-hand string.
    pub fn regex_match(&self, pattern: &Value) -> Result<bool, ValueError> {
        let haystack = self.as_str().ok_or_else(|| ValueError::OperatorKindMismatch {
            op: "=~",
            expected: "string",
            found: self.kind(),
        })?;
        let pattern = pattern.as_str().ok_or_else(|| ValueError::OperatorKindMismatch {
            op: "=~",
            expected: "string",
            found: pattern.kind(),
        })?;
        Ok(anchored_regex(pattern)?.is_match(haystack))
    }

    /// Project to plain host data: maps, lists, numbers, bools, strings,
    /// null. `func` and `schema` members are elided from object/array
    /// projections — see `NativeValue` in spec §3.2.
    pub fn to_native(&self) -> Option<NativeValue> {
        match self {
            Value::Null => Some(NativeValue::Null),
            Value::Bool(b) => Some(NativeValue::Bool(*b)),
            Value::Number(n) => Some(NativeValue::Number(n.clone())),
            Value::String(s) => Some(NativeValue::String(s.clone())),
            Value::Array(items) => Some(NativeValue::Array(
                items.iter().filter_map(Value::to_native).collect(),
            )),
            Value::Object(entries) => Some(NativeValue::Object(
                entries
                    .iter()
                    .filter_map(|e| e.value.to_native().map(|v| (e.key.clone(), v)))
                    .collect(),
            )),
            Value::Func(_) | Value::Schema(_) | Value::Undefined(_) => None,
        }
    }
}

fn anchored_regex(pattern: &str) -> Result<Regex, ValueError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|e| ValueError::InvalidRegex {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

fn numeric_op(
    a: &Value,
    b: &Value,
    op: &'static str,
    f: impl FnOnce(BigDecimal, BigDecimal) -> Result<BigDecimal, ValueError>,
) -> Result<Value, ValueError> {
    let (an, bn) = match (a, b) {
        (Value::Number(x), Value::Number(y)) => (x.clone(), y.clone()),
        (Value::Number(_), other) => {
            return Err(ValueError::OperatorKindMismatch {
                op,
                expected: "number",
                found: other.kind(),
            })
        }
        (other, _) => {
            return Err(ValueError::OperatorKindMismatch {
                op,
                expected: "number",
                found: other.kind(),
            })
        }
    };
    f(an, bn).map(Value::Number)
}

/// Plain host-data projection of a `Value`, eliding `func`/`schema`
/// members. Used as the boundary representation for JSON/YAML ingest and
/// CLI output.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Null,
    Bool(bool),
    Number(BigDecimal),
    String(String),
    Array(Vec<NativeValue>),
    Object(Vec<(String, NativeValue)>),
}

impl NativeValue {
    /// Lift a plain host value back into the `Value` algebra as a
    /// concrete value (never a schema).
    pub fn into_value(self) -> Value {
        match self {
            NativeValue::Null => Value::Null,
            NativeValue::Bool(b) => Value::Bool(b),
            NativeValue::Number(n) => Value::Number(n),
            NativeValue::String(s) => Value::String(s),
            NativeValue::Array(items) => Value::Array(items.into_iter().map(Self::into_value).collect()),
            NativeValue::Object(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| Entry::new(k, v.into_value()))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(s: &str) -> Value {
        Value::Number(s.parse().unwrap())
    }

    #[test]
    fn null_is_identity_hole() {
        assert!(Value::Null.value_eq(&Value::Null));
    }

    #[test]
    fn array_index_out_of_range_is_clean_miss() {
        let arr = Value::array(vec![num("1"), num("2")]);
        assert!(arr.index(5).is_none());
        assert!(arr.index(-1).is_none());
        assert_eq!(arr.index(1), Some(&num("2")));
    }

    #[test]
    fn slice_rejects_invalid_bounds() {
        let arr = Value::array(vec![num("1"), num("2"), num("3")]);
        assert!(arr.slice(Some(2), Some(1)).is_none());
        assert!(arr.slice(Some(0), Some(10)).is_none());
        assert_eq!(
            arr.slice(Some(1), Some(3)),
            Some(Value::array(vec![num("2"), num("3")]))
        );
    }

    #[test]
    fn arithmetic_requires_numbers() {
        assert!(Value::Bool(true).add(&num("1")).is_err());
        assert_eq!(num("1").add(&num("2")).unwrap(), num("3"));
    }

    #[test]
    fn division_by_zero_errors() {
        assert!(matches!(
            num("1").div(&num("0")),
            Err(ValueError::DivisionByZero)
        ));
    }

    #[test]
    fn regex_match_is_full_string_anchored() {
        assert!(Value::string("hello")
            .regex_match(&Value::string("[a-z]+"))
            .unwrap());
        assert!(!Value::string("Hello")
            .regex_match(&Value::string("[a-z]+"))
            .unwrap());
    }

    #[test]
    fn object_equality_is_order_independent() {
        let a = Value::object(vec![Entry::new("a", num("1")), Entry::new("b", num("2"))]);
        let b = Value::object(vec![Entry::new("b", num("2")), Entry::new("a", num("1"))]);
        assert!(a.value_eq(&b));
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.value_eq(other)
    }
}
