//! Property tests for the invariants in spec §8: merge identity, merge
//! associativity over objects, and schema validation idempotence.

use bigdecimal::BigDecimal;
use cl_value::{merge, Entry, Kind, TypeSchema, Value};
use proptest::prelude::*;

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| Value::Number(BigDecimal::from(n))),
        "[a-z]{0,8}".prop_map(Value::string),
    ]
}

/// A small object over a fixed key set, values restricted to scalars so
/// recursive merges at shared keys stay well-defined (scalar merge is
/// always "right wins", never a kind clash).
fn arb_object() -> impl Strategy<Value = Value> {
    let keys = vec!["a", "b", "c"];
    proptest::collection::vec(arb_scalar(), keys.len()).prop_map(move |values| {
        Value::Object(
            keys.iter()
                .zip(values)
                .map(|(k, v)| Entry::new(*k, v))
                .collect(),
        )
    })
}

proptest! {
    #[test]
    fn merge_identity(v in arb_scalar()) {
        prop_assert_eq!(merge(&Value::Null, &v).unwrap(), v.clone());
        prop_assert_eq!(merge(&v, &Value::Null).unwrap(), v);
    }

    #[test]
    fn merge_associativity_on_objects(a in arb_object(), b in arb_object(), c in arb_object()) {
        let ab_c = merge(&merge(&a, &b).unwrap(), &c).unwrap();
        let a_bc = merge(&a, &merge(&b, &c).unwrap()).unwrap();
        prop_assert!(ab_c.to_native() == a_bc.to_native());
    }

    #[test]
    fn schema_validation_is_idempotent(n in any::<i32>()) {
        let schema = Value::Schema(cl_value::SchemaValue::Type(Box::new(TypeSchema::new(Kind::Number))));
        let value = Value::Number(BigDecimal::from(n));
        let once = merge(&schema, &value).unwrap();
        let twice = merge(&schema, &once).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn key_ordering_is_preserved_with_recursive_merge_at_duplicates(x in any::<i32>(), y in any::<i32>()) {
        // struct { a: x, b: 1, a: y } -> keys [a, b] in this order, with a's
        // value the scalar-merge ("right wins") of x and y.
        let left = Value::Object(vec![
            Entry::new("a", Value::Number(BigDecimal::from(x))),
            Entry::new("b", Value::Number(BigDecimal::from(1))),
        ]);
        let right = Value::Object(vec![Entry::new("a", Value::Number(BigDecimal::from(y)))]);
        let merged = merge(&left, &right).unwrap();
        let entries = merged.as_object().unwrap();
        prop_assert_eq!(entries[0].key.as_str(), "a");
        prop_assert_eq!(entries[1].key.as_str(), "b");
        prop_assert_eq!(&entries[0].value, &Value::Number(BigDecimal::from(y)));
    }
}

#[test]
fn schema_defaults_fill_missing_required_keys() {
    use cl_value::{Contract, FieldDesc, ObjectSchemaValue, SchemaContext, SchemaValue, ValueError};
    use std::sync::Arc;

    #[derive(Debug)]
    struct OneRequiredKey;
    impl Contract for OneRequiredKey {
        fn path(&self) -> Option<String> {
            None
        }
        fn description(&self) -> Option<String> {
            None
        }
        fn allow_new_keys(&self) -> bool {
            false
        }
        fn required_keys(&self) -> Result<Vec<String>, ValueError> {
            Ok(vec!["k".to_string()])
        }
        fn lookup_value(&self, key: &str) -> Result<Option<Value>, ValueError> {
            if key == "k" {
                Ok(Some(Value::Schema(SchemaValue::Type(Box::new(
                    TypeSchema::new(Kind::Number).with_default(Value::Number(BigDecimal::from(42))),
                )))))
            } else {
                Ok(None)
            }
        }
        fn fields(&self, _ctx: &SchemaContext) -> Result<Vec<FieldDesc>, ValueError> {
            Ok(Vec::new())
        }
    }

    let schema = Value::Schema(SchemaValue::Object(ObjectSchemaValue::new(Arc::new(OneRequiredKey))));
    let empty = Value::Object(Vec::new());
    let result = merge(&schema, &empty).unwrap();
    assert_eq!(result.lookup("k"), Some(&Value::Number(BigDecimal::from(42))));

    let supplied = Value::Object(vec![Entry::new("k", Value::Number(BigDecimal::from(7)))]);
    let result = merge(&schema, &supplied).unwrap();
    assert_eq!(result.lookup("k"), Some(&Value::Number(BigDecimal::from(7))));
}
