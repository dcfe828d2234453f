//! `Merge` — the central fold that unifies values, schemas, and defaults
//! into a single value (spec §4.1 rules 1-7).

use crate::error::ValueError;
use crate::kind::Kind;
use crate::schema::{FieldDesc, SchemaContext, SchemaValue};
use crate::value::{Entry, Value};

/// Merge `right` into `left`. See spec §4.1 for the full rule set; the
/// short version:
///
/// 1. `null` is the identity on either side.
/// 2. kinds must otherwise match, except `schema ⊕ concrete` (validate),
///    `schema ⊕ schema` of equal target kind (conjunction), and
///    `array-schema ⊕ array` (element-wise validate).
/// 3. `array ⊕ array` concatenates.
/// 4. `object ⊕ object` recurses per shared key, appends the rest.
/// 5. `object-schema ⊕ object` validates and fills in missing defaults.
/// 6. scalars of the same kind: right wins.
/// 7. two object-schemas compose their contracts.
pub fn merge(left: &Value, right: &Value) -> Result<Value, ValueError> {
    match (left, right) {
        (Value::Null, r) => Ok(r.clone()),
        (l, Value::Null) => Ok(l.clone()),

        (Value::Undefined(_), _) => Ok(left.clone()),
        (_, Value::Undefined(_)) => Ok(right.clone()),

        (Value::Schema(SchemaValue::Object(l)), Value::Schema(SchemaValue::Object(r))) => {
            Ok(Value::Schema(SchemaValue::Object(l.merge_contract(r))))
        }

        (Value::Schema(SchemaValue::Type(l)), Value::Schema(SchemaValue::Type(r)))
            if l.kind == r.kind =>
        {
            Ok(Value::Schema(SchemaValue::Type(Box::new(l.and(r)?))))
        }

        (Value::Schema(SchemaValue::Object(os)), Value::Object(entries)) => {
            merge_object_schema(os, entries)
        }
        (Value::Object(entries), Value::Schema(SchemaValue::Object(os))) => {
            merge_object_schema(os, entries)
        }

        (Value::Schema(SchemaValue::Type(ts)), right) if ts.kind == Kind::Array => {
            match right {
                Value::Array(_) => ts.check(right),
                _ => Err(ValueError::MergeKindMismatch {
                    left: Kind::Schema,
                    right: right.kind(),
                }),
            }
        }

        (Value::Schema(SchemaValue::Type(ts)), right) => ts.check(right),

        // A concrete value followed by its own type constraint (`foo: 1`
        // then later `foo: number`) is the same unification as the
        // schema-first order above, just written the other way round.
        (left, Value::Schema(SchemaValue::Type(ts))) if ts.kind == Kind::Array => match left {
            Value::Array(_) => ts.check(left),
            _ => Err(ValueError::MergeKindMismatch {
                left: left.kind(),
                right: Kind::Schema,
            }),
        },
        (left, Value::Schema(SchemaValue::Type(ts))) => ts.check(left),

        (Value::Array(a), Value::Array(b)) => {
            let mut out = a.clone();
            out.extend(b.iter().cloned());
            Ok(Value::Array(out))
        }

        (Value::Object(a), Value::Object(b)) => Ok(Value::Object(merge_objects(a, b)?)),

        (Value::Bool(_), Value::Bool(_))
        | (Value::Number(_), Value::Number(_))
        | (Value::String(_), Value::String(_))
        | (Value::Func(_), Value::Func(_)) => Ok(right.clone()),

        (l, r) => Err(ValueError::MergeKindMismatch {
            left: l.kind(),
            right: r.kind(),
        }),
    }
}

/// `object ⊕ object`: left's entries keep their order; for each right
/// entry, recurse into the existing value at that key (`last.Merge(val)`)
/// or append if the key is new.
///
/// This resolves spec.md's Open Question 1 (the reference source's
/// `val.Merge(val)` self-merge looks like a bug; `last.Merge(val)` is
/// what every other merge path does, so that's what's implemented here).
fn merge_objects(left: &[Entry], right: &[Entry]) -> Result<Vec<Entry>, ValueError> {
    let mut result = left.to_vec();
    for r in right {
        if let Some(existing) = result.iter_mut().find(|e| e.key == r.key) {
            existing.value = merge(&existing.value, &r.value)?;
        } else {
            result.push(r.clone());
        }
    }
    Ok(result)
}

/// `object-schema ⊕ object`: validate each key of `right` against the
/// contract, then fill in defaults for required keys `right` didn't
/// supply.
fn merge_object_schema(
    schema: &crate::schema::ObjectSchemaValue,
    right: &[Entry],
) -> Result<Value, ValueError> {
    let mut result = Vec::with_capacity(right.len());
    let mut consumed = std::collections::HashSet::new();

    for entry in right {
        match schema.0.lookup_value(&entry.key)? {
            Some(schema_value) => {
                let merged = merge(&schema_value, &entry.value)?;
                result.push(Entry::new(entry.key.clone(), merged));
                consumed.insert(entry.key.clone());
            }
            None => {
                if schema.0.allow_new_keys() {
                    result.push(entry.clone());
                } else {
                    return Err(ValueError::UnknownField {
                        key: entry.key.clone(),
                    });
                }
            }
        }
    }

    let mut prepend = Vec::new();
    let mut missing = Vec::new();
    for key in schema.0.required_keys()? {
        if consumed.contains(&key) {
            continue;
        }
        match schema.0.lookup_value(&key)? {
            Some(schema_value) => match default_of(&schema_value) {
                Some(default) => prepend.push(Entry::new(key, default)),
                None => missing.push(key),
            },
            None => missing.push(key),
        }
    }

    if !missing.is_empty() {
        return Err(ValueError::MissingRequiredKeys { keys: missing });
    }

    prepend.extend(result);
    Ok(Value::Object(prepend))
}

/// What to use for a required key nothing supplied a concrete value for:
/// a type schema's own `*default` if it has one (`None` otherwise — truly
/// missing), a nested object schema as-is (the caller's own recursive
/// close resolves it, or reports its own missing keys), or — since a
/// struct literal's concrete fields are themselves contract entries now —
/// the concrete value itself, which is its own unification result against
/// nothing supplied.
fn default_of(v: &Value) -> Option<Value> {
    match v {
        Value::Schema(SchemaValue::Type(ts)) => ts.marked_default(),
        Value::Schema(SchemaValue::Object(_)) => Some(v.clone()),
        concrete => Some(concrete.clone()),
    }
}

/// Schema derivation: walk a schema value into the external schema
/// document representation (spec §4.2/§6.3).
pub fn describe_field_type(
    ctx: &SchemaContext,
    v: &Value,
) -> Result<crate::schema::FieldType, ValueError> {
    use crate::schema::{FieldType, SchemaArray, SchemaObject};

    match v {
        Value::Schema(SchemaValue::Object(os)) => {
            let path = os.0.path();
            if let Some(p) = &path {
                if ctx.has_seen(p) {
                    return Ok(FieldType {
                        kind: Kind::Object,
                        object: Some(Box::new(SchemaObject {
                            path: Some(p.clone()),
                            description: None,
                            fields: Vec::new(),
                            allow_new_keys: os.0.allow_new_keys(),
                            reference: true,
                        })),
                        array: None,
                        constraints: Vec::new(),
                        default: None,
                        alternate: None,
                    });
                }
                ctx.visit(p);
            }
            let fields = describe_object(ctx, os)?;
            Ok(FieldType {
                kind: Kind::Object,
                object: Some(Box::new(SchemaObject {
                    path,
                    description: os.0.description(),
                    fields,
                    allow_new_keys: os.0.allow_new_keys(),
                    reference: false,
                })),
                array: None,
                constraints: Vec::new(),
                default: None,
                alternate: None,
            })
        }
        Value::Schema(SchemaValue::Type(ts)) if ts.kind == Kind::Array => {
            let items = match &ts.element {
                Some(element) => describe_field_type(ctx, &Value::Schema(SchemaValue::Type(element.clone())))?,
                None => FieldType {
                    kind: Kind::Undefined,
                    object: None,
                    array: None,
                    constraints: Vec::new(),
                    default: None,
                    alternate: None,
                },
            };
            Ok(FieldType {
                kind: Kind::Array,
                object: None,
                array: Some(Box::new(SchemaArray { items: Box::new(items) })),
                constraints: Vec::new(),
                default: ts.default.as_ref().map(|d| (**d).clone()),
                alternate: None,
            })
        }
        Value::Schema(SchemaValue::Type(ts)) => {
            let constraints = ts
                .constraints
                .iter()
                .map(|c| crate::schema::ConstraintDesc {
                    op: c.op,
                    right: Some(c.right.clone()),
                    description: None,
                })
                .collect();
            let alternate = match &ts.alternate {
                Some(alt) => Some(Box::new(describe_field_type(
                    ctx,
                    &Value::Schema(SchemaValue::Type(alt.clone())),
                )?)),
                None => None,
            };
            Ok(FieldType {
                kind: ts.kind,
                object: None,
                array: None,
                constraints,
                default: ts.default.as_ref().map(|d| (**d).clone()),
                alternate,
            })
        }
        concrete => Ok(FieldType {
            kind: concrete.kind(),
            object: None,
            array: None,
            constraints: Vec::new(),
            default: Some(concrete.clone()),
            alternate: None,
        }),
    }
}

fn describe_object(
    ctx: &SchemaContext,
    os: &crate::schema::ObjectSchemaValue,
) -> Result<Vec<FieldDesc>, ValueError> {
    let raw = os.0.fields(ctx)?;
    let mut out: Vec<FieldDesc> = Vec::new();
    for field in raw {
        if let Some(existing) = out.iter_mut().find(|f| f.name == field.name) {
            if let (Ok(a), Ok(b)) = (
                Ok::<_, ValueError>(existing.field_type.clone()),
                Ok::<_, ValueError>(field.field_type.clone()),
            ) {
                existing.field_type = merge_field_types(a, b);
            }
        } else {
            out.push(field);
        }
    }
    Ok(out)
}

fn merge_field_types(a: crate::schema::FieldType, b: crate::schema::FieldType) -> crate::schema::FieldType {
    // Best-effort merge for duplicate field names in schema derivation:
    // prefer `a`'s shape, carry over `b`'s constraints as an alternate.
    if a == b {
        return a;
    }
    crate::schema::FieldType {
        alternate: Some(Box::new(b)),
        ..a
    }
}
