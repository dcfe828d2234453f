//! Schema algebra: `TypeSchema` (scalar/array schemas with constraints and
//! disjunction chains) and `ObjectSchema` (a `Contract` wrapper).
//!
//! `ObjectSchema` and `Value::Func` both wrap trait objects rather than
//! eval-layer types directly, the way the reference implementation lets
//! `eval.Struct`/`eval.Function` satisfy `value.Contract`/`value.Caller`
//! interfaces — it is what keeps `cl-value` free of a dependency on
//! `cl-eval` while still letting schema validation call back into struct
//! field resolution.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::ValueError;
use crate::kind::Kind;
use crate::value::{CallArgument, Value};

/// A single `(operator, right-hand value)` constraint, tested as a binary
/// operation against the checked value.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub op: ConstraintOp,
    pub right: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConstraintOp::Eq => "==",
            ConstraintOp::Ne => "!=",
            ConstraintOp::Lt => "<",
            ConstraintOp::Le => "<=",
            ConstraintOp::Gt => ">",
            ConstraintOp::Ge => ">=",
        };
        f.write_str(s)
    }
}

impl Constraint {
    pub fn check(&self, value: &Value) -> Result<(), ValueError> {
        let ok = match self.op {
            ConstraintOp::Eq => value.value_eq(&self.right),
            ConstraintOp::Ne => !value.value_eq(&self.right),
            ConstraintOp::Lt => value.compare(&self.right)? == std::cmp::Ordering::Less,
            ConstraintOp::Le => value.compare(&self.right)? != std::cmp::Ordering::Greater,
            ConstraintOp::Gt => value.compare(&self.right)? == std::cmp::Ordering::Greater,
            ConstraintOp::Ge => value.compare(&self.right)? != std::cmp::Ordering::Less,
        };
        if ok {
            Ok(())
        } else {
            Err(ValueError::UnmatchedConstraint {
                message: format!("expected value {} {}", self.op, describe(&self.right)),
            })
        }
    }
}

fn describe(v: &Value) -> String {
    match v {
        Value::String(s) => format!("{s:?}"),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => format!("{:?}", other.kind()),
    }
}

/// A scalar or array schema: a target kind, a list of constraints, a
/// disjunction chain of alternates, and an optional default value.
///
/// `ArraySchema` from spec §3.3 has no separate representation: it is a
/// `TypeSchema` with `kind == Array` and its per-element type schema
/// carried in `element`, mirroring how the reference implementation folds
/// element validation through the same `Merge` path as scalars.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSchema {
    pub kind: Kind,
    pub constraints: Vec<Constraint>,
    pub alternate: Option<Box<TypeSchema>>,
    pub default: Option<Box<Value>>,
    pub element: Option<Box<TypeSchema>>,
}

impl TypeSchema {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            constraints: Vec::new(),
            alternate: None,
            default: None,
            element: None,
        }
    }

    /// `NewDefault` — a bare schema matching `value`'s kind, defaulted to it.
    pub fn new_default(value: Value) -> Self {
        Self {
            kind: value.target_kind(),
            constraints: Vec::new(),
            alternate: None,
            default: Some(Box::new(value)),
            element: None,
        }
    }

    pub fn array_of(element: TypeSchema) -> Self {
        Self {
            element: Some(Box::new(element)),
            ..Self::new(Kind::Array)
        }
    }

    pub fn with_constraint(mut self, op: ConstraintOp, right: Value) -> Self {
        self.constraints.push(Constraint { op, right });
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(Box::new(value));
        self
    }

    /// The chain's marked default (`number || *8080`'s `8080`), wherever in
    /// the disjunction it sits — not necessarily on `self`.
    pub fn marked_default(&self) -> Option<Value> {
        self.alternates().into_iter().find_map(|node| node.default.as_ref().map(|d| (**d).clone()))
    }

    fn alternates(&self) -> Vec<&TypeSchema> {
        let mut out = vec![self];
        let mut cur = &self.alternate;
        while let Some(next) = cur {
            out.push(next);
            cur = &next.alternate;
        }
        out
    }

    fn tail_mut(&mut self) -> &mut TypeSchema {
        let mut cur = self;
        while cur.alternate.is_some() {
            cur = cur.alternate.as_mut().unwrap();
        }
        cur
    }

    /// Append `other`'s alternate chain to the tail of `self`'s chain.
    fn add_or(mut self, other: TypeSchema) -> TypeSchema {
        self.tail_mut().alternate = Some(Box::new(other));
        self
    }

    /// Conjunction (`&&` on schemas, spec §4.2). Target kinds must already
    /// be equal (checked by the caller's merge dispatch).
    pub fn and(&self, other: &TypeSchema) -> Result<TypeSchema, ValueError> {
        debug_assert_eq!(self.kind, other.kind);
        let mut constraints = self.constraints.clone();
        constraints.extend(other.constraints.iter().cloned());

        let default = match (&self.default, &other.default) {
            (Some(a), Some(b)) => {
                if a.value_eq(b) {
                    Some(a.clone())
                } else {
                    return Err(ValueError::Contract {
                        message: "conflicting defaults in schema conjunction".into(),
                    });
                }
            }
            (Some(a), None) => Some(a.clone()),
            (None, Some(b)) => Some(b.clone()),
            (None, None) => None,
        };

        let element = match (&self.element, &other.element) {
            (Some(a), Some(b)) => Some(Box::new(a.and(b)?)),
            (Some(a), None) => Some(a.clone()),
            (None, Some(b)) => Some(b.clone()),
            (None, None) => None,
        };

        let mut result = TypeSchema {
            kind: self.kind,
            constraints,
            alternate: self.alternate.clone(),
            default,
            element,
        };
        if let Some(other_alt) = &other.alternate {
            result = result.add_or((**other_alt).clone());
        }
        Ok(result)
    }

    /// Disjunction (`||` on schemas, spec §4.2).
    pub fn or(&self, rhs: &Value) -> TypeSchema {
        let addend = match rhs {
            Value::Schema(SchemaValue::Type(ts)) => (**ts).clone(),
            other => TypeSchema::new_default(other.clone()),
        };
        self.clone().add_or(addend)
    }

    /// `Merge(schema, concrete)` — validate, trying `self` then each
    /// alternate in order; the first success wins.
    pub fn check(&self, value: &Value) -> Result<Value, ValueError> {
        if value.is_undefined() {
            return Ok(value.clone());
        }
        let mut errors = Vec::new();
        for node in self.alternates() {
            match node.check_one(value) {
                Ok(v) => return Ok(v),
                Err(e) => errors.push(e.to_string()),
            }
        }
        Err(ValueError::UnmatchedConstraint {
            message: errors.join("; "),
        })
    }

    fn check_one(&self, value: &Value) -> Result<Value, ValueError> {
        if value.target_kind() != self.kind {
            return Err(ValueError::MergeKindMismatch {
                left: self.kind,
                right: value.target_kind(),
            });
        }
        for c in &self.constraints {
            c.check(value)?;
        }
        if self.kind == Kind::Array {
            if let (Some(element), Value::Array(items)) = (&self.element, value) {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(element.check(item)?);
                }
                return Ok(Value::Array(out));
            }
        }
        match (&self.default, value) {
            (Some(default), Value::Object(_) | Value::Array(_)) => {
                crate::merge::merge(default, value)
            }
            _ => Ok(value.clone()),
        }
    }
}

/// `Value::Schema` holds either a scalar/array `TypeSchema` or an
/// `ObjectSchema` wrapping a `Contract`.
#[derive(Clone)]
pub enum SchemaValue {
    Type(Box<TypeSchema>),
    Object(ObjectSchemaValue),
}

impl fmt::Debug for SchemaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaValue::Type(ts) => write!(f, "{ts:?}"),
            SchemaValue::Object(os) => write!(f, "ObjectSchema({:?})", os.0.path()),
        }
    }
}

impl SchemaValue {
    pub fn target_kind(&self) -> Kind {
        match self {
            SchemaValue::Type(ts) => ts.kind,
            SchemaValue::Object(_) => Kind::Object,
        }
    }
}

/// The capability surface of an object-schema: path, required keys,
/// per-key lookup, allow-new-keys, field description. Implemented by
/// `cl-eval::Struct`'s lazily-captured contract.
pub trait Contract {
    fn path(&self) -> Option<String>;
    fn description(&self) -> Option<String>;
    fn allow_new_keys(&self) -> bool;
    fn required_keys(&self) -> Result<Vec<String>, ValueError>;
    fn lookup_value(&self, key: &str) -> Result<Option<Value>, ValueError>;
    fn fields(&self, ctx: &SchemaContext) -> Result<Vec<FieldDesc>, ValueError>;
}

#[derive(Clone)]
pub struct ObjectSchemaValue(pub Arc<dyn Contract>);

impl ObjectSchemaValue {
    pub fn new(contract: Arc<dyn Contract>) -> Self {
        Self(contract)
    }

    /// Two object-schemas merge into one whose contract composes
    /// `lookup_value` (recursive merge when both sides resolve) and
    /// `required_keys` (de-duplicated union) — spec §4.1 rule 7.
    pub fn merge_contract(&self, other: &ObjectSchemaValue) -> ObjectSchemaValue {
        ObjectSchemaValue(Arc::new(MergedContract {
            left: self.0.clone(),
            right: other.0.clone(),
        }))
    }
}

struct MergedContract {
    left: Arc<dyn Contract>,
    right: Arc<dyn Contract>,
}

impl Contract for MergedContract {
    fn path(&self) -> Option<String> {
        self.left.path().or_else(|| self.right.path())
    }

    fn description(&self) -> Option<String> {
        self.left.description().or_else(|| self.right.description())
    }

    fn allow_new_keys(&self) -> bool {
        self.left.allow_new_keys() || self.right.allow_new_keys()
    }

    fn required_keys(&self) -> Result<Vec<String>, ValueError> {
        let mut keys = self.left.required_keys()?;
        for k in self.right.required_keys()? {
            if !keys.contains(&k) {
                keys.push(k);
            }
        }
        Ok(keys)
    }

    fn lookup_value(&self, key: &str) -> Result<Option<Value>, ValueError> {
        let l = self.left.lookup_value(key)?;
        let r = self.right.lookup_value(key)?;
        match (l, r) {
            (Some(a), Some(b)) => Ok(Some(crate::merge::merge(&a, &b)?)),
            (Some(a), None) => Ok(Some(a)),
            (None, Some(b)) => Ok(Some(b)),
            (None, None) => Ok(None),
        }
    }

    fn fields(&self, ctx: &SchemaContext) -> Result<Vec<FieldDesc>, ValueError> {
        let mut fields = self.left.fields(ctx)?;
        fields.extend(self.right.fields(ctx)?);
        Ok(fields)
    }
}

/// A value that can be called: `Value::Func` wraps this trait object so
/// `cl-value` need not depend on `cl-eval::Function`.
pub trait Caller {
    fn call(&self, args: Vec<CallArgument>) -> Result<Value, ValueError>;
}

/// Tracks state shared across one schema-derivation walk: the set of
/// contract paths already visited (cycle break) and a monotonically
/// increasing counter used to synthesize unique `embedded.N` paths for
/// embedded expressions that don't resolve to their own named path.
#[derive(Default)]
pub struct SchemaContext {
    seen: RefCell<HashSet<String>>,
    embedded_counter: Cell<u32>,
}

impl SchemaContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if this is the first time `path` has been seen.
    pub fn visit(&self, path: &str) -> bool {
        self.seen.borrow_mut().insert(path.to_string())
    }

    pub fn has_seen(&self, path: &str) -> bool {
        self.seen.borrow().contains(path)
    }

    /// Reserve and return the next `embedded.N` synthetic path segment.
    /// Must be called by the embedding call site before recursing, so
    /// that sibling embedded expressions never collide.
    pub fn next_embedded_path(&self) -> String {
        let n = self.embedded_counter.get();
        self.embedded_counter.set(n + 1);
        format!("embedded.{n}")
    }
}

/// External schema document shape (spec §6.3).
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaObject {
    pub path: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<FieldDesc>,
    pub allow_new_keys: bool,
    pub reference: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDesc {
    pub name: String,
    pub description: Option<String>,
    pub field_type: FieldType,
    pub is_match: bool,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldType {
    pub kind: Kind,
    pub object: Option<Box<SchemaObject>>,
    pub array: Option<Box<SchemaArray>>,
    pub constraints: Vec<ConstraintDesc>,
    pub default: Option<Value>,
    pub alternate: Option<Box<FieldType>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaArray {
    pub items: Box<FieldType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDesc {
    pub op: ConstraintOp,
    pub right: Option<Value>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conjunction_concatenates_constraints() {
        let a = TypeSchema::new(Kind::Number).with_constraint(ConstraintOp::Lt, Value::Number(10.into()));
        let b = TypeSchema::new(Kind::Number).with_constraint(ConstraintOp::Gt, Value::Number(0.into()));
        let merged = a.and(&b).unwrap();
        assert_eq!(merged.constraints.len(), 2);
    }

    #[test]
    fn conjunction_rejects_conflicting_defaults() {
        let a = TypeSchema::new(Kind::Number).with_default(Value::Number(1.into()));
        let b = TypeSchema::new(Kind::Number).with_default(Value::Number(2.into()));
        assert!(a.and(&b).is_err());
    }

    #[test]
    fn disjunction_appends_alternate() {
        let a = TypeSchema::new(Kind::Number);
        let combined = a.or(&Value::string("dev"));
        assert!(combined.alternate.is_some());
    }

    #[test]
    fn check_tries_alternates_in_order() {
        let schema = TypeSchema::new(Kind::Number).or(&Value::string("dev"));
        assert!(schema.check(&Value::Number(5.into())).is_ok());
        assert!(schema.check(&Value::string("dev")).is_ok());
        assert!(schema.check(&Value::Bool(true)).is_err());
    }
}
