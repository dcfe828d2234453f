//! `Struct`: an object literal's runtime identity. Captures the lexical
//! scope it was written in and, when evaluated, extends that scope with
//! itself so sibling fields can refer to each other (and to themselves,
//! for recursive definitions) through the same `ScopeLookup::Struct`
//! frame used for ordinary lookups.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Weak};

use cl_value::{Contract, FieldDesc, ObjectSchemaValue, SchemaContext, SchemaValue, Value, ValueError};

use crate::error::EvalResult;
use crate::field::{FieldKey, FieldList, FieldNode};
use crate::scope::{Scope, ScopeLookup};

pub struct Struct {
    fields: Rc<FieldList>,
    captured_scope: Scope,
    path: Option<String>,
    description: Option<String>,
    self_ref: RefCell<Weak<Struct>>,
}

impl Struct {
    pub fn new(fields: Rc<FieldList>, captured_scope: Scope) -> Arc<Self> {
        Self::with_path(fields, captured_scope, None, None)
    }

    pub fn with_path(
        fields: Rc<FieldList>,
        captured_scope: Scope,
        path: Option<String>,
        description: Option<String>,
    ) -> Arc<Self> {
        let arc = Arc::new(Self {
            fields,
            captured_scope,
            path,
            description,
            self_ref: RefCell::new(Weak::new()),
        });
        *arc.self_ref.borrow_mut() = Arc::downgrade(&arc);
        arc
    }

    /// The scope fields of this struct are evaluated in: the captured
    /// lexical scope, extended with a frame resolving back to this same
    /// struct (via the weak self-pointer stashed at construction) so that
    /// self- and sibling-references see each other.
    fn self_scope(&self) -> Scope {
        match self.self_ref.borrow().upgrade() {
            Some(strong) => self.captured_scope.push(ScopeLookup::Struct(strong)),
            None => self.captured_scope.clone(),
        }
    }

    /// Resolve `key` against this struct's own fields, with one
    /// exception: `$` (spec §4.6's `AssignRoot`) always resolves to the
    /// struct's own value via the same weak self-pointer `self_scope`
    /// uses, rather than being looked up as a field.
    pub fn scope_lookup(&self, scope: &Scope, key: &str) -> EvalResult<Option<Value>> {
        let _ = scope;
        if key == "$" {
            return match self.self_ref.borrow().upgrade() {
                Some(strong) => strong.to_value().map(Some),
                None => Ok(None),
            };
        }
        self.fields.resolve(&self.self_scope(), key)
    }

    /// Evaluate this struct to a `Value`. Every struct literal becomes an
    /// `ObjectSchema` (spec §4.1's schema/concrete unification has no
    /// separate "plain object" case — a literal with no match keys and no
    /// schema-valued fields is simply a contract whose `required_keys()`
    /// happen to all be concrete already). Callers that need a final
    /// concrete document (`File::eval`, a function body's result) close it
    /// by merging against an empty object; intermediate merges compose
    /// contracts structurally via `cl_value::merge`.
    pub fn to_value(self: &Arc<Self>) -> EvalResult<Value> {
        Ok(Value::Schema(SchemaValue::Object(ObjectSchemaValue::new(
            self.clone(),
        ))))
    }
}

impl Contract for Struct {
    fn path(&self) -> Option<String> {
        self.path.clone()
    }

    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn allow_new_keys(&self) -> bool {
        self.fields
            .fields
            .iter()
            .any(|f| matches!(f, FieldNode::KeyValue(kv) if matches!(kv.key, FieldKey::Match(_))))
    }

    /// The key/value fields' `required_keys()` (itself evaluating any
    /// computed key to learn its runtime name) plus, for each embedded
    /// field, the keys its evaluated value itself requires — an embedded
    /// match-key schema contributes no static names (it isn't asked about
    /// by name here), but an embedded struct or for-merge result's own
    /// keys must surface here too, or `merge_object_schema`'s
    /// closing-against-empty fold never materializes them (a struct made
    /// of nothing but a bare embedded or computed-key field would
    /// otherwise close to `{}`).
    fn required_keys(&self) -> Result<Vec<String>, ValueError> {
        let mut keys = self
            .fields
            .required_keys(&self.self_scope())
            .map_err(|e| ValueError::Contract { message: e.to_string() })?;
        for field in &self.fields.fields {
            if let FieldNode::Embedded(expr) = field {
                let v = expr
                    .eval(&self.self_scope())
                    .map_err(|e| ValueError::Contract { message: e.to_string() })?;
                let embedded_keys = match &v {
                    Value::Schema(SchemaValue::Object(os)) => os.0.required_keys()?,
                    other => other
                        .as_object()
                        .map(|entries| entries.iter().map(|e| e.key.clone()).collect())
                        .unwrap_or_default(),
                };
                for key in embedded_keys {
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
            }
        }
        Ok(keys)
    }

    fn lookup_value(&self, key: &str) -> Result<Option<Value>, ValueError> {
        if key == "$" {
            return self
                .scope_lookup(&self.captured_scope, key)
                .map_err(|e| ValueError::Contract { message: e.to_string() });
        }
        self.fields
            .resolve_as_schema(&self.self_scope(), key)
            .map_err(|e| ValueError::Contract { message: e.to_string() })
    }

    fn fields(&self, ctx: &SchemaContext) -> Result<Vec<FieldDesc>, ValueError> {
        let mut out = Vec::new();
        for field in &self.fields.fields {
            if let FieldNode::KeyValue(kv) = field {
                let name = match &kv.key {
                    FieldKey::Ident(s) | FieldKey::String(s) => s.clone(),
                    FieldKey::Computed(_) => continue,
                    FieldKey::Match(_) => ctx.next_embedded_path(),
                };
                let value = self
                    .lookup_value(&name)
                    .map_err(|e| ValueError::Contract { message: e.to_string() })?;
                let value = match value {
                    Some(v) => v,
                    None => continue,
                };
                let field_type = cl_value::describe_field_type(ctx, &value)?;
                out.push(FieldDesc {
                    name,
                    description: None,
                    field_type,
                    is_match: matches!(kv.key, FieldKey::Match(_)),
                    optional: kv.optional,
                });
            }
        }
        Ok(out)
    }
}
