//! Object-literal fields: tagged `FieldNode` variants (key/value and
//! embedded), grouped into a `FieldList` shared by struct bodies, `if`
//! branches, and function bodies.

use cl_tokenizer::Span;
use cl_value::{Entry, SchemaValue, TypeSchema, Value};

use crate::error::{EvalError, EvalErrorKind, EvalResult};
use crate::expr::Expression;
use crate::scope::Scope;

/// The left-hand side of a `KeyValue` field, after `Build` has resolved
/// computed/match keys down to an evaluatable expression where needed.
#[derive(Clone)]
pub enum FieldKey {
    Ident(String),
    String(String),
    /// `(expr):` — evaluated once per containing scope to a string key.
    Computed(Expression),
    /// `[expr]:` — a match-key: applies to any field name satisfying the
    /// pattern rather than one fixed name.
    Match(Expression),
}

impl FieldKey {
    pub(crate) fn is_named(&self, name: &str) -> bool {
        matches!(self, FieldKey::Ident(s) | FieldKey::String(s) if s == name)
    }
}

#[derive(Clone)]
pub struct KeyValueNode {
    pub key: FieldKey,
    pub optional: bool,
    pub local: bool,
    pub value: Expression,
    pub span: Span,
}

#[derive(Clone)]
pub enum FieldNode {
    KeyValue(KeyValueNode),
    Embedded(Expression),
}

impl FieldNode {
    pub fn span(&self) -> Span {
        match self {
            FieldNode::KeyValue(kv) => kv.span,
            FieldNode::Embedded(e) => e.span(),
        }
    }
}

/// A flat list of fields belonging to one object body.
#[derive(Default)]
pub struct FieldList {
    pub fields: Vec<FieldNode>,
}

impl FieldList {
    pub fn new(fields: Vec<FieldNode>) -> Self {
        Self { fields }
    }

    /// Split into the fields whose top-level key is `name` (in
    /// declaration order) and every other field, without disturbing
    /// either group's relative order. Used to carve `args`/`profiles`
    /// fields out of a function literal's body (spec §4.6).
    pub fn partition_by_key(&self, name: &str) -> (FieldList, FieldList) {
        let mut matching = Vec::new();
        let mut rest = Vec::new();
        for field in &self.fields {
            match field {
                FieldNode::KeyValue(kv) if kv.key.is_named(name) => matching.push(field.clone()),
                _ => rest.push(field.clone()),
            }
        }
        (FieldList::new(matching), FieldList::new(rest))
    }

    /// The non-match key names this list contributes to `required_keys()`
    /// — excludes optional, local, and match-key fields (spec §4.5). A
    /// computed key (`(expr):`) is evaluated against `scope` to learn its
    /// runtime name, same as ordinary lookup would; a key declared more
    /// than once (a concrete value and a sibling type constraint, say)
    /// contributes a single entry, in its first-occurrence order.
    pub fn required_keys(&self, scope: &Scope) -> EvalResult<Vec<String>> {
        let mut keys = Vec::new();
        for f in &self.fields {
            if let FieldNode::KeyValue(kv) = f {
                if kv.optional || kv.local {
                    continue;
                }
                let name = match &kv.key {
                    FieldKey::Ident(s) | FieldKey::String(s) => s.clone(),
                    FieldKey::Computed(expr) => {
                        let v = expr.eval(scope)?;
                        match v.as_str() {
                            Some(s) => s.to_string(),
                            None => continue,
                        }
                    }
                    FieldKey::Match(_) => continue,
                };
                if !keys.contains(&name) {
                    keys.push(name);
                }
            }
        }
        Ok(keys)
    }

    /// Resolve a single named field against this list: every field that
    /// contributes a value for `key` (a matching ident/string key, a
    /// matching regex match-key, or an embedded expression that itself
    /// carries the key) is evaluated and all results are `Merge`d together
    /// in declaration order, so that `a: 1` followed later by `a: { b: 2 }`
    /// — identical keys across distinct fields — combine exactly as the
    /// concrete-object projection would (spec §4.5's `ScopeLookup`).
    /// `local` fields resolve here too: they are only excluded from
    /// `required_keys()` and from the final concrete-object projection,
    /// not from lookup.
    pub fn resolve(&self, scope: &Scope, key: &str) -> EvalResult<Option<Value>> {
        self.resolve_impl(scope, key, false)
    }

    /// Like `resolve`, but for a schema/contract context (spec §4.5's
    /// `IsSchema`/`ToValueForKey`): each field's contributed value is
    /// wrapped with `TypeSchema::new_default` before folding into the
    /// running result, so that a concrete field (`foo: 1`) and a sibling
    /// type constraint (`foo: number < 10`) *conjoin* into one schema
    /// instead of the constraint validating-and-collapsing the concrete
    /// value. Used by `Contract::lookup_value` — never by ordinary
    /// same-scope identifier lookups, which need the plain value back.
    pub fn resolve_as_schema(&self, scope: &Scope, key: &str) -> EvalResult<Option<Value>> {
        self.resolve_impl(scope, key, true)
    }

    fn resolve_impl(&self, scope: &Scope, key: &str, schema_mode: bool) -> EvalResult<Option<Value>> {
        let mut result: Option<Value> = None;
        for field in &self.fields {
            let contribution = match field {
                FieldNode::KeyValue(kv) => match &kv.key {
                    FieldKey::Ident(s) | FieldKey::String(s) if s == key => {
                        Some(kv.value.eval(scope)?)
                    }
                    FieldKey::Computed(expr) => {
                        let computed = expr.eval(scope)?;
                        if computed.as_str() == Some(key) {
                            Some(kv.value.eval(scope)?)
                        } else {
                            None
                        }
                    }
                    FieldKey::Match(pattern) => {
                        let pat = pattern.eval(scope)?;
                        if Value::String(key.to_string())
                            .regex_match(&pat)
                            .map_err(|e| EvalError::from_value(e, Some(kv.span)))?
                        {
                            Some(kv.value.eval(scope)?)
                        } else {
                            None
                        }
                    }
                    _ => None,
                },
                FieldNode::Embedded(expr) => {
                    let v = expr.eval(scope)?;
                    match &v {
                        Value::Schema(cl_value::SchemaValue::Object(os)) => os
                            .0
                            .lookup_value(key)
                            .map_err(|e| EvalError::from_value(e, Some(field.span())))?,
                        _ => v.lookup(key).cloned(),
                    }
                }
            };
            if let Some(c) = contribution {
                let c = if schema_mode { wrap_for_schema(c) } else { c };
                result = Some(match result {
                    Some(existing) => {
                        cl_value::merge(&existing, &c).map_err(|e| EvalError::from_value(e, Some(field.span())))?
                    }
                    None => c,
                });
            }
        }
        Ok(result)
    }

    /// Evaluate this field list into a concrete object value: every
    /// non-local key/value field plus every embedded expression's
    /// contributed keys, merged left to right in declaration order.
    pub fn eval_to_object(&self, scope: &Scope) -> EvalResult<Value> {
        let mut result = Value::Object(Vec::new());
        for field in &self.fields {
            let contribution = match field {
                FieldNode::KeyValue(kv) => {
                    if kv.local {
                        continue;
                    }
                    let key = match &kv.key {
                        FieldKey::Ident(s) | FieldKey::String(s) => s.clone(),
                        FieldKey::Computed(expr) => {
                            let v = expr.eval(scope)?;
                            v.as_str()
                                .map(str::to_string)
                                .ok_or_else(|| EvalError::new(EvalErrorKind::ExpectedStringKey, Some(kv.span)))?
                        }
                        FieldKey::Match(_) => continue,
                    };
                    let value = kv.value.eval(scope)?;
                    Value::Object(vec![Entry::new(key, value)])
                }
                FieldNode::Embedded(expr) => expr.eval(scope)?,
            };
            result = cl_value::merge(&result, &contribution).map_err(|e| EvalError::from_value(e, Some(field.span())))?;
        }
        Ok(result)
    }
}

/// Wrap a bare concrete value as a defaulted `TypeSchema` (spec §4.5: "in
/// schema mode, scalar results are wrapped by `NewDefault`"). A value
/// that's already schema-valued carries its own constraints and passes
/// through unchanged; `undefined` stays `undefined` so the ordinary
/// identity-propagation merge rules still apply to it.
fn wrap_for_schema(value: Value) -> Value {
    match value {
        Value::Schema(_) | Value::Undefined(_) => value,
        other => Value::Schema(SchemaValue::Type(Box::new(TypeSchema::new_default(other)))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::root_scope;
    use cl_tokenizer::Span;

    fn kv(key: &str, value: Expression) -> FieldNode {
        FieldNode::KeyValue(KeyValueNode {
            key: FieldKey::Ident(key.to_string()),
            optional: false,
            local: false,
            value,
            span: Span::default(),
        })
    }

    fn num(n: i64, span: Span) -> Expression {
        Expression::Value(Value::Number(n.into()), span)
    }

    #[test]
    fn partition_by_key_splits_out_matching_fields_in_order() {
        let fields = FieldList::new(vec![
            kv("args", num(1, Span::default())),
            kv("a", num(2, Span::default())),
            kv("profiles", num(3, Span::default())),
            kv("b", num(4, Span::default())),
        ]);
        let (args, rest) = fields.partition_by_key("args");
        assert_eq!(args.fields.len(), 1);
        assert_eq!(rest.fields.len(), 3);
    }

    #[test]
    fn resolve_merges_every_contributing_field_for_a_duplicate_key() {
        // `a: 1` then later `a: 2` — both are KeyValue fields for `a`;
        // the second's scalar should win, matching plain object merge.
        let fields = FieldList::new(vec![kv("a", num(1, Span::default())), kv("a", num(2, Span::default()))]);
        let scope = root_scope();
        let resolved = fields.resolve(&scope, "a").unwrap();
        assert_eq!(resolved, Some(Value::Number(2.into())));
    }

    #[test]
    fn resolve_returns_none_for_an_absent_key() {
        let fields = FieldList::new(vec![kv("a", num(1, Span::default()))]);
        let scope = root_scope();
        assert_eq!(fields.resolve(&scope, "missing").unwrap(), None);
    }

    #[test]
    fn required_keys_deduplicates_a_twice_declared_key() {
        let fields = FieldList::new(vec![kv("a", num(1, Span::default())), kv("a", num(2, Span::default())), kv("b", num(3, Span::default()))]);
        let scope = root_scope();
        assert_eq!(fields.required_keys(&scope).unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn resolve_as_schema_wraps_a_bare_scalar_contribution() {
        let fields = FieldList::new(vec![kv("a", num(1, Span::default()))]);
        let scope = root_scope();
        let resolved = fields.resolve_as_schema(&scope, "a").unwrap().unwrap();
        assert!(matches!(resolved, Value::Schema(_)));
    }

    fn computed_kv(key_name: &str, value: Expression) -> FieldNode {
        FieldNode::KeyValue(KeyValueNode {
            key: FieldKey::Computed(Expression::Value(Value::string(key_name.to_string()), Span::default())),
            optional: false,
            local: false,
            value,
            span: Span::default(),
        })
    }

    #[test]
    fn required_keys_evaluates_a_computed_key_to_learn_its_name() {
        let fields = FieldList::new(vec![computed_kv("a", num(1, Span::default()))]);
        let scope = root_scope();
        assert_eq!(fields.required_keys(&scope).unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn resolve_matches_a_computed_key_against_its_evaluated_name() {
        let fields = FieldList::new(vec![computed_kv("a", num(1, Span::default()))]);
        let scope = root_scope();
        assert_eq!(fields.resolve(&scope, "a").unwrap(), Some(Value::Number(1.into())));
        assert_eq!(fields.resolve(&scope, "b").unwrap(), None);
    }
}
