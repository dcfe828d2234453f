//! The evaluator's expression tree: tagged variants with match-dispatched
//! evaluation, rather than trait-object polymorphism (see the crate's
//! design notes on why `Caller`/`Contract` are the only trait objects
//! here).

use std::cell::Cell;
use std::rc::Rc;

use cl_parser::ast::{BinOp, UnOp};
use cl_tokenizer::Span;
use cl_value::{CallArgument, Kind, SchemaValue, TypeSchema, Value};

use crate::error::{EvalError, EvalErrorKind, EvalResult};
use crate::field::FieldList;
use crate::scope::{Scope, ScopeLookup};
use crate::struct_::Struct;

/// One identifier reference. Carries its own re-entrancy guard: evaluating
/// the same lookup node while it is already on the call stack (a field
/// that refers to itself through a cycle of other fields) yields
/// `undefined` rather than looping forever (spec §4.3/§5).
#[derive(Clone)]
pub struct LookupNode {
    pub name: String,
    pub span: Span,
    evaluating: Cell<bool>,
}

impl LookupNode {
    pub fn new(name: String, span: Span) -> Self {
        Self {
            name,
            span,
            evaluating: Cell::new(false),
        }
    }
}

#[derive(Clone)]
pub enum Arg {
    Positional(Expression),
    Named(String, Expression, Span),
}

#[derive(Clone)]
pub struct CallNode {
    pub callee: Box<Expression>,
    pub args: Vec<Arg>,
    pub span: Span,
}

#[derive(Clone)]
pub struct IfNode {
    pub condition: Box<Expression>,
    pub then_fields: Rc<FieldList>,
    pub else_fields: Option<Rc<FieldList>>,
    pub span: Span,
}

#[derive(Clone)]
pub struct ForNode {
    pub key: Option<String>,
    pub value: String,
    pub collection: Box<Expression>,
    pub body: Box<Expression>,
    /// Fold the accumulated array into a single merged object (spec
    /// §4.4's `merge` flag) instead of returning it as an array. Set only
    /// for a `for` written as a bare embedded struct field, matching
    /// `original_source/builder/builder.go`'s `declToField`/
    /// `comprehensionToExpression(.., field: true, ..)`.
    pub merge: bool,
    pub span: Span,
}

#[derive(Clone)]
pub enum InterpPart {
    Literal(String),
    Expr(Expression),
}

/// The evaluator's internal expression representation, built once from
/// `cl_parser::ast::Expr` by [`crate::build::build_expr`].
#[derive(Clone)]
pub enum Expression {
    Value(Value, Span),
    Lookup(LookupNode),
    Selector(Box<Expression>, String, Span),
    Index(Box<Expression>, Box<Expression>, Span),
    Slice(Box<Expression>, Option<Box<Expression>>, Option<Box<Expression>>, Span),
    Unary(UnOp, Box<Expression>, Span),
    Binary(BinOp, Box<Expression>, Box<Expression>, Span),
    Parens(Box<Expression>, Span),
    Default(Box<Expression>, Span),
    Interpolation(Vec<InterpPart>, Span),
    Object(Rc<FieldList>, Span),
    /// An object literal whose top-level fields include a literal `args`
    /// and/or `profiles` key: built as a callable `Function` instead of a
    /// plain struct (spec §4.6).
    FuncLiteral(Rc<crate::function::FunctionDefinition>, Span),
    Array(Vec<Expression>, Span),
    If(IfNode),
    For(ForNode),
    Call(CallNode),
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Value(_, s)
            | Expression::Selector(_, _, s)
            | Expression::Index(_, _, s)
            | Expression::Slice(_, _, _, s)
            | Expression::Unary(_, _, s)
            | Expression::Binary(_, _, _, s)
            | Expression::Parens(_, s)
            | Expression::Default(_, s)
            | Expression::Interpolation(_, s)
            | Expression::Object(_, s)
            | Expression::FuncLiteral(_, s)
            | Expression::Array(_, s) => *s,
            Expression::Lookup(n) => n.span,
            Expression::If(n) => n.span,
            Expression::For(n) => n.span,
            Expression::Call(n) => n.span,
        }
    }

    pub fn eval(&self, scope: &Scope) -> EvalResult<Value> {
        scope.check_cancelled()?;
        match self {
            Expression::Value(v, _) => Ok(v.clone()),

            Expression::Lookup(node) => {
                if node.evaluating.get() {
                    return Ok(Value::Undefined(Some(node.span)));
                }
                node.evaluating.set(true);
                let result = scope.get(&node.name).map_err(|e| {
                    EvalError::wrap(
                        EvalErrorKind::PathNotFound { key: node.name.clone() },
                        Some(node.span),
                        e,
                    )
                });
                node.evaluating.set(false);
                match result? {
                    Some(v) => Ok(v),
                    None => Err(EvalError::new(
                        EvalErrorKind::PathNotFound { key: node.name.clone() },
                        Some(node.span),
                    )),
                }
            }

            Expression::Selector(base, name, span) => {
                let base_val = close_for_access(base.eval(scope)?, *span)?;
                match base_val.lookup(name) {
                    Some(v) => Ok(v.clone()),
                    None => Err(EvalError::new(
                        EvalErrorKind::UnknownField { key: name.clone() },
                        Some(*span),
                    )),
                }
            }

            Expression::Index(base, index, span) => {
                let base_val = close_for_access(base.eval(scope)?, *span)?;
                let index_val = index.eval(scope)?;
                match (&base_val, &index_val) {
                    (Value::Array(_), Value::Number(n)) => {
                        let i = to_i64(n);
                        Ok(base_val.index(i).cloned().unwrap_or(Value::Undefined(Some(*span))))
                    }
                    (Value::Object(_), Value::String(key)) => Ok(base_val
                        .lookup(key)
                        .cloned()
                        .unwrap_or(Value::Undefined(Some(*span)))),
                    _ => Err(EvalError::new(
                        EvalErrorKind::Value(cl_value::ValueError::MergeKindMismatch {
                            left: base_val.kind(),
                            right: index_val.kind(),
                        }),
                        Some(*span),
                    )),
                }
            }

            Expression::Slice(base, start, end, span) => {
                let base_val = base.eval(scope)?;
                let zero = zero();
                let start = start
                    .as_ref()
                    .map(|e| e.eval(scope))
                    .transpose()?
                    .map(|v| to_i64(v.as_number().unwrap_or(&zero)));
                let end = end
                    .as_ref()
                    .map(|e| e.eval(scope))
                    .transpose()?
                    .map(|v| to_i64(v.as_number().unwrap_or(&zero)));
                base_val.slice(start, end).ok_or_else(|| {
                    EvalError::new(
                        EvalErrorKind::UnmatchedConstraint { message: "slice out of range".into() },
                        Some(*span),
                    )
                })
            }

            Expression::Unary(op, operand, span) => {
                let v = operand.eval(scope)?;
                let result = match op {
                    UnOp::Neg => v.negate(),
                    UnOp::Not => v.not(),
                };
                result.map_err(|e| EvalError::from_value(e, Some(*span)))
            }

            Expression::Binary(op, left, right, span) => eval_binary(*op, left, right, scope, *span),

            // `(expr)` introduces no new bindings; it exists purely to
            // override operator precedence at parse time.
            Expression::Parens(inner, _) => inner.eval(scope),

            // `*expr` always produces a defaulted type schema; it is only
            // meaningful as an operand of `||`-disjunction (`number || *8080`),
            // which unwraps it when combining alternates.
            Expression::Default(inner, _) => {
                let value = inner.eval(scope)?;
                Ok(Value::Schema(SchemaValue::Type(Box::new(TypeSchema::new_default(value)))))
            }

            Expression::Interpolation(parts, span) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        InterpPart::Literal(s) => out.push_str(s),
                        InterpPart::Expr(e) => {
                            let v = e.eval(scope)?;
                            match v.as_str() {
                                Some(s) => out.push_str(s),
                                None => match v {
                                    Value::Number(n) => out.push_str(&n.to_string()),
                                    Value::Bool(b) => out.push_str(&b.to_string()),
                                    _ => {
                                        return Err(EvalError::new(
                                            EvalErrorKind::UnmatchedConstraint {
                                                message: "interpolated value must be string, number, or bool".into(),
                                            },
                                            Some(*span),
                                        ))
                                    }
                                },
                            }
                        }
                    }
                }
                Ok(Value::String(out))
            }

            Expression::Object(fields, _) => {
                let st = Struct::new(fields.clone(), scope.clone());
                st.to_value()
            }

            Expression::FuncLiteral(def, _) => {
                let func = crate::function::Function::new(def.clone(), scope.clone());
                Ok(Value::Func(func))
            }

            Expression::Array(items, _) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    let v = item.eval(scope)?;
                    // A `for` written directly as an array element (as
                    // opposed to an embedded struct field) contributes its
                    // whole accumulated array as that element's expansion,
                    // not as one nested array — `[for x in xs: x, y]`
                    // splices `for`'s results alongside `y` in one flat
                    // array.
                    match (item, &v) {
                        (Expression::For(_), Value::Array(inner)) => out.extend(inner.iter().cloned()),
                        _ => out.push(v),
                    }
                }
                Ok(Value::Array(out))
            }

            Expression::If(node) => {
                let cond = node.condition.eval(scope)?;
                let truthy = cond.truthy().map_err(|e| EvalError::from_value(e, Some(node.span)))?;
                let fields = if truthy {
                    Some(&node.then_fields)
                } else {
                    node.else_fields.as_ref()
                };
                match fields {
                    Some(fields) => fields.eval_to_object(scope),
                    None => Ok(Value::Object(Vec::new())),
                }
            }

            Expression::For(node) => eval_for(node, scope),

            Expression::Call(node) => eval_call(node, scope),
        }
    }
}

fn to_i64(n: &bigdecimal::BigDecimal) -> i64 {
    use num_traits::ToPrimitive;
    n.to_i64().unwrap_or(0)
}

fn zero() -> bigdecimal::BigDecimal {
    bigdecimal::BigDecimal::from(0)
}

/// Selector/index access and `for`-iteration both need a concrete value to
/// walk; struct literals evaluate to an `ObjectSchema` (see `struct_.rs`),
/// so field/element access closes it first.
fn close_for_access(v: Value, span: Span) -> EvalResult<Value> {
    crate::close::close(&v).map_err(|e| EvalError::from_value(e, Some(span)))
}

fn as_type_schema(v: &Value) -> TypeSchema {
    match v {
        Value::Schema(SchemaValue::Type(ts)) => (**ts).clone(),
        other => TypeSchema::new_default(other.clone()),
    }
}

fn eval_binary(op: BinOp, left: &Expression, right: &Expression, scope: &Scope, span: Span) -> EvalResult<Value> {
    let l = left.eval(scope)?;
    match op {
        BinOp::And => {
            if !l.truthy().map_err(|e| EvalError::from_value(e, Some(span)))? {
                return Ok(Value::Bool(false));
            }
            let r = right.eval(scope)?;
            l.and(&r).map_err(|e| EvalError::from_value(e, Some(span)))
        }
        // `||` is overloaded: between two schema values (or a schema and a
        // bare default) it builds a disjunction chain; between two bools
        // it short-circuits as logical or.
        BinOp::Or => {
            if let Value::Bool(true) = l {
                return Ok(Value::Bool(true));
            }
            let r = right.eval(scope)?;
            match (&l, &r) {
                (Value::Bool(_), Value::Bool(_)) => {
                    l.or(&r).map_err(|e| EvalError::from_value(e, Some(span)))
                }
                _ => {
                    let lhs = as_type_schema(&l);
                    Ok(Value::Schema(SchemaValue::Type(Box::new(lhs.or(&r)))))
                }
            }
        }
        _ => {
            let r = right.eval(scope)?;
            let result = match op {
                BinOp::Eq => Ok(Value::Bool(l.value_eq(&r))),
                BinOp::Ne => Ok(Value::Bool(!l.value_eq(&r))),
                BinOp::Match => l.regex_match(&r).map(Value::Bool),
                BinOp::NotMatch => l.regex_match(&r).map(|b| Value::Bool(!b)),
                BinOp::Lt => l.compare(&r).map(|o| Value::Bool(o == std::cmp::Ordering::Less)),
                BinOp::Le => l.compare(&r).map(|o| Value::Bool(o != std::cmp::Ordering::Greater)),
                BinOp::Gt => l.compare(&r).map(|o| Value::Bool(o == std::cmp::Ordering::Greater)),
                BinOp::Ge => l.compare(&r).map(|o| Value::Bool(o != std::cmp::Ordering::Less)),
                BinOp::Add => l.add(&r),
                BinOp::Sub => l.sub(&r),
                BinOp::Mul => l.mul(&r),
                BinOp::Div => l.div(&r),
                BinOp::And | BinOp::Or => unreachable!("handled above"),
            };
            result.map_err(|e| EvalError::from_value(e, Some(span)))
        }
    }
}

fn eval_for(node: &ForNode, scope: &Scope) -> EvalResult<Value> {
    let collection = close_for_access(node.collection.eval(scope)?, node.span)?;
    let mut array_acc: Vec<Value> = Vec::new();

    let iter_items: Vec<(Value, Value)> = match &collection {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (Value::Number(bigdecimal::BigDecimal::from(i as i64)), v.clone()))
            .collect(),
        Value::Object(entries) => entries.iter().map(|e| (Value::String(e.key.clone()), e.value.clone())).collect(),
        other => {
            return Err(EvalError::new(
                EvalErrorKind::Value(cl_value::ValueError::MergeKindMismatch {
                    left: Kind::Array,
                    right: other.kind(),
                }),
                Some(node.span),
            ))
        }
    };

    for (k, v) in iter_items {
        let mut bindings = vec![(node.value.clone(), v)];
        if let Some(key_name) = &node.key {
            bindings.push((key_name.clone(), k));
        }
        let child = scope.push(ScopeLookup::Value(bindings));
        let result = close_for_access(node.body.eval(&child)?, node.span)?;
        array_acc.push(result);
    }

    if !node.merge {
        return Ok(Value::Array(array_acc));
    }

    // `merge` flag set: fold the accumulated array into a single object
    // via `Merge`, in iteration order; an empty collection folds to an
    // empty object rather than an empty array.
    let mut folded = Value::Object(Vec::new());
    for item in &array_acc {
        folded = cl_value::merge(&folded, item).map_err(|e| EvalError::from_value(e, Some(node.span)))?;
    }
    Ok(folded)
}

fn eval_call(node: &CallNode, scope: &Scope) -> EvalResult<Value> {
    let callee = node.callee.eval(scope)?;
    let func = match &callee {
        Value::Func(f) => f.clone(),
        _ => return Err(EvalError::new(EvalErrorKind::CallNotCallable, Some(node.span))),
    };

    let mut args = Vec::with_capacity(node.args.len());
    for arg in &node.args {
        let arg = match arg {
            Arg::Positional(e) => CallArgument {
                value: e.eval(scope)?,
                is_positional: true,
                key: None,
            },
            Arg::Named(name, e, _) => CallArgument {
                value: e.eval(scope)?,
                is_positional: false,
                key: Some(name.clone()),
            },
        };
        args.push(arg);
    }
    // Call-depth enforcement happens inside `Function::call` itself (spec
    // §4.6 step 1), since that is the boundary `Caller::call` actually
    // crosses — a native/foreign `Caller` would need the same guard.
    func.call(args).map_err(|e| EvalError::from_value(e, Some(node.span)))
}
