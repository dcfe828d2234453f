//! `Build`: turn a `cl_parser::ast::File` into the evaluator's own
//! `Expression`/`FieldList` tree. This is where the AST's surface
//! distinctions (e.g. `*expr` vs `expr`, computed vs match keys) get
//! resolved into the shapes `Expression::eval` dispatches on.

use std::rc::Rc;

use cl_parser::ast::{self, Arg as AstArg, Expr, Field as AstField, Key as AstKey};

use crate::expr::{Arg, CallNode, Expression, ForNode, IfNode, InterpPart, LookupNode};
use crate::field::{FieldKey, FieldList, FieldNode, KeyValueNode};
use crate::function::FunctionDefinition;

/// A struct literal becomes a callable `Function` instead of a plain
/// object whenever it declares a top-level `args` or `profiles` field
/// (spec §4.6) — this is a static, build-time decision since both are
/// literal key names.
fn declares_arguments(fields: &FieldList) -> bool {
    fields.fields.iter().any(|f| {
        matches!(f, FieldNode::KeyValue(kv) if kv.key.is_named("args") || kv.key.is_named("profiles"))
    })
}

pub fn build_file(file: &ast::File) -> FieldList {
    build_fields(&file.fields)
}

fn build_fields(fields: &[AstField]) -> FieldList {
    FieldList::new(fields.iter().map(build_field).collect())
}

fn build_field(field: &AstField) -> FieldNode {
    match field {
        AstField::KeyValue(kv) => FieldNode::KeyValue(KeyValueNode {
            key: build_key(&kv.key),
            optional: kv.optional,
            local: kv.local,
            value: build_expr(&kv.value),
            span: kv.span,
        }),
        AstField::Embedded(e) => FieldNode::Embedded(build_embedded_expr(&e.expr)),
    }
}

/// An embedded (unnamed, struct-level) `for` comprehension folds its
/// accumulated array into a single object (spec §4.4's `merge` flag) —
/// the original's `declToField`'s bare `*ast.Comprehension` case, as
/// opposed to a `for` used as a named field's value or an array element,
/// neither of which sets it (`exprToExpression`'s generic
/// `*ast.Comprehension` case always passes `field: false`).
fn build_embedded_expr(expr: &Expr) -> Expression {
    match build_expr(expr) {
        Expression::For(mut node) => {
            node.merge = true;
            Expression::For(node)
        }
        other => other,
    }
}

fn build_key(key: &AstKey) -> FieldKey {
    match key {
        AstKey::Ident(s, _) => FieldKey::Ident(s.clone()),
        AstKey::String(s, _) => FieldKey::String(s.clone()),
        AstKey::Computed(expr, _) => FieldKey::Computed(build_expr(expr)),
        AstKey::Match(expr, _) => FieldKey::Match(build_expr(expr)),
    }
}

pub fn build_expr(expr: &Expr) -> Expression {
    match expr {
        Expr::Null(span) => Expression::Value(cl_value::Value::Null, *span),
        Expr::Bool(b, span) => Expression::Value(cl_value::Value::Bool(*b), *span),
        Expr::Number(text, span) => {
            let n: bigdecimal::BigDecimal = text.parse().unwrap_or_else(|_| bigdecimal::BigDecimal::from(0));
            Expression::Value(cl_value::Value::Number(n), *span)
        }
        Expr::String(s, span) => Expression::Value(cl_value::Value::string(s.clone()), *span),
        Expr::Interpolation(parts, span) => Expression::Interpolation(
            parts
                .iter()
                .map(|p| match p {
                    ast::InterpPart::Literal(s) => InterpPart::Literal(s.clone()),
                    ast::InterpPart::Expr(e) => InterpPart::Expr(build_expr(e)),
                })
                .collect(),
            *span,
        ),
        Expr::Lookup(name, span) => Expression::Lookup(LookupNode::new(name.clone(), *span)),
        Expr::Selector(base, name, span) => {
            Expression::Selector(Box::new(build_expr(base)), name.clone(), *span)
        }
        Expr::Index(base, index, span) => {
            Expression::Index(Box::new(build_expr(base)), Box::new(build_expr(index)), *span)
        }
        Expr::Slice(base, start, end, span) => Expression::Slice(
            Box::new(build_expr(base)),
            start.as_ref().map(|e| Box::new(build_expr(e))),
            end.as_ref().map(|e| Box::new(build_expr(e))),
            *span,
        ),
        Expr::Call(callee, args, span) => Expression::Call(CallNode {
            callee: Box::new(build_expr(callee)),
            args: args.iter().map(build_arg).collect(),
            span: *span,
        }),
        Expr::Unary(op, operand, span) => Expression::Unary(*op, Box::new(build_expr(operand)), *span),
        Expr::Binary(op, left, right, span) => {
            Expression::Binary(*op, Box::new(build_expr(left)), Box::new(build_expr(right)), *span)
        }
        Expr::Parens(inner, span) => Expression::Parens(Box::new(build_expr(inner)), *span),
        Expr::Default(inner, span) => Expression::Default(Box::new(build_expr(inner)), *span),
        Expr::Object(fields, span) => {
            let built = build_fields(fields);
            if declares_arguments(&built) {
                Expression::FuncLiteral(FunctionDefinition::new(Rc::new(built), false), *span)
            } else {
                Expression::Object(Rc::new(built), *span)
            }
        }
        Expr::Array(items, span) => Expression::Array(items.iter().map(build_expr).collect(), *span),
        Expr::If {
            condition,
            then_fields,
            else_fields,
            span,
        } => Expression::If(IfNode {
            condition: Box::new(build_expr(condition)),
            then_fields: Rc::new(build_fields(then_fields)),
            else_fields: else_fields.as_ref().map(|f| Rc::new(build_fields(f))),
            span: *span,
        }),
        Expr::For {
            key,
            value,
            collection,
            body,
            span,
        } => Expression::For(ForNode {
            key: key.clone(),
            value: value.clone(),
            collection: Box::new(build_expr(collection)),
            body: Box::new(build_expr(body)),
            merge: false,
            span: *span,
        }),
    }
}

fn build_arg(arg: &AstArg) -> Arg {
    match arg {
        AstArg::Positional(e) => Arg::Positional(build_expr(e)),
        AstArg::Named(name, e, span) => Arg::Named(name.clone(), build_expr(e), *span),
    }
}
