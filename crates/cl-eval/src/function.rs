//! Function values: a body plus an argument/profile schema split, closing
//! over the scope they were defined in. `Function` implements
//! `cl_value::Caller` so `Value::Func` can hold one without `cl-value`
//! depending on `cl-eval` (spec §4.6).

use std::rc::Rc;
use std::sync::Arc;

use cl_value::{CallArgument, Caller, Contract, SchemaValue, Value, ValueError};

use crate::error::EvalError;
use crate::field::FieldList;
use crate::scope::{Scope, ScopeLookup};
use crate::struct_::Struct;

/// A function's static shape, produced once by `Build` from an object
/// literal's fields (or the whole document, for the file-level function):
/// the `args`/`profiles` fields are carved out to derive the argument and
/// profile schemas, and everything else becomes the body.
pub struct FunctionDefinition {
    args_fields: Rc<FieldList>,
    profiles_fields: Rc<FieldList>,
    body_fields: Rc<FieldList>,
    /// The file-level function yields the whole evaluated body; an
    /// ordinary function literal looks up and returns its `return` field.
    return_body: bool,
}

impl FunctionDefinition {
    /// Split `fields` into its `args`/`profiles` declarations and body.
    pub fn new(fields: Rc<FieldList>, return_body: bool) -> Rc<Self> {
        let (args_fields, rest) = fields.partition_by_key("args");
        let (profiles_fields, body_fields) = rest.partition_by_key("profiles");
        Rc::new(Self {
            args_fields: Rc::new(args_fields),
            profiles_fields: Rc::new(profiles_fields),
            body_fields: Rc::new(body_fields),
            return_body,
        })
    }
}

/// A function value: a definition closed over the scope it was written in.
pub struct Function {
    def: Rc<FunctionDefinition>,
    captured_scope: Scope,
}

impl Function {
    pub fn new(def: Rc<FunctionDefinition>, captured_scope: Scope) -> Arc<Self> {
        Arc::new(Self { def, captured_scope })
    }

    /// Evaluate the `args`/`profiles` declaration fields (a struct built
    /// from just that sub-list) and look up the declared key, giving the
    /// `ArgsSchema`/`ProfilesSchema` contract-or-value spec §4.6 describes.
    /// Absent entirely, an empty object stands in (no required keys, no
    /// declared defaults).
    fn declared_schema(&self, fields: &Rc<FieldList>, key: &str) -> Result<Value, ValueError> {
        if fields.fields.is_empty() {
            return Ok(Value::Object(Vec::new()));
        }
        let decl = Struct::new(fields.clone(), self.captured_scope.clone());
        decl.lookup_value(key)
            .map(|v| v.unwrap_or(Value::Object(Vec::new())))
    }

    /// Schema mode (spec.md's second dataflow path: AST → Expression →
    /// schema document): evaluate the body with no `args` bound and no
    /// final `close`, so the result stays whatever mix of `Schema`/concrete
    /// values the body's fields produce — the shape `cl-cli schema` walks
    /// with `describe_field_type` rather than a value `cl-cli eval` would
    /// print.
    pub fn schema_value(&self) -> Result<Value, ValueError> {
        let body = Struct::new(self.def.body_fields.clone(), self.captured_scope.clone());
        body.to_value().map_err(eval_err_to_value)
    }
}

fn eval_err_to_value(e: EvalError) -> ValueError {
    ValueError::Contract { message: e.to_string() }
}

impl Caller for Function {
    /// 1. Enforce call depth. 2. Partition arguments: positional args map
    ///    by index onto `ArgsSchema`'s required keys; named `profiles`
    ///    resolve against `ProfilesSchema` and merge right-to-left
    ///    underneath the other named args; everything else contributes
    ///    directly by name. 3. Validate/default the composed value against
    ///    `ArgsSchema`. 4. Bind `args` and evaluate the body. 5. Return the
    ///    body (file-level) or its `return` key.
    #[tracing::instrument(skip_all, fields(args = args.len()))]
    fn call(&self, args: Vec<CallArgument>) -> Result<Value, ValueError> {
        let ctx = self.captured_scope.call_ctx();
        ctx.check().map_err(eval_err_to_value)?;
        ctx.enter_call().map_err(eval_err_to_value)?;
        let result = self.call_inner(args);
        ctx.exit_call();
        if let Err(e) = &result {
            tracing::debug!(error = %e, "call failed");
        }
        result
    }
}

impl Function {
    fn call_inner(&self, args: Vec<CallArgument>) -> Result<Value, ValueError> {
        let args_schema = self.declared_schema(&self.def.args_fields, "args")?;
        let profiles_schema = self.declared_schema(&self.def.profiles_fields, "profiles")?;
        let arg_names = match &args_schema {
            Value::Schema(SchemaValue::Object(os)) => os.0.required_keys()?,
            _ => Vec::new(),
        };

        let mut positional = Vec::new();
        let mut named = Vec::new();
        let mut profile_names: Vec<String> = Vec::new();
        for arg in &args {
            if arg.is_positional {
                positional.push(arg.value.clone());
            } else if arg.key.as_deref() == Some("profiles") {
                match &arg.value {
                    Value::Array(items) => {
                        for item in items {
                            if let Some(s) = item.as_str() {
                                profile_names.push(s.to_string());
                            }
                        }
                    }
                    Value::String(s) => profile_names.push(s.clone()),
                    _ => {}
                }
            } else if let Some(key) = &arg.key {
                named.push((key.clone(), arg.value.clone()));
            }
        }

        if positional.len() > arg_names.len() {
            return Err(ValueError::Contract {
                message: format!("too many positional arguments: expected at most {}", arg_names.len()),
            });
        }

        // Profiles merge right-to-left, then sit underneath the explicit
        // named/positional args (spec §4.6 step 2).
        let mut profile_value = Value::Object(Vec::new());
        for name in profile_names.iter().rev() {
            let (name, optional) = match name.strip_suffix('?') {
                Some(stem) => (stem, true),
                None => (name.as_str(), false),
            };
            let profile_entry = match &profiles_schema {
                Value::Schema(SchemaValue::Object(os)) => os.0.lookup_value(name)?,
                Value::Object(entries) => entries.iter().find(|e| e.key == name).map(|e| e.value.clone()),
                _ => None,
            };
            match profile_entry {
                Some(v) => {
                    profile_value = cl_value::merge(&v, &profile_value)?;
                }
                None if optional => {}
                None => {
                    return Err(ValueError::UnknownField { key: name.to_string() });
                }
            }
        }

        let mut arg_value = profile_value;
        for (i, value) in positional.into_iter().enumerate() {
            let name = &arg_names[i];
            arg_value = cl_value::merge(&arg_value, &Value::Object(vec![cl_value::Entry::new(name.clone(), value)]))?;
        }
        for (key, value) in named {
            arg_value = cl_value::merge(&arg_value, &Value::Object(vec![cl_value::Entry::new(key, value)]))?;
        }

        let bound_args = cl_value::merge(&args_schema, &arg_value)?;
        let bound_args = crate::close::close(&bound_args)?;

        let child = self
            .captured_scope
            .push(ScopeLookup::Names(vec![("args".to_string(), bound_args)]));
        let body = Struct::new(self.def.body_fields.clone(), child);
        let body_value = body.to_value().map_err(eval_err_to_value)?;

        if self.def.return_body {
            crate::close::close(&body_value)
        } else {
            match &body_value {
                Value::Schema(SchemaValue::Object(os)) => {
                    let returned = os.0.lookup_value("return")?.unwrap_or(Value::Null);
                    crate::close::close(&returned)
                }
                _ => crate::close::close(&body_value),
            }
        }
    }
}
