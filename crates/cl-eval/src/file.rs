//! The top-level document: parsed fields wrapped in an implicit
//! whole-body-returning function, called once with the CLI-supplied
//! arguments (spec §4.7).

use std::rc::Rc;

use cl_value::{CallArgument, Value};

use crate::build;
use crate::builtin::root_scope;
use crate::error::{EvalError, EvalResult};
use crate::function::{Function, FunctionDefinition};

pub struct File {
    def: Rc<FunctionDefinition>,
}

#[derive(Debug)]
pub enum LoadError {
    Parse(Vec<cl_parser::ParseError>),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Parse(errors) => {
                write!(f, "{} parse error(s)", errors.len())
            }
        }
    }
}

impl std::error::Error for LoadError {}

impl File {
    #[tracing::instrument(skip_all, fields(len = source.len()))]
    pub fn parse(source: &str) -> Result<Self, LoadError> {
        let ast = cl_parser::parse(source).map_err(LoadError::Parse)?;
        let fields = Rc::new(build::build_file(&ast));
        tracing::debug!("file built");
        Ok(Self {
            def: FunctionDefinition::new(fields, true),
        })
    }

    /// Evaluate the document to its final value, binding `args` as if the
    /// whole file were a zero-parameter function called once.
    #[tracing::instrument(skip_all, fields(args = args.len()))]
    pub fn eval(&self, args: Vec<CallArgument>) -> EvalResult<Value> {
        let func = Function::new(self.def.clone(), root_scope());
        func.call(args).map_err(|e| EvalError::from_value(e, None))
    }

    /// Evaluate the document in schema mode: no call, no final `close`,
    /// just the body's own Schema/concrete field shape (spec.md's second
    /// dataflow path, for `cl schema`/schema derivation).
    #[tracing::instrument(skip_all)]
    pub fn schema(&self) -> EvalResult<Value> {
        let func = Function::new(self.def.clone(), root_scope());
        func.schema_value().map_err(|e| EvalError::from_value(e, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_a_flat_object() {
        let file = File::parse("a: 1\nb: \"x\"\n").unwrap();
        let value = file.eval(Vec::new()).unwrap();
        assert_eq!(value.lookup("a"), Some(&Value::Number(1.into())));
        assert_eq!(value.lookup("b"), Some(&Value::string("x")));
    }

    #[test]
    fn sibling_fields_can_reference_each_other() {
        let file = File::parse("a: 1\nb: a + 1\n").unwrap();
        let value = file.eval(Vec::new()).unwrap();
        assert_eq!(value.lookup("b"), Some(&Value::Number(2.into())));
    }

    #[test]
    fn embedded_if_contributes_fields_conditionally() {
        let file = File::parse("flag: true\nif flag {\n  extra: 1\n}\n").unwrap();
        let value = file.eval(Vec::new()).unwrap();
        assert_eq!(value.lookup("extra"), Some(&Value::Number(1.into())));
    }
}
