//! Turn `cl eval`'s trailing `-- ARGS...` into `CallArgument`s.
//!
//! There's no standalone single-expression entry point in `cl-parser` (it
//! only parses whole documents), so CLI argument values get their own tiny
//! literal grammar rather than round-tripping through the full parser:
//! `true`/`false`/`null`, a decimal number, or else a bare string — the
//! same three-way guess a shell-facing tool like this needs, not CL's full
//! expression syntax.

use cl_value::{CallArgument, Value};

pub fn parse_literal(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => match raw.parse::<bigdecimal::BigDecimal>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::string(raw),
        },
    }
}

/// Split `key=value` into a named argument, otherwise treat the whole
/// string as a positional value.
pub fn parse_call_argument(raw: &str) -> CallArgument {
    match raw.split_once('=') {
        Some((key, value)) => CallArgument {
            value: parse_literal(value),
            is_positional: false,
            key: Some(key.to_string()),
        },
        None => CallArgument {
            value: parse_literal(raw),
            is_positional: true,
            key: None,
        },
    }
}

/// Fold `--profile` flags into one `profiles` named `CallArgument`, the
/// form `Function::call_inner` expects (spec §4.6 step 2).
pub fn profiles_argument(profiles: &[String]) -> Option<CallArgument> {
    if profiles.is_empty() {
        return None;
    }
    Some(CallArgument {
        value: Value::Array(profiles.iter().map(|p| Value::string(p.clone())).collect()),
        is_positional: false,
        key: Some("profiles".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_values_guess_kind() {
        assert_eq!(parse_literal("3").kind(), cl_value::Kind::Number);
        assert_eq!(parse_literal("true").kind(), cl_value::Kind::Bool);
        assert_eq!(parse_literal("hello").kind(), cl_value::Kind::String);
    }

    #[test]
    fn named_arguments_split_on_first_equals() {
        let arg = parse_call_argument("bar=2");
        assert_eq!(arg.key.as_deref(), Some("bar"));
        assert!(!arg.is_positional);
        assert_eq!(arg.value, Value::Number(2.into()));
    }
}
