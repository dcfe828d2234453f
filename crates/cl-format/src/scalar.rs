//! Scalar/identifier formatting helpers.

/// Whether `s` can be written as a bare (unquoted) object key — an
/// identifier per `cl-tokenizer`'s lexer: starts with `_`/alphabetic,
/// continues with `_`/alphanumeric.
pub fn can_be_bare_key(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

/// Escape a string's contents for a double-quoted CL string literal.
/// Mirrors exactly the four escapes `cl-parser::parser::parse_string_literal`
/// understands: `\n \t \r \\ \"`.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_keys_follow_identifier_rules() {
        assert!(can_be_bare_key("host"));
        assert!(can_be_bare_key("_private"));
        assert!(can_be_bare_key("port8080"));
        assert!(!can_be_bare_key(""));
        assert!(!can_be_bare_key("8080"));
        assert!(!can_be_bare_key("key with spaces"));
        assert!(!can_be_bare_key("key-with-dash"));
    }

    #[test]
    fn escaping_round_trips_through_the_four_known_escapes() {
        assert_eq!(escape_string("hello"), "hello");
        assert_eq!(escape_string("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_string("line1\nline2"), "line1\\nline2");
        assert_eq!(escape_string("a\\b"), "a\\\\b");
    }
}
