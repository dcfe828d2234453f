//! Format a `cl_value::Value` back to CL source text.

use cl_value::{Entry, FieldType, SchemaContext, SchemaValue, Value};

use crate::scalar::{can_be_bare_key, escape_string};
use crate::writer::Writer;

/// Format a value as a document: if it's an object, its fields are written
/// at the top level with no enclosing braces, matching how a CL source file
/// itself has no outer `{ }`.
pub fn format_value(value: &Value) -> String {
    let mut formatter = ValueFormatter::new();
    formatter.format_root(value);
    formatter.writer.finish()
}

/// Format a value as a standalone expression, always braced if it's an
/// object. Useful for formatting a single field's value in isolation.
pub fn format_expr(value: &Value) -> String {
    let mut formatter = ValueFormatter::new();
    formatter.format_value(value);
    formatter.writer.finish()
}

struct ValueFormatter {
    writer: Writer,
}

impl ValueFormatter {
    fn new() -> Self {
        Self { writer: Writer::new() }
    }

    fn format_root(&mut self, value: &Value) {
        match value {
            Value::Object(entries) => self.format_entries(entries),
            other => self.format_value(other),
        }
    }

    fn format_value(&mut self, value: &Value) {
        match value {
            Value::Null => self.writer.write("null"),
            Value::Bool(b) => self.writer.write(&b.to_string()),
            Value::Number(n) => self.writer.write(&n.to_string()),
            Value::String(s) => self.format_string(s),
            Value::Array(items) => self.format_array(items),
            Value::Object(entries) => self.format_object(entries),
            Value::Func(_) => self.writer.write("<func>"),
            Value::Schema(schema) => self.format_schema(schema),
            Value::Undefined(_) => self.writer.write("undefined"),
        }
    }

    fn format_string(&mut self, s: &str) {
        self.writer.write("\"");
        self.writer.write(&escape_string(s));
        self.writer.write("\"");
    }

    fn format_array(&mut self, items: &[Value]) {
        if items.is_empty() {
            self.writer.write("[]");
            return;
        }
        self.writer.write("[");
        self.writer.newline();
        self.writer.indent_in();
        for item in items {
            self.writer.write_indent();
            self.format_value(item);
            self.writer.write(",");
            self.writer.newline();
        }
        self.writer.indent_out();
        self.writer.write_indent();
        self.writer.write("]");
    }

    fn format_object(&mut self, entries: &[Entry]) {
        if entries.is_empty() {
            self.writer.write("{}");
            return;
        }
        self.writer.write("{");
        self.writer.newline();
        self.writer.indent_in();
        self.format_entries(entries);
        self.writer.indent_out();
        self.writer.write_indent();
        self.writer.write("}");
    }

    fn format_entries(&mut self, entries: &[Entry]) {
        for entry in entries {
            self.writer.write_indent();
            self.format_key(&entry.key);
            self.writer.write(": ");
            self.format_value(&entry.value);
            self.writer.newline();
        }
    }

    fn format_key(&mut self, key: &str) {
        if can_be_bare_key(key) {
            self.writer.write(key);
        } else {
            self.format_string(key);
        }
    }

    /// Best-effort formatting of an unclosed schema value. There's no CL
    /// surface syntax that round-trips an arbitrary `Contract`, so this
    /// walks the same schema-derivation shape `cl fmt`'s `schema`
    /// subcommand would show rather than inventing new syntax.
    fn format_schema(&mut self, schema: &SchemaValue) {
        let ctx = SchemaContext::new();
        let value = Value::Schema(schema.clone());
        match cl_value::describe_field_type(&ctx, &value) {
            Ok(field_type) => self.format_field_type(&field_type),
            Err(_) => self.writer.write("<schema>"),
        }
    }

    fn format_field_type(&mut self, ft: &FieldType) {
        if let Some(array) = &ft.array {
            self.writer.write("[");
            self.format_field_type(&array.items);
            self.writer.write("]");
            return;
        }
        if let Some(object) = &ft.object {
            if object.reference {
                self.writer.write("{...}");
                return;
            }
            if object.fields.is_empty() {
                self.writer.write("{}");
            } else {
                self.writer.write("{");
                self.writer.newline();
                self.writer.indent_in();
                for field in &object.fields {
                    self.writer.write_indent();
                    self.format_key(&field.name);
                    if field.optional {
                        self.writer.write("?");
                    }
                    self.writer.write(": ");
                    self.format_field_type(&field.field_type);
                    self.writer.newline();
                }
                self.writer.indent_out();
                self.writer.write_indent();
                self.writer.write("}");
            }
            return;
        }
        self.writer.write(&ft.kind.to_string());
        for constraint in &ft.constraints {
            self.writer.write(&format!(" {} ", constraint.op));
            if let Some(right) = &constraint.right {
                self.format_value(right);
            }
        }
        if let Some(default) = &ft.default {
            self.writer.write(" || *");
            self.format_value(default);
        }
        if let Some(alt) = &ft.alternate {
            self.writer.write(" || ");
            self.format_field_type(alt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cl_value::Entry as CLEntry;

    #[test]
    fn formats_scalars_and_strings() {
        assert_eq!(format_expr(&Value::Number(42.into())), "42");
        assert_eq!(format_expr(&Value::Bool(true)), "true");
        assert_eq!(format_expr(&Value::string("hi")), "\"hi\"");
    }

    #[test]
    fn formats_object_with_bare_and_quoted_keys() {
        let value = Value::Object(vec![
            CLEntry::new("host", Value::string("localhost")),
            CLEntry::new("weird key", Value::Number(1.into())),
        ]);
        let out = format_value(&value);
        assert!(out.contains("host: \"localhost\""));
        assert!(out.contains("\"weird key\": 1"));
    }

    #[test]
    fn formats_array_one_item_per_line() {
        let value = Value::Array(vec![Value::Number(1.into()), Value::Number(2.into())]);
        let out = format_expr(&value);
        assert_eq!(out, "[\n  1,\n  2,\n]");
    }

    #[test]
    fn root_object_has_no_enclosing_braces() {
        let value = Value::Object(vec![CLEntry::new("a", Value::Number(1.into()))]);
        let out = format_value(&value);
        assert_eq!(out, "a: 1\n");
    }
}
