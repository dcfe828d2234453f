//! Low-level indenting output writer.
//!
//! `cl_value::Value` carries no inline-vs-multiline metadata and no CST
//! behind it to preserve the author's original layout, so there's a
//! single house style: one field per line, two spaces per nesting level.

pub struct Writer {
    out: String,
    depth: usize,
}

impl Writer {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            depth: 0,
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    pub fn line(&mut self, text: &str) {
        self.indent();
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    pub fn newline(&mut self) {
        self.out.push('\n');
    }

    pub fn indent_in(&mut self) {
        self.depth += 1;
    }

    pub fn indent_out(&mut self) {
        self.depth -= 1;
    }

    pub fn write_indent(&mut self) {
        self.indent();
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}
