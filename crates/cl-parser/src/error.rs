//! Parse diagnostics, rendered as `ariadne` reports pointing at the
//! offending source span.

use ariadne::{Color, Label, Report, ReportKind, Source};
use cl_tokenizer::Span;
use std::fmt;

/// The kind of syntax error encountered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },
    #[error("unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String },
    #[error("expected a field key")]
    ExpectedKey,
    #[error("expected a value expression")]
    ExpectedValue,
    #[error("duplicate key `{0}` in object literal")]
    DuplicateKey(String),
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("invalid number literal")]
    InvalidNumber,
    #[error("unclosed `{{`")]
    UnclosedBrace,
    #[error("unclosed `[`")]
    UnclosedBracket,
    #[error("unclosed `(`")]
    UnclosedParen,
    #[error("invalid key expression")]
    InvalidKey,
}

/// A single parse error with source location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Render this error as a styled ariadne report string, given the
    /// original source text and a display name for the source file.
    pub fn render(&self, source_name: &str, source: &str) -> String {
        let mut buf = Vec::new();
        self.write_report(source_name, source, &mut buf)
            .expect("writing to an in-memory buffer never fails");
        String::from_utf8(buf).expect("ariadne reports are valid utf-8")
    }

    fn write_report<W: std::io::Write>(
        &self,
        source_name: &str,
        source: &str,
        w: &mut W,
    ) -> std::io::Result<()> {
        self.build_report(source_name).write(
            (source_name, Source::from(source)),
            w,
        )
    }

    fn build_report(&self, source_name: &str) -> Report<'static, (String, std::ops::Range<usize>)> {
        let range: std::ops::Range<usize> = self.span.into();
        let (help, label_msg) = self.help_and_label();
        let mut report = Report::build(ReportKind::Error, (source_name.to_string(), range.clone()))
            .with_message(self.kind.to_string())
            .with_label(
                Label::new((source_name.to_string(), range))
                    .with_message(label_msg)
                    .with_color(Color::Red),
            );
        if let Some(help) = help {
            report = report.with_help(help);
        }
        report.finish()
    }

    fn help_and_label(&self) -> (Option<&'static str>, String) {
        match &self.kind {
            ParseErrorKind::UnexpectedToken { expected, found } => (
                None,
                format!("expected {expected}, found {found} here"),
            ),
            ParseErrorKind::UnexpectedEof { expected } => {
                (None, format!("expected {expected}, reached end of input"))
            }
            ParseErrorKind::ExpectedKey => (
                Some("field keys are identifiers, quoted strings, `(expr)`, or `[expr]`"),
                "expected a key here".into(),
            ),
            ParseErrorKind::ExpectedValue => {
                (None, "expected a value expression here".into())
            }
            ParseErrorKind::DuplicateKey(key) => (
                Some("remove or rename one of the duplicate fields"),
                format!("`{key}` is already defined in this object"),
            ),
            ParseErrorKind::InvalidEscape => {
                (Some(r#"valid escapes are \n \t \r \\ \" \( "#), "invalid escape here".into())
            }
            ParseErrorKind::UnterminatedString => {
                (Some("add a closing `\"`"), "string starts here".into())
            }
            ParseErrorKind::InvalidNumber => (None, "not a valid number".into()),
            ParseErrorKind::UnclosedBrace => (Some("add a closing `}`"), "opened here".into()),
            ParseErrorKind::UnclosedBracket => (Some("add a closing `]`"), "opened here".into()),
            ParseErrorKind::UnclosedParen => (Some("add a closing `)`"), "opened here".into()),
            ParseErrorKind::InvalidKey => (None, "not a valid key expression".into()),
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", <Self as std::error::Error>::to_string(self))
    }
}

/// Sort and deduplicate a batch of parse errors, the way
/// `original_source/pkg/errors/errors.go` (`SanitizeParserErrors`) keeps a
/// single failed parse from reporting a cascade of near-duplicate errors.
pub fn sanitize_parser_errors(mut errors: Vec<ParseError>) -> Vec<ParseError> {
    errors.sort_by(|a, b| {
        a.span
            .start
            .cmp(&b.span.start)
            .then(a.span.end.cmp(&b.span.end))
    });
    remove_multiples(errors)
}

/// Two errors within this many bytes of each other are considered to be
/// reporting the same underlying failure.
const APPROXIMATE_DISTANCE: u32 = 1;

fn approximately_equal(a: &ParseError, b: &ParseError) -> bool {
    a.span.start.abs_diff(b.span.start) <= APPROXIMATE_DISTANCE && a.kind == b.kind
}

fn remove_multiples(errors: Vec<ParseError>) -> Vec<ParseError> {
    let mut out: Vec<ParseError> = Vec::with_capacity(errors.len());
    for err in errors {
        if out.last().is_none_or(|prev| !approximately_equal(prev, &err)) {
            out.push(err);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupes_adjacent_duplicates() {
        let errors = vec![
            ParseError::new(ParseErrorKind::ExpectedValue, Span::new(5, 5)),
            ParseError::new(ParseErrorKind::ExpectedValue, Span::new(6, 6)),
            ParseError::new(ParseErrorKind::ExpectedKey, Span::new(20, 20)),
        ];
        let sanitized = sanitize_parser_errors(errors);
        assert_eq!(sanitized.len(), 2);
    }

    #[test]
    fn render_includes_message() {
        let err = ParseError::new(
            ParseErrorKind::UnexpectedToken {
                expected: "`:`".into(),
                found: "`,`".into(),
            },
            Span::new(3, 4),
        );
        let rendered = err.render("test.cl", "{ a, }");
        assert!(rendered.contains("unexpected token"));
    }
}
