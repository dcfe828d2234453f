//! Tokenizer for the CL configuration language.

use crate::{Span, Token, TokenKind};
use tracing::trace;

/// A tokenizer that produces tokens from CL source text.
#[derive(Clone)]
pub struct Tokenizer<'src> {
    /// The source text being tokenized.
    source: &'src str,
    /// The remaining source text (suffix of `source`).
    remaining: &'src str,
    /// Current byte position in `source`.
    pos: u32,
}

impl<'src> Tokenizer<'src> {
    /// Create a new tokenizer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            remaining: source,
            pos: 0,
        }
    }

    /// Get the current byte position.
    #[inline]
    pub fn position(&self) -> u32 {
        self.pos
    }

    /// Check if we're at the end of input.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.remaining.is_empty()
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.remaining.chars().next()
    }

    #[inline]
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.remaining.chars().nth(n)
    }

    #[inline]
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8() as u32;
        self.remaining = &self.remaining[c.len_utf8()..];
        Some(c)
    }

    #[inline]
    fn starts_with(&self, prefix: &str) -> bool {
        self.remaining.starts_with(prefix)
    }

    fn token(&self, kind: TokenKind, start: u32) -> Token<'src> {
        let span = Span::new(start, self.pos);
        let text = &self.source[start as usize..self.pos as usize];
        trace!(?kind, ?span, ?text, "token");
        Token::new(kind, span, text)
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token<'src> {
        if self.is_eof() {
            return self.token(TokenKind::Eof, self.pos);
        }

        let start = self.pos;
        let c = self.peek().unwrap();

        match c {
            '{' => {
                self.advance();
                self.token(TokenKind::LBrace, start)
            }
            '}' => {
                self.advance();
                self.token(TokenKind::RBrace, start)
            }
            '(' => {
                self.advance();
                self.token(TokenKind::LParen, start)
            }
            ')' => {
                self.advance();
                self.token(TokenKind::RParen, start)
            }
            '[' => {
                self.advance();
                self.token(TokenKind::LBracket, start)
            }
            ']' => {
                self.advance();
                self.token(TokenKind::RBracket, start)
            }
            ',' => {
                self.advance();
                self.token(TokenKind::Comma, start)
            }
            ':' => {
                self.advance();
                self.token(TokenKind::Colon, start)
            }
            '.' => {
                self.advance();
                self.token(TokenKind::Dot, start)
            }
            '?' => {
                self.advance();
                self.token(TokenKind::Question, start)
            }
            '*' => {
                self.advance();
                self.token(TokenKind::Star, start)
            }
            '+' => {
                self.advance();
                self.token(TokenKind::Plus, start)
            }
            '-' => {
                self.advance();
                self.token(TokenKind::Minus, start)
            }
            '<' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    self.token(TokenKind::Le, start)
                } else {
                    self.token(TokenKind::Lt, start)
                }
            }
            '>' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    self.token(TokenKind::Ge, start)
                } else {
                    self.token(TokenKind::Gt, start)
                }
            }
            '=' => {
                self.advance();
                match self.peek() {
                    Some('=') => {
                        self.advance();
                        self.token(TokenKind::EqEq, start)
                    }
                    Some('~') => {
                        self.advance();
                        self.token(TokenKind::TildeEq, start)
                    }
                    _ => self.token(TokenKind::Error, start),
                }
            }
            '!' => {
                self.advance();
                match self.peek() {
                    Some('=') => {
                        self.advance();
                        self.token(TokenKind::Ne, start)
                    }
                    Some('~') => {
                        self.advance();
                        self.token(TokenKind::BangTilde, start)
                    }
                    _ => self.token(TokenKind::Bang, start),
                }
            }
            '&' if self.peek_nth(1) == Some('&') => {
                self.advance_by(2);
                self.token(TokenKind::AndAnd, start)
            }
            '|' if self.peek_nth(1) == Some('|') => {
                self.advance_by(2);
                self.token(TokenKind::OrOr, start)
            }
            '/' if self.starts_with("///") => self.tokenize_doc_comment(),
            '/' if self.starts_with("//") => self.tokenize_line_comment(),
            '/' => {
                self.advance();
                self.token(TokenKind::Slash, start)
            }
            '"' => self.tokenize_string(),
            ' ' | '\t' => self.tokenize_whitespace(),
            '\r' | '\n' => self.tokenize_newline(),
            c if c == '_' || c.is_alphabetic() => self.tokenize_ident_or_keyword(),
            c if c.is_ascii_digit() => self.tokenize_number(),
            _ => {
                self.advance();
                self.token(TokenKind::Error, start)
            }
        }
    }

    #[inline]
    fn advance_by(&mut self, bytes: usize) {
        self.pos += bytes as u32;
        self.remaining = &self.remaining[bytes..];
    }

    fn tokenize_whitespace(&mut self) -> Token<'src> {
        let start = self.pos;
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.advance();
        }
        self.token(TokenKind::Whitespace, start)
    }

    fn tokenize_newline(&mut self) -> Token<'src> {
        let start = self.pos;
        if self.peek() == Some('\r') {
            self.advance();
        }
        if self.peek() == Some('\n') {
            self.advance();
        }
        self.token(TokenKind::Newline, start)
    }

    fn tokenize_line_comment(&mut self) -> Token<'src> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
        self.token(TokenKind::LineComment, start)
    }

    fn tokenize_doc_comment(&mut self) -> Token<'src> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
        self.token(TokenKind::DocComment, start)
    }

    fn tokenize_ident_or_keyword(&mut self) -> Token<'src> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c == '_' || c.is_alphanumeric()) {
            self.advance();
        }
        let text = &self.source[start as usize..self.pos as usize];
        let kind = match text {
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "local" => TokenKind::Local,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => TokenKind::Ident,
        };
        self.token(kind, start)
    }

    fn tokenize_number(&mut self) -> Token<'src> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') && matches!(self.peek_nth(1), Some(c) if c.is_ascii_digit()) {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let save_pos = self.pos;
            let save_remaining = self.remaining;
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            if matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
            } else {
                self.pos = save_pos;
                self.remaining = save_remaining;
            }
        }
        self.token(TokenKind::Number, start)
    }

    /// Tokenize a quoted string. Escapes and `\( ... \)` interpolation
    /// markers are left in the raw text for the parser to split; the
    /// tokenizer only needs to find the matching unescaped closing quote.
    fn tokenize_string(&mut self) -> Token<'src> {
        let start = self.pos;
        self.advance(); // opening quote
        let mut paren_depth = 0i32;
        while let Some(c) = self.peek() {
            match c {
                '\\' => {
                    self.advance();
                    self.advance();
                }
                '(' if paren_depth > 0 => {
                    paren_depth += 1;
                    self.advance();
                }
                ')' if paren_depth > 0 => {
                    paren_depth -= 1;
                    self.advance();
                }
                '"' if paren_depth == 0 => {
                    self.advance();
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }
        self.token(TokenKind::String, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize_all(source: &str) -> Vec<TokenKind> {
        let mut tok = Tokenizer::new(source);
        let mut kinds = Vec::new();
        loop {
            let t = tok.next_token();
            if t.kind == TokenKind::Eof {
                break;
            }
            kinds.push(t.kind);
        }
        kinds
    }

    #[test]
    fn test_structural() {
        assert_eq!(
            tokenize_all("{}()[]"),
            vec![
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBracket,
                TokenKind::RBracket,
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            tokenize_all("<= >= == != =~ !~ && ||"),
            vec![
                TokenKind::Le,
                TokenKind::Whitespace,
                TokenKind::Ge,
                TokenKind::Whitespace,
                TokenKind::EqEq,
                TokenKind::Whitespace,
                TokenKind::Ne,
                TokenKind::Whitespace,
                TokenKind::TildeEq,
                TokenKind::Whitespace,
                TokenKind::BangTilde,
                TokenKind::Whitespace,
                TokenKind::AndAnd,
                TokenKind::Whitespace,
                TokenKind::OrOr,
            ]
        );
    }

    #[test]
    fn test_keywords_vs_ident() {
        assert_eq!(tokenize_all("if else for in local"), {
            use TokenKind::*;
            vec![
                If, Whitespace, Else, Whitespace, For, Whitespace, In, Whitespace, Local,
            ]
        });
        assert_eq!(tokenize_all("iffy"), vec![TokenKind::Ident]);
    }

    #[test]
    fn test_number() {
        assert_eq!(tokenize_all("42"), vec![TokenKind::Number]);
        assert_eq!(tokenize_all("3.14"), vec![TokenKind::Number]);
        assert_eq!(tokenize_all("1e10"), vec![TokenKind::Number]);
    }

    #[test]
    fn test_string_with_interpolation() {
        let src = r#""hello \(name)""#;
        let mut tok = Tokenizer::new(src);
        let t = tok.next_token();
        assert_eq!(t.kind, TokenKind::String);
        assert_eq!(t.text, src);
    }

    #[test]
    fn test_string_with_escaped_quote() {
        let src = r#""wo\"rld""#;
        let mut tok = Tokenizer::new(src);
        let t = tok.next_token();
        assert_eq!(t.kind, TokenKind::String);
        assert_eq!(t.text, src);
    }
}
