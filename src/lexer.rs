//! Minimal reference lexer for a PHP-like class syntax.
//!
//! The analytical core consumes a [`TokenStream`] from a host lexer; this
//! module is the stand-in host used by the CLI and the test suite. It is
//! deliberately small: just enough lexical structure to drive the
//! builder (visibility keywords, identifiers, `$`-variables, doc-comment
//! tags, braces, and the operators the reference classifier inspects).
//! It is not a parser and never will be.

use crate::token::{Token, TokenKind, TokenStream};

/// Lex source text into a token stream with brace links resolved.
pub fn lex(source: &str) -> TokenStream {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> TokenStream {
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => self.whitespace(),
                b'/' if self.peek(1) == Some(b'*') => self.block_comment(),
                b'/' if self.peek(1) == Some(b'/') => self.line_comment(),
                b'#' => self.line_comment(),
                b'$' => self.variable(),
                b'\'' | b'"' => self.string(b),
                b'{' => self.single(TokenKind::OpenBrace, "{"),
                b'}' => self.single(TokenKind::CloseBrace, "}"),
                b'(' => self.single(TokenKind::OpenParen, "("),
                b')' => self.single(TokenKind::CloseParen, ")"),
                b'[' => self.single(TokenKind::OpenBracket, "["),
                b']' => self.single(TokenKind::CloseBracket, "]"),
                b';' => self.single(TokenKind::Semicolon, ";"),
                b'@' => self.single(TokenKind::At, "@"),
                b'-' if self.peek(1) == Some(b'>') => {
                    self.push(TokenKind::Arrow, "->");
                    self.pos += 2;
                }
                b'=' if self.peek(1) == Some(b'=') => {
                    // ==, === — comparison, not assignment
                    let start = self.pos;
                    while self.pos < self.bytes.len() && self.bytes[self.pos] == b'=' {
                        self.pos += 1;
                    }
                    let text = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
                    self.push(TokenKind::Other, text);
                }
                b'=' if self.peek(1) == Some(b'>') => {
                    self.push(TokenKind::Other, "=>");
                    self.pos += 2;
                }
                b'=' => self.single(TokenKind::Assign, "="),
                b'+' | b'-' | b'*' | b'.' if self.peek(1) == Some(b'=') => {
                    let text: String = format!("{}=", b as char);
                    self.push(TokenKind::Assign, text);
                    self.pos += 2;
                }
                _ if b.is_ascii_alphabetic() || b == b'_' => self.word(),
                _ => {
                    let text = (b as char).to_string();
                    self.single(TokenKind::Other, text);
                }
            }
        }

        TokenStream::new(self.tokens)
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn push(&mut self, kind: TokenKind, text: impl Into<String>) {
        self.tokens.push(Token::new(kind, text).with_line(self.line));
    }

    fn single(&mut self, kind: TokenKind, text: impl Into<String>) {
        self.push(kind, text);
        self.pos += 1;
    }

    fn whitespace(&mut self) {
        let start = self.pos;
        let start_line = self.line;
        while self.pos < self.bytes.len()
            && matches!(self.bytes[self.pos], b' ' | b'\t' | b'\r' | b'\n')
        {
            if self.bytes[self.pos] == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
        let text = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
        self.tokens
            .push(Token::new(TokenKind::Whitespace, text).with_line(start_line));
    }

    fn line_comment(&mut self) {
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
        let text = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
        self.push(TokenKind::Comment, text);
    }

    /// Block and doc comments. A doc comment additionally yields one
    /// `DocCommentTag` token per `@tag` found in its body, so the
    /// builder's tag lookbehind sees them as contiguous trivia.
    fn block_comment(&mut self) {
        let start = self.pos;
        let start_line = self.line;
        self.pos += 2;
        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] == b'\n' {
                self.line += 1;
            }
            if self.bytes[self.pos] == b'*' && self.peek(1) == Some(b'/') {
                self.pos += 2;
                break;
            }
            self.pos += 1;
        }

        let text = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
        let is_doc = text.starts_with("/**");
        self.tokens
            .push(Token::new(TokenKind::Comment, text.clone()).with_line(start_line));

        if is_doc {
            for tag in doc_tags(&text) {
                self.tokens
                    .push(Token::new(TokenKind::DocCommentTag, tag).with_line(start_line));
            }
        }
    }

    fn string(&mut self, quote: u8) {
        let start = self.pos;
        self.pos += 1;
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if b == b'\\' {
                self.pos += 2;
                continue;
            }
            if b == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
            if b == quote {
                break;
            }
        }
        let text = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
        self.push(TokenKind::Other, text);
    }

    fn variable(&mut self) {
        let start = self.pos;
        self.pos += 1;
        while self.pos < self.bytes.len()
            && (self.bytes[self.pos].is_ascii_alphanumeric() || self.bytes[self.pos] == b'_')
        {
            self.pos += 1;
        }
        let text = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
        self.push(TokenKind::Variable, text);
    }

    fn word(&mut self) {
        let start = self.pos;
        while self.pos < self.bytes.len()
            && (self.bytes[self.pos].is_ascii_alphanumeric() || self.bytes[self.pos] == b'_')
        {
            self.pos += 1;
        }
        let text = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
        let kind = match text.as_str() {
            "public" => TokenKind::Public,
            "protected" => TokenKind::Protected,
            "private" => TokenKind::Private,
            "final" => TokenKind::Final,
            "class" => TokenKind::Class,
            "function" => TokenKind::Function,
            "return" => TokenKind::Return,
            _ => TokenKind::Ident,
        };
        self.push(kind, text);
    }
}

/// Extract `@tag` words from a doc comment body.
fn doc_tags(comment: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let bytes = comment.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'@' {
            let start = i;
            i += 1;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            if i > start + 1 {
                tags.push(comment[start..i].to_string());
            }
        } else {
            i += 1;
        }
    }
    tags
}
