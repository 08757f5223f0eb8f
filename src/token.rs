//! Token stream adapter.
//!
//! The analyzer does not parse raw source text; it consumes an ordered
//! token stream supplied by a host lexer. [`TokenStream`] is the adapter
//! around that stream: lexical categories, matching-brace links, and the
//! forward/backward searches the builder relies on.

use std::fmt;

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Public,
    Protected,
    Private,
    Final,
    Class,
    Function,
    Return,
    /// A `$`-prefixed variable, e.g. `$this`.
    Variable,
    Ident,
    /// A tag inside a doc comment, e.g. `@context`.
    DocCommentTag,
    Comment,
    Whitespace,
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Assign,
    /// Member access (`->`).
    Arrow,
    At,
    Semicolon,
    Other,
}

impl TokenKind {
    /// Visibility modifiers open Role and Method declarations.
    pub fn is_visibility(self) -> bool {
        matches!(self, Self::Public | Self::Protected | Self::Private)
    }

    /// Tokens skipped when looking for the significant neighbor.
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::Whitespace | Self::Comment)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A single token. Its position is its index in the stream.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based source line, 0 when unknown.
    pub line: u32,
    /// For braces: position of the matching partner, when balanced.
    scope_mate: Option<usize>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            line: 0,
            scope_mate: None,
        }
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }
}

/// Ordered token stream with brace matching and bounded searches.
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Build a stream, resolving matching-brace links. Unbalanced braces
    /// are left unlinked; the builder degrades gracefully around them.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        let mut stack: Vec<usize> = Vec::new();
        let mut pairs: Vec<(usize, usize)> = Vec::new();

        for (pos, token) in tokens.iter().enumerate() {
            match token.kind {
                TokenKind::OpenBrace => stack.push(pos),
                TokenKind::CloseBrace => {
                    if let Some(open) = stack.pop() {
                        pairs.push((open, pos));
                    }
                }
                _ => {}
            }
        }

        for (open, close) in pairs {
            tokens[open].scope_mate = Some(close);
            tokens[close].scope_mate = Some(open);
        }

        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, pos: usize) -> Option<&Token> {
        self.tokens.get(pos)
    }

    /// 1-based source line of a token, 0 when unknown.
    pub fn line_of(&self, pos: usize) -> u32 {
        self.get(pos).map_or(0, |t| t.line)
    }

    /// Matching partner of a brace token.
    pub fn scope_mate(&self, pos: usize) -> Option<usize> {
        self.get(pos).and_then(|t| t.scope_mate)
    }

    /// Search forward (exclusive of `from`) for the next token of `kind`.
    ///
    /// With `scope_local`, the search does not escape the current
    /// statement: it stops at a semicolon or any brace.
    pub fn find_next(&self, kind: TokenKind, from: usize, scope_local: bool) -> Option<usize> {
        for pos in from + 1..self.tokens.len() {
            let current = self.tokens[pos].kind;
            if current == kind {
                return Some(pos);
            }
            if scope_local
                && matches!(
                    current,
                    TokenKind::Semicolon | TokenKind::OpenBrace | TokenKind::CloseBrace
                )
            {
                return None;
            }
        }
        None
    }

    /// Backward analogue of [`find_next`](Self::find_next).
    pub fn find_previous(&self, kind: TokenKind, from: usize, scope_local: bool) -> Option<usize> {
        for pos in (0..from).rev() {
            let current = self.tokens[pos].kind;
            if current == kind {
                return Some(pos);
            }
            if scope_local
                && matches!(
                    current,
                    TokenKind::Semicolon | TokenKind::OpenBrace | TokenKind::CloseBrace
                )
            {
                return None;
            }
        }
        None
    }

    /// Next non-trivia token after `from`.
    pub fn next_significant(&self, from: usize) -> Option<usize> {
        (from + 1..self.tokens.len()).find(|&pos| !self.tokens[pos].kind.is_trivia())
    }

    /// Previous non-trivia token before `from`.
    pub fn prev_significant(&self, from: usize) -> Option<usize> {
        (0..from).rev().find(|&pos| !self.tokens[pos].kind.is_trivia())
    }

    /// Bounded lookbehind: the contiguous doc-comment tags immediately
    /// preceding `pos`, in source order. Walks backward over whitespace,
    /// comments and tags, stopping at the first other token.
    pub fn tags_before(&self, pos: usize) -> Vec<String> {
        let mut tags = Vec::new();

        for p in (0..pos).rev() {
            match self.tokens[p].kind {
                TokenKind::DocCommentTag => tags.push(self.tokens[p].text.clone()),
                TokenKind::Whitespace | TokenKind::Comment => {}
                _ => break,
            }
        }

        tags.reverse();
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(kinds: &[(TokenKind, &str)]) -> TokenStream {
        TokenStream::new(
            kinds
                .iter()
                .map(|(k, t)| Token::new(*k, t.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_visibility_kinds() {
        assert!(TokenKind::Public.is_visibility());
        assert!(TokenKind::Protected.is_visibility());
        assert!(TokenKind::Private.is_visibility());
        assert!(!TokenKind::Final.is_visibility());
        assert!(!TokenKind::Ident.is_visibility());
    }

    #[test]
    fn test_brace_matching() {
        use TokenKind::*;
        let s = stream(&[
            (Class, "class"),
            (OpenBrace, "{"),
            (OpenBrace, "{"),
            (CloseBrace, "}"),
            (CloseBrace, "}"),
        ]);

        assert_eq!(s.scope_mate(1), Some(4));
        assert_eq!(s.scope_mate(4), Some(1));
        assert_eq!(s.scope_mate(2), Some(3));
        assert_eq!(s.scope_mate(0), None);
    }

    #[test]
    fn test_unbalanced_braces_stay_unlinked() {
        use TokenKind::*;
        let s = stream(&[(OpenBrace, "{"), (OpenBrace, "{"), (CloseBrace, "}")]);

        assert_eq!(s.scope_mate(1), Some(2));
        assert_eq!(s.scope_mate(0), None);
    }

    #[test]
    fn test_scope_local_search_stops_at_statement_end() {
        use TokenKind::*;
        // private $source; private function run() {
        let s = stream(&[
            (Private, "private"),
            (Variable, "$source"),
            (Semicolon, ";"),
            (Private, "private"),
            (Function, "function"),
        ]);

        // Local search from the first modifier must not see the later function.
        assert_eq!(s.find_next(TokenKind::Function, 0, true), None);
        assert_eq!(s.find_next(TokenKind::Function, 0, false), Some(4));
        assert_eq!(s.find_next(TokenKind::Variable, 0, true), Some(1));
    }

    #[test]
    fn test_tags_before() {
        use TokenKind::*;
        let s = stream(&[
            (DocCommentTag, "@context"),
            (Whitespace, " "),
            (DocCommentTag, "@immutable"),
            (Whitespace, "\n"),
            (Private, "private"),
            (Variable, "$source"),
        ]);

        assert_eq!(s.tags_before(4), vec!["@context", "@immutable"]);
        // An interposed non-comment token cuts the walk.
        assert!(s.tags_before(0).is_empty());
    }

    #[test]
    fn test_significant_neighbors() {
        use TokenKind::*;
        let s = stream(&[
            (Return, "return"),
            (Whitespace, " "),
            (Variable, "$this"),
            (Comment, "// x"),
            (Semicolon, ";"),
        ]);

        assert_eq!(s.next_significant(0), Some(2));
        assert_eq!(s.prev_significant(2), Some(0));
        assert_eq!(s.next_significant(2), Some(4));
    }
}
