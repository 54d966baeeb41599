use serde::{Serialize, Serializer};

use crate::error::LexError;

/// A lexical token of the filter language.
///
/// Only `String`, `Int` and `Illegal` carry a value. A well-formed stream ends
/// with exactly one `Eof` or `Illegal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Token {
    /// Lexing failed; the error explains why. Always the last token.
    Illegal(#[serde(serialize_with = "as_message")] LexError),

    /// End of input. Always the last token.
    Eof,

    /// Field name, bare (`.foo`) or quoted (`."foo$"`, `.["foo"]`)
    String(String),

    /// Array index or slice bound
    ///
    /// # Examples
    /// ```text
    /// .[10]
    /// .[10:100]
    /// ```
    Int(i64),

    /// `.`
    Period,

    /// `[`
    #[serde(rename = "LBRACK")]
    LBrack,

    /// `]`
    #[serde(rename = "RBRACK")]
    RBrack,

    /// `:` between slice bounds
    Colon,

    /// `?` optional suffix
    Question,

    /// `,` union connector
    Comma,

    /// `|` pipe connector
    Pipe,
}

fn as_message<S: Serializer>(err: &LexError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(err)
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Illegal(_) => TokenKind::Illegal,
            Token::Eof => TokenKind::Eof,
            Token::String(_) => TokenKind::String,
            Token::Int(_) => TokenKind::Int,
            Token::Period => TokenKind::Period,
            Token::LBrack => TokenKind::LBrack,
            Token::RBrack => TokenKind::RBrack,
            Token::Colon => TokenKind::Colon,
            Token::Question => TokenKind::Question,
            Token::Comma => TokenKind::Comma,
            Token::Pipe => TokenKind::Pipe,
        }
    }

    /// `true` for `Eof` and `Illegal`, the only tokens that end a stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Token::Eof | Token::Illegal(_))
    }
}

/// The value-less classification of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    Illegal,
    Eof,
    String,
    Int,
    Period,
    #[serde(rename = "LBRACK")]
    LBrack,
    #[serde(rename = "RBRACK")]
    RBrack,
    Colon,
    Question,
    Comma,
    Pipe,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::Illegal => "ILLEGAL",
            TokenKind::Eof => "EOF",
            TokenKind::String => "STRING",
            TokenKind::Int => "INT",
            TokenKind::Period => "'.'",
            TokenKind::LBrack => "'['",
            TokenKind::RBrack => "']'",
            TokenKind::Colon => "':'",
            TokenKind::Question => "'?'",
            TokenKind::Comma => "','",
            TokenKind::Pipe => "'|'",
        };
        f.write_str(name)
    }
}

/// Byte range `[start, end)` of the source a token was scanned from.
///
/// For `String` tokens this is the field name without quotes; `Eof` and
/// `Illegal` carry an empty span where scanning stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn empty(at: usize) -> Self {
        Span { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A token together with where it came from; the unit of a token stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub token: Token,
    pub span: Span,
}

impl Item {
    pub fn new(token: Token, span: Span) -> Self {
        Item { token, span }
    }

    pub fn kind(&self) -> TokenKind {
        self.token.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_tokens() {
        assert!(Token::Eof.is_terminal());
        assert!(
            Token::Illegal(LexError::Unterminated { start: 2 }).is_terminal()
        );
        assert!(!Token::Period.is_terminal());
        assert!(!Token::String("foo".to_string()).is_terminal());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(TokenKind::Eof.to_string(), "EOF");
        assert_eq!(TokenKind::Pipe.to_string(), "'|'");
        assert_eq!(Token::Int(3).kind(), TokenKind::Int);
    }

    #[test]
    fn test_span() {
        let span = Span::new(1, 4);
        assert_eq!(span.len(), 3);
        assert!(!span.is_empty());
        assert!(Span::empty(7).is_empty());
    }
}
