use std::{io, num::ParseIntError};

use crate::{context::ContextError, token::TokenKind};

/// Errors reported by the [`RuneReader`](crate::reader::RuneReader).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    /// End of input. Not a failure in itself; states decide what it means.
    #[error("unexpected end of input")]
    Eof,

    #[error("invalid UTF-8 sequence at byte offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("slice {start}..{end} is out of bounds")]
    OutOfBounds { start: usize, end: usize },
}

/// Errors carried by an `ILLEGAL` token.
///
/// The lexer stops at the first one of these; it never resynchronizes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    /// A read failed for a reason other than running out of input.
    #[error("{state}: {source}")]
    Read {
        state: &'static str,
        #[source]
        source: ReadError,
    },

    /// A required delimiter was missing.
    #[error("{state}: expected {expected}, found {}", describe(.found))]
    Expected {
        state: &'static str,
        expected: &'static str,
        found: Option<char>,
    },

    #[error("unterminated quoted field starting at byte offset {start}")]
    Unterminated { start: usize },

    #[error("invalid integer {literal:?}: {source}")]
    InvalidInt {
        literal: String,
        #[source]
        source: ParseIntError,
    },
}

fn describe(found: &Option<char>) -> String {
    match found {
        Some(c) => format!("{c:?}"),
        None => "end of input".to_string(),
    }
}

/// Errors returned by the [`Builder`](crate::builder::Builder).
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("expected filter expression, found {found} at byte offset {offset}")]
    ExpectedFilter { found: TokenKind, offset: usize },

    #[error("expected {expected}, found {found} at byte offset {offset}")]
    Unexpected {
        expected: &'static str,
        found: TokenKind,
        offset: usize,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("{found} after '.' is not yet supported (byte offset {offset})")]
    Unsupported { found: TokenKind, offset: usize },

    #[error("syntax error at byte offset {offset}: {source}")]
    Lex {
        offset: usize,
        #[source]
        source: LexError,
    },

    /// The token stream ended without a terminal token.
    #[error("token stream closed before end of input")]
    StreamClosed,

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("{node} node cannot have children")]
    NotAppendable { node: &'static str },

    #[error("failed to start lexer thread: {0}")]
    Spawn(#[source] io::Error),
}
