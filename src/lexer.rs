//! State-machine lexer for filter expressions.
//!
//! The lexer is a set of states, each of which reads from a [`RuneReader`],
//! emits zero or more tokens into a [`Sink`] and names the state to run next.
//! [`Scanner::run`] drives the machine until a state stops it or the
//! [`Context`] is done. Every read, peek and emit observes cancellation.
//!
//! ```text
//! Expr ──'.'──▶ Filter ──letter──▶ IdentField ──┐
//!                 │ ──'"'───▶ QuotedField ──────┤
//!                 │ ──'['───▶ Index ────────────┤
//!                 │                             ▼
//!                 └◀──'|' ',' '.'── ConnectorOrFilter ──EOF──▶ stop
//! ```

use std::{collections::VecDeque, fmt, io, thread};

use crossbeam_channel::{Sender, select};
use unicode_general_category::{GeneralCategory, get_general_category};

use crate::{
    context::Context,
    error::{LexError, ReadError},
    iter::{InlineTokens, TokenIterator},
    reader::RuneReader,
    token::{Item, Span, Token},
};

/// Entry point for lexing a filter expression.
#[derive(Debug, Default, Clone, Copy)]
pub struct Lexer;

impl Lexer {
    pub fn new() -> Self {
        Lexer
    }

    /// Lexes `src` on a dedicated thread.
    ///
    /// Tokens are handed over one at a time: the lexer does not scan ahead of
    /// the consumer. Dropping the returned iterator stops the thread.
    pub fn spawn(&self, ctx: &Context, src: impl AsRef<[u8]>) -> io::Result<TokenIterator> {
        let (tx, rx) = crossbeam_channel::bounded(0);
        let scanner = Scanner::new(ctx.clone(), tx, RuneReader::new(src.as_ref()));
        thread::Builder::new()
            .name("jqg-lexer".to_string())
            .spawn(move || scanner.run())?;
        Ok(TokenIterator::new(ctx.clone(), rx))
    }

    /// Lexes `src` on the caller's thread, scanning only when a token is asked for.
    pub fn pull(&self, ctx: &Context, src: impl AsRef<[u8]>) -> InlineTokens {
        let scanner = Scanner::new(ctx.clone(), VecDeque::new(), RuneReader::new(src.as_ref()));
        InlineTokens::new(ctx.clone(), scanner)
    }
}

/// Where the lexer delivers tokens.
pub(crate) trait Sink {
    /// Hands `item` over, returning `false` if the run must stop instead.
    fn emit(&mut self, ctx: &Context, item: Item) -> bool;
}

impl Sink for Sender<Item> {
    fn emit(&mut self, ctx: &Context, item: Item) -> bool {
        if ctx.is_done() {
            return false;
        }
        let tx: &Sender<Item> = self;
        let expiry = ctx.expiry();
        select! {
            send(tx, item) -> res => res.is_ok(),
            recv(ctx.done()) -> _ => false,
            recv(expiry) -> _ => false,
        }
    }
}

impl Sink for VecDeque<Item> {
    fn emit(&mut self, ctx: &Context, item: Item) -> bool {
        if ctx.is_done() {
            return false;
        }
        self.push_back(item);
        true
    }
}

/// What the scanner expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Expr,
    Filter,
    IdentField,
    QuotedField,
    Index,
    ConnectorOrFilter,
}

impl State {
    fn name(self) -> &'static str {
        match self {
            State::Expr => "expression-start",
            State::Filter => "filter-start",
            State::IdentField => "ident-field",
            State::QuotedField => "quoted-field",
            State::Index => "index",
            State::ConnectorOrFilter => "connector-or-filter",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a state stopped early.
enum Halt {
    /// Cancelled, or nobody is listening any more. Nothing else is emitted.
    Aborted,
    /// Bad input. Reported as the final `ILLEGAL` token.
    Illegal(LexError),
}

impl From<LexError> for Halt {
    fn from(err: LexError) -> Self {
        Halt::Illegal(err)
    }
}

type Step = Result<Option<State>, Halt>;

pub(crate) struct Scanner<S> {
    ctx: Context,
    sink: S,
    rdr: RuneReader,
    state: State,
}

impl<S: Sink> Scanner<S> {
    pub(crate) fn new(ctx: Context, sink: S, rdr: RuneReader) -> Self {
        Scanner {
            ctx,
            sink,
            rdr,
            state: State::Expr,
        }
    }

    pub(crate) fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Runs the machine to completion. The sink is dropped on return, which
    /// closes a channel-backed stream.
    pub(crate) fn run(mut self) {
        let mut next = Some(State::Expr);
        while let Some(state) = next {
            if let Some(err) = self.ctx.err() {
                log::debug!("lexer: stopping before {state}: {err}");
                break;
            }
            next = self.step(state);
        }
        log::trace!("lexer: run finished at byte offset {}", self.rdr.offset());
    }

    /// Runs a single state and returns the one to run next.
    pub(crate) fn step(&mut self, state: State) -> Option<State> {
        log::trace!("lexer: {state} at byte offset {}", self.rdr.offset());
        self.state = state;

        let res = match state {
            State::Expr => self.lex_expr(),
            State::Filter => self.lex_filter(),
            State::IdentField => self.lex_ident_field(),
            State::QuotedField => self.lex_quoted_field(),
            State::Index => self.lex_index(),
            State::ConnectorOrFilter => self.lex_connector_or_filter(),
        };

        match res {
            Ok(next) => next,
            Err(Halt::Aborted) => {
                log::debug!("lexer: {state} aborted");
                None
            }
            Err(Halt::Illegal(err)) => {
                log::debug!("lexer: illegal input: {err}");
                let at = self.rdr.offset();
                self.sink
                    .emit(&self.ctx, Item::new(Token::Illegal(err), Span::empty(at)));
                None
            }
        }
    }

    fn lex_expr(&mut self) -> Step {
        self.rdr.skip_spaces();

        match self.peek()? {
            Some('.') => Ok(Some(State::Filter)),
            None => self.eof(),
            found => Err(self.expected("'.'", found)),
        }
    }

    fn lex_filter(&mut self) -> Step {
        self.rdr.skip_spaces();

        let start = self.rdr.offset();
        self.expect('.', "'.'")?;
        self.emit(Token::Period, start)?;

        self.rdr.skip_spaces();
        Ok(match self.peek()? {
            Some('"') => Some(State::QuotedField),
            Some('[') => Some(State::Index),
            Some(c) if is_letter(c) => Some(State::IdentField),
            // A bare '.', whatever follows is up to expression-start.
            Some(_) => Some(State::Expr),
            None => return self.eof(),
        })
    }

    fn lex_ident_field(&mut self) -> Step {
        let start = self.rdr.offset();

        loop {
            match self.peek() {
                Ok(Some(c)) if is_letter(c) => self.bump(),
                Err(Halt::Aborted) => return Err(Halt::Aborted),
                // End of input and decode errors end the name; the next state reports them.
                _ => break,
            }
        }

        let name = self.slice_from(start)?;
        self.emit(Token::String(name), start)?;
        self.finish_filter()
    }

    fn lex_quoted_field(&mut self) -> Step {
        self.accept_quoted()?;
        self.finish_filter()
    }

    fn lex_index(&mut self) -> Step {
        self.rdr.skip_spaces();

        let start = self.rdr.offset();
        self.expect('[', "'['")?;
        self.emit(Token::LBrack, start)?;

        self.rdr.skip_spaces();
        match self.peek()? {
            // `.[]`
            Some(']') => {}
            Some('"') => self.accept_quoted()?,
            _ => self.accept_number_or_range()?,
        }

        self.rdr.skip_spaces();
        let start = self.rdr.offset();
        self.expect(']', "']'")?;
        self.emit(Token::RBrack, start)?;
        self.finish_filter()
    }

    fn lex_connector_or_filter(&mut self) -> Step {
        self.rdr.skip_spaces();

        let start = self.rdr.offset();
        match self.peek()? {
            Some('|') => {
                self.bump();
                self.emit(Token::Pipe, start)?;
                Ok(Some(State::Filter))
            }
            Some(',') => {
                self.bump();
                self.emit(Token::Comma, start)?;
                Ok(Some(State::Filter))
            }
            // Filter-start consumes the '.' itself
            Some('.') => Ok(Some(State::Filter)),
            None => self.eof(),
            found => Err(self.expected("'|' or ','", found)),
        }
    }

    /// Optional `?` suffix, then on to the connector.
    fn finish_filter(&mut self) -> Step {
        self.maybe_question()?;
        Ok(Some(State::ConnectorOrFilter))
    }

    fn maybe_question(&mut self) -> Result<(), Halt> {
        if self.peek()? == Some('?') {
            let start = self.rdr.offset();
            self.bump();
            self.emit(Token::Question, start)?;
        }
        Ok(())
    }

    /// `"name"`, emitted as a `String` token without the quotes.
    fn accept_quoted(&mut self) -> Result<(), Halt> {
        let open = self.rdr.offset();
        self.expect('"', "'\"'")?;

        let start = self.rdr.offset();
        loop {
            match self.peek()? {
                Some('"') => break,
                Some(_) => self.bump(),
                None => return Err(LexError::Unterminated { start: open }.into()),
            }
        }

        let name = self.slice_from(start)?;
        self.emit(Token::String(name), start)?;
        self.bump();
        Ok(())
    }

    fn accept_number_or_range(&mut self) -> Result<(), Halt> {
        self.accept_number()?;

        self.rdr.skip_spaces();
        if self.peek()? == Some(':') {
            let start = self.rdr.offset();
            self.bump();
            self.emit(Token::Colon, start)?;

            self.rdr.skip_spaces();
            self.accept_number()?;
        }
        Ok(())
    }

    fn accept_number(&mut self) -> Result<(), Halt> {
        let start = self.rdr.offset();
        match self.read()? {
            Some(c) if c.is_ascii_digit() => {}
            found => return Err(self.expected("digit", found)),
        }
        while let Some(c) = self.peek()? {
            if !c.is_ascii_digit() {
                break;
            }
            self.bump();
        }

        let literal = self.slice_from(start)?;
        let value = match literal.parse::<i64>() {
            Ok(v) => v,
            Err(source) => return Err(LexError::InvalidInt { literal, source }.into()),
        };
        self.emit(Token::Int(value), start)
    }

    fn eof(&mut self) -> Step {
        let at = self.rdr.offset();
        self.emit(Token::Eof, at)?;
        Ok(None)
    }

    /// Emits `token` spanning from `start` to the current offset.
    fn emit(&mut self, token: Token, start: usize) -> Result<(), Halt> {
        let item = Item::new(token, Span::new(start, self.rdr.offset()));
        if self.sink.emit(&self.ctx, item) {
            Ok(())
        } else {
            Err(Halt::Aborted)
        }
    }

    fn check(&self) -> Result<(), Halt> {
        if self.ctx.is_done() {
            Err(Halt::Aborted)
        } else {
            Ok(())
        }
    }

    /// Next rune without consuming it; `None` at end of input.
    fn peek(&mut self) -> Result<Option<char>, Halt> {
        self.check()?;
        let res = self.rdr.peek_rune();
        self.decoded(res)
    }

    fn read(&mut self) -> Result<Option<char>, Halt> {
        self.check()?;
        let res = self.rdr.read_rune();
        self.decoded(res)
    }

    /// Consumes a rune that a successful peek has already seen.
    fn bump(&mut self) {
        let res = self.rdr.read_rune();
        debug_assert!(res.is_ok(), "bump without a successful peek");
    }

    fn expect(&mut self, want: char, expected: &'static str) -> Result<(), Halt> {
        match self.read()? {
            Some(c) if c == want => Ok(()),
            found => Err(self.expected(expected, found)),
        }
    }

    fn decoded(&self, res: Result<(char, usize), ReadError>) -> Result<Option<char>, Halt> {
        match res {
            Ok((c, _)) => Ok(Some(c)),
            Err(ReadError::Eof) => Ok(None),
            Err(source) => Err(self.read_failed(source)),
        }
    }

    fn slice_from(&self, start: usize) -> Result<String, Halt> {
        self.rdr
            .slice(start, self.rdr.offset())
            .map(str::to_string)
            .map_err(|source| self.read_failed(source))
    }

    fn read_failed(&self, source: ReadError) -> Halt {
        Halt::Illegal(LexError::Read {
            state: self.state.name(),
            source,
        })
    }

    fn expected(&self, expected: &'static str, found: Option<char>) -> Halt {
        Halt::Illegal(LexError::Expected {
            state: self.state.name(),
            expected,
            found,
        })
    }
}

/// Unicode letters (general category L*), the runes a bare field name is made of.
fn is_letter(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
    )
}
