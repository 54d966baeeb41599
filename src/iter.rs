//! Consumer-side handles over a token stream.

use std::collections::VecDeque;

use crossbeam_channel::{Receiver, select};

use crate::{
    context::Context,
    lexer::{Scanner, State},
    token::Item,
};

/// A single-consumer stream of lexed items.
pub trait TokenStream {
    /// Blocks until the next item is available and makes it current.
    ///
    /// Returns `false` once the stream is exhausted or `ctx` is done; after
    /// that it keeps returning `false`.
    fn advance(&mut self, ctx: &Context) -> bool;

    /// The item the last successful [`advance`](TokenStream::advance) moved to.
    fn current(&self) -> Option<&Item>;
}

/// Items produced by a lexer running on its own thread.
///
/// Created by [`Lexer::spawn`](crate::lexer::Lexer::spawn). Dropping the
/// iterator disconnects the channel and the lexer thread exits.
#[derive(Debug)]
pub struct TokenIterator {
    ctx: Context,
    rx: Receiver<Item>,
    current: Option<Item>,
}

impl TokenIterator {
    pub(crate) fn new(ctx: Context, rx: Receiver<Item>) -> Self {
        TokenIterator {
            ctx,
            rx,
            current: None,
        }
    }
}

impl TokenStream for TokenIterator {
    fn advance(&mut self, ctx: &Context) -> bool {
        if ctx.is_done() {
            return false;
        }
        let expiry = ctx.expiry();
        select! {
            recv(self.rx) -> msg => match msg {
                Ok(item) => {
                    self.current = Some(item);
                    true
                }
                Err(_) => false,
            },
            recv(ctx.done()) -> _ => false,
            recv(expiry) -> _ => false,
        }
    }

    fn current(&self) -> Option<&Item> {
        self.current.as_ref()
    }
}

impl Iterator for TokenIterator {
    type Item = Item;

    /// Advances under the context the lexer was spawned with.
    fn next(&mut self) -> Option<Item> {
        let ctx = self.ctx.clone();
        if self.advance(&ctx) {
            self.current.clone()
        } else {
            None
        }
    }
}

/// Items produced on demand by stepping the lexer on the caller's thread.
///
/// Created by [`Lexer::pull`](crate::lexer::Lexer::pull). Yields exactly what
/// a [`TokenIterator`] would for the same source.
pub struct InlineTokens {
    ctx: Context,
    scanner: Scanner<VecDeque<Item>>,
    state: Option<State>,
    current: Option<Item>,
}

impl InlineTokens {
    pub(crate) fn new(ctx: Context, scanner: Scanner<VecDeque<Item>>) -> Self {
        InlineTokens {
            ctx,
            scanner,
            state: Some(State::Expr),
            current: None,
        }
    }
}

impl TokenStream for InlineTokens {
    fn advance(&mut self, ctx: &Context) -> bool {
        loop {
            if ctx.is_done() {
                self.state = None;
                self.scanner.sink_mut().clear();
                return false;
            }
            if let Some(item) = self.scanner.sink_mut().pop_front() {
                self.current = Some(item);
                return true;
            }
            match self.state.take() {
                Some(state) => self.state = self.scanner.step(state),
                None => return false,
            }
        }
    }

    fn current(&self) -> Option<&Item> {
        self.current.as_ref()
    }
}

impl Iterator for InlineTokens {
    type Item = Item;

    fn next(&mut self) -> Option<Item> {
        let ctx = self.ctx.clone();
        if self.advance(&ctx) {
            self.current.clone()
        } else {
            None
        }
    }
}

impl std::fmt::Debug for InlineTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineTokens")
            .field("state", &self.state)
            .field("current", &self.current)
            .finish()
    }
}
