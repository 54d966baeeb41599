//! Options for [`parse_with`](crate::parse_with) and the [`Builder`](crate::Builder).

use std::time::Duration;

/// How the lexer is driven while the builder consumes tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Driver {
    /// Lexer on its own thread, handing tokens over a rendezvous channel
    #[default]
    Thread,

    /// Lexer stepped on the caller's thread whenever a token is needed
    Inline,
}

/// Options for parsing a query
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Give up once this much time has passed
    pub timeout: Option<Duration>,
    pub driver: Driver,
}

impl ParseOptions {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn driver(mut self, driver: Driver) -> Self {
        self.driver = driver;
        self
    }
}
