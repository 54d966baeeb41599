use crate::{
    ast::{Append, Ast, Node},
    context::Context,
    error::ParseError,
    iter::TokenStream,
    lexer::Lexer,
    options::{Driver, ParseOptions},
    token::{Item, Token, TokenKind},
};

/// Builds an [`Ast`] from a filter expression.
///
/// Grammar, loosest binding first:
///
/// ```text
/// start  := pipe EOF
/// pipe   := union ( '|' union )*
/// union  := chain ( ',' chain )*
/// chain  := filter filter*
/// filter := '.' ( STRING | index )? '?'?
/// index  := '[' ( ']' | STRING ']' | INT ( ':' INT )? ']' )
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    options: ParseOptions,
}

impl Builder {
    pub fn new() -> Self {
        Builder::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Builder { options }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Lexes `src` with the configured driver and builds the tree.
    pub fn run(&self, ctx: &Context, src: &str) -> Result<Ast, ParseError> {
        let lexer = Lexer::new();
        match self.options.driver {
            Driver::Thread => {
                let tokens = lexer.spawn(ctx, src).map_err(ParseError::Spawn)?;
                self.build(ctx, tokens)
            }
            Driver::Inline => self.build(ctx, lexer.pull(ctx, src)),
        }
    }

    /// Builds a tree from an already running token stream.
    pub fn build<S: TokenStream>(&self, ctx: &Context, stream: S) -> Result<Ast, ParseError> {
        let mut parser = Parser::new(ctx, stream);
        let mut root = Ast::new();
        match parser.parse_start(&mut root) {
            Ok(()) => Ok(root),
            Err(e) => {
                log::debug!("builder: {e}");
                Err(e)
            }
        }
    }
}

/// Recursive-descent parser with three tokens of lookahead.
struct Parser<'a, S> {
    ctx: &'a Context,
    stream: S,
    tokens: [Item; 3],
    peek_count: usize,
}

impl<'a, S: TokenStream> Parser<'a, S> {
    fn new(ctx: &'a Context, stream: S) -> Self {
        Parser {
            ctx,
            stream,
            tokens: std::array::from_fn(|_| Item::new(Token::Eof, Default::default())),
            peek_count: 0,
        }
    }

    fn pull(&mut self) -> Result<Item, ParseError> {
        if !self.stream.advance(self.ctx) {
            return Err(match self.ctx.err() {
                Some(e) => e.into(),
                None => ParseError::StreamClosed,
            });
        }
        self.stream.current().cloned().ok_or(ParseError::StreamClosed)
    }

    /// Returns the next item without consuming it.
    fn peek(&mut self) -> Result<&Item, ParseError> {
        if self.peek_count == 0 {
            self.tokens[0] = self.pull()?;
            self.peek_count = 1;
        }
        Ok(&self.tokens[self.peek_count - 1])
    }

    fn next(&mut self) -> Result<Item, ParseError> {
        if self.peek_count > 0 {
            self.peek_count -= 1;
        } else {
            self.tokens[0] = self.pull()?;
        }
        Ok(self.tokens[self.peek_count].clone())
    }

    /// Pushes back the item last returned by `next`.
    fn backup(&mut self) {
        self.peek_count += 1;
    }

    /// Pushes back the last item returned by `next` and `first`, which came
    /// before it.
    #[cfg_attr(not(test), allow(dead_code))]
    fn backup2(&mut self, first: Item) {
        self.tokens[1] = first;
        self.peek_count = 2;
    }

    fn peek_kind(&mut self) -> Result<TokenKind, ParseError> {
        Ok(self.peek()?.kind())
    }

    /// Consumes the next item if it is `kind`.
    fn accept(&mut self, kind: TokenKind) -> Result<bool, ParseError> {
        if self.next()?.kind() == kind {
            return Ok(true);
        }
        self.backup();
        Ok(false)
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Item, ParseError> {
        let item = self.next()?;
        if item.kind() == kind {
            return Ok(item);
        }
        Err(unexpected(item, expected))
    }

    fn parse_start(&mut self, target: &mut dyn Append) -> Result<(), ParseError> {
        let node = self.parse_pipe()?;
        self.expect(TokenKind::Eof, "end of input")?;
        target.append(node)
    }

    fn parse_pipe(&mut self) -> Result<Node, ParseError> {
        let first = self.parse_union()?;
        if self.peek_kind()? != TokenKind::Pipe {
            return Ok(first);
        }

        let mut pipe = Node::Pipe { children: vec![first] };
        while self.accept(TokenKind::Pipe)? {
            pipe.append(self.parse_union()?)?;
        }
        Ok(pipe)
    }

    fn parse_union(&mut self) -> Result<Node, ParseError> {
        let first = self.parse_chain()?;
        if self.peek_kind()? != TokenKind::Comma {
            return Ok(first);
        }

        let mut union = Node::Union { children: vec![first] };
        while self.accept(TokenKind::Comma)? {
            union.append(self.parse_chain()?)?;
        }
        Ok(union)
    }

    /// Filters written back to back, like `.foo.bar` or `.foo.[0]`.
    fn parse_chain(&mut self) -> Result<Node, ParseError> {
        let first = self.parse_filter()?;
        if self.peek_kind()? != TokenKind::Period {
            return Ok(first);
        }

        let mut chain = Node::Pipe { children: vec![first] };
        while self.peek_kind()? == TokenKind::Period {
            chain.append(self.parse_filter()?)?;
        }
        Ok(chain)
    }

    fn parse_filter(&mut self) -> Result<Node, ParseError> {
        let item = self.next()?;
        match item.token {
            Token::Period => {}
            Token::Illegal(source) => {
                return Err(ParseError::Lex {
                    offset: item.span.start,
                    source,
                });
            }
            Token::Eof => {
                return Err(ParseError::UnexpectedEof {
                    expected: "filter expression",
                });
            }
            other => {
                return Err(ParseError::ExpectedFilter {
                    found: other.kind(),
                    offset: item.span.start,
                });
            }
        }

        let next = self.peek()?.clone();
        let offset = next.span.start;
        let node = match next.token {
            Token::String(name) => {
                self.next()?;
                Node::Field { name }
            }
            Token::LBrack => self.parse_index()?,
            // The bare `.` filter; whatever follows belongs to the caller.
            Token::Eof | Token::Period | Token::Pipe | Token::Comma => Node::Identity,
            Token::Illegal(source) => return Err(ParseError::Lex { offset, source }),
            other => {
                return Err(ParseError::Unsupported {
                    found: other.kind(),
                    offset,
                });
            }
        };

        if self.accept(TokenKind::Question)? {
            return Ok(Node::optional(node));
        }
        Ok(node)
    }

    fn parse_index(&mut self) -> Result<Node, ParseError> {
        self.expect(TokenKind::LBrack, "'['")?;

        let item = self.next()?;
        let node = match item.token {
            Token::RBrack => return Ok(Node::Iterate),
            Token::String(name) => Node::Field { name },
            Token::Int(from) => {
                if self.accept(TokenKind::Colon)? {
                    let to = self.expect_int()?;
                    Node::Slice { from, to }
                } else {
                    Node::Index { index: from }
                }
            }
            _ => return Err(unexpected(item, "index, slice or ']'")),
        };

        self.expect(TokenKind::RBrack, "']'")?;
        Ok(node)
    }

    fn expect_int(&mut self) -> Result<i64, ParseError> {
        let item = self.next()?;
        match item.token {
            Token::Int(v) => Ok(v),
            _ => Err(unexpected(item, "integer")),
        }
    }
}

/// Error for `item` turning up where `expected` should have.
fn unexpected(item: Item, expected: &'static str) -> ParseError {
    let offset = item.span.start;
    match item.token {
        Token::Illegal(source) => ParseError::Lex { offset, source },
        Token::Eof => ParseError::UnexpectedEof { expected },
        other => ParseError::Unexpected {
            expected,
            found: other.kind(),
            offset,
        },
    }
}
