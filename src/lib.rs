pub mod ast;
pub mod builder;
pub mod context;
pub mod error;
pub mod iter;
pub mod lexer;
pub mod options;
pub mod output;
pub mod reader;
pub mod token;

pub use ast::{Append, Ast, Node};
pub use builder::Builder;
pub use context::{Canceller, Context, ContextError};
pub use error::{LexError, ParseError, ReadError};
pub use iter::{InlineTokens, TokenIterator, TokenStream};
pub use lexer::Lexer;
pub use options::{Driver, ParseOptions};
pub use output::{to_json, to_json_pretty};
pub use reader::RuneReader;
pub use token::{Item, Span, Token, TokenKind};

/// Parses `src` with default options.
///
/// ```
/// use jqg::Node;
///
/// let ast = jqg::parse(".foo?").unwrap();
/// assert_eq!(ast.single(), Some(&Node::optional(Node::field("foo"))));
/// ```
pub fn parse(src: &str) -> Result<Ast, ParseError> {
    Builder::new().run(&Context::background(), src)
}

/// Parses `src`, giving up once `options.timeout` has passed.
pub fn parse_with(src: &str, options: &ParseOptions) -> Result<Ast, ParseError> {
    let builder = Builder::with_options(options.clone());
    match options.timeout {
        Some(timeout) => {
            let (ctx, _cancel) = Context::with_timeout(timeout);
            builder.run(&ctx, src)
        }
        None => builder.run(&Context::background(), src),
    }
}
