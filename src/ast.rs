//! # Syntax tree for jqg filter expressions
//!
//! The builder turns a token stream into an [`Ast`]: a root holding one
//! top-level [`Node`] per parsed expression.
//!
//! ## Node kinds
//!
//! - **Leaves**: [`Node::Identity`], [`Node::Field`], [`Node::Index`],
//!   [`Node::Slice`], [`Node::Iterate`]
//! - **Wrappers**: [`Node::Optional`] for the `?` suffix
//! - **Composites**: [`Node::Pipe`] and [`Node::Union`]
//!
//! ## Precedence
//!
//! `|` binds loosest, then `,`, then filters written back to back:
//!
//! ```text
//! .a.b, .c | .d   ==   ((.a | .b), .c) | .d
//! ```
//!
//! ## Appending
//!
//! Containers implement [`Append`]. The root and the composites accept
//! children; leaves refuse with [`ParseError::NotAppendable`].
pub mod node;
pub mod tree;

pub use node::Node;
pub use tree::Ast;

use crate::error::ParseError;

/// A node that can take children.
pub trait Append {
    fn append(&mut self, node: Node) -> Result<(), ParseError>;
}
