use serde::Serialize;

use crate::{ast::Append, error::ParseError};

/// A filter in the syntax tree.
///
/// Nodes are purely syntactic: they record what was written, not how it
/// evaluates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// The identity filter
    ///
    /// # Example
    /// ```text
    /// .
    /// ```
    Identity,

    /// Field lookup, bare or quoted
    ///
    /// # Examples
    /// ```text
    /// .foo
    /// ."foo$"
    /// .["foo"]
    /// ```
    Field { name: String },

    /// Array index
    ///
    /// # Example
    /// ```text
    /// .[10]
    /// ```
    Index { index: i64 },

    /// Array slice `[from:to]`
    ///
    /// # Example
    /// ```text
    /// .[10:100]
    /// ```
    Slice { from: i64, to: i64 },

    /// Iterate all elements (`.[]`)
    Iterate,

    /// A filter followed by `?`
    ///
    /// # Examples
    /// ```text
    /// .foo?
    /// .[]?
    /// ```
    Optional { inner: Box<Node> },

    /// Filters joined by `|`, or written back to back (`.foo.bar`)
    Pipe { children: Vec<Node> },

    /// Filters joined by `,`
    Union { children: Vec<Node> },
}

impl Node {
    pub fn field(name: impl Into<String>) -> Self {
        Node::Field { name: name.into() }
    }

    pub fn optional(inner: Node) -> Self {
        Node::Optional {
            inner: Box::new(inner),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Node::Identity => "identity",
            Node::Field { .. } => "field",
            Node::Index { .. } => "index",
            Node::Slice { .. } => "slice",
            Node::Iterate => "iterate",
            Node::Optional { .. } => "optional",
            Node::Pipe { .. } => "pipe",
            Node::Union { .. } => "union",
        }
    }

    /// Child nodes, empty for leaves.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Pipe { children } | Node::Union { children } => children,
            Node::Optional { inner } => std::slice::from_ref(inner.as_ref()),
            _ => &[],
        }
    }
}

impl Append for Node {
    fn append(&mut self, node: Node) -> Result<(), ParseError> {
        match self {
            Node::Pipe { children } | Node::Union { children } => {
                children.push(node);
                Ok(())
            }
            other => Err(ParseError::NotAppendable { node: other.name() }),
        }
    }
}
