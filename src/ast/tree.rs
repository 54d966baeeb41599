use serde::Serialize;

use crate::{
    ast::{Append, Node},
    error::ParseError,
};

/// Root of a parsed query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Ast {
    children: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Ast::default()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// The only top-level filter, if there is exactly one.
    pub fn single(&self) -> Option<&Node> {
        match self.children.as_slice() {
            [node] => Some(node),
            _ => None,
        }
    }
}

impl Append for Ast {
    fn append(&mut self, node: Node) -> Result<(), ParseError> {
        self.children.push(node);
        Ok(())
    }
}
