//! JSON rendering of token streams and syntax trees.
//!
//! Anything in this crate that describes a query (tokens, items, nodes, whole
//! trees) can be printed as JSON, compact or pretty.
//!
//! # Shapes
//!
//! - **Tokens** are `{"kind": ..., "value": ...}`; `value` is only present for
//!   `STRING`, `INT` and `ILLEGAL` (the error message)
//! - **Items** are `{"token": ..., "span": {"start": ..., "end": ...}}`
//! - **Nodes** are tagged by `type`, e.g. `{"type": "field", "name": "foo"}`
//!
//! # Examples
//!
//! ```
//! use jqg::output::to_json;
//!
//! let ast = jqg::parse(".foo").unwrap();
//! assert_eq!(
//!     to_json(&ast).unwrap(),
//!     r#"{"children":[{"type":"field","name":"foo"}]}"#
//! );
//! ```

use serde::Serialize;

pub struct JsonPrinter {
    pretty: bool,
}

impl JsonPrinter {
    pub fn new(pretty: bool) -> Self {
        JsonPrinter { pretty }
    }

    pub fn print<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }
}

/// Compact JSON with no extra whitespace.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    JsonPrinter::new(false).print(value)
}

/// JSON with 2-space indentation, one element per line.
pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    JsonPrinter::new(true).print(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::Node,
        error::LexError,
        token::{Item, Span, Token},
    };

    #[test]
    fn test_token_shapes() {
        let cases = vec![
            (Token::Period, r#"{"kind":"PERIOD"}"#),
            (Token::LBrack, r#"{"kind":"LBRACK"}"#),
            (Token::String("foo".to_string()), r#"{"kind":"STRING","value":"foo"}"#),
            (Token::Int(-3), r#"{"kind":"INT","value":-3}"#),
            (
                Token::Illegal(LexError::Unterminated { start: 1 }),
                r#"{"kind":"ILLEGAL","value":"unterminated quoted field starting at byte offset 1"}"#,
            ),
        ];

        for (token, expected) in cases {
            assert_eq!(to_json(&token).unwrap(), expected, "Failed for token: {:?}", token);
        }
    }

    #[test]
    fn test_item_shape() {
        let item = Item::new(Token::Eof, Span::empty(4));
        assert_eq!(
            to_json(&item).unwrap(),
            r#"{"token":{"kind":"EOF"},"span":{"start":4,"end":4}}"#
        );
    }

    #[test]
    fn test_node_shapes() {
        let node = Node::optional(Node::Slice { from: 1, to: 2 });
        assert_eq!(
            to_json(&node).unwrap(),
            r#"{"type":"optional","inner":{"type":"slice","from":1,"to":2}}"#
        );
    }

    #[test]
    fn test_pretty() {
        let node = Node::Pipe {
            children: vec![Node::Identity],
        };
        assert_eq!(
            to_json_pretty(&node).unwrap(),
            "{\n  \"type\": \"pipe\",\n  \"children\": [\n    {\n      \"type\": \"identity\"\n    }\n  ]\n}"
        );
    }
}
