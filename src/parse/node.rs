use crate::Decimal;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// A quoted string from the structured output.
///
/// `value` holds the string with escapes resolved, `raw` the exact text that
/// appeared between the quotes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Text {
    pub value: String,
    pub raw: String,
}

impl Text {
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        let mut raw = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '"' => raw.push_str("\\\""),
                '\\' => raw.push_str("\\\\"),
                '\n' => raw.push_str("\\n"),
                '\t' => raw.push_str("\\t"),
                '\r' => raw.push_str("\\r"),
                _ => raw.push(c),
            }
        }
        Text {
            value: value.to_string(),
            raw,
        }
    }
}

/// A node of the symbolic-expression tree printed by `ledger emacs`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    List(Vec<Node>),
    Symbol(String),
    String(Text),
    Number(Decimal),
    Nil,
}

impl Node {
    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Node::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Node::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Node::Nil)
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::List(_) => "list",
            Node::Symbol(_) => "symbol",
            Node::String(_) => "string",
            Node::Number(_) => "number",
            Node::Nil => "nil",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::List(items) => {
                write!(f, "(")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Node::Symbol(name) => write!(f, "{}", name),
            Node::String(text) => write!(f, "\"{}\"", text.raw),
            Node::Number(number) => write!(f, "{}", number),
            Node::Nil => write!(f, "nil"),
        }
    }
}
