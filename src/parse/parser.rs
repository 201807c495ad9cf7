use super::lexer::{Lexeme, Lexer};
use super::node::{Node, Text};
use super::token::Token;
use crate::{Decimal, ParseError};
use log::debug;

/// Default limit on list nesting accepted by [`parse`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options of the structured-output reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Lists nested deeper than this fail with [`ParseError::TooDeep`].
    pub max_depth: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Parses the output of `ledger emacs` into a single [`Node`].
///
/// Empty input yields [`Node::Nil`]. Anything after the first complete node,
/// apart from whitespace, is an error.
pub fn parse(text: &str) -> Result<Node, ParseError> {
    parse_with(text, &ReaderConfig::default())
}

/// Same as [`parse`], with explicit reader options.
pub fn parse_with(text: &str, config: &ReaderConfig) -> Result<Node, ParseError> {
    let mut parser = Parser {
        lexer: Lexer::new(text),
        max_depth: config.max_depth,
    };
    let node = parser.parse_document()?;
    debug!("parsed {} bytes of structured output", parser.lexer.offset());
    Ok(node)
}

pub struct Parser<'source> {
    lexer: Lexer<'source>,
    max_depth: usize,
}

impl<'source> Parser<'source> {
    fn parse_document(&mut self) -> Result<Node, ParseError> {
        let first = match self.lexer.take()? {
            Some(lexeme) => lexeme,
            None => return Ok(Node::Nil),
        };
        let node = self.parse_node(first, 0)?;
        if let Some(extra) = self.lexer.peek()? {
            return Err(ParseError::TrailingContent(extra.offset));
        }
        Ok(node)
    }

    fn parse_node(&mut self, lexeme: Lexeme<'source>, depth: usize) -> Result<Node, ParseError> {
        match lexeme.token {
            Token::LParen => self.parse_list(lexeme.offset, depth + 1),
            Token::RParen => Err(ParseError::UnexpectedClose(lexeme.offset)),
            Token::String => parse_string(lexeme.text, lexeme.offset),
            Token::Atom => parse_atom(lexeme.text, lexeme.offset),
            Token::Error => Err(ParseError::UnexpectedCharacter(lexeme.offset)),
        }
    }

    fn parse_list(&mut self, open: usize, depth: usize) -> Result<Node, ParseError> {
        if depth > self.max_depth {
            return Err(ParseError::TooDeep {
                offset: open,
                limit: self.max_depth,
            });
        }
        let mut items = vec![];
        loop {
            match self.lexer.take()? {
                None => return Err(ParseError::UnterminatedList(open)),
                Some(Lexeme {
                    token: Token::RParen,
                    ..
                }) => return Ok(Node::List(items)),
                Some(lexeme) => items.push(self.parse_node(lexeme, depth)?),
            }
        }
    }
}

fn parse_string(quoted: &str, offset: usize) -> Result<Node, ParseError> {
    let raw = &quoted[1..quoted.len() - 1];
    let mut value = String::with_capacity(raw.len());
    let mut chars = raw.char_indices();
    while let Some((index, c)) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some((_, escaped)) => escaped,
            None => return Err(ParseError::UnterminatedString(offset)),
        };
        match escaped {
            '"' | '\\' => value.push(escaped),
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            _ => {
                return Err(ParseError::InvalidEscape {
                    offset: offset + 1 + index,
                    escape: escaped,
                })
            }
        }
    }
    Ok(Node::String(Text {
        value,
        raw: raw.to_string(),
    }))
}

fn parse_atom(text: &str, offset: usize) -> Result<Node, ParseError> {
    if text == "nil" {
        Ok(Node::Nil)
    } else if is_number(text) {
        text.parse::<Decimal>()
            .map(Node::Number)
            .map_err(|_| ParseError::InvalidNumber {
                offset,
                text: text.to_string(),
            })
    } else {
        Ok(Node::Symbol(text.to_string()))
    }
}

/// Matches `-?digits(.digits)?`.
fn is_number(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (int, frac) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (unsigned, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(int) && frac.map_or(true, all_digits)
}
