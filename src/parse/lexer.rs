use super::Token;
use crate::ParseError;
use logos::{Lexer as LogosLexer, Logos};

/// A token together with its text and the byte offset where it starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lexeme<'source> {
    pub token: Token,
    pub text: &'source str,
    pub offset: usize,
}

/// Wraps the `logos` lexer with one token of lookahead.
pub struct Lexer<'source> {
    llex: LogosLexer<'source, Token>,
    peeked: Option<Lexeme<'source>>,
}

impl<'source> Lexer<'source> {
    pub fn new(src: &'source str) -> Self {
        Lexer {
            llex: Token::lexer(src),
            peeked: None,
        }
    }

    /// Byte offset just past the last token read from the source.
    pub fn offset(&self) -> usize {
        self.llex.span().end
    }

    pub fn peek(&mut self) -> Result<Option<Lexeme<'source>>, ParseError> {
        if self.peeked.is_none() {
            self.peeked = self.advance()?;
        }
        Ok(self.peeked)
    }

    pub fn take(&mut self) -> Result<Option<Lexeme<'source>>, ParseError> {
        match self.peeked.take() {
            Some(lexeme) => Ok(Some(lexeme)),
            None => self.advance(),
        }
    }

    fn advance(&mut self) -> Result<Option<Lexeme<'source>>, ParseError> {
        let token = match self.llex.next() {
            Some(token) => token,
            None => return Ok(None),
        };
        let text = self.llex.slice();
        let offset = self.llex.span().start;
        if token == Token::Error {
            return Err(if text.starts_with('"') {
                ParseError::UnterminatedString(offset)
            } else {
                ParseError::UnexpectedCharacter(offset)
            });
        }
        Ok(Some(Lexeme {
            token,
            text,
            offset,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_does_not_consume() {
        let mut lexer = Lexer::new("(a)");
        let first = lexer.peek().unwrap().unwrap();
        assert_eq!(first.token, Token::LParen);
        assert_eq!(lexer.take().unwrap(), Some(first));
        let atom = lexer.take().unwrap().unwrap();
        assert_eq!((atom.token, atom.text, atom.offset), (Token::Atom, "a", 1));
        assert_eq!(lexer.take().unwrap().unwrap().token, Token::RParen);
        assert_eq!(lexer.take().unwrap(), None);
    }

    #[test]
    fn reports_unterminated_string_at_its_quote() {
        let mut lexer = Lexer::new("(1 \"open");
        lexer.take().unwrap();
        lexer.take().unwrap();
        assert_eq!(lexer.take(), Err(ParseError::UnterminatedString(3)));
    }
}
