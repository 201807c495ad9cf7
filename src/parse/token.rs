use logos::Logos;

#[derive(Debug, PartialEq, Logos, Clone, Copy)]
pub enum Token {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[regex(r#""([^"\\]|\\(.|\n))*""#)]
    String,

    /// Symbols, numbers and `nil`; told apart by the parser.
    #[regex(r#"[^\s()"]+"#)]
    Atom,

    #[error]
    #[regex(r"[ \f\r\t\v\n]+", logos::skip)]
    Error,
}

#[cfg(test)]
mod tests {
    use super::Token;
    use logos::Logos;

    #[test]
    fn splits_lists_strings_and_atoms() {
        let tokens: Vec<_> = Token::lexer(r#"(12 "a \"b\"" nil)"#).collect();
        assert_eq!(
            tokens,
            vec![
                Token::LParen,
                Token::Atom,
                Token::String,
                Token::Atom,
                Token::RParen
            ]
        );
    }

    #[test]
    fn atoms_stop_at_parens() {
        let mut lex = Token::lexer("pending)");
        assert_eq!(lex.next(), Some(Token::Atom));
        assert_eq!(lex.slice(), "pending");
        assert_eq!(lex.next(), Some(Token::RParen));
        assert_eq!(lex.next(), None);
    }

    #[test]
    fn escaped_newline_stays_inside_the_string() {
        let mut lex = Token::lexer("\"a\\\nb\" x");
        assert_eq!(lex.next(), Some(Token::String));
        assert_eq!(lex.slice(), "\"a\\\nb\"");
        assert_eq!(lex.next(), Some(Token::Atom));
    }

    #[test]
    fn open_quote_is_an_error() {
        let mut lex = Token::lexer(r#"  "abc"#);
        assert_eq!(lex.next(), Some(Token::Error));
        assert_eq!(lex.span().start, 2);
    }
}
