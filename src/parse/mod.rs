//! Reader for the symbolic expressions printed by `ledger emacs`.

mod lexer;
mod node;
mod parser;
mod token;

pub use lexer::{Lexeme, Lexer};
pub use node::{Node, Text};
pub use parser::*;
pub use token::Token;
