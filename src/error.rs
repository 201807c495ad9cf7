use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Malformed structured output. Offsets are byte offsets into the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unterminated list opened at offset {0}")]
    UnterminatedList(usize),

    #[error("unexpected `)` at offset {0}")]
    UnexpectedClose(usize),

    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),

    #[error("invalid escape `\\{escape}` at offset {offset}")]
    InvalidEscape { offset: usize, escape: char },

    #[error("number `{text}` at offset {offset} is out of range")]
    InvalidNumber { offset: usize, text: String },

    #[error("unexpected character at offset {0}")]
    UnexpectedCharacter(usize),

    #[error("trailing content at offset {0}")]
    TrailingContent(usize),

    #[error("lists nested deeper than {limit} levels at offset {offset}")]
    TooDeep { offset: usize, limit: usize },
}

/// Well-formed structured output that does not look like ledger records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("unexpected shape at {path}: expected {expected}, found {found}")]
    UnexpectedShape {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid amount `{text}` at {path}")]
    InvalidAmount { path: String, text: String },

    #[error("invalid date at {path}")]
    InvalidDate { path: String },
}

/// Failures of the ledger file editor. A stale expected status is not an
/// error; it is reported as [`EditResult::PreconditionFailed`](crate::EditResult).
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0} is not valid UTF-8")]
    NotUtf8(PathBuf),

    #[error("line {line} is out of range, the file has {total} lines")]
    LineOutOfRange { line: usize, total: usize },

    #[error("line {line} is not a posting")]
    NotAPosting { line: usize },

    #[error("line {line} inherits its status from the transaction header at line {header}")]
    InheritedStatus { line: usize, header: usize },

    #[error("{0} was modified by another writer during the edit")]
    ModifiedDuringEdit(PathBuf),
}

/// Unusable target amount text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("no digits in `{0}`")]
    NoDigits(String),

    #[error("invalid amount `{0}`")]
    Invalid(String),

    #[error("{0} is out of range")]
    OutOfRange(String),
}

/// Any error produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading structured output from a file or stdin failed.
    #[error("cannot read input: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    Format(#[from] FormatError),
}
