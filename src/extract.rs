//! Projects the node tree printed by `ledger emacs` onto [`Transaction`]s.
//!
//! The tool prints one list per transaction:
//!
//! ```text
//! ("file" LINE (HIGH LOW USEC) CODE PAYEE
//!   (LINE "account" "amount" STATUS ["cost"] ["note"]) ...)
//! ```
//!
//! where `CODE` and `PAYEE` are strings or `nil`, and `STATUS` is `nil`,
//! `pending` or `t`. Anything else is rejected rather than guessed at.

use crate::parse::Node;
use crate::utils::parse_ledger_amount;
use crate::{Date, Decimal, ExtractError, Posting, Status, Transaction};
use chrono::{Local, TimeZone};
use log::debug;
use rust_decimal::prelude::ToPrimitive;

/// Extracts all transactions from a parsed document.
///
/// A document of `nil` holds no transactions. One malformed record fails the
/// whole extraction.
pub fn extract(node: &Node) -> Result<Vec<Transaction>, ExtractError> {
    let items = match node {
        Node::Nil => return Ok(vec![]),
        Node::List(items) => items,
        other => return Err(shape("document", "list of transactions", other)),
    };
    let txns = items
        .iter()
        .enumerate()
        .map(|(index, item)| extract_txn(item, &format!("transaction[{}]", index)))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(
        "extracted {} transactions with {} postings",
        txns.len(),
        txns.iter().map(|txn| txn.postings.len()).sum::<usize>()
    );
    Ok(txns)
}

fn shape(path: &str, expected: &'static str, found: &Node) -> ExtractError {
    ExtractError::UnexpectedShape {
        path: path.to_string(),
        expected,
        found: found.kind(),
    }
}

/// The `index`-th field of a record, reported as missing when absent.
fn field<'a>(
    fields: &'a [Node],
    index: usize,
    path: &str,
    expected: &'static str,
) -> Result<&'a Node, ExtractError> {
    fields.get(index).ok_or_else(|| ExtractError::UnexpectedShape {
        path: path.to_string(),
        expected,
        found: "end of list",
    })
}

fn line_number(node: &Node, path: &str) -> Result<usize, ExtractError> {
    node.as_number()
        .filter(|n| n.fract().is_zero())
        .and_then(|n| n.to_usize())
        .filter(|n| *n > 0)
        .ok_or_else(|| shape(path, "positive line number", node))
}

fn optional_string(node: &Node, path: &str) -> Result<Option<String>, ExtractError> {
    if node.is_nil() {
        return Ok(None);
    }
    node.as_str()
        .map(|text| Some(text.to_string()))
        .ok_or_else(|| shape(path, "string or nil", node))
}

fn extract_txn(node: &Node, path: &str) -> Result<Transaction, ExtractError> {
    let fields = node
        .as_list()
        .ok_or_else(|| shape(path, "transaction list", node))?;

    let file_path = format!("{}.file", path);
    let file = match field(fields, 0, &file_path, "file name")? {
        Node::String(text) => text.value.clone(),
        other => return Err(shape(&file_path, "file name", other)),
    };
    let line_path = format!("{}.line", path);
    let line = line_number(field(fields, 1, &line_path, "line number")?, &line_path)?;
    let date_path = format!("{}.date", path);
    let date = emacs_date(field(fields, 2, &date_path, "date")?, &date_path)?;
    let code_path = format!("{}.code", path);
    let code = optional_string(field(fields, 3, &code_path, "code")?, &code_path)?;
    let payee_path = format!("{}.payee", path);
    let description =
        optional_string(field(fields, 4, &payee_path, "payee")?, &payee_path)?.unwrap_or_default();

    let postings = fields[5..]
        .iter()
        .enumerate()
        .map(|(index, item)| extract_posting(item, &format!("{}.posting[{}]", path, index)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Transaction {
        file,
        line_number: line,
        date,
        code,
        description,
        postings,
    })
}

fn extract_posting(node: &Node, path: &str) -> Result<Posting, ExtractError> {
    let fields = node
        .as_list()
        .ok_or_else(|| shape(path, "posting list", node))?;

    let line_path = format!("{}.line", path);
    let line = line_number(field(fields, 0, &line_path, "line number")?, &line_path)?;

    let account_path = format!("{}.account", path);
    let account = match field(fields, 1, &account_path, "account name")? {
        Node::String(text) if !text.value.is_empty() => text.value.clone(),
        other => return Err(shape(&account_path, "account name", other)),
    };

    let amount_path = format!("{}.amount", path);
    let amount = match field(fields, 2, &amount_path, "amount")? {
        Node::Nil => None,
        Node::String(text) if text.value.trim().is_empty() => None,
        Node::String(text) => Some(parse_ledger_amount(&text.value).ok_or_else(|| {
            ExtractError::InvalidAmount {
                path: amount_path.clone(),
                text: text.value.clone(),
            }
        })?),
        other => return Err(shape(&amount_path, "amount string", other)),
    };

    let status_path = format!("{}.status", path);
    let status = match fields.get(3) {
        None => Status::Unreconciled,
        Some(node) if node.is_nil() => Status::Unreconciled,
        Some(node) => node
            .as_symbol()
            .and_then(Status::from_symbol)
            .ok_or_else(|| shape(&status_path, "nil, pending or t", node))?,
    };

    let extras_path = format!("{}.note", path);
    let extras = fields
        .get(4..)
        .unwrap_or_default()
        .iter()
        .map(|extra| match extra {
            Node::String(text) => Ok(text.value.clone()),
            other => Err(shape(&extras_path, "string", other)),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let (cost, note) = match extras.len() {
        0 => (None, None),
        1 => (None, extras.into_iter().next()),
        2 => {
            let mut extras = extras.into_iter();
            (extras.next(), extras.next())
        }
        _ => return Err(shape(&extras_path, "at most cost and note", &fields[6])),
    };

    Ok(Posting {
        line_number: line,
        account,
        amount,
        status,
        cost,
        note,
    })
}

/// Converts an Emacs time triple `(HIGH LOW USEC)` to the local date it
/// falls on. The tool encodes the transaction date as local midnight.
fn emacs_date(node: &Node, path: &str) -> Result<Date, ExtractError> {
    let parts = node
        .as_list()
        .filter(|parts| parts.len() >= 2)
        .ok_or_else(|| shape(path, "time triple", node))?;
    let (high, low) = match (parts[0].as_number(), parts[1].as_number()) {
        (Some(high), Some(low)) => (high, low),
        _ => return Err(shape(path, "time triple", node)),
    };
    let invalid = || ExtractError::InvalidDate {
        path: path.to_string(),
    };
    let seconds = time_word(high)
        .zip(time_word(low))
        .and_then(|(high, low)| high.checked_mul(65536)?.checked_add(low))
        .ok_or_else(invalid)?;
    let local = Local.timestamp_opt(seconds, 0).earliest().ok_or_else(invalid)?;
    Ok(local.date_naive())
}

/// One non-negative integer word of an Emacs time value.
fn time_word(number: Decimal) -> Option<i64> {
    if !number.fract().is_zero() || number.is_sign_negative() {
        return None;
    }
    number.to_i64()
}
