pub use chrono::NaiveDate as Date;
use getset::{CopyGetters, Getters};
pub use rust_decimal::Decimal;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The reconciliation status of a posting.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Status {
    /// No marker.
    #[default]
    Unreconciled,
    /// Marked with `!`.
    Pending,
    /// Marked with `*`.
    Cleared,
}

impl Status {
    /// The marker character written in a ledger file, if any.
    pub fn marker(self) -> Option<char> {
        match self {
            Status::Unreconciled => None,
            Status::Pending => Some('!'),
            Status::Cleared => Some('*'),
        }
    }

    pub fn from_marker(c: char) -> Option<Self> {
        match c {
            '!' => Some(Status::Pending),
            '*' => Some(Status::Cleared),
            _ => None,
        }
    }

    /// Interprets the status symbol of a posting in `ledger emacs` output.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "pending" => Some(Status::Pending),
            "t" | "cleared" => Some(Status::Cleared),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Unreconciled => write!(f, "unreconciled"),
            Status::Pending => write!(f, "pending"),
            Status::Cleared => write!(f, "cleared"),
        }
    }
}

/// Error returned when a [`Status`] name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status `{0}`, expected one of: unreconciled, pending, cleared, !, *")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "unreconciled" | "none" => Ok(Status::Unreconciled),
            "!" | "pending" => Ok(Status::Pending),
            "*" | "cleared" => Ok(Status::Cleared),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A [`Decimal`] number plus the commodity, like `$` or `EUR`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Amount {
    pub number: Decimal,
    pub commodity: String,
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbolic = self.commodity.chars().count() == 1
            && !self.commodity.chars().all(char::is_alphabetic);
        if self.commodity.is_empty() {
            write!(f, "{}", self.number)
        } else if symbolic {
            write!(f, "{}{}", self.commodity, self.number)
        } else {
            write!(f, "{} {}", self.number, self.commodity)
        }
    }
}

/// A posting reported by the ledger tool, keyed by its line in the source file.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct Posting {
    /// Returns the 1-based line of the posting in the ledger file.
    #[getset(get_copy = "pub")]
    pub(crate) line_number: usize,

    /// Returns the full account name.
    #[getset(get = "pub")]
    pub(crate) account: String,

    /// Returns the amount, absent when the tool printed none.
    #[getset(get = "pub")]
    pub(crate) amount: Option<Amount>,

    #[getset(get_copy = "pub")]
    pub(crate) status: Status,

    /// Returns the cost annotation, if reported.
    #[getset(get = "pub")]
    pub(crate) cost: Option<String>,

    #[getset(get = "pub")]
    pub(crate) note: Option<String>,
}

impl Posting {
    pub fn is_cleared(&self) -> bool {
        self.status == Status::Cleared
    }
}

impl fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = f.width().unwrap_or(46);
        let head = match self.status.marker() {
            Some(marker) => format!("{} {}", marker, self.account),
            None => self.account.clone(),
        };
        match &self.amount {
            Some(amount) => {
                let amount = amount.to_string();
                let pad = std::cmp::max(head.chars().count() + 2, width - amount.len().min(width));
                write!(f, "{:pad$}{}", head, amount, pad = pad)
            }
            None => write!(f, "{}", head),
        }
    }
}

/// A transaction from the structured output. Only the postings the tool
/// reported are present, in source order.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct Transaction {
    /// Returns the file the tool read this transaction from.
    #[getset(get = "pub")]
    pub(crate) file: String,

    /// Returns the 1-based line of the transaction header.
    #[getset(get_copy = "pub")]
    pub(crate) line_number: usize,

    #[getset(get_copy = "pub")]
    pub(crate) date: Date,

    #[getset(get = "pub")]
    pub(crate) code: Option<String>,

    /// Returns the payee line.
    #[getset(get = "pub")]
    pub(crate) description: String,

    #[getset(get = "pub")]
    pub(crate) postings: Vec<Posting>,
}

impl Transaction {
    /// Postings to `account`, in source order.
    pub fn postings_for<'a>(&'a self, account: &'a str) -> impl Iterator<Item = &'a Posting> {
        self.postings.iter().filter(move |p| p.account == account)
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format("%Y/%m/%d"))?;
        if let Some(code) = &self.code {
            write!(f, " ({})", code)?;
        }
        write!(f, " {}", self.description)?;
        let width = f.width().unwrap_or(50);
        for posting in self.postings.iter() {
            write!(f, "\n    {:width$}", posting, width = width.saturating_sub(4))?;
        }
        Ok(())
    }
}
