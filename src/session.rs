//! The state behind one reconciliation window: the ledger file being edited
//! and the latest snapshot of its transactions.

use crate::edit::{self, EditRequest, EditResult, Fingerprint};
use crate::extract::extract;
use crate::parse::{parse_with, ReaderConfig};
use crate::{Decimal, EditorError, Error, Status, Transaction};
use getset::Getters;
use log::{debug, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Commodity of the statement balances being reconciled.
pub const DOLLAR: &str = "$";

/// An immutable view of the transactions read in one pass.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct Snapshot {
    #[getset(get = "pub")]
    transactions: Vec<Transaction>,
}

impl Snapshot {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Snapshot { transactions }
    }

    /// Parses and extracts the structured output of the ledger tool.
    pub fn read(text: &str, config: &ReaderConfig) -> Result<Self, Error> {
        let node = parse_with(text, config)?;
        Ok(Snapshot::new(extract(&node)?))
    }

    /// Reads a file of structured output.
    pub fn read_file(path: impl AsRef<Path>, config: &ReaderConfig) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        Snapshot::read(&text, config)
    }

    /// Sum of the dollar amounts posted to `account` that are pending or
    /// cleared. Other commodities are left out. Returns `None` when the sum
    /// does not fit a [`Decimal`].
    pub fn cleared_and_pending_total(&self, account: &str) -> Option<Decimal> {
        self.transactions
            .iter()
            .flat_map(|txn| txn.postings_for(account))
            .filter(|posting| posting.status() != Status::Unreconciled)
            .filter_map(|posting| posting.amount().as_ref())
            .filter(|amount| amount.commodity == DOLLAR)
            .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount.number))
    }

    /// Transactions with at least one posting to `account` that is not
    /// cleared yet.
    pub fn uncleared<'a>(&'a self, account: &'a str) -> impl Iterator<Item = &'a Transaction> {
        self.transactions
            .iter()
            .filter(move |txn| txn.postings_for(account).any(|posting| !posting.is_cleared()))
    }

    /// Every account with a posting in the snapshot.
    pub fn accounts(&self) -> BTreeSet<&str> {
        self.transactions
            .iter()
            .flat_map(|txn| txn.postings().iter())
            .map(|posting| posting.account().as_str())
            .collect()
    }
}

/// Owns the ledger path and its current [`Snapshot`].
///
/// Edits take `&mut self`, so a session has at most one edit in flight.
#[derive(Debug, Getters)]
pub struct Session {
    #[getset(get = "pub")]
    path: PathBuf,
    config: ReaderConfig,
    snapshot: Arc<Snapshot>,
    last_error: Option<String>,
    last_write: Option<Fingerprint>,
}

impl Session {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::open_with(path, ReaderConfig::default())
    }

    pub fn open_with(path: impl AsRef<Path>, config: ReaderConfig) -> Result<Self, Error> {
        let path = fs::canonicalize(path.as_ref()).map_err(EditorError::from)?;
        Ok(Session {
            path,
            config,
            snapshot: Arc::default(),
            last_error: None,
            last_write: None,
        })
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Replaces the snapshot with the transactions in `text`. On failure the
    /// previous snapshot is kept and the error is remembered until the next
    /// successful refresh.
    pub fn refresh(&mut self, text: &str) -> Result<Arc<Snapshot>, Error> {
        match Snapshot::read(text, &self.config) {
            Ok(snapshot) => {
                debug!(
                    "refreshed {} with {} transactions",
                    self.path.display(),
                    snapshot.transactions.len()
                );
                self.snapshot = Arc::new(snapshot);
                self.last_error = None;
                Ok(self.snapshot())
            }
            Err(err) => {
                warn!("keeping previous snapshot of {}: {}", self.path.display(), err);
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// The message of the last failed refresh, if the latest refresh failed.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn update_status(&mut self, request: &EditRequest) -> Result<EditResult, Error> {
        let result = edit::update_status(&self.path, request)?;
        if let EditResult::Applied {
            updated,
            fingerprint,
        } = result
        {
            if updated > 0 {
                self.last_write = Some(fingerprint);
            }
        }
        Ok(result)
    }

    /// Whether the file version `fingerprint` is the one this session wrote
    /// last.
    pub fn is_own_write(&self, fingerprint: &Fingerprint) -> bool {
        self.last_write.as_ref() == Some(fingerprint)
    }

    pub fn uncleared<'a>(&'a self, account: &'a str) -> Vec<&'a Transaction> {
        self.snapshot.uncleared(account).collect()
    }
}
