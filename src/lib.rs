//! # ledger-reconcile
//!
//! ledger-reconcile is the core of a reconciliation tool for text-based
//! ledger files. It reads the structured output of `ledger emacs` into
//! transactions, rewrites posting status markers in the ledger file, and
//! normalizes the statement balances typed in by the user.
//!
//! ```no_run
//! use ledger_reconcile::{extract, parse, update_status, EditRequest, Status};
//!
//! # fn main() -> Result<(), ledger_reconcile::Error> {
//! let txns = extract(&parse(r#"(("main.ledger" 1 (0 0 0) nil "Rent"
//!     (2 "Assets:Checking" "$-800.00" nil)))"#)?)?;
//! let lines = txns[0].postings().iter().map(|p| p.line_number());
//! let request = EditRequest::new(lines, Status::Unreconciled, Status::Pending);
//! update_status("main.ledger", &request)?;
//! # Ok(())
//! # }
//! ```
#![doc(html_root_url = "https://docs.rs/ledger-reconcile/0.1.0")]

pub mod amount;
pub mod edit;
mod error;
pub mod extract;
mod ledger;
pub mod parse;
pub mod session;
pub mod utils;

pub use amount::{delta, parse_amount, TargetAmount};
pub use edit::{update_status, EditRequest, EditResult, Fingerprint};
pub use error::*;
pub use extract::extract;
pub use ledger::*;
pub use parse::{parse, parse_with, Node, ReaderConfig};
pub use session::{Session, Snapshot};
