//! Rewrites posting status markers in a ledger file.
//!
//! An edit either changes every requested marker or nothing: all target
//! lines are checked against the expected status first, and the new content
//! replaces the file through a temporary file and a rename, so readers see
//! the old file or the new one and never a mixture.

mod line;

pub use line::{body, find_header, header_status, split_lines, PostingLine};

use crate::{EditorError, Status};
use log::{info, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{self, Metadata, Permissions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Identifies a version of a file on disk by its length and modification time.
///
/// [`update_status`] returns the fingerprint of what it wrote, so a file
/// watcher can tell its own process's writes from external edits.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl Fingerprint {
    pub fn of(path: impl AsRef<Path>) -> io::Result<Self> {
        fs::metadata(path).map(|metadata| Self::from(&metadata))
    }
}

impl From<&Metadata> for Fingerprint {
    fn from(metadata: &Metadata) -> Self {
        Fingerprint {
            len: metadata.len(),
            modified: metadata.modified().ok(),
        }
    }
}

/// Asks for the postings on `target_lines` (1-based) to move from
/// `expected` to `new_status`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    pub target_lines: BTreeSet<usize>,
    pub expected: Status,
    pub new_status: Status,
}

impl EditRequest {
    pub fn new(
        target_lines: impl IntoIterator<Item = usize>,
        expected: Status,
        new_status: Status,
    ) -> Self {
        EditRequest {
            target_lines: target_lines.into_iter().collect(),
            expected,
            new_status,
        }
    }
}

/// Outcome of an edit that ran to completion.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditResult {
    /// `updated` lines were rewritten; `fingerprint` describes the file as
    /// it is now.
    Applied {
        updated: usize,
        fingerprint: Fingerprint,
    },
    /// The posting on `line` has status `actual`, not the expected one.
    /// The file was not touched.
    PreconditionFailed { line: usize, actual: Status },
}

impl EditResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, EditResult::Applied { .. })
    }
}

struct Target {
    index: usize,
    posting: PostingLine,
    header: (usize, Status),
}

impl Target {
    /// The status the ledger tool reports: the posting's own marker, or the
    /// header's when the posting has none.
    fn effective_status(&self) -> Status {
        match self.posting.status {
            Status::Unreconciled => self.header.1,
            own => own,
        }
    }
}

/// Changes the status marker of the postings listed in `request`.
///
/// Every target must be a posting line and have the expected status;
/// otherwise nothing is written. Only marker characters change, every other
/// byte of the file is preserved.
pub fn update_status(
    file_path: impl AsRef<Path>,
    request: &EditRequest,
) -> Result<EditResult, EditorError> {
    let path = fs::canonicalize(file_path.as_ref())?;
    let metadata = fs::metadata(&path)?;
    let read_fingerprint = Fingerprint::from(&metadata);
    let content =
        String::from_utf8(fs::read(&path)?).map_err(|_| EditorError::NotUtf8(path.clone()))?;
    let lines = split_lines(&content);

    let targets = request
        .target_lines
        .iter()
        .map(|&line| locate(&lines, line))
        .collect::<Result<Vec<_>, _>>()?;

    for target in &targets {
        let actual = target.effective_status();
        if actual != request.expected {
            warn!(
                "{}:{} is {}, expected {}; nothing changed",
                path.display(),
                target.index + 1,
                actual,
                request.expected
            );
            return Ok(EditResult::PreconditionFailed {
                line: target.index + 1,
                actual,
            });
        }
    }

    // A posting without a marker shows its header's status, so removing the
    // marker cannot make it unreconciled.
    if request.new_status == Status::Unreconciled {
        let inherited = targets
            .iter()
            .find(|target| target.header.1 != Status::Unreconciled);
        if let Some(target) = inherited {
            return Err(EditorError::InheritedStatus {
                line: target.index + 1,
                header: target.header.0 + 1,
            });
        }
    }

    let mut new_lines: Vec<String> = lines.iter().map(|line| line.to_string()).collect();
    let mut updated = 0;
    for target in &targets {
        let old = lines[target.index];
        let new = target.posting.with_status(old, request.new_status);
        if new != old {
            new_lines[target.index] = new;
            updated += 1;
        }
    }
    if updated == 0 {
        return Ok(EditResult::Applied {
            updated,
            fingerprint: read_fingerprint,
        });
    }

    let fingerprint = write_atomic(
        &path,
        &new_lines.concat(),
        metadata.permissions(),
        &read_fingerprint,
    )?;
    info!(
        "marked {} postings {} in {}",
        updated,
        request.new_status,
        path.display()
    );
    Ok(EditResult::Applied {
        updated,
        fingerprint,
    })
}

fn locate(lines: &[&str], line: usize) -> Result<Target, EditorError> {
    if line == 0 || line > lines.len() {
        return Err(EditorError::LineOutOfRange {
            line,
            total: lines.len(),
        });
    }
    let index = line - 1;
    let posting = PostingLine::parse(lines[index]).ok_or(EditorError::NotAPosting { line })?;
    let header = find_header(lines, index).ok_or(EditorError::NotAPosting { line })?;
    Ok(Target {
        index,
        posting,
        header,
    })
}

/// Replaces `path` with `contents` through a temporary file in the same
/// directory. The temporary file is removed on every error path.
fn write_atomic(
    path: &Path,
    contents: &str,
    permissions: Permissions,
    expected: &Fingerprint,
) -> Result<Fingerprint, EditorError> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".reconcile-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    fs::set_permissions(tmp.path(), permissions)?;

    if Fingerprint::of(path)? != *expected {
        return Err(EditorError::ModifiedDuringEdit(PathBuf::from(path)));
    }
    tmp.persist(path).map_err(|err| EditorError::Io(err.error))?;
    if let Err(err) = sync_dir(dir) {
        warn!("could not sync {}: {}", dir.display(), err);
    }
    Ok(Fingerprint::of(path)?)
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LEDGER: &str = "\
2024-01-01 Opening Balance
    Assets:Checking              $1000.00
    Equity:Opening Balances

2024-01-02 ! Grocery Store
    Expenses:Food                 $45.67
    CC:Visa                      -$45.67

2024-01-03 Mixed
    ! Assets:Checking             $100.00
    * Expenses:Test               $50.00 ; receipt
    CC:Test Card                 -$150.00
";

    fn ledger(content: &str) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.ledger");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    fn lines_of(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .split_inclusive('\n')
            .map(String::from)
            .collect()
    }

    #[test]
    fn marks_unreconciled_postings_pending() {
        let (_dir, path) = ledger(LEDGER);
        let request = EditRequest::new([2, 3], Status::Unreconciled, Status::Pending);
        let result = update_status(&path, &request).unwrap();
        assert!(matches!(result, EditResult::Applied { updated: 2, .. }));

        let lines = lines_of(&path);
        assert_eq!(lines[1], "    ! Assets:Checking              $1000.00\n");
        assert_eq!(lines[2], "    ! Equity:Opening Balances\n");
        assert_eq!(lines[0], "2024-01-01 Opening Balance\n");
    }

    #[test]
    fn header_status_is_inherited() {
        let (_dir, path) = ledger(LEDGER);
        let request = EditRequest::new([7], Status::Unreconciled, Status::Cleared);
        assert_eq!(
            update_status(&path, &request).unwrap(),
            EditResult::PreconditionFailed {
                line: 7,
                actual: Status::Pending
            }
        );

        let request = EditRequest::new([7], Status::Pending, Status::Cleared);
        assert!(update_status(&path, &request).unwrap().is_applied());
        let lines = lines_of(&path);
        assert_eq!(lines[6], "    * CC:Visa                      -$45.67\n");
        assert_eq!(lines[4], "2024-01-02 ! Grocery Store\n");
    }

    #[test]
    fn clearing_an_inherited_status_is_refused() {
        let (_dir, path) = ledger(LEDGER);
        let request = EditRequest::new([6], Status::Pending, Status::Unreconciled);
        assert!(matches!(
            update_status(&path, &request),
            Err(EditorError::InheritedStatus { line: 6, header: 5 })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), LEDGER);
    }

    #[test]
    fn removing_a_marker_keeps_the_comment() {
        let (_dir, path) = ledger(LEDGER);
        let request = EditRequest::new([11], Status::Cleared, Status::Unreconciled);
        assert!(update_status(&path, &request).unwrap().is_applied());
        assert_eq!(
            lines_of(&path)[10],
            "    Expenses:Test               $50.00 ; receipt\n"
        );
    }

    #[test]
    fn rejects_non_postings_and_missing_lines() {
        let (_dir, path) = ledger(LEDGER);
        for line in [1, 4, 5] {
            let request = EditRequest::new([line], Status::Unreconciled, Status::Pending);
            assert!(matches!(
                update_status(&path, &request),
                Err(EditorError::NotAPosting { line: l }) if l == line
            ));
        }
        for line in [0, 100] {
            let request = EditRequest::new([line], Status::Unreconciled, Status::Pending);
            assert!(matches!(
                update_status(&path, &request),
                Err(EditorError::LineOutOfRange { total: 12, .. })
            ));
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), LEDGER);
    }

    #[test]
    fn empty_request_and_no_op_do_not_write() {
        let (_dir, path) = ledger(LEDGER);
        let before = Fingerprint::of(&path).unwrap();
        let request = EditRequest::new([], Status::Pending, Status::Cleared);
        assert_eq!(
            update_status(&path, &request).unwrap(),
            EditResult::Applied {
                updated: 0,
                fingerprint: before
            }
        );
        let request = EditRequest::new([10], Status::Pending, Status::Pending);
        assert!(matches!(
            update_status(&path, &request).unwrap(),
            EditResult::Applied { updated: 0, .. }
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), LEDGER);
    }

    #[test]
    fn preserves_crlf_and_missing_final_newline() {
        let content = "2024-01-01 A\r\n    X  $1\r\n    Y";
        let (_dir, path) = ledger(content);
        let request = EditRequest::new([2, 3], Status::Unreconciled, Status::Cleared);
        assert!(update_status(&path, &request).unwrap().is_applied());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "2024-01-01 A\r\n    * X  $1\r\n    * Y"
        );
    }

    #[test]
    fn leaves_no_temporary_files() {
        let (dir, path) = ledger(LEDGER);
        let request = EditRequest::new([2], Status::Unreconciled, Status::Cleared);
        update_status(&path, &request).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("main.ledger")]);
    }

    #[test]
    fn detects_a_concurrent_writer() {
        let (_dir, path) = ledger(LEDGER);
        let stale = Fingerprint {
            len: 1,
            modified: None,
        };
        let err = write_atomic(&path, "changed", fs::metadata(&path).unwrap().permissions(), &stale)
            .unwrap_err();
        assert!(matches!(err, EditorError::ModifiedDuringEdit(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), LEDGER);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let request = EditRequest::new([1], Status::Unreconciled, Status::Cleared);
        assert!(matches!(
            update_status(dir.path().join("absent.ledger"), &request),
            Err(EditorError::Io(_))
        ));
    }
}
