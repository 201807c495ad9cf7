//! Line-level grammar of ledger files, just enough to find status markers.

use crate::Status;

/// Splits `content` into lines, each keeping its terminator. A final line
/// without a terminator is kept as is.
pub fn split_lines(content: &str) -> Vec<&str> {
    content.split_inclusive('\n').collect()
}

/// The line without its `\n` or `\r\n` terminator.
pub fn body(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// A posting line: indented, not blank and not a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingLine {
    /// Byte offset of the first non-blank character, where a marker lives.
    pub column: usize,
    /// The status written on the line itself.
    pub status: Status,
}

impl PostingLine {
    pub fn parse(line: &str) -> Option<Self> {
        let body = body(line);
        if !body.starts_with(is_blank) {
            return None;
        }
        let column = body.find(|c: char| !is_blank(c))?;
        let first = body[column..].chars().next()?;
        if first == ';' {
            return None;
        }
        Some(PostingLine {
            column,
            status: Status::from_marker(first).unwrap_or_default(),
        })
    }

    /// Returns `line` with its marker replaced by the one of `status`.
    ///
    /// Only the marker changes: a new marker is inserted with one separating
    /// space, and a removed marker takes one following blank with it.
    pub fn with_status(&self, line: &str, status: Status) -> String {
        let (head, rest) = line.split_at(self.column);
        let rest = match self.status.marker() {
            Some(old) => {
                let after = &rest[old.len_utf8()..];
                match status.marker() {
                    Some(_) => after,
                    None => after.strip_prefix(is_blank).unwrap_or(after),
                }
            }
            None => rest,
        };
        match (self.status.marker(), status.marker()) {
            (Some(_), Some(new)) => format!("{}{}{}", head, new, rest),
            (None, Some(new)) => format!("{}{} {}", head, new, rest),
            (_, None) => format!("{}{}", head, rest),
        }
    }
}

/// Parses a transaction header `DATE[=AUX] [*|!] ...` and returns the status
/// written on it.
pub fn header_status(line: &str) -> Option<Status> {
    let body = body(line);
    if !body.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let date_end = body.find(is_blank).unwrap_or(body.len());
    let date = &body[..date_end];
    let is_date = date
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '-' | '/' | '.' | '='));
    if !is_date || !date.contains(|c| matches!(c, '-' | '/' | '.')) {
        return None;
    }
    let rest = body[date_end..].trim_start_matches(is_blank);
    Some(
        rest.chars()
            .next()
            .and_then(Status::from_marker)
            .unwrap_or_default(),
    )
}

/// Finds the header of the transaction containing the line at `index`
/// (0-based), scanning upward through its sibling postings and notes.
/// Returns the header's index and status.
pub fn find_header(lines: &[&str], index: usize) -> Option<(usize, Status)> {
    for i in (0..index).rev() {
        let body = body(lines[i]);
        if body.trim().is_empty() {
            return None;
        }
        if body.starts_with(is_blank) {
            continue;
        }
        return header_status(body).map(|status| (i, status));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_terminators() {
        let lines = split_lines("a\r\nb\n\nc");
        assert_eq!(lines, vec!["a\r\n", "b\n", "\n", "c"]);
        assert_eq!(body(lines[0]), "a");
        assert_eq!(body(lines[3]), "c");
        assert_eq!(lines.concat(), "a\r\nb\n\nc");
    }

    #[test]
    fn posting_lines() {
        let line = PostingLine::parse("    * Assets:Checking   $10\n").unwrap();
        assert_eq!((line.column, line.status), (4, Status::Cleared));
        let line = PostingLine::parse("\t!Expenses:Food\n").unwrap();
        assert_eq!((line.column, line.status), (1, Status::Pending));
        let line = PostingLine::parse("  Liabilities:Visa").unwrap();
        assert_eq!(line.status, Status::Unreconciled);

        assert_eq!(PostingLine::parse("2024-01-01 * Payee\n"), None);
        assert_eq!(PostingLine::parse("    ; a note\n"), None);
        assert_eq!(PostingLine::parse("   \n"), None);
        assert_eq!(PostingLine::parse("\n"), None);
    }

    #[test]
    fn replaces_only_the_marker() {
        let line = "    ! Assets:Checking   $10.00\r\n";
        let posting = PostingLine::parse(line).unwrap();
        assert_eq!(
            posting.with_status(line, Status::Cleared),
            "    * Assets:Checking   $10.00\r\n"
        );
        assert_eq!(
            posting.with_status(line, Status::Unreconciled),
            "    Assets:Checking   $10.00\r\n"
        );
        assert_eq!(posting.with_status(line, Status::Pending), line);
    }

    #[test]
    fn inserts_a_marker() {
        let line = "        Expenses:Test             $50.00\n";
        let posting = PostingLine::parse(line).unwrap();
        assert_eq!(
            posting.with_status(line, Status::Pending),
            "        ! Expenses:Test             $50.00\n"
        );
        assert_eq!(posting.with_status(line, Status::Unreconciled), line);
    }

    #[test]
    fn removes_an_attached_marker() {
        let line = "  *Assets:Cash  $1";
        let posting = PostingLine::parse(line).unwrap();
        assert_eq!(posting.with_status(line, Status::Unreconciled), "  Assets:Cash  $1");
    }

    #[test]
    fn headers() {
        assert_eq!(header_status("2024-01-01 Opening\n"), Some(Status::Unreconciled));
        assert_eq!(header_status("2024/01/02 ! Grocery\n"), Some(Status::Pending));
        assert_eq!(header_status("2024/1/2=2024/1/5 * (42) Rent"), Some(Status::Cleared));
        assert_eq!(header_status("2024-01-03"), Some(Status::Unreconciled));
        assert_eq!(header_status("    Assets:Cash"), None);
        assert_eq!(header_status("; 2024-01-01 comment"), None);
        assert_eq!(header_status("2024 is a year"), None);
        assert_eq!(header_status("account Assets:Cash"), None);
    }

    #[test]
    fn finds_the_enclosing_header() {
        let lines = split_lines(
            "2024-01-01 * First\n    A  $1\n    ; note\n    B\n\n2024-01-02 Second\n    C  $2\n",
        );
        assert_eq!(find_header(&lines, 3), Some((0, Status::Cleared)));
        assert_eq!(find_header(&lines, 1), Some((0, Status::Cleared)));
        assert_eq!(find_header(&lines, 6), Some((5, Status::Unreconciled)));
        assert_eq!(find_header(&lines, 0), None);

        let orphan = split_lines("account Assets:Cash\n    note Cash\n");
        assert_eq!(find_header(&orphan, 1), None);
        let detached = split_lines("2024-01-01 x\n\n    A  $1\n");
        assert_eq!(find_header(&detached, 2), None);
    }
}
