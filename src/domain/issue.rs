use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::id::{BookId, IssueId, StudentId};

/// Loan period assumed for ledger entries that predate due dates.
pub const DEFAULT_LOAN_DAYS: i64 = 7;

/// One ledger entry: a single copy of a book, lent to one student for a
/// bounded period.
///
/// An issue is mutated exactly once, when it is closed by a return, and is
/// immutable afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Unique ledger id, e.g. `ISS-4`.
    pub id: IssueId,
    /// The borrowing student.
    pub student_id: StudentId,
    /// The borrowed book.
    pub book_id: BookId,
    /// When the copy left the shelf. Absent on some legacy records.
    #[serde(default)]
    pub issue_date: Option<DateTime<Utc>>,
    /// When the copy is due back. Absent on some legacy records.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Whether the copy has come back.
    #[serde(default)]
    pub returned: bool,
    /// When the copy came back.
    #[serde(default)]
    pub return_date: Option<DateTime<Utc>>,
    /// Whether a return request is pending for this issue.
    #[serde(default)]
    pub return_requested: bool,
}

impl Issue {
    pub(crate) fn new(
        id: IssueId,
        student_id: StudentId,
        book_id: BookId,
        issued: DateTime<Utc>,
        days: i64,
    ) -> Self {
        Self {
            id,
            student_id,
            book_id,
            issue_date: Some(issued),
            due_date: Some(issued + Duration::days(days)),
            returned: false,
            return_date: None,
            return_requested: false,
        }
    }

    /// Whether the copy is still out.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.returned
    }

    /// The deadline this loan is judged against.
    ///
    /// A missing due date is reconstructed as `issue_date` plus
    /// [`DEFAULT_LOAN_DAYS`]. `None` means both dates are missing and the
    /// return can never be counted late.
    #[must_use]
    pub fn effective_due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
            .or_else(|| self.issue_date.map(|d| d + Duration::days(DEFAULT_LOAN_DAYS)))
    }

    pub(crate) fn close(&mut self, now: DateTime<Utc>) {
        self.returned = true;
        self.return_date = Some(now);
        self.return_requested = false;
    }
}
