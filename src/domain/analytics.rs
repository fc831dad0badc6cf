use serde::Serialize;

use super::{Book, Issue, Student};

/// Point-in-time aggregate counts across the circulation collections.
///
/// Pure read-side derivation: computing this has no side effects and the
/// numbers are recomputed from the stores on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Analytics {
    /// Copies owned, summed across all books.
    pub total_books: u32,
    /// Copies on the shelf, summed across all books.
    pub available_books: u32,
    /// Copies currently out (owned minus on-shelf).
    pub issued_books: u32,
    /// Registered students.
    pub total_students: usize,
    /// Students with approved accounts.
    pub approved_students: usize,
    /// Students still awaiting approval.
    pub pending_students: usize,
    /// Students carrying the late-return flag.
    pub flagged_students: usize,
    /// Ledger entries not yet returned.
    pub currently_issued: usize,
}

impl Analytics {
    /// Computes the aggregates from full collection snapshots.
    #[must_use]
    pub fn compute(books: &[Book], students: &[Student], issues: &[Issue]) -> Self {
        let total_books: u32 = books.iter().map(Book::total_copies).sum();
        let available_books: u32 = books.iter().map(Book::available_copies).sum();
        let total_students = students.len();
        let approved_students = students.iter().filter(|s| s.approved).count();

        Self {
            total_books,
            available_books,
            issued_books: total_books.saturating_sub(available_books),
            total_students,
            approved_students,
            pending_students: total_students - approved_students,
            flagged_students: students.iter().filter(|s| s.flagged).count(),
            currently_issued: issues.iter().filter(|i| i.is_active()).count(),
        }
    }
}
