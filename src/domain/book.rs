use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::BookId;

/// A title in the catalogue.
///
/// Copies are fungible: only counts are tracked, never the identity of an
/// individual physical copy. The `available` flag is derived state and is
/// kept consistent with `available_copies` by every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawBook")]
pub struct Book {
    /// Unique catalogue id, e.g. `BK-001`.
    pub id: BookId,
    /// Title of the book.
    pub title: String,
    /// Author of the book.
    pub author: String,
    /// Genre shelved under.
    pub genre: String,
    available: bool,
    total_copies: u32,
    available_copies: u32,
    /// When the book was added to the catalogue.
    pub added_at: DateTime<Utc>,
}

impl Book {
    pub(crate) fn new(id: BookId, title: String, author: String, genre: String, copies: u32) -> Self {
        let copies = copies.max(1);
        Self {
            id,
            title,
            author,
            genre,
            available: true,
            total_copies: copies,
            available_copies: copies,
            added_at: Utc::now(),
        }
    }

    /// Synthesizes a single-copy record for a book id that appears in the
    /// ledger but not in the catalogue, so a return always has somewhere to
    /// land.
    pub(crate) fn placeholder(id: BookId) -> Self {
        Self {
            title: format!("Book {id}"),
            author: "Unknown".to_string(),
            genre: "Unknown".to_string(),
            available: true,
            total_copies: 1,
            available_copies: 1,
            added_at: Utc::now(),
            id,
        }
    }

    /// Whether at least one copy is on the shelf.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.available
    }

    /// Number of copies the library owns.
    #[must_use]
    pub const fn total_copies(&self) -> u32 {
        self.total_copies
    }

    /// Number of copies currently on the shelf.
    #[must_use]
    pub const fn available_copies(&self) -> u32 {
        self.available_copies
    }

    /// Takes one copy off the shelf.
    ///
    /// Returns `false` when no copies remain, leaving the record untouched.
    pub(crate) fn checkout(&mut self) -> bool {
        if self.available_copies == 0 {
            return false;
        }
        self.available_copies -= 1;
        self.available = self.available_copies > 0;
        true
    }

    /// Puts one copy back on the shelf.
    ///
    /// The count is capped at `total_copies` so an inconsistent ledger
    /// cannot push it past the number of copies owned.
    pub(crate) fn check_in(&mut self) {
        self.available_copies = self.available_copies.saturating_add(1).min(self.total_copies);
        self.available = self.available_copies > 0;
    }

    pub(crate) fn update(
        &mut self,
        title: String,
        author: String,
        genre: String,
        total_copies: u32,
        available_copies: u32,
    ) {
        self.title = title;
        self.author = author;
        self.genre = genre;
        self.total_copies = total_copies.max(1);
        self.available_copies = available_copies.min(self.total_copies);
        self.available = self.available_copies > 0;
    }
}

/// The on-disk shape of a book record.
///
/// Older records may lack the copy-count fields entirely, or hold
/// `available_copies` as a string. The conversion applies the documented
/// defaults: `total_copies` falls back to 1, `available_copies` falls back
/// to `total_copies` when the book is marked available and 0 otherwise.
#[derive(Deserialize)]
struct RawBook {
    id: BookId,
    title: String,
    author: String,
    genre: String,
    #[serde(default = "default_available")]
    available: bool,
    #[serde(default)]
    total_copies: Option<u32>,
    #[serde(default)]
    available_copies: Option<serde_json::Value>,
    #[serde(default = "Utc::now")]
    added_at: DateTime<Utc>,
}

const fn default_available() -> bool {
    true
}

impl From<RawBook> for Book {
    fn from(raw: RawBook) -> Self {
        let total_copies = raw.total_copies.unwrap_or(1).max(1);
        let available_copies = raw
            .available_copies
            .as_ref()
            .and_then(coerce_count)
            .unwrap_or(if raw.available { total_copies } else { 0 })
            .min(total_copies);
        Self {
            id: raw.id,
            title: raw.title,
            author: raw.author,
            genre: raw.genre,
            available: available_copies > 0,
            total_copies,
            available_copies,
            added_at: raw.added_at,
        }
    }
}

fn coerce_count(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
