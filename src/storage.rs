//! Persistence for the circulation collections.
//!
//! Storage is a whole-collection seam: every operation reads or replaces an
//! entire collection, with no filtering or partial updates pushed down. The
//! [`Store`] trait is the boundary; [`JsonStore`] is the flat-file
//! implementation the `circ` binary uses.

mod json;

use std::path::PathBuf;

pub use json::JsonStore;

use crate::domain::{Book, Issue, Request, Student};

/// Full-collection persistence used by the lending engine.
pub trait Store {
    /// Reads the book collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read or parsed.
    fn load_books(&self) -> Result<Vec<Book>, StoreError>;

    /// Replaces the book collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be written.
    fn save_books(&self, books: &[Book]) -> Result<(), StoreError>;

    /// Reads the student collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read or parsed.
    fn load_students(&self) -> Result<Vec<Student>, StoreError>;

    /// Replaces the student collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be written.
    fn save_students(&self, students: &[Student]) -> Result<(), StoreError>;

    /// Reads the issue ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read or parsed.
    fn load_issues(&self) -> Result<Vec<Issue>, StoreError>;

    /// Replaces the issue ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be written.
    fn save_issues(&self, issues: &[Issue]) -> Result<(), StoreError>;

    /// Reads the request queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read or parsed.
    fn load_requests(&self) -> Result<Vec<Request>, StoreError>;

    /// Replaces the request queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be written.
    fn save_requests(&self, requests: &[Request]) -> Result<(), StoreError>;
}

/// Errors raised by a [`Store`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A collection file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// The collection file.
        path: PathBuf,
        /// The underlying io error.
        #[source]
        source: std::io::Error,
    },

    /// A collection file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// The collection file.
        path: PathBuf,
        /// The underlying io error.
        #[source]
        source: std::io::Error,
    },

    /// A collection file held something other than the expected records.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// The collection file.
        path: PathBuf,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}
