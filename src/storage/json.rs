//! A directory of JSON collection files.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};

use super::{Store, StoreError};
use crate::domain::{Book, Issue, Request, Student};

const BOOKS_FILE: &str = "books.json";
const STUDENTS_FILE: &str = "students.json";
const ISSUES_FILE: &str = "issued_books.json";
const REQUESTS_FILE: &str = "requests.json";

/// Flat-file store: one pretty-printed JSON array per collection, all in a
/// single data directory.
///
/// A missing collection file reads as the empty collection. Writes land in a
/// temporary file and are renamed into place, so a collection file is never
/// observed half-written; atomicity across *different* collections is not
/// provided, and callers order their writes accordingly.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    /// Opens a store rooted at the given data directory.
    ///
    /// The directory is created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The data directory this store reads and writes.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, StoreError> {
        let path = self.root.join(file);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("{} not found, treating as empty", path.display());
                return Ok(Vec::new());
            }
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        serde_json::from_str(&content).map_err(|source| StoreError::Parse { path, source })
    }

    fn write<T: Serialize>(&self, file: &str, records: &[T]) -> Result<(), StoreError> {
        let path = self.root.join(file);
        let json = serde_json::to_string_pretty(records).map_err(|source| StoreError::Parse {
            path: path.clone(),
            source,
        })?;

        fs::create_dir_all(&self.root).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| StoreError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Write { path, source })
    }
}

impl Store for JsonStore {
    fn load_books(&self) -> Result<Vec<Book>, StoreError> {
        self.read(BOOKS_FILE)
    }

    fn save_books(&self, books: &[Book]) -> Result<(), StoreError> {
        self.write(BOOKS_FILE, books)
    }

    fn load_students(&self) -> Result<Vec<Student>, StoreError> {
        self.read(STUDENTS_FILE)
    }

    fn save_students(&self, students: &[Student]) -> Result<(), StoreError> {
        self.write(STUDENTS_FILE, students)
    }

    fn load_issues(&self) -> Result<Vec<Issue>, StoreError> {
        self.read(ISSUES_FILE)
    }

    fn save_issues(&self, issues: &[Issue]) -> Result<(), StoreError> {
        self.write(ISSUES_FILE, issues)
    }

    fn load_requests(&self) -> Result<Vec<Request>, StoreError> {
        self.read(REQUESTS_FILE)
    }

    fn save_requests(&self, requests: &[Request]) -> Result<(), StoreError> {
        self.write(REQUESTS_FILE, requests)
    }
}
