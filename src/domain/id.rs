//! Typed record identifiers.
//!
//! Each collection has its own id format: `BK-001` for books, `STU-A1B2C3`
//! for students, `ISS-4` for ledger entries, `REQ-12` for requests. The
//! newtypes keep the collections from being crossed and give the CLI strict
//! parsing at the boundary.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when a string is not a valid id for its collection.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid {kind} id '{value}': expected the form {expected}")]
pub struct ParseIdError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

impl ParseIdError {
    fn new(kind: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected,
        }
    }
}

/// Identifier of a book in the catalogue, e.g. `BK-001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    /// Allocates the id after the highest one already in use.
    ///
    /// The numeric suffix is one greater than the largest existing suffix,
    /// zero-padded to `digits`, so deleting a book can never recycle a live
    /// id.
    pub(crate) fn next<'a, I>(existing: I, digits: usize) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let max = existing
            .into_iter()
            .filter_map(Self::number)
            .max()
            .unwrap_or(0);
        Self(format!("BK-{:0width$}", max + 1, width = digits))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn number(&self) -> Option<usize> {
        self.0.strip_prefix("BK-")?.parse().ok()
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BookId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if numeric_suffix(s, "BK-").is_some() {
            Ok(Self(s.to_string()))
        } else {
            Err(ParseIdError::new("book", s, "BK-<number>"))
        }
    }
}

/// Identifier of a student, e.g. `STU-A1B2C3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    /// Generates a fresh random student id.
    ///
    /// The suffix is the first six hex characters of a v4 UUID, uppercased.
    /// Student ids are random rather than sequential so they cannot be
    /// enumerated from a registration form.
    #[must_use]
    pub(crate) fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(format!("STU-{}", hex[..6].to_ascii_uppercase()))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StudentId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("STU-") {
            Some(rest) if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric()) => {
                Ok(Self(s.to_string()))
            }
            _ => Err(ParseIdError::new("student", s, "STU-<suffix>")),
        }
    }
}

/// Identifier of a ledger entry, e.g. `ISS-4`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(String);

impl IssueId {
    /// Allocates the id after the highest one already in the ledger.
    pub(crate) fn next<'a, I>(existing: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let max = existing
            .into_iter()
            .filter_map(Self::number)
            .max()
            .unwrap_or(0);
        Self(format!("ISS-{}", max + 1))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn number(&self) -> Option<usize> {
        self.0.strip_prefix("ISS-")?.parse().ok()
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for IssueId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if numeric_suffix(s, "ISS-").is_some() {
            Ok(Self(s.to_string()))
        } else {
            Err(ParseIdError::new("issue", s, "ISS-<number>"))
        }
    }
}

/// Identifier of a pending or approved request, e.g. `REQ-12`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Allocates the id after the highest one already in the queue.
    pub(crate) fn next<'a, I>(existing: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let max = existing
            .into_iter()
            .filter_map(Self::number)
            .max()
            .unwrap_or(0);
        Self(format!("REQ-{}", max + 1))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn number(&self) -> Option<usize> {
        self.0.strip_prefix("REQ-")?.parse().ok()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RequestId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if numeric_suffix(s, "REQ-").is_some() {
            Ok(Self(s.to_string()))
        } else {
            Err(ParseIdError::new("request", s, "REQ-<number>"))
        }
    }
}

fn numeric_suffix(s: &str, prefix: &str) -> Option<usize> {
    s.strip_prefix(prefix)?.parse().ok()
}
