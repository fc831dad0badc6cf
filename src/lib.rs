//! Library circulation management
//!
//! Books, students, and the issue/return lifecycle, backed by flat JSON
//! collections. The [`Engine`] holds the state-transition rules; everything
//! else is the data it moves.

pub mod domain;
pub use domain::{
    Analytics, Book, BookId, Config, Issue, IssueId, Request, RequestId, RequestKind,
    RequestStatus, Student, StudentId,
};

/// Flat-file persistence for the circulation collections.
pub mod storage;
pub use storage::{JsonStore, Store, StoreError};

/// The lending engine: issue, return, request, and approve.
pub mod engine;
pub use engine::{Approved, Engine, Error, ErrorKind, ReturnReceipt};

/// Append-only action history.
pub mod audit;
pub use audit::{AuditEntry, AuditLog, CsvAudit};
