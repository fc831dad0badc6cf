//! Domain types for the circulation system.

pub mod analytics;
pub mod book;
pub mod config;
pub mod id;
pub mod issue;
pub mod request;
pub mod student;

pub use analytics::Analytics;
pub use book::Book;
pub use config::{Config, ConfigError};
pub use id::{BookId, IssueId, ParseIdError, RequestId, StudentId};
pub use issue::{DEFAULT_LOAN_DAYS, Issue};
pub use request::{Request, RequestKind, RequestStatus};
pub use student::Student;
