use crate::{
    domain::{BookId, IssueId, RequestId, StudentId},
    storage::StoreError,
};

/// Coarse classification of engine failures, for callers that care about
/// the category rather than the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced entity does not exist.
    NotFound,
    /// The entity exists but the operation is not legal in its current state.
    InvalidState,
    /// The acting student is not allowed to do this.
    PermissionDenied,
    /// The store failed to read or write a collection.
    Persistence,
}

/// Failures surfaced by [`Engine`](super::Engine) operations.
///
/// Every variant renders as a human-readable message via `Display`; nothing
/// panics past the engine boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No book with the given id.
    #[error("book {0} not found")]
    BookNotFound(BookId),

    /// No student with the given id.
    #[error("student {0} not found")]
    StudentNotFound(StudentId),

    /// No ledger entry with the given id (or it belongs to someone else).
    #[error("issue record {0} not found")]
    IssueNotFound(IssueId),

    /// No request with the given id.
    #[error("request {0} not found")]
    RequestNotFound(RequestId),

    /// Every copy of the book is already out.
    #[error("no copies of '{title}' are available")]
    NoCopiesAvailable {
        /// The book in question.
        book_id: BookId,
        /// Its title, for the message.
        title: String,
    },

    /// The student's account has not been approved by an admin.
    #[error("student {0} is not approved")]
    NotApproved(StudentId),

    /// A flagged student already has an active loan.
    #[error("flagged students can only have one book at a time")]
    FlaggedLimit,

    /// The ledger entry is already closed.
    #[error("issue {0} is already returned")]
    AlreadyReturned(IssueId),

    /// A return request is already pending for this ledger entry.
    #[error("return of issue {0} is already requested")]
    ReturnAlreadyRequested(IssueId),

    /// The request has already been approved.
    #[error("request {0} is not pending")]
    NotPending(RequestId),

    /// A return request carries no issue reference.
    #[error("return request {0} has no issue reference")]
    MalformedRequest(RequestId),

    /// Another student is already registered under this email.
    #[error("email {0} is already registered")]
    EmailTaken(String),

    /// The student account is already approved.
    #[error("student {0} is already approved")]
    AlreadyApproved(StudentId),

    /// The book still has unreturned copies in the ledger.
    #[error("cannot delete book {0} while copies are issued")]
    BookHasActiveIssues(BookId),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    /// The coarse category of this failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::BookNotFound(_)
            | Self::StudentNotFound(_)
            | Self::IssueNotFound(_)
            | Self::RequestNotFound(_) => ErrorKind::NotFound,
            Self::NoCopiesAvailable { .. }
            | Self::AlreadyReturned(_)
            | Self::ReturnAlreadyRequested(_)
            | Self::NotPending(_)
            | Self::MalformedRequest(_)
            | Self::EmailTaken(_)
            | Self::AlreadyApproved(_)
            | Self::BookHasActiveIssues(_) => ErrorKind::InvalidState,
            Self::NotApproved(_) | Self::FlaggedLimit => ErrorKind::PermissionDenied,
            Self::Store(_) => ErrorKind::Persistence,
        }
    }
}
