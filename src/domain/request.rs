use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{BookId, IssueId, RequestId, StudentId};

/// What a request asks the admin to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// Borrow a book.
    Issue,
    /// Return a borrowed book.
    Return,
}

/// Lifecycle state of a request.
///
/// Approval is terminal. There is deliberately no rejected state: admins can
/// only approve or leave a request pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Awaiting an admin decision.
    Pending,
    /// Approved and dispatched.
    Approved,
}

/// A student-initiated, admin-approved intent to issue or return a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Unique request id, e.g. `REQ-12`.
    pub id: RequestId,
    /// Issue or return.
    #[serde(rename = "type")]
    pub kind: RequestKind,
    /// The requesting student.
    pub student_id: StudentId,
    /// The book concerned.
    pub book_id: BookId,
    /// The ledger entry to close; set only on return requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<IssueId>,
    /// Current lifecycle state.
    pub status: RequestStatus,
    /// When the student filed the request.
    pub requested_at: DateTime<Utc>,
    /// When an admin approved it.
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
}

impl Request {
    pub(crate) fn new_issue(
        id: RequestId,
        student_id: StudentId,
        book_id: BookId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind: RequestKind::Issue,
            student_id,
            book_id,
            issue_id: None,
            status: RequestStatus::Pending,
            requested_at: now,
            approved_at: None,
        }
    }

    pub(crate) fn new_return(
        id: RequestId,
        student_id: StudentId,
        book_id: BookId,
        issue_id: IssueId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind: RequestKind::Return,
            student_id,
            book_id,
            issue_id: Some(issue_id),
            status: RequestStatus::Pending,
            requested_at: now,
            approved_at: None,
        }
    }

    /// Whether the request is still awaiting a decision.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    pub(crate) fn approve(&mut self, now: DateTime<Utc>) {
        self.status = RequestStatus::Approved;
        self.approved_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_is_recorded_with_timestamp() {
        let mut request = Request::new_issue(
            "REQ-1".parse().unwrap(),
            "STU-A1B2C3".parse().unwrap(),
            "BK-001".parse().unwrap(),
            Utc::now(),
        );
        assert!(request.is_pending());
        let now = Utc::now();
        request.approve(now);
        assert!(!request.is_pending());
        assert_eq!(request.approved_at, Some(now));
    }

    #[test]
    fn kind_serializes_as_the_type_field() {
        let request = Request::new_issue(
            "REQ-1".parse().unwrap(),
            "STU-A1B2C3".parse().unwrap(),
            "BK-001".parse().unwrap(),
            Utc::now(),
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "issue");
        assert_eq!(json["status"], "pending");
        // Issue requests carry no issue reference at all.
        assert!(json.get("issue_id").is_none());
    }

    #[test]
    fn return_request_references_its_issue() {
        let request = Request::new_return(
            "REQ-2".parse().unwrap(),
            "STU-A1B2C3".parse().unwrap(),
            "BK-001".parse().unwrap(),
            "ISS-1".parse().unwrap(),
            Utc::now(),
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "return");
        assert_eq!(json["issue_id"], "ISS-1");
    }
}
