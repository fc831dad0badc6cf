//! The lending engine.
//!
//! State transitions over the inventory, membership, ledger, and request
//! collections. Each operation performs its own full read-modify-write cycle
//! against the collections it touches. There is no cross-collection
//! transaction; writes are ordered so that a failure part-way through leaves
//! the safest possible state (in particular, a request approval is persisted
//! before the approved operation is dispatched, so it can never be processed
//! twice).

mod catalog;
mod error;
mod membership;

use std::fmt;

use chrono::Utc;
pub use error::{Error, ErrorKind};

use crate::{
    domain::{
        Analytics, Book, BookId, Config, Issue, IssueId, Request, RequestId, RequestKind, Student,
        StudentId,
    },
    storage::Store,
};

/// The circulation state machine over a [`Store`].
///
/// Mutating operations take `&mut self`, which makes the single-writer
/// assumption a compile-time fact rather than a convention: two admin
/// sessions cannot interleave through one engine.
#[derive(Debug)]
pub struct Engine<S> {
    store: S,
    config: Config,
}

impl<S> Engine<S> {
    /// Creates an engine over the given store.
    pub const fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    /// The active configuration.
    pub const fn config(&self) -> &Config {
        &self.config
    }
}

/// The result of approving a pending request.
#[derive(Debug, Clone)]
pub enum Approved {
    /// An issue request was approved and the book issued.
    Issued(Issue),
    /// A return request was approved and the book returned.
    Returned(ReturnReceipt),
}

/// Outcome of a successful return.
#[derive(Debug, Clone)]
pub struct ReturnReceipt {
    /// The closed ledger entry.
    pub issue: Issue,
    /// Whether the return came in past the due date, flagging the student.
    pub late: bool,
}

impl fmt::Display for ReturnReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.late {
            write!(f, "Book returned successfully (Late return - Student flagged)")
        } else {
            write!(f, "Book returned successfully")
        }
    }
}

impl<S: Store> Engine<S> {
    /// Files a pending request to borrow a book.
    ///
    /// Copy counts are untouched here: copies are only decremented when the
    /// request is approved and the book actually issued.
    ///
    /// # Errors
    ///
    /// Fails when the book or student is unknown, no copies are on the
    /// shelf, the student is unapproved, or a flagged student already has an
    /// active loan.
    pub fn request_issue(
        &mut self,
        student_id: &StudentId,
        book_id: &BookId,
    ) -> Result<Request, Error> {
        let books = self.store.load_books()?;
        let book = find_book(&books, book_id)?;
        if !book.is_available() {
            return Err(no_copies(book));
        }

        let students = self.store.load_students()?;
        let student = find_student(&students, student_id)?;
        if !student.approved {
            return Err(Error::NotApproved(student_id.clone()));
        }
        if student.flagged {
            self.assert_flag_limit(student_id)?;
        }

        let mut requests = self.store.load_requests()?;
        let request = Request::new_issue(
            RequestId::next(requests.iter().map(|r| &r.id)),
            student_id.clone(),
            book_id.clone(),
            Utc::now(),
        );
        requests.push(request.clone());
        self.store.save_requests(&requests)?;
        Ok(request)
    }

    /// Files a pending request to return a borrowed book.
    ///
    /// Marks the ledger entry as return-requested so the same loan cannot
    /// queue twice.
    ///
    /// # Errors
    ///
    /// Fails when the issue does not exist or belongs to another student, is
    /// already returned, or already has a return request pending.
    pub fn request_return(
        &mut self,
        student_id: &StudentId,
        issue_id: &IssueId,
    ) -> Result<Request, Error> {
        let mut issues = self.store.load_issues()?;
        let issue = issues
            .iter_mut()
            .find(|i| &i.id == issue_id && &i.student_id == student_id)
            .ok_or_else(|| Error::IssueNotFound(issue_id.clone()))?;
        if issue.returned {
            return Err(Error::AlreadyReturned(issue_id.clone()));
        }
        if issue.return_requested {
            return Err(Error::ReturnAlreadyRequested(issue_id.clone()));
        }
        issue.return_requested = true;
        let book_id = issue.book_id.clone();

        let mut requests = self.store.load_requests()?;
        let request = Request::new_return(
            RequestId::next(requests.iter().map(|r| &r.id)),
            student_id.clone(),
            book_id,
            issue_id.clone(),
            Utc::now(),
        );
        requests.push(request.clone());

        self.store.save_issues(&issues)?;
        self.store.save_requests(&requests)?;
        Ok(request)
    }

    /// Approves a pending request and dispatches the underlying operation.
    ///
    /// The approval is persisted before dispatch: if the dispatched issue or
    /// return then fails, the request stays approved and cannot be
    /// reprocessed.
    ///
    /// # Errors
    ///
    /// Fails when the request is unknown or not pending, or when the
    /// dispatched operation fails its own re-validation.
    pub fn approve_request(&mut self, request_id: &RequestId) -> Result<Approved, Error> {
        let mut requests = self.store.load_requests()?;
        let request = requests
            .iter_mut()
            .find(|r| &r.id == request_id)
            .ok_or_else(|| Error::RequestNotFound(request_id.clone()))?;
        if !request.is_pending() {
            return Err(Error::NotPending(request_id.clone()));
        }
        request.approve(Utc::now());

        let kind = request.kind;
        let student_id = request.student_id.clone();
        let book_id = request.book_id.clone();
        let issue_id = request.issue_id.clone();
        self.store.save_requests(&requests)?;

        match kind {
            RequestKind::Issue => {
                let days = self.config.loan_period_days();
                let issue = self.issue_book(&student_id, &book_id, days)?;
                Ok(Approved::Issued(issue))
            }
            RequestKind::Return => {
                let issue_id =
                    issue_id.ok_or_else(|| Error::MalformedRequest(request_id.clone()))?;
                let receipt = self.return_book(&issue_id)?;
                Ok(Approved::Returned(receipt))
            }
        }
    }

    /// Issues a book to a student, directly (admin action) or via approval
    /// dispatch.
    ///
    /// Availability, account approval, and the flagged-student limit are all
    /// re-validated here: the state may have changed since any request was
    /// filed, and a stale snapshot is never trusted.
    ///
    /// # Errors
    ///
    /// Fails when the book or student is unknown, no copies remain, the
    /// student is unapproved, or a flagged student already has an active
    /// loan.
    pub fn issue_book(
        &mut self,
        student_id: &StudentId,
        book_id: &BookId,
        days: i64,
    ) -> Result<Issue, Error> {
        let mut books = self.store.load_books()?;
        let book = books
            .iter_mut()
            .find(|b| &b.id == book_id)
            .ok_or_else(|| Error::BookNotFound(book_id.clone()))?;
        if !book.is_available() {
            return Err(no_copies(book));
        }

        let students = self.store.load_students()?;
        let student = find_student(&students, student_id)?;
        if !student.approved {
            return Err(Error::NotApproved(student_id.clone()));
        }

        let mut issues = self.store.load_issues()?;
        if student.flagged
            && issues
                .iter()
                .any(|i| i.is_active() && &i.student_id == student_id)
        {
            return Err(Error::FlaggedLimit);
        }

        if !book.checkout() {
            return Err(no_copies(book));
        }

        let issue = Issue::new(
            IssueId::next(issues.iter().map(|i| &i.id)),
            student_id.clone(),
            book_id.clone(),
            Utc::now(),
            days,
        );
        issues.push(issue.clone());

        self.store.save_issues(&issues)?;
        self.store.save_books(&books)?;
        Ok(issue)
    }

    /// Returns a book, directly (admin action) or via approval dispatch.
    ///
    /// Closes the ledger entry, puts the copy back on the shelf, and flags
    /// the student if the return is past the due date. The flag is sticky:
    /// nothing but explicit admin action clears it.
    ///
    /// A ledger entry with no due date is judged against its issue date plus
    /// [`crate::domain::DEFAULT_LOAN_DAYS`]; an entry with neither date can
    /// never be late. A book id missing from the catalogue gets a synthesized
    /// single-copy record so the ledger stays consistent.
    ///
    /// # Errors
    ///
    /// Fails when the issue does not exist or is already returned.
    pub fn return_book(&mut self, issue_id: &IssueId) -> Result<ReturnReceipt, Error> {
        let now = Utc::now();

        let mut issues = self.store.load_issues()?;
        let issue = issues
            .iter_mut()
            .find(|i| &i.id == issue_id)
            .ok_or_else(|| Error::IssueNotFound(issue_id.clone()))?;
        if issue.returned {
            return Err(Error::AlreadyReturned(issue_id.clone()));
        }

        let late = issue.effective_due_date().is_some_and(|due| now > due);
        issue.close(now);
        let book_id = issue.book_id.clone();
        let student_id = issue.student_id.clone();
        let closed = issue.clone();

        let mut books = self.store.load_books()?;
        if let Some(book) = books.iter_mut().find(|b| b.id == book_id) {
            book.check_in();
        } else {
            tracing::warn!("book {book_id} missing from catalogue, synthesizing a placeholder");
            books.push(Book::placeholder(book_id));
        }

        let mut students = self.store.load_students()?;
        if late {
            if let Some(student) = students.iter_mut().find(|s| s.id == student_id) {
                student.flagged = true;
            }
        }

        self.store.save_issues(&issues)?;
        self.store.save_books(&books)?;
        self.store.save_students(&students)?;
        Ok(ReturnReceipt {
            issue: closed,
            late,
        })
    }

    /// All books in the catalogue.
    ///
    /// # Errors
    ///
    /// Fails when the store cannot be read.
    pub fn books(&self) -> Result<Vec<Book>, Error> {
        Ok(self.store.load_books()?)
    }

    /// Looks up a single book.
    ///
    /// # Errors
    ///
    /// Fails when the book does not exist or the store cannot be read.
    pub fn book(&self, id: &BookId) -> Result<Book, Error> {
        self.store
            .load_books()?
            .into_iter()
            .find(|b| &b.id == id)
            .ok_or_else(|| Error::BookNotFound(id.clone()))
    }

    /// All registered students.
    ///
    /// # Errors
    ///
    /// Fails when the store cannot be read.
    pub fn students(&self) -> Result<Vec<Student>, Error> {
        Ok(self.store.load_students()?)
    }

    /// Looks up a single student.
    ///
    /// # Errors
    ///
    /// Fails when the student does not exist or the store cannot be read.
    pub fn student(&self, id: &StudentId) -> Result<Student, Error> {
        self.store
            .load_students()?
            .into_iter()
            .find(|s| &s.id == id)
            .ok_or_else(|| Error::StudentNotFound(id.clone()))
    }

    /// The full issue ledger, open and closed.
    ///
    /// # Errors
    ///
    /// Fails when the store cannot be read.
    pub fn issues(&self) -> Result<Vec<Issue>, Error> {
        Ok(self.store.load_issues()?)
    }

    /// All requests, pending and approved.
    ///
    /// # Errors
    ///
    /// Fails when the store cannot be read.
    pub fn requests(&self) -> Result<Vec<Request>, Error> {
        Ok(self.store.load_requests()?)
    }

    /// Requests still awaiting an admin decision.
    ///
    /// # Errors
    ///
    /// Fails when the store cannot be read.
    pub fn pending_requests(&self) -> Result<Vec<Request>, Error> {
        Ok(self
            .store
            .load_requests()?
            .into_iter()
            .filter(Request::is_pending)
            .collect())
    }

    /// Aggregate counts across the collections. Pure read, recomputed on
    /// demand.
    ///
    /// # Errors
    ///
    /// Fails when the store cannot be read.
    pub fn analytics(&self) -> Result<Analytics, Error> {
        Ok(Analytics::compute(
            &self.store.load_books()?,
            &self.store.load_students()?,
            &self.store.load_issues()?,
        ))
    }

    fn assert_flag_limit(&self, student_id: &StudentId) -> Result<(), Error> {
        let issues = self.store.load_issues()?;
        if issues
            .iter()
            .any(|i| i.is_active() && &i.student_id == student_id)
        {
            Err(Error::FlaggedLimit)
        } else {
            Ok(())
        }
    }
}

fn find_book<'a>(books: &'a [Book], id: &BookId) -> Result<&'a Book, Error> {
    books
        .iter()
        .find(|b| &b.id == id)
        .ok_or_else(|| Error::BookNotFound(id.clone()))
}

fn find_student<'a>(students: &'a [Student], id: &StudentId) -> Result<&'a Student, Error> {
    students
        .iter()
        .find(|s| &s.id == id)
        .ok_or_else(|| Error::StudentNotFound(id.clone()))
}

fn no_copies(book: &Book) -> Error {
    Error::NoCopiesAvailable {
        book_id: book.id.clone(),
        title: book.title.clone(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use tempfile::{TempDir, tempdir};

    use super::*;
    use crate::{
        domain::{Issue, RequestStatus},
        storage::JsonStore,
    };

    fn setup() -> (TempDir, Engine<JsonStore>) {
        let tmp = tempdir().unwrap();
        let engine = Engine::new(JsonStore::new(tmp.path()), Config::default());
        (tmp, engine)
    }

    fn add_book(engine: &mut Engine<JsonStore>, copies: u32) -> BookId {
        engine
            .add_book(
                "1984".to_string(),
                "George Orwell".to_string(),
                "Science Fiction".to_string(),
                copies,
            )
            .unwrap()
            .id
    }

    fn approved_student(engine: &mut Engine<JsonStore>, email: &str) -> StudentId {
        let student = engine
            .register_student("John Doe".to_string(), email.to_string(), "123456")
            .unwrap();
        engine.approve_student(&student.id).unwrap();
        student.id
    }

    fn assert_copy_invariant(engine: &Engine<JsonStore>) {
        for book in engine.books().unwrap() {
            assert!(book.available_copies() <= book.total_copies());
            assert_eq!(book.is_available(), book.available_copies() > 0);
        }
    }

    #[test]
    fn issue_then_return_round_trips_copy_counts() {
        let (_tmp, mut engine) = setup();
        let book_id = add_book(&mut engine, 1);
        let student_id = approved_student(&mut engine, "john@example.com");

        let issue = engine.issue_book(&student_id, &book_id, 7).unwrap();
        let book = engine.book(&book_id).unwrap();
        assert_eq!(book.available_copies(), 0);
        assert!(!book.is_available());
        assert_copy_invariant(&engine);

        let receipt = engine.return_book(&issue.id).unwrap();
        assert!(!receipt.late);
        assert_eq!(receipt.to_string(), "Book returned successfully");

        let book = engine.book(&book_id).unwrap();
        assert_eq!(book.available_copies(), 1);
        assert!(book.is_available());
        assert!(!engine.student(&student_id).unwrap().flagged);
        assert_copy_invariant(&engine);
    }

    #[test]
    fn issue_fails_when_no_copies_remain() {
        let (_tmp, mut engine) = setup();
        let book_id = add_book(&mut engine, 1);
        let first = approved_student(&mut engine, "john@example.com");
        let second = approved_student(&mut engine, "jane@example.com");

        engine.issue_book(&first, &book_id, 7).unwrap();
        let error = engine.issue_book(&second, &book_id, 7).unwrap_err();
        assert!(matches!(error, Error::NoCopiesAvailable { .. }));
        assert_copy_invariant(&engine);
    }

    #[test]
    fn unknown_book_and_student_are_not_found() {
        let (_tmp, mut engine) = setup();
        let book_id = add_book(&mut engine, 1);
        let student_id = approved_student(&mut engine, "john@example.com");

        let missing_book: BookId = "BK-099".parse().unwrap();
        let error = engine.issue_book(&student_id, &missing_book, 7).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);

        let missing_student: StudentId = "STU-FFFFFF".parse().unwrap();
        let error = engine.issue_book(&missing_student, &book_id, 7).unwrap_err();
        assert!(matches!(error, Error::StudentNotFound(_)));
    }

    #[test]
    fn unapproved_student_cannot_request_and_no_request_is_filed() {
        let (_tmp, mut engine) = setup();
        let book_id = add_book(&mut engine, 1);
        let student = engine
            .register_student(
                "Alice Brown".to_string(),
                "alice@example.com".to_string(),
                "123456",
            )
            .unwrap();

        let error = engine.request_issue(&student.id, &book_id).unwrap_err();
        assert!(matches!(error, Error::NotApproved(_)));
        assert_eq!(error.kind(), ErrorKind::PermissionDenied);
        assert!(engine.requests().unwrap().is_empty());
    }

    #[test]
    fn flagged_student_is_limited_to_one_active_loan() {
        let (_tmp, mut engine) = setup();
        let first_book = add_book(&mut engine, 1);
        let second_book = add_book(&mut engine, 1);
        let student_id = approved_student(&mut engine, "bob@example.com");
        engine.set_student_flag(&student_id, true).unwrap();

        // One active loan is allowed.
        engine.issue_book(&student_id, &first_book, 7).unwrap();

        let error = engine.issue_book(&student_id, &second_book, 7).unwrap_err();
        assert!(matches!(error, Error::FlaggedLimit));

        let error = engine.request_issue(&student_id, &second_book).unwrap_err();
        assert!(matches!(error, Error::FlaggedLimit));
        assert!(engine.requests().unwrap().is_empty());
    }

    #[test]
    fn flagged_student_with_no_active_loans_may_borrow() {
        let (_tmp, mut engine) = setup();
        let book_id = add_book(&mut engine, 1);
        let student_id = approved_student(&mut engine, "bob@example.com");
        engine.set_student_flag(&student_id, true).unwrap();

        let issue = engine.issue_book(&student_id, &book_id, 7).unwrap();
        engine.return_book(&issue.id).unwrap();

        // The previous loan is closed, so a new one is allowed again.
        engine.issue_book(&student_id, &book_id, 7).unwrap();
    }

    #[test]
    fn late_return_flags_the_student() {
        let (_tmp, mut engine) = setup();
        let book_id = add_book(&mut engine, 1);
        let student_id = approved_student(&mut engine, "john@example.com");

        let issue = engine.issue_book(&student_id, &book_id, -1).unwrap();
        let receipt = engine.return_book(&issue.id).unwrap();

        assert!(receipt.late);
        assert_eq!(
            receipt.to_string(),
            "Book returned successfully (Late return - Student flagged)"
        );
        assert!(engine.student(&student_id).unwrap().flagged);
    }

    #[test]
    fn flag_is_sticky_until_an_admin_clears_it() {
        let (_tmp, mut engine) = setup();
        let book_id = add_book(&mut engine, 1);
        let student_id = approved_student(&mut engine, "john@example.com");

        let issue = engine.issue_book(&student_id, &book_id, -1).unwrap();
        engine.return_book(&issue.id).unwrap();
        assert!(engine.student(&student_id).unwrap().flagged);

        // An on-time return does not clear the flag.
        let issue = engine.issue_book(&student_id, &book_id, 7).unwrap();
        engine.return_book(&issue.id).unwrap();
        assert!(engine.student(&student_id).unwrap().flagged);

        engine.set_student_flag(&student_id, false).unwrap();
        assert!(!engine.student(&student_id).unwrap().flagged);
    }

    #[test]
    fn double_return_fails_with_already_returned() {
        let (_tmp, mut engine) = setup();
        let book_id = add_book(&mut engine, 1);
        let student_id = approved_student(&mut engine, "john@example.com");

        let issue = engine.issue_book(&student_id, &book_id, 7).unwrap();
        engine.return_book(&issue.id).unwrap();

        let error = engine.return_book(&issue.id).unwrap_err();
        assert!(matches!(error, Error::AlreadyReturned(_)));
        assert_eq!(error.kind(), ErrorKind::InvalidState);

        // The shelf count did not move a second time.
        assert_eq!(engine.book(&book_id).unwrap().available_copies(), 1);
    }

    #[test]
    fn request_then_approve_issues_the_book() {
        let (_tmp, mut engine) = setup();
        let book_id = add_book(&mut engine, 1);
        let student_id = approved_student(&mut engine, "john@example.com");

        let request = engine.request_issue(&student_id, &book_id).unwrap();
        assert!(request.is_pending());
        // Filing the request does not touch the shelf.
        assert_eq!(engine.book(&book_id).unwrap().available_copies(), 1);

        let approved = engine.approve_request(&request.id).unwrap();
        let Approved::Issued(issue) = approved else {
            panic!("expected an issued book");
        };
        assert_eq!(issue.student_id, student_id);
        assert_eq!(engine.book(&book_id).unwrap().available_copies(), 0);

        let stored = &engine.requests().unwrap()[0];
        assert_eq!(stored.status, RequestStatus::Approved);
        assert!(stored.approved_at.is_some());
    }

    #[test]
    fn approve_non_pending_fails_without_mutation() {
        let (_tmp, mut engine) = setup();
        let book_id = add_book(&mut engine, 2);
        let student_id = approved_student(&mut engine, "john@example.com");

        let request = engine.request_issue(&student_id, &book_id).unwrap();
        engine.approve_request(&request.id).unwrap();

        let issues_before = engine.issues().unwrap();
        let copies_before = engine.book(&book_id).unwrap().available_copies();

        let error = engine.approve_request(&request.id).unwrap_err();
        assert!(matches!(error, Error::NotPending(_)));

        assert_eq!(engine.issues().unwrap(), issues_before);
        assert_eq!(
            engine.book(&book_id).unwrap().available_copies(),
            copies_before
        );
    }

    #[test]
    fn approve_unknown_request_is_not_found() {
        let (_tmp, mut engine) = setup();
        let missing: RequestId = "REQ-9".parse().unwrap();
        let error = engine.approve_request(&missing).unwrap_err();
        assert!(matches!(error, Error::RequestNotFound(_)));
    }

    #[test]
    fn request_return_marks_the_issue_and_queues_once() {
        let (_tmp, mut engine) = setup();
        let book_id = add_book(&mut engine, 1);
        let student_id = approved_student(&mut engine, "john@example.com");
        let issue = engine.issue_book(&student_id, &book_id, 7).unwrap();

        let request = engine.request_return(&student_id, &issue.id).unwrap();
        assert_eq!(request.issue_id, Some(issue.id.clone()));
        assert!(engine.issues().unwrap()[0].return_requested);

        let error = engine.request_return(&student_id, &issue.id).unwrap_err();
        assert!(matches!(error, Error::ReturnAlreadyRequested(_)));

        let approved = engine.approve_request(&request.id).unwrap();
        let Approved::Returned(receipt) = approved else {
            panic!("expected a returned book");
        };
        assert!(!receipt.late);
        assert_eq!(engine.book(&book_id).unwrap().available_copies(), 1);
        assert!(!engine.issues().unwrap()[0].return_requested);
    }

    #[test]
    fn request_return_for_another_students_issue_is_not_found() {
        let (_tmp, mut engine) = setup();
        let book_id = add_book(&mut engine, 1);
        let borrower = approved_student(&mut engine, "john@example.com");
        let other = approved_student(&mut engine, "jane@example.com");
        let issue = engine.issue_book(&borrower, &book_id, 7).unwrap();

        let error = engine.request_return(&other, &issue.id).unwrap_err();
        assert!(matches!(error, Error::IssueNotFound(_)));
    }

    #[test]
    fn approval_is_persisted_even_when_dispatch_fails() {
        let (tmp, mut engine) = setup();
        let book_id = add_book(&mut engine, 1);
        let requester = approved_student(&mut engine, "john@example.com");
        let rival = approved_student(&mut engine, "jane@example.com");

        let request = engine.request_issue(&requester, &book_id).unwrap();
        // The last copy goes to someone else before the admin approves.
        engine.issue_book(&rival, &book_id, 7).unwrap();

        let error = engine.approve_request(&request.id).unwrap_err();
        assert!(matches!(error, Error::NoCopiesAvailable { .. }));

        // Durability-first ordering: the approval was written before the
        // dispatch failed, so the request cannot be reprocessed.
        let store = JsonStore::new(tmp.path());
        let stored = &store.load_requests().unwrap()[0];
        assert_eq!(stored.status, RequestStatus::Approved);
    }

    #[test]
    fn return_synthesizes_a_placeholder_for_a_missing_book() {
        let (tmp, mut engine) = setup();
        let student_id = approved_student(&mut engine, "john@example.com");

        let orphan_book: BookId = "BK-042".parse().unwrap();
        let issue = Issue::new(
            "ISS-1".parse().unwrap(),
            student_id,
            orphan_book.clone(),
            Utc::now(),
            7,
        );
        JsonStore::new(tmp.path()).save_issues(&[issue.clone()]).unwrap();

        engine.return_book(&issue.id).unwrap();

        let book = engine.book(&orphan_book).unwrap();
        assert_eq!(book.title, "Book BK-042");
        assert_eq!(book.total_copies(), 1);
        assert_eq!(book.available_copies(), 1);
        assert_copy_invariant(&engine);
    }

    #[test]
    fn missing_due_date_is_judged_against_issue_date_plus_default() {
        let (tmp, mut engine) = setup();
        let book_id = add_book(&mut engine, 1);
        let student_id = approved_student(&mut engine, "john@example.com");

        let mut issue = Issue::new(
            "ISS-1".parse().unwrap(),
            student_id.clone(),
            book_id,
            Utc::now() - Duration::days(10),
            7,
        );
        issue.due_date = None;
        JsonStore::new(tmp.path()).save_issues(&[issue.clone()]).unwrap();

        let receipt = engine.return_book(&issue.id).unwrap();
        assert!(receipt.late);
        assert!(engine.student(&student_id).unwrap().flagged);
    }

    #[test]
    fn issue_with_no_dates_at_all_is_never_late() {
        let (tmp, mut engine) = setup();
        let book_id = add_book(&mut engine, 1);
        let student_id = approved_student(&mut engine, "john@example.com");

        let mut issue = Issue::new(
            "ISS-1".parse().unwrap(),
            student_id.clone(),
            book_id,
            Utc::now(),
            7,
        );
        issue.issue_date = None;
        issue.due_date = None;
        JsonStore::new(tmp.path()).save_issues(&[issue.clone()]).unwrap();

        let receipt = engine.return_book(&issue.id).unwrap();
        assert!(!receipt.late);
        assert!(!engine.student(&student_id).unwrap().flagged);
    }

    #[test]
    fn malformed_return_request_is_rejected_at_dispatch() {
        let (tmp, mut engine) = setup();
        let book_id = add_book(&mut engine, 1);
        let student_id = approved_student(&mut engine, "john@example.com");

        // A return request with no issue reference, written by hand.
        let mut request =
            Request::new_issue("REQ-1".parse().unwrap(), student_id, book_id, Utc::now());
        request.kind = RequestKind::Return;
        JsonStore::new(tmp.path())
            .save_requests(&[request.clone()])
            .unwrap();

        let error = engine.approve_request(&request.id).unwrap_err();
        assert!(matches!(error, Error::MalformedRequest(_)));
    }

    #[test]
    fn ledger_ids_are_sequential() {
        let (_tmp, mut engine) = setup();
        let book_id = add_book(&mut engine, 3);
        let student_id = approved_student(&mut engine, "john@example.com");

        let first = engine.issue_book(&student_id, &book_id, 7).unwrap();
        let second = engine.issue_book(&student_id, &book_id, 7).unwrap();
        assert_eq!(first.id.as_str(), "ISS-1");
        assert_eq!(second.id.as_str(), "ISS-2");
    }

    #[test]
    fn analytics_track_the_lifecycle() {
        let (_tmp, mut engine) = setup();
        let book_id = add_book(&mut engine, 2);
        let student_id = approved_student(&mut engine, "john@example.com");
        engine
            .register_student(
                "Alice Brown".to_string(),
                "alice@example.com".to_string(),
                "123456",
            )
            .unwrap();

        let issue = engine.issue_book(&student_id, &book_id, 7).unwrap();

        let analytics = engine.analytics().unwrap();
        assert_eq!(analytics.total_books, 2);
        assert_eq!(analytics.available_books, 1);
        assert_eq!(analytics.issued_books, 1);
        assert_eq!(analytics.total_students, 2);
        assert_eq!(analytics.approved_students, 1);
        assert_eq!(analytics.pending_students, 1);
        assert_eq!(analytics.currently_issued, 1);

        engine.return_book(&issue.id).unwrap();
        let analytics = engine.analytics().unwrap();
        assert_eq!(analytics.available_books, 2);
        assert_eq!(analytics.currently_issued, 0);
    }
}
