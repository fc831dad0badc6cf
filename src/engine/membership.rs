//! Membership administration: registration, approval, and flags.

use super::{Engine, Error};
use crate::{
    domain::{Student, StudentId},
    storage::Store,
};

impl<S: Store> Engine<S> {
    /// Registers a new student account.
    ///
    /// The account starts unapproved and cannot borrow until an admin
    /// approves it. Emails are unique across the membership.
    ///
    /// # Errors
    ///
    /// Fails when the email is already registered or the store cannot be
    /// read or written.
    pub fn register_student(
        &mut self,
        name: String,
        email: String,
        password: &str,
    ) -> Result<Student, Error> {
        let mut students = self.store.load_students()?;
        if students
            .iter()
            .any(|s| s.email.eq_ignore_ascii_case(&email))
        {
            return Err(Error::EmailTaken(email));
        }

        let student = Student::new(name, email, password);
        students.push(student.clone());
        self.store.save_students(&students)?;
        Ok(student)
    }

    /// Approves a pending student account.
    ///
    /// # Errors
    ///
    /// Fails when the student does not exist, is already approved, or the
    /// store cannot be read or written.
    pub fn approve_student(&mut self, id: &StudentId) -> Result<Student, Error> {
        self.with_student(id, |student| {
            if student.approved {
                return Err(Error::AlreadyApproved(id.clone()));
            }
            student.approved = true;
            Ok(())
        })
    }

    /// Revokes a student's approval, blocking further borrowing.
    ///
    /// Active loans are unaffected; the student just cannot take out more.
    ///
    /// # Errors
    ///
    /// Fails when the student does not exist or the store cannot be read or
    /// written.
    pub fn block_student(&mut self, id: &StudentId) -> Result<Student, Error> {
        self.with_student(id, |student| {
            student.approved = false;
            Ok(())
        })
    }

    /// Sets or clears a student's late-return flag.
    ///
    /// The flag is otherwise sticky: late returns set it, and nothing but
    /// this operation clears it.
    ///
    /// # Errors
    ///
    /// Fails when the student does not exist or the store cannot be read or
    /// written.
    pub fn set_student_flag(&mut self, id: &StudentId, flagged: bool) -> Result<Student, Error> {
        self.with_student(id, |student| {
            student.flagged = flagged;
            Ok(())
        })
    }

    fn with_student(
        &mut self,
        id: &StudentId,
        mutate: impl FnOnce(&mut Student) -> Result<(), Error>,
    ) -> Result<Student, Error> {
        let mut students = self.store.load_students()?;
        let student = students
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| Error::StudentNotFound(id.clone()))?;
        mutate(student)?;
        let updated = student.clone();
        self.store.save_students(&students)?;
        Ok(updated)
    }
}
