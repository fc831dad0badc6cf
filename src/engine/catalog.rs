//! Catalogue maintenance: adding, editing, and removing titles.

use super::{Engine, Error};
use crate::{
    domain::{Book, BookId},
    storage::Store,
};

impl<S: Store> Engine<S> {
    /// Adds a new title to the catalogue.
    ///
    /// The id is allocated one past the highest in use, so a deleted book's
    /// id is never handed out again. A copy count of zero is bumped to one.
    ///
    /// # Errors
    ///
    /// Fails when the store cannot be read or written.
    pub fn add_book(
        &mut self,
        title: String,
        author: String,
        genre: String,
        copies: u32,
    ) -> Result<Book, Error> {
        let mut books = self.store.load_books()?;
        let id = BookId::next(books.iter().map(|b| &b.id), self.config.digits());
        let book = Book::new(id, title, author, genre, copies);
        books.push(book.clone());
        self.store.save_books(&books)?;
        Ok(book)
    }

    /// Rewrites a title's details and copy counts.
    ///
    /// `available_copies` is clamped to the new total and the availability
    /// flag re-derived, so the edit cannot leave the record inconsistent.
    ///
    /// # Errors
    ///
    /// Fails when the book does not exist or the store cannot be read or
    /// written.
    pub fn update_book(
        &mut self,
        id: &BookId,
        title: String,
        author: String,
        genre: String,
        total_copies: u32,
        available_copies: u32,
    ) -> Result<Book, Error> {
        let mut books = self.store.load_books()?;
        let book = books
            .iter_mut()
            .find(|b| &b.id == id)
            .ok_or_else(|| Error::BookNotFound(id.clone()))?;
        book.update(title, author, genre, total_copies, available_copies);
        let updated = book.clone();
        self.store.save_books(&books)?;
        Ok(updated)
    }

    /// Removes a title from the catalogue.
    ///
    /// Refused while any copy is still out: the ledger must never reference
    /// a book that no longer exists.
    ///
    /// # Errors
    ///
    /// Fails when the book does not exist, still has active issues, or the
    /// store cannot be read or written.
    pub fn delete_book(&mut self, id: &BookId) -> Result<(), Error> {
        let issues = self.store.load_issues()?;
        if issues.iter().any(|i| i.is_active() && &i.book_id == id) {
            return Err(Error::BookHasActiveIssues(id.clone()));
        }

        let mut books = self.store.load_books()?;
        let before = books.len();
        books.retain(|b| &b.id != id);
        if books.len() == before {
            return Err(Error::BookNotFound(id.clone()));
        }
        self.store.save_books(&books)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::{TempDir, tempdir};

    use super::*;
    use crate::{domain::Config, storage::JsonStore};

    fn setup() -> (TempDir, Engine<JsonStore>) {
        let tmp = tempdir().unwrap();
        let engine = Engine::new(JsonStore::new(tmp.path()), Config::default());
        (tmp, engine)
    }

    fn add(engine: &mut Engine<JsonStore>, title: &str) -> Book {
        engine
            .add_book(
                title.to_string(),
                "George Orwell".to_string(),
                "Science Fiction".to_string(),
                2,
            )
            .unwrap()
    }

    #[test]
    fn added_books_get_padded_sequential_ids() {
        let (_tmp, mut engine) = setup();
        assert_eq!(add(&mut engine, "1984").id.as_str(), "BK-001");
        assert_eq!(add(&mut engine, "Animal Farm").id.as_str(), "BK-002");
    }

    #[test]
    fn deleted_ids_are_never_reissued() {
        let (_tmp, mut engine) = setup();
        add(&mut engine, "1984");
        let second = add(&mut engine, "Animal Farm");
        engine.delete_book(&second.id).unwrap();

        assert_eq!(add(&mut engine, "The Hobbit").id.as_str(), "BK-003");
    }

    #[test]
    fn update_clamps_available_to_total() {
        let (_tmp, mut engine) = setup();
        let book = add(&mut engine, "1984");

        let updated = engine
            .update_book(
                &book.id,
                "Nineteen Eighty-Four".to_string(),
                "George Orwell".to_string(),
                "Dystopia".to_string(),
                3,
                9,
            )
            .unwrap();
        assert_eq!(updated.title, "Nineteen Eighty-Four");
        assert_eq!(updated.total_copies(), 3);
        assert_eq!(updated.available_copies(), 3);

        let updated = engine
            .update_book(
                &book.id,
                "Nineteen Eighty-Four".to_string(),
                "George Orwell".to_string(),
                "Dystopia".to_string(),
                3,
                0,
            )
            .unwrap();
        assert!(!updated.is_available());
    }

    #[test]
    fn update_missing_book_is_not_found() {
        let (_tmp, mut engine) = setup();
        let missing: BookId = "BK-099".parse().unwrap();
        let error = engine
            .update_book(
                &missing,
                "x".to_string(),
                "y".to_string(),
                "z".to_string(),
                1,
                1,
            )
            .unwrap_err();
        assert!(matches!(error, Error::BookNotFound(_)));
    }

    #[test]
    fn delete_refused_while_a_copy_is_out() {
        let (_tmp, mut engine) = setup();
        let book = add(&mut engine, "1984");
        let student = engine
            .register_student(
                "John Doe".to_string(),
                "john@example.com".to_string(),
                "123456",
            )
            .unwrap();
        engine.approve_student(&student.id).unwrap();
        let issue = engine.issue_book(&student.id, &book.id, 7).unwrap();

        let error = engine.delete_book(&book.id).unwrap_err();
        assert!(matches!(error, Error::BookHasActiveIssues(_)));

        // Once every copy is back the delete goes through.
        engine.return_book(&issue.id).unwrap();
        engine.delete_book(&book.id).unwrap();
        assert!(engine.books().unwrap().is_empty());
    }

    #[test]
    fn delete_missing_book_is_not_found() {
        let (_tmp, mut engine) = setup();
        let missing: BookId = "BK-099".parse().unwrap();
        let error = engine.delete_book(&missing).unwrap_err();
        assert!(matches!(error, Error::BookNotFound(_)));
    }
}
