// Catalog
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Operations on one book.

use crate::db;
use crate::driver::Driver;
use crate::model::{Book, BookDraft, EntityId, Isbn, Publisher, PublisherCode, Version};
use catalog_core::db::repository::{self, Entity, Saved, UnitOfWork};
use catalog_core::db::{DbError, Executor};
use catalog_core::driver::{DriverError, DriverResult};
use log::debug;

/// Looks up the publisher with `code` that a book being written refers to.
async fn get_referenced_publisher(
    ex: &mut Executor,
    code: &PublisherCode,
) -> DriverResult<Publisher> {
    match db::find_publisher_by_code(ex, code).await? {
        Some(publisher) => Ok(publisher),
        None => Err(DriverError::UnknownReference(format!(
            "Can not create or update book. Publisher with code {} was not found",
            code
        ))),
    }
}

/// Builds the error to return when the book with `isbn` does not exist.
fn book_not_found(isbn: &Isbn) -> DriverError {
    DriverError::NotFound(format!("Book with isbn: '{}' was not found", isbn))
}

impl Driver {
    /// Gets the book identified by `isbn`.
    pub(crate) async fn get_book(self, isbn: &Isbn) -> DriverResult<Book> {
        match db::find_book_by_isbn(&mut self.db.ex().await?, isbn).await? {
            Some(book) => Ok(book),
            None => Err(book_not_found(isbn)),
        }
    }

    /// Gets the publisher of the book identified by `isbn`.
    pub(crate) async fn get_book_publisher(self, isbn: &Isbn) -> DriverResult<Publisher> {
        let book = self.get_book(isbn).await?;
        Ok(book.publisher().clone())
    }

    /// Creates a new book from `draft`.
    ///
    /// Any identifier or version carried by the draft is ignored: new books always get a fresh
    /// identifier and start at the initial version.
    pub(crate) async fn create_book(self, draft: BookDraft) -> DriverResult<Book> {
        let mut tx = self.db.begin().await?;

        let publisher = get_referenced_publisher(tx.ex(), draft.publisher_code()).await?;
        if db::find_book_by_isbn(tx.ex(), draft.isbn()).await?.is_some() {
            return Err(DriverError::AlreadyExists(format!(
                "Book with isbn: '{}' already exists",
                draft.isbn()
            )));
        }

        let book = draft.into_book(EntityId::generate(), Version::initial(), publisher);
        let book = repository::persist(UnitOfWork::join(&mut tx), book).await?;
        tx.commit().await?;

        debug!("Created book with ISBN: {}. Title: {}", book.isbn().formatted(), book.title());
        Ok(book)
    }

    /// Stores the book described by `draft`, updating it if it exists and creating it otherwise.
    ///
    /// The book to update is located by the identifier in the draft or, if there is none, by its
    /// ISBN.  If the draft carries a version, the update only happens if it matches the stored
    /// one; otherwise the update is unconditional.
    pub(crate) async fn put_book(self, draft: BookDraft) -> DriverResult<Saved<Book>> {
        let mut tx = self.db.begin().await?;

        let publisher = get_referenced_publisher(tx.ex(), draft.publisher_code()).await?;
        let current = match draft.id() {
            Some(id) => Book::find(tx.ex(), id).await?,
            None => db::find_book_by_isbn(tx.ex(), draft.isbn()).await?,
        };
        let (id, version) = match current {
            Some(current) => (current.id().clone(), draft.version().unwrap_or(*current.version())),
            None => (draft.id().clone().unwrap_or_else(EntityId::generate), Version::initial()),
        };

        let isbn = draft.isbn().clone();
        let book = draft.into_book(id, version, publisher);
        let saved = match repository::create_or_update(UnitOfWork::join(&mut tx), book).await {
            Ok(saved) => saved,
            Err(DbError::Conflict) => {
                return Err(DriverError::Conflict(format!(
                    "Book with isbn: '{}' was modified by someone else",
                    isbn
                )));
            }
            Err(DbError::AlreadyExists) => {
                return Err(DriverError::AlreadyExists(format!(
                    "Book with isbn: '{}' already exists",
                    isbn
                )));
            }
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;

        match &saved {
            Saved::Created(book) => debug!("Created book with ISBN: {}", book.isbn()),
            Saved::Updated(book) => debug!("Updated book with ISBN: {}", book.isbn()),
        }
        Ok(saved)
    }

    /// Deletes the book identified by `isbn`.  Deleting a book that does not exist succeeds.
    pub(crate) async fn delete_book(self, isbn: &Isbn) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;
        if let Some(book) = db::find_book_by_isbn(tx.ex(), isbn).await? {
            repository::remove::<Book>(UnitOfWork::join(&mut tx), book.id()).await?;
            debug!("Book with isbn: '{}' deleted", isbn);
        }
        tx.commit().await?;
        Ok(())
    }
}
