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

//! Test utilities for the business layer.

use crate::db;
use crate::driver::Driver;
use crate::model::testutils::{book, publisher};
use crate::model::{Book, Isbn, Publisher};
use catalog_core::db::repository::Entity;
use catalog_core::db::{Db, Executor};
use std::sync::Arc;

/// State of a running test.
pub(crate) struct TestContext {
    /// The database backing the driver.
    db: Arc<dyn Db + Send + Sync>,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes the driver using an in-memory database.
    pub(crate) async fn setup() -> Self {
        let _can_fail = env_logger::builder().is_test(true).try_init();

        let db: Arc<dyn Db + Send + Sync> =
            Arc::new(catalog_core::db::sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let driver = Driver::new(db.clone());
        Self { db, driver }
    }

    /// Gets a direct executor against the database.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Gets a copy of the driver in this test context.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Stores a publisher with `code` and `name` directly in the database.
    pub(crate) async fn add_publisher(&self, code: &str, name: &str) -> Publisher {
        Publisher::insert(&mut self.ex().await, publisher(code, name)).await.unwrap()
    }

    /// Stores a book with the given mandatory fields directly in the database.
    pub(crate) async fn add_book(
        &self,
        isbn: &str,
        title: &str,
        author: &str,
        publisher: &Publisher,
    ) -> Book {
        Book::insert(&mut self.ex().await, book(isbn, title, author, publisher)).await.unwrap()
    }

    /// Fetches the book with `isbn` directly from the database, if it exists.
    pub(crate) async fn find_book(&self, isbn: &str) -> Option<Book> {
        let isbn = Isbn::new(isbn).unwrap();
        db::find_book_by_isbn(&mut self.ex().await, &isbn).await.unwrap()
    }
}
