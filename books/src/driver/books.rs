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

//! Operations on the collection of books.

use crate::db;
use crate::driver::Driver;
use crate::model::{Book, Page, SearchType};
use catalog_core::driver::DriverResult;
use catalog_core::model::blank_to_none;
use log::debug;

impl Driver {
    /// Gets the `page` of books that match `value` in the fields selected by `search_type`.
    ///
    /// A missing or blank `value` matches all books.
    pub(crate) async fn search_books(
        self,
        search_type: SearchType,
        value: Option<String>,
        page: Page,
    ) -> DriverResult<Vec<Book>> {
        let value = blank_to_none(value);
        let books =
            db::search_books(&mut self.db.ex().await?, search_type, value.as_deref(), page).await?;
        debug!(
            "Search by {} for {:?} at offset {} returned {} books",
            search_type,
            value,
            page.offset(),
            books.len()
        );
        Ok(books)
    }

    /// Counts the number of stored books.
    pub(crate) async fn count_books(self) -> DriverResult<i64> {
        let count = db::count_books(&mut self.db.ex().await?).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;

    /// Returns the ISBNs of `books` in order.
    fn isbns(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.isbn().as_str()).collect()
    }

    #[tokio::test]
    async fn test_search_books_none() {
        let context = TestContext::setup().await;

        let books =
            context.driver().search_books(SearchType::Any, None, Page::default()).await.unwrap();
        assert!(books.is_empty());
    }

    #[tokio::test]
    async fn test_search_books_blank_value_matches_all() {
        let context = TestContext::setup().await;
        let pub1 = context.add_publisher("82021", "Cappelen").await;
        context.add_book("9788202148683", "Fisken", "Loe, Erlend", &pub1).await;
        context.add_book("9788202244699", "Rumpemelk fra Afrika", "Loe, Erlend", &pub1).await;

        let books = context
            .driver()
            .search_books(SearchType::Title, Some("   ".to_owned()), Page::default())
            .await
            .unwrap();
        assert_eq!(vec!["9788202148683", "9788202244699"], isbns(&books));
    }

    #[tokio::test]
    async fn test_search_books_by_author_ordered_and_paged() {
        let context = TestContext::setup().await;
        let pub1 = context.add_publisher("82022", "Cappelen Damm").await;
        context.add_book("9788202425975", "Doppler", "Loe, Erlend", &pub1).await;
        context.add_book("9788202365387", "Fonk", "Loe, Erlend", &pub1).await;
        context.add_book("9788202426378", "Naiv. Super", "Loe, Erlend", &pub1).await;
        context.add_book("9780241971987", "Little Failure", "Shteyngart, Gary", &pub1).await;

        let books = context
            .driver()
            .search_books(SearchType::Author, Some("LOE".to_owned()), Page::new(Some(1), Some(2)))
            .await
            .unwrap();
        assert_eq!(vec!["9788202425975", "9788202426378"], isbns(&books));
    }

    #[tokio::test]
    async fn test_count_books() {
        let context = TestContext::setup().await;
        assert_eq!(0, context.driver().count_books().await.unwrap());

        let pub1 = context.add_publisher("14472", "Picador").await;
        context.add_book("9781447268970", "Station Eleven", "St. John Mandel, Emily", &pub1).await;
        context.add_book("9781447279402", "The Guest Cat", "Hiraide, Takashi", &pub1).await;
        assert_eq!(2, context.driver().count_books().await.unwrap());
    }
}
