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

//! Database abstraction in terms of the operations needed by the server.

use crate::model::{Book, EntityId, Isbn, Page, Publisher, PublisherCode, SearchType, Version};
use async_trait::async_trait;
use catalog_core::db::postgres;
use catalog_core::db::repository::{Entity, Identifiable};
use catalog_core::db::sqlite;
use catalog_core::db::{DbError, DbResult, Executor};
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use time::Date;

mod query;
use query::{build_search, fold_case, Dialect, BOOK_COLUMNS, BOOK_TABLES};

/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,
    }
}

/// Typed access to the columns of a result row, regardless of the backend that produced it.
trait RowExt {
    /// Gets the non-null text value of `column`.
    fn text(&self, column: &str) -> DbResult<String>;

    /// Gets the nullable text value of `column`.
    fn opt_text(&self, column: &str) -> DbResult<Option<String>>;

    /// Gets the non-null integer value of `column`.
    fn int(&self, column: &str) -> DbResult<i64>;

    /// Gets the nullable date value of `column`.
    fn opt_date(&self, column: &str) -> DbResult<Option<Date>>;
}

/// Implements `RowExt` for a backend's `$row` type using its `$map_err` error mapper.
macro_rules! impl_row_ext [
    ( $row:ty, $map_err:path ) => {
        impl RowExt for $row {
            fn text(&self, column: &str) -> DbResult<String> {
                self.try_get(column).map_err($map_err)
            }

            fn opt_text(&self, column: &str) -> DbResult<Option<String>> {
                self.try_get(column).map_err($map_err)
            }

            fn int(&self, column: &str) -> DbResult<i64> {
                self.try_get(column).map_err($map_err)
            }

            fn opt_date(&self, column: &str) -> DbResult<Option<Date>> {
                self.try_get(column).map_err($map_err)
            }
        }
    }
];

impl_row_ext!(PgRow, postgres::map_sqlx_error);
impl_row_ext!(SqliteRow, sqlite::map_sqlx_error);

/// Names of the columns that hold the fields of a publisher in a result row.
struct PublisherColumns {
    /// Column with the primary key.
    id: &'static str,

    /// Column with the version.
    version: &'static str,

    /// Column with the code.
    code: &'static str,

    /// Column with the name.
    name: &'static str,
}

/// Columns of a publisher when querying the `publishers` table directly.
const PUBLISHER_COLUMNS: PublisherColumns =
    PublisherColumns { id: "id", version: "version", code: "code", name: "name" };

/// Columns of a publisher when querying books joined with their publishers.
const JOINED_PUBLISHER_COLUMNS: PublisherColumns = PublisherColumns {
    id: "publisher_id",
    version: "publisher_version",
    code: "publisher_code",
    name: "publisher_name",
};

/// Decodes a publisher from the `columns` of `row`.
fn publisher_from_row<R: RowExt>(row: &R, columns: &PublisherColumns) -> DbResult<Publisher> {
    let id = EntityId::new(row.text(columns.id)?)?;
    let version = Version::new(row.int(columns.version)?)?;
    let code = PublisherCode::new(row.text(columns.code)?)?;
    Ok(Publisher::new(id, version, code, row.text(columns.name)?)?)
}

/// Decodes a book and its publisher from a `row` fetched with `BOOK_COLUMNS`.
fn book_from_row<R: RowExt>(row: &R) -> DbResult<Book> {
    let publisher = publisher_from_row(row, &JOINED_PUBLISHER_COLUMNS)?;
    let book = Book::new(
        EntityId::new(row.text("id")?)?,
        Version::new(row.int("version")?)?,
        Isbn::new(row.text("isbn")?)?,
        row.text("title")?,
        row.text("author")?,
        publisher,
    )?
    .with_published(row.opt_date("published")?)
    .with_translator(row.opt_text("translator")?)
    .with_summary(row.opt_text("summary")?);
    Ok(book)
}

/// Converts the result of an `UPDATE` that touched `rows_affected` rows of `table` for the entity
/// with primary key `id` into an error if the update did not happen.
async fn check_updated(
    ex: &mut Executor,
    table: &'static str,
    id: &EntityId,
    rows_affected: u64,
) -> DbResult<()> {
    match rows_affected {
        1 => Ok(()),
        0 => {
            let query_str = format!("SELECT COUNT(*) AS count FROM {} WHERE id = $1", table);
            let count: i64 = match ex {
                Executor::Postgres(ex) => {
                    let row = sqlx::query(&query_str)
                        .bind(id.as_str())
                        .fetch_one(&mut **ex)
                        .await
                        .map_err(postgres::map_sqlx_error)?;
                    row.int("count")?
                }
                Executor::Sqlite(ex) => {
                    let row = sqlx::query(&query_str)
                        .bind(id.as_str())
                        .fetch_one(&mut **ex)
                        .await
                        .map_err(sqlite::map_sqlx_error)?;
                    row.int("count")?
                }
            };
            if count == 0 {
                Err(DbError::NotFound)
            } else {
                Err(DbError::Conflict)
            }
        }
        n => Err(DbError::BackendError(format!("Update affected {} rows instead of 1", n))),
    }
}

/// Runs a `query_str` that returns a single `count` column and returns its value.
async fn count(ex: &mut Executor, query_str: &str) -> DbResult<i64> {
    match ex {
        Executor::Postgres(ex) => {
            let row = sqlx::query(query_str)
                .fetch_one(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.int("count")
        }
        Executor::Sqlite(ex) => {
            let row = sqlx::query(query_str)
                .fetch_one(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.int("count")
        }
    }
}

impl Identifiable for Publisher {
    type Id = EntityId;

    fn id(&self) -> &EntityId {
        self.id()
    }
}

#[async_trait]
impl Entity for Publisher {
    async fn find(ex: &mut Executor, id: &EntityId) -> DbResult<Option<Self>> {
        match ex {
            Executor::Postgres(ex) => {
                let query_str = "SELECT id, version, code, name FROM publishers WHERE id = $1";
                let row = sqlx::query(query_str)
                    .bind(id.as_str())
                    .fetch_optional(&mut **ex)
                    .await
                    .map_err(postgres::map_sqlx_error)?;
                row.map(|row| publisher_from_row(&row, &PUBLISHER_COLUMNS)).transpose()
            }
            Executor::Sqlite(ex) => {
                let query_str = "SELECT id, version, code, name FROM publishers WHERE id = ?";
                let row = sqlx::query(query_str)
                    .bind(id.as_str())
                    .fetch_optional(&mut **ex)
                    .await
                    .map_err(sqlite::map_sqlx_error)?;
                row.map(|row| publisher_from_row(&row, &PUBLISHER_COLUMNS)).transpose()
            }
        }
    }

    async fn insert(ex: &mut Executor, publisher: Self) -> DbResult<Self> {
        match ex {
            Executor::Postgres(ex) => {
                let query_str = "INSERT INTO publishers (id, version, code, name, name_folded)
                    VALUES ($1, $2, $3, $4, $5)";
                sqlx::query(query_str)
                    .bind(publisher.id().as_str())
                    .bind(publisher.version().as_i64())
                    .bind(publisher.code().as_str())
                    .bind(publisher.name())
                    .bind(fold_case(publisher.name()))
                    .execute(&mut **ex)
                    .await
                    .map_err(postgres::map_sqlx_error)?;
            }
            Executor::Sqlite(ex) => {
                let query_str = "INSERT INTO publishers (id, version, code, name, name_folded)
                    VALUES (?, ?, ?, ?, ?)";
                sqlx::query(query_str)
                    .bind(publisher.id().as_str())
                    .bind(publisher.version().as_i64())
                    .bind(publisher.code().as_str())
                    .bind(publisher.name())
                    .bind(fold_case(publisher.name()))
                    .execute(&mut **ex)
                    .await
                    .map_err(sqlite::map_sqlx_error)?;
            }
        }
        Ok(publisher)
    }

    async fn update(ex: &mut Executor, publisher: Self) -> DbResult<Self> {
        let rows_affected = match &mut *ex {
            Executor::Postgres(ex) => {
                let query_str = "UPDATE publishers
                    SET code = $1, name = $2, name_folded = $3, version = version + 1
                    WHERE id = $4 AND version = $5";
                let done = sqlx::query(query_str)
                    .bind(publisher.code().as_str())
                    .bind(publisher.name())
                    .bind(fold_case(publisher.name()))
                    .bind(publisher.id().as_str())
                    .bind(publisher.version().as_i64())
                    .execute(&mut **ex)
                    .await
                    .map_err(postgres::map_sqlx_error)?;
                done.rows_affected()
            }
            Executor::Sqlite(ex) => {
                let query_str = "UPDATE publishers
                    SET code = ?, name = ?, name_folded = ?, version = version + 1
                    WHERE id = ? AND version = ?";
                let done = sqlx::query(query_str)
                    .bind(publisher.code().as_str())
                    .bind(publisher.name())
                    .bind(fold_case(publisher.name()))
                    .bind(publisher.id().as_str())
                    .bind(publisher.version().as_i64())
                    .execute(&mut **ex)
                    .await
                    .map_err(sqlite::map_sqlx_error)?;
                done.rows_affected()
            }
        };
        check_updated(ex, "publishers", publisher.id(), rows_affected).await?;
        let version = publisher.version().next();
        Ok(publisher.with_version(version))
    }

    async fn delete(ex: &mut Executor, id: &EntityId) -> DbResult<bool> {
        let rows_affected = match ex {
            Executor::Postgres(ex) => {
                sqlx::query("DELETE FROM publishers WHERE id = $1")
                    .bind(id.as_str())
                    .execute(&mut **ex)
                    .await
                    .map_err(postgres::map_sqlx_error)?
                    .rows_affected()
            }
            Executor::Sqlite(ex) => {
                sqlx::query("DELETE FROM publishers WHERE id = ?")
                    .bind(id.as_str())
                    .execute(&mut **ex)
                    .await
                    .map_err(sqlite::map_sqlx_error)?
                    .rows_affected()
            }
        };
        Ok(rows_affected > 0)
    }
}

/// Gets the publisher identified by `code`, if it exists.
pub(crate) async fn find_publisher_by_code(
    ex: &mut Executor,
    code: &PublisherCode,
) -> DbResult<Option<Publisher>> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "SELECT id, version, code, name FROM publishers WHERE code = $1";
            let row = sqlx::query(query_str)
                .bind(code.as_str())
                .fetch_optional(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.map(|row| publisher_from_row(&row, &PUBLISHER_COLUMNS)).transpose()
        }
        Executor::Sqlite(ex) => {
            let query_str = "SELECT id, version, code, name FROM publishers WHERE code = ?";
            let row = sqlx::query(query_str)
                .bind(code.as_str())
                .fetch_optional(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.map(|row| publisher_from_row(&row, &PUBLISHER_COLUMNS)).transpose()
        }
    }
}

/// Gets a `page` of publishers ordered by their code.  If `name_prefix` is present, only returns
/// publishers whose name starts with it, ignoring case.
pub(crate) async fn get_publishers(
    ex: &mut Executor,
    name_prefix: Option<&str>,
    page: Page,
) -> DbResult<Vec<Publisher>> {
    let pattern = name_prefix.map(|prefix| format!("{}%", fold_case(prefix)));
    let rows = match ex {
        Executor::Postgres(ex) => {
            let query = match pattern.as_ref() {
                Some(pattern) => sqlx::query(
                    "SELECT id, version, code, name FROM publishers WHERE name_folded LIKE $1
                    ORDER BY code LIMIT $2 OFFSET $3",
                )
                .bind(pattern),
                None => sqlx::query(
                    "SELECT id, version, code, name FROM publishers
                    ORDER BY code LIMIT $1 OFFSET $2",
                ),
            };
            let rows = query
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.iter()
                .map(|row| publisher_from_row(row, &PUBLISHER_COLUMNS))
                .collect::<DbResult<Vec<Publisher>>>()?
        }
        Executor::Sqlite(ex) => {
            let query = match pattern.as_ref() {
                Some(pattern) => sqlx::query(
                    "SELECT id, version, code, name FROM publishers WHERE name_folded LIKE ?
                    ORDER BY code LIMIT ? OFFSET ?",
                )
                .bind(pattern),
                None => sqlx::query(
                    "SELECT id, version, code, name FROM publishers
                    ORDER BY code LIMIT ? OFFSET ?",
                ),
            };
            let rows = query
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            rows.iter()
                .map(|row| publisher_from_row(row, &PUBLISHER_COLUMNS))
                .collect::<DbResult<Vec<Publisher>>>()?
        }
    };
    Ok(rows)
}

/// Counts the number of publishers.
pub(crate) async fn count_publishers(ex: &mut Executor) -> DbResult<i64> {
    count(ex, "SELECT COUNT(*) AS count FROM publishers").await
}

impl Identifiable for Book {
    type Id = EntityId;

    fn id(&self) -> &EntityId {
        self.id()
    }
}

#[async_trait]
impl Entity for Book {
    async fn find(ex: &mut Executor, id: &EntityId) -> DbResult<Option<Self>> {
        match ex {
            Executor::Postgres(ex) => {
                let query_str =
                    format!("SELECT {} FROM {} WHERE b.id = $1", BOOK_COLUMNS, BOOK_TABLES);
                let row = sqlx::query(&query_str)
                    .bind(id.as_str())
                    .fetch_optional(&mut **ex)
                    .await
                    .map_err(postgres::map_sqlx_error)?;
                row.map(|row| book_from_row(&row)).transpose()
            }
            Executor::Sqlite(ex) => {
                let query_str =
                    format!("SELECT {} FROM {} WHERE b.id = ?", BOOK_COLUMNS, BOOK_TABLES);
                let row = sqlx::query(&query_str)
                    .bind(id.as_str())
                    .fetch_optional(&mut **ex)
                    .await
                    .map_err(sqlite::map_sqlx_error)?;
                row.map(|row| book_from_row(&row)).transpose()
            }
        }
    }

    async fn insert(ex: &mut Executor, book: Self) -> DbResult<Self> {
        match ex {
            Executor::Postgres(ex) => {
                let query_str = "INSERT INTO books
                    (id, version, isbn, title, author, published, translator, summary,
                        title_folded, author_folded, summary_folded, publisher_id)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)";
                sqlx::query(query_str)
                    .bind(book.id().as_str())
                    .bind(book.version().as_i64())
                    .bind(book.isbn().as_str())
                    .bind(book.title())
                    .bind(book.author())
                    .bind(*book.published())
                    .bind(book.translator().as_deref())
                    .bind(book.summary().as_deref())
                    .bind(fold_case(book.title()))
                    .bind(fold_case(book.author()))
                    .bind(book.summary().as_deref().map(fold_case))
                    .bind(book.publisher().id().as_str())
                    .execute(&mut **ex)
                    .await
                    .map_err(postgres::map_sqlx_error)?;
            }
            Executor::Sqlite(ex) => {
                let query_str = "INSERT INTO books
                    (id, version, isbn, title, author, published, translator, summary,
                        title_folded, author_folded, summary_folded, publisher_id)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
                sqlx::query(query_str)
                    .bind(book.id().as_str())
                    .bind(book.version().as_i64())
                    .bind(book.isbn().as_str())
                    .bind(book.title())
                    .bind(book.author())
                    .bind(*book.published())
                    .bind(book.translator().as_deref())
                    .bind(book.summary().as_deref())
                    .bind(fold_case(book.title()))
                    .bind(fold_case(book.author()))
                    .bind(book.summary().as_deref().map(fold_case))
                    .bind(book.publisher().id().as_str())
                    .execute(&mut **ex)
                    .await
                    .map_err(sqlite::map_sqlx_error)?;
            }
        }
        Ok(book)
    }

    async fn update(ex: &mut Executor, book: Self) -> DbResult<Self> {
        let rows_affected = match &mut *ex {
            Executor::Postgres(ex) => {
                let query_str = "UPDATE books
                    SET isbn = $1, title = $2, author = $3, published = $4, translator = $5,
                        summary = $6, title_folded = $7, author_folded = $8, summary_folded = $9,
                        publisher_id = $10, version = version + 1
                    WHERE id = $11 AND version = $12";
                let done = sqlx::query(query_str)
                    .bind(book.isbn().as_str())
                    .bind(book.title())
                    .bind(book.author())
                    .bind(*book.published())
                    .bind(book.translator().as_deref())
                    .bind(book.summary().as_deref())
                    .bind(fold_case(book.title()))
                    .bind(fold_case(book.author()))
                    .bind(book.summary().as_deref().map(fold_case))
                    .bind(book.publisher().id().as_str())
                    .bind(book.id().as_str())
                    .bind(book.version().as_i64())
                    .execute(&mut **ex)
                    .await
                    .map_err(postgres::map_sqlx_error)?;
                done.rows_affected()
            }
            Executor::Sqlite(ex) => {
                let query_str = "UPDATE books
                    SET isbn = ?, title = ?, author = ?, published = ?, translator = ?,
                        summary = ?, title_folded = ?, author_folded = ?, summary_folded = ?,
                        publisher_id = ?, version = version + 1
                    WHERE id = ? AND version = ?";
                let done = sqlx::query(query_str)
                    .bind(book.isbn().as_str())
                    .bind(book.title())
                    .bind(book.author())
                    .bind(*book.published())
                    .bind(book.translator().as_deref())
                    .bind(book.summary().as_deref())
                    .bind(fold_case(book.title()))
                    .bind(fold_case(book.author()))
                    .bind(book.summary().as_deref().map(fold_case))
                    .bind(book.publisher().id().as_str())
                    .bind(book.id().as_str())
                    .bind(book.version().as_i64())
                    .execute(&mut **ex)
                    .await
                    .map_err(sqlite::map_sqlx_error)?;
                done.rows_affected()
            }
        };
        check_updated(ex, "books", book.id(), rows_affected).await?;
        let version = book.version().next();
        Ok(book.with_version(version))
    }

    async fn delete(ex: &mut Executor, id: &EntityId) -> DbResult<bool> {
        let rows_affected = match ex {
            Executor::Postgres(ex) => {
                sqlx::query("DELETE FROM books WHERE id = $1")
                    .bind(id.as_str())
                    .execute(&mut **ex)
                    .await
                    .map_err(postgres::map_sqlx_error)?
                    .rows_affected()
            }
            Executor::Sqlite(ex) => {
                sqlx::query("DELETE FROM books WHERE id = ?")
                    .bind(id.as_str())
                    .execute(&mut **ex)
                    .await
                    .map_err(sqlite::map_sqlx_error)?
                    .rows_affected()
            }
        };
        Ok(rows_affected > 0)
    }
}

/// Gets the book identified by `isbn`, if it exists.
pub(crate) async fn find_book_by_isbn(ex: &mut Executor, isbn: &Isbn) -> DbResult<Option<Book>> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str =
                format!("SELECT {} FROM {} WHERE b.isbn = $1", BOOK_COLUMNS, BOOK_TABLES);
            let row = sqlx::query(&query_str)
                .bind(isbn.as_str())
                .fetch_optional(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.map(|row| book_from_row(&row)).transpose()
        }
        Executor::Sqlite(ex) => {
            let query_str =
                format!("SELECT {} FROM {} WHERE b.isbn = ?", BOOK_COLUMNS, BOOK_TABLES);
            let row = sqlx::query(&query_str)
                .bind(isbn.as_str())
                .fetch_optional(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.map(|row| book_from_row(&row)).transpose()
        }
    }
}

/// Gets the `page` of books that match `value` in the fields selected by `search_type`.
pub(crate) async fn search_books(
    ex: &mut Executor,
    search_type: SearchType,
    value: Option<&str>,
    page: Page,
) -> DbResult<Vec<Book>> {
    match ex {
        Executor::Postgres(ex) => {
            let search = build_search(Dialect::Postgres, search_type, value, page);
            let mut query = sqlx::query(&search.sql);
            if let Some(pattern) = search.pattern.as_ref() {
                query = query.bind(pattern);
            }
            let rows = query
                .bind(search.limit)
                .bind(search.offset)
                .fetch_all(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.iter().map(book_from_row).collect()
        }
        Executor::Sqlite(ex) => {
            let search = build_search(Dialect::Sqlite, search_type, value, page);
            let mut query = sqlx::query(&search.sql);
            if let Some(pattern) = search.pattern.as_ref() {
                query = query.bind(pattern);
            }
            let rows = query
                .bind(search.limit)
                .bind(search.offset)
                .fetch_all(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            rows.iter().map(book_from_row).collect()
        }
    }
}

/// Counts the number of books.
pub(crate) async fn count_books(ex: &mut Executor) -> DbResult<i64> {
    count(ex, "SELECT COUNT(*) AS count FROM books").await
}
