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

//! Composition of the dynamic SQL used to search for books.

use crate::model::{Page, SearchType};

/// Columns to fetch for every book, joined with those of its publisher.
pub(super) const BOOK_COLUMNS: &str = "
    b.id, b.version, b.isbn, b.title, b.author, b.published, b.translator, b.summary,
    p.id AS publisher_id, p.version AS publisher_version,
    p.code AS publisher_code, p.name AS publisher_name";

/// Tables to fetch books from, joined with their publishers.
pub(super) const BOOK_TABLES: &str = "books b JOIN publishers p ON p.id = b.publisher_id";

/// SQL flavors supported by the query builder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum Dialect {
    /// PostgreSQL, which uses `$n` placeholders.
    Postgres,

    /// SQLite, which uses `?n` placeholders.
    Sqlite,
}

impl Dialect {
    /// Returns the placeholder for the 1-based parameter `n`.
    fn placeholder(self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", n),
            Dialect::Sqlite => format!("?{}", n),
        }
    }
}

/// Folds `s` to the form stored in the `*_folded` columns and used to build search patterns.
///
/// Folding happens in Rust rather than with `LOWER` so that both databases compare text the same
/// way: SQLite's `LOWER` and `LIKE` only fold ASCII letters.
pub(super) fn fold_case(s: &str) -> String {
    s.to_lowercase()
}

/// Returns the column that a specific search type matches against, or `None` for `Any`.
///
/// Text columns are matched through their folded shadows.  ISBNs and publisher codes only hold
/// digits, so they are matched as is.
fn match_column(search_type: SearchType) -> Option<&'static str> {
    match search_type {
        SearchType::Any => None,
        SearchType::Isbn => Some("b.isbn"),
        SearchType::Title => Some("b.title_folded"),
        SearchType::Author => Some("b.author_folded"),
        SearchType::Summary => Some("b.summary_folded"),
        SearchType::PublisherCode => Some("p.code"),
        SearchType::PublisherName => Some("p.name_folded"),
    }
}

/// Returns the column that results of a specific search type are sorted by, or `None` for `Any`.
fn order_column(search_type: SearchType) -> Option<&'static str> {
    match search_type {
        SearchType::Any => None,
        SearchType::Isbn => Some("b.isbn"),
        SearchType::Title => Some("b.title"),
        SearchType::Author => Some("b.author"),
        SearchType::Summary => Some("b.summary"),
        SearchType::PublisherCode => Some("p.code"),
        SearchType::PublisherName => Some("p.name"),
    }
}

/// A search query ready to be executed.
///
/// Parameters must be bound in this order: the `pattern`, if present, followed by the `limit` and
/// the `offset` of the page.
#[derive(Debug, PartialEq)]
pub(super) struct SearchQuery {
    /// The SQL statement with numbered placeholders.
    pub(super) sql: String,

    /// The case-insensitive substring pattern to bind, if the search has a value.
    pub(super) pattern: Option<String>,

    /// Maximum number of rows to return.
    pub(super) limit: i64,

    /// Number of rows to skip.
    pub(super) offset: i64,
}

/// Builds the query to find books that match `value` in the fields selected by `search_type`.
///
/// Matching is a case-insensitive substring comparison.  `Any` matches a book if any of its
/// searchable fields match.  An absent `value` matches all books.  Results are ordered by the
/// selected field with the ISBN as the tie-breaker, except for `Any`, which imposes no order.
///
/// Because `Any` has no `ORDER BY`, paging through its results is only stable as long as the
/// database returns rows in the same order on every call.  SQLite does for an unchanged table but
/// PostgreSQL gives no such guarantee, so consecutive pages may overlap or skip books there.
pub(super) fn build_search(
    dialect: Dialect,
    search_type: SearchType,
    value: Option<&str>,
    page: Page,
) -> SearchQuery {
    let mut sql = format!("SELECT {} FROM {}", BOOK_COLUMNS, BOOK_TABLES);
    let mut next_param = 1;

    let pattern = value.map(|value| format!("%{}%", fold_case(value)));
    if pattern.is_some() {
        let param = dialect.placeholder(next_param);
        next_param += 1;

        let columns = match match_column(search_type) {
            Some(column) => vec![column],
            None => SearchType::ALL.into_iter().filter_map(match_column).collect(),
        };
        let predicates = columns
            .into_iter()
            .map(|column| format!("{} LIKE {}", column, param))
            .collect::<Vec<String>>();
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" OR "));
    }

    if let Some(column) = order_column(search_type) {
        sql.push_str(" ORDER BY ");
        sql.push_str(column);
        if column != "b.isbn" {
            sql.push_str(", b.isbn");
        }
    }

    sql.push_str(&format!(
        " LIMIT {} OFFSET {}",
        dialect.placeholder(next_param),
        dialect.placeholder(next_param + 1)
    ));

    SearchQuery { sql, pattern, limit: page.limit(), offset: page.offset() }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns the common prefix of all search queries.
    fn select() -> String {
        format!("SELECT {} FROM {}", BOOK_COLUMNS, BOOK_TABLES)
    }

    #[test]
    fn test_build_search_any_without_value() {
        let query = build_search(Dialect::Sqlite, SearchType::Any, None, Page::new(None, None));
        assert_eq!(
            SearchQuery {
                sql: format!("{} LIMIT ?1 OFFSET ?2", select()),
                pattern: None,
                limit: 20,
                offset: 0,
            },
            query
        );
    }

    #[test]
    fn test_build_search_any_with_value() {
        let query = build_search(
            Dialect::Postgres,
            SearchType::Any,
            Some("HawKing"),
            Page::new(Some(5), Some(10)),
        );
        assert_eq!(
            SearchQuery {
                sql: format!(
                    "{} WHERE b.isbn LIKE $1 OR b.title_folded LIKE $1 \
                    OR b.author_folded LIKE $1 OR b.summary_folded LIKE $1 \
                    OR p.code LIKE $1 OR p.name_folded LIKE $1 \
                    LIMIT $2 OFFSET $3",
                    select()
                ),
                pattern: Some("%hawking%".to_owned()),
                limit: 10,
                offset: 5,
            },
            query
        );
    }

    #[test]
    fn test_build_search_one_field_with_value() {
        let query = build_search(
            Dialect::Sqlite,
            SearchType::PublisherName,
            Some("Cappelen"),
            Page::new(None, Some(4)),
        );
        assert_eq!(
            SearchQuery {
                sql: format!(
                    "{} WHERE p.name_folded LIKE ?1 ORDER BY p.name, b.isbn LIMIT ?2 OFFSET ?3",
                    select()
                ),
                pattern: Some("%cappelen%".to_owned()),
                limit: 4,
                offset: 0,
            },
            query
        );
    }

    #[test]
    fn test_build_search_one_field_without_value_still_orders() {
        let query = build_search(Dialect::Postgres, SearchType::Title, None, Page::default());
        assert_eq!(format!("{} ORDER BY b.title, b.isbn LIMIT $1 OFFSET $2", select()), query.sql);
        assert_eq!(None, query.pattern);
    }

    #[test]
    fn test_build_search_isbn_has_no_redundant_tie_breaker() {
        let query = build_search(Dialect::Sqlite, SearchType::Isbn, Some("978"), Page::default());
        assert!(query.sql.ends_with("ORDER BY b.isbn LIMIT ?2 OFFSET ?3"), "{}", query.sql);
    }

    #[test]
    fn test_build_search_folds_non_ascii_value() {
        let query =
            build_search(Dialect::Sqlite, SearchType::Summary, Some("ÖLAND"), Page::default());
        assert_eq!(Some("%öland%".to_owned()), query.pattern);
        assert!(query.sql.contains("WHERE b.summary_folded LIKE ?1"), "{}", query.sql);
    }

    #[test]
    fn test_fold_case() {
        assert_eq!("ørnen på åsen", fold_case("ØRNEN på Åsen"));
        assert_eq!("öland", fold_case("Öland"));
        assert_eq!("978-82", fold_case("978-82"));
    }
}
