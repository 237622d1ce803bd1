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

//! Conversion of domain entities into the representations returned by the REST API.
//!
//! Entities are rendered either as plain JSON documents or, when the client asks for it via the
//! `Accept` header, as Collection+JSON documents that embed links to related resources.

use crate::model::{Book, Page, Publisher, SearchType};
use crate::rest::collection_json::{
    self, Collection, CollectionJson, Data, Item, Link, Query, Template,
};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use catalog_core::rest::{accepts, BaseUrl};
#[cfg(test)]
use serde::Deserialize;
use serde::Serialize;
use url::Url;

/// JSON representation of a publisher.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize, PartialEq))]
pub(crate) struct PublisherResponse {
    /// Opaque identifier.
    pub(crate) id: String,

    /// Optimistic concurrency version.
    pub(crate) version: i64,

    /// Unique registrant code.
    pub(crate) code: String,

    /// Display name.
    pub(crate) name: String,
}

impl From<&Publisher> for PublisherResponse {
    fn from(publisher: &Publisher) -> Self {
        Self {
            id: publisher.id().as_str().to_owned(),
            version: publisher.version().as_i64(),
            code: publisher.code().as_str().to_owned(),
            name: publisher.name().clone(),
        }
    }
}

/// JSON representation of a book, which embeds its publisher.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize, PartialEq))]
pub(crate) struct BookResponse {
    /// Opaque identifier.
    pub(crate) id: String,

    /// Optimistic concurrency version.
    pub(crate) version: i64,

    /// ISBN-13 without separators.
    pub(crate) isbn: String,

    /// Title of the book.
    pub(crate) title: String,

    /// Author or authors of the book.
    pub(crate) author: String,

    /// Publication date as `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) published: Option<String>,

    /// Translator or translators of the book.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) translator: Option<String>,

    /// Summary of the contents of the book.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) summary: Option<String>,

    /// Publisher of the book.
    pub(crate) publisher: PublisherResponse,
}

impl From<&Book> for BookResponse {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id().as_str().to_owned(),
            version: book.version().as_i64(),
            isbn: book.isbn().as_str().to_owned(),
            title: book.title().clone(),
            author: book.author().clone(),
            published: book.published().map(|d| d.to_string()),
            translator: book.translator().clone(),
            summary: book.summary().clone(),
            publisher: PublisherResponse::from(book.publisher()),
        }
    }
}

/// Builds the URL of the `page` of results of the collection at `path` restricted by `filters`.
pub(crate) fn page_url(
    base_url: &BaseUrl,
    path: &str,
    filters: &[(&'static str, String)],
    page: Page,
) -> Url {
    let mut pairs = filters.to_vec();
    pairs.push(("offset", page.offset().to_string()));
    pairs.push(("limit", page.limit().to_string()));
    base_url.make_url_with_query(path, &pairs)
}

/// Builds the links to the pages surrounding `page` of the collection at `path` restricted by
/// `filters`, given that the current page yielded `returned` results.
pub(crate) fn page_links(
    base_url: &BaseUrl,
    path: &str,
    filters: &[(&'static str, String)],
    page: Page,
    returned: usize,
) -> Vec<Link> {
    let mut links = vec![];
    if let Some(prev) = page.prev() {
        links.push(Link::new("prev", page_url(base_url, path, filters, prev), None));
    }
    if let Some(next) = page.next(returned) {
        links.push(Link::new("next", page_url(base_url, path, filters, next), None));
    }
    links
}

/// Returns the path of the search of type `search_type`, relative to the base URL.
pub(crate) fn search_path(search_type: SearchType) -> String {
    format!("books/search/{}", search_type)
}

/// Returns the search filters to apply for the free-text `value`, if any.
pub(crate) fn search_filters(value: Option<&str>) -> Vec<(&'static str, String)> {
    match value {
        Some(value) => vec![("q", value.to_owned())],
        None => vec![],
    }
}

/// Builds the Collection+JSON item for `book`.
pub(crate) fn book_item(base_url: &BaseUrl, book: &Book) -> Item {
    let href = base_url.make_url(&format!("books/{}", book.isbn().as_str()));
    let data = vec![
        Data::new("id", Some(book.id().as_str()), Some("Id")),
        Data::new("version", Some(book.version().to_string()), Some("Version")),
        Data::new("isbn", Some(book.isbn().as_str()), Some("ISBN")),
        Data::new("title", Some(book.title().as_str()), Some("Title")),
        Data::new("author", Some(book.author().as_str()), Some("Author")),
        Data::new("published", book.published().map(|d| d.to_string()), Some("Published")),
        Data::new("translator", book.translator().as_deref(), Some("Translator")),
        Data::new("summary", book.summary().as_deref(), Some("Summary")),
        Data::new(
            "publisher.code",
            Some(book.publisher().code().as_str()),
            Some("Publisher code"),
        ),
    ];
    let links = vec![
        Link::new("self", href.clone(), Some("This book")),
        Link::new(
            "publisher",
            base_url.make_url(&format!("books/{}/publisher", book.isbn().as_str())),
            Some("Publisher of book"),
        ),
        Link::new(
            "authorship",
            base_url.make_url_with_query(
                &search_path(SearchType::Author),
                &[("q", book.author().as_str())],
            ),
            Some("Books by this author"),
        ),
    ];
    Item::new(href, data, links)
}

/// Builds the Collection+JSON item for `publisher`.
pub(crate) fn publisher_item(base_url: &BaseUrl, publisher: &Publisher) -> Item {
    let href = base_url.make_url(&format!("publishers/{}", publisher.code().as_str()));
    let data = vec![
        Data::new("id", Some(publisher.id().as_str()), Some("Id")),
        Data::new("version", Some(publisher.version().to_string()), Some("Version")),
        Data::new("code", Some(publisher.code().as_str()), Some("Code")),
        Data::new("name", Some(publisher.name().as_str()), Some("Name")),
    ];
    let links = vec![
        Link::new("self", href.clone(), Some("This publisher")),
        Link::new(
            "books",
            base_url.make_url_with_query(
                &search_path(SearchType::PublisherCode),
                &[("q", publisher.code().as_str())],
            ),
            Some("Books by this publisher"),
        ),
    ];
    Item::new(href, data, links)
}

/// Builds the parameters of a paginated query, optionally preceded by a free-text `q`.
fn query_data(with_q: bool) -> Vec<Data> {
    let names: &[&str] = if with_q { &["q", "offset", "limit"] } else { &["offset", "limit"] };
    names.iter().map(|name| Data::new(name, Some(""), None)).collect()
}

/// Builds the queries advertised by book collections: one per search type.
pub(crate) fn book_queries(base_url: &BaseUrl) -> Vec<Query> {
    SearchType::ALL
        .into_iter()
        .map(|search_type| Query {
            rel: "search".to_owned(),
            href: base_url.make_url(&search_path(search_type)).to_string(),
            prompt: format!("Search {}", search_type),
            data: query_data(true),
        })
        .collect()
}

/// Builds the queries advertised by publisher collections.
pub(crate) fn publisher_queries(base_url: &BaseUrl) -> Vec<Query> {
    let mut data = vec![Data::new("name", Some(""), Some("Name prefix"))];
    data.extend(query_data(false));
    vec![Query {
        rel: "search".to_owned(),
        href: base_url.make_url("publishers").to_string(),
        prompt: "Search publishers by name".to_owned(),
        data,
    }]
}

/// Builds the template to write books.
pub(crate) fn book_template() -> Template {
    let fields = [
        ("id", "Id"),
        ("version", "Version"),
        ("isbn", "ISBN"),
        ("title", "Title"),
        ("author", "Author"),
        ("published", "Published"),
        ("translator", "Translator"),
        ("summary", "Summary"),
        ("publisher-code", "Publisher code"),
    ];
    Template {
        data: fields
            .iter()
            .map(|(name, prompt)| Data::new(name, Some(""), Some(*prompt)))
            .collect(),
    }
}

/// Builds the template to write publishers.
pub(crate) fn publisher_template() -> Template {
    Template {
        data: vec![
            Data::new("code", Some(""), Some("Code")),
            Data::new("name", Some(""), Some("Name")),
        ],
    }
}

/// Builds the Collection+JSON document for a page of `books` found at `href`.
pub(crate) fn books_collection(
    base_url: &BaseUrl,
    href: Url,
    books: &[Book],
    links: Vec<Link>,
) -> CollectionJson {
    Collection::new(href)
        .with_links(links)
        .with_items(books.iter().map(|book| book_item(base_url, book)).collect())
        .with_queries(book_queries(base_url))
        .with_template(book_template())
        .into()
}

/// Builds the Collection+JSON document for a page of `publishers` found at `href`.
pub(crate) fn publishers_collection(
    base_url: &BaseUrl,
    href: Url,
    publishers: &[Publisher],
    links: Vec<Link>,
) -> CollectionJson {
    Collection::new(href)
        .with_links(links)
        .with_items(publishers.iter().map(|p| publisher_item(base_url, p)).collect())
        .with_queries(publisher_queries(base_url))
        .with_template(publisher_template())
        .into()
}

/// Renders `book` in the representation requested by the client in `headers`.
pub(crate) fn render_book(headers: &HeaderMap, base_url: &BaseUrl, book: &Book) -> Response {
    if accepts(headers, collection_json::MEDIA_TYPE) {
        CollectionJson::from(
            Collection::new(base_url.make_url("books")).with_items(vec![book_item(base_url, book)]),
        )
        .into_response()
    } else {
        Json(BookResponse::from(book)).into_response()
    }
}

/// Renders `publisher` in the representation requested by the client in `headers`.
pub(crate) fn render_publisher(
    headers: &HeaderMap,
    base_url: &BaseUrl,
    publisher: &Publisher,
) -> Response {
    if accepts(headers, collection_json::MEDIA_TYPE) {
        CollectionJson::from(
            Collection::new(base_url.make_url("publishers"))
                .with_items(vec![publisher_item(base_url, publisher)]),
        )
        .into_response()
    } else {
        Json(PublisherResponse::from(publisher)).into_response()
    }
}
