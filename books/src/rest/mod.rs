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

//! REST interface for the catalog service.

use crate::driver::Driver;
use crate::model::Page;
use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use axum::Router;
use catalog_core::rest::{BaseUrl, RestError, RestResult};
use serde::Deserialize;
#[cfg(test)]
use serde::Serialize;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::decompression::RequestDecompressionLayer;

mod book_delete;
mod book_get;
mod book_post;
mod book_publisher_get;
mod book_put;
mod books_get;
mod books_search_get;
mod collection_json;
mod count_get;
mod ping_get;
mod presenter;
mod publisher_get;
mod publisher_post;
mod publishers_get;
#[cfg(test)]
mod testutils;

/// State shared by all handlers: the business logic and the public base URL of the service.
pub(crate) type AppState = (Driver, Arc<BaseUrl>);

/// Pagination parameters accepted by the collection APIs.
#[derive(Debug, Default, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub(crate) struct PageQuery {
    /// Number of results to skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) offset: Option<i64>,

    /// Maximum number of results to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) limit: Option<i64>,
}

impl PageQuery {
    /// Converts the raw parameters into a valid page.
    pub(crate) fn page(&self) -> Page {
        Page::new(self.offset, self.limit)
    }
}

/// Unwraps the outcome of extracting a query string, reporting failures as a `RestError` so
/// that clients always get the error envelope.
pub(crate) fn parse_query<T>(query: Result<Query<T>, QueryRejection>) -> RestResult<T> {
    match query {
        Ok(Query(query)) => Ok(query),
        Err(e) => Err(RestError::InvalidRequest(e.body_text())),
    }
}

/// Creates the router for the application.
///
/// All links emitted by the service are absolute and rooted at `base_url`.
pub(crate) fn app(driver: Driver, base_url: Arc<BaseUrl>) -> Router {
    use axum::routing::{get, post};

    let books = get(books_get::handler).layer(CompressionLayer::new()).merge(
        post(book_post::handler)
            .put(book_put::handler)
            .layer(RequestDecompressionLayer::new()),
    );

    let publishers = get(publishers_get::handler)
        .layer(CompressionLayer::new())
        .merge(post(publisher_post::handler).layer(RequestDecompressionLayer::new()));

    Router::new()
        .route("/api/books", books)
        .route("/api/books/count", get(count_get::handler))
        .route("/api/books/ping", get(ping_get::handler))
        .route(
            "/api/books/search/:type",
            get(books_search_get::handler).layer(CompressionLayer::new()),
        )
        .route("/api/books/:isbn", get(book_get::handler).delete(book_delete::handler))
        .route("/api/books/:isbn/publisher", get(book_publisher_get::handler))
        .route("/api/publishers", publishers)
        .route("/api/publishers/:code", get(publisher_get::handler))
        .with_state((driver, base_url))
}
