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

//! API to browse the whole catalog of books.

use crate::model::SearchType;
use crate::rest::collection_json::CollectionJson;
use crate::rest::presenter::{books_collection, page_links, page_url, search_path};
use crate::rest::{parse_query, AppState, PageQuery};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use catalog_core::rest::{EmptyBody, RestResult};

/// GET handler for this API.
pub(crate) async fn handler(
    State((driver, base_url)): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
    _: EmptyBody,
) -> RestResult<CollectionJson> {
    let page = parse_query(query)?.page();

    let books = driver.search_books(SearchType::Any, None, page).await?;

    let href = page_url(&base_url, "books", &[], page);
    let links = page_links(&base_url, &search_path(SearchType::Any), &[], page, books.len());
    Ok(books_collection(&base_url, href, &books, links))
}
