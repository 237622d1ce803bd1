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

//! API to search for books by one of their fields.

use crate::model::{Page, SearchType};
use crate::rest::collection_json::CollectionJson;
use crate::rest::presenter::{
    books_collection, page_links, page_url, search_filters, search_path,
};
use crate::rest::{parse_query, AppState};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use catalog_core::model::blank_to_none;
use catalog_core::rest::{EmptyBody, RestResult};
use serde::Deserialize;
#[cfg(test)]
use serde::Serialize;

/// Query parameters for a search.
#[derive(Debug, Default, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub(crate) struct SearchQuery {
    /// Text to look for.  Searches without a value match all books.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) q: Option<String>,

    /// Number of results to skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) offset: Option<i64>,

    /// Maximum number of results to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) limit: Option<i64>,
}

/// GET handler for this API.
pub(crate) async fn handler(
    State((driver, base_url)): State<AppState>,
    Path(search_type): Path<String>,
    query: Result<Query<SearchQuery>, QueryRejection>,
    _: EmptyBody,
) -> RestResult<CollectionJson> {
    let search_type = search_type.parse::<SearchType>()?;
    let query = parse_query(query)?;
    let value = blank_to_none(query.q);
    let page = Page::new(query.offset, query.limit);

    let books = driver.search_books(search_type, value.clone(), page).await?;

    let path = search_path(search_type);
    let filters = search_filters(value.as_deref());
    let href = page_url(&base_url, &path, &filters, page);
    let links = page_links(&base_url, &path, &filters, page, books.len());
    Ok(books_collection(&base_url, href, &books, links))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::collection_json::find_link;
    use crate::rest::testutils::*;
    use axum::http;
    use catalog_core::rest::testutils::OneShotBuilder;
    use catalog_core::test_payload_must_be_empty;

    fn route(search_type: &str) -> (http::Method, String) {
        (http::Method::GET, format!("/api/books/search/{}", search_type))
    }

    /// Extracts the ISBNs of the books in a search `response`, sorted.
    fn isbns(response: CollectionJson) -> Vec<String> {
        let mut isbns = response
            .collection
            .items
            .iter()
            .map(|item| item.value("isbn").unwrap().to_owned())
            .collect::<Vec<String>>();
        isbns.sort();
        isbns
    }

    async fn search(context: &TestContext, search_type: &str, q: &str) -> CollectionJson {
        OneShotBuilder::new(context.app(), route(search_type))
            .with_query(SearchQuery { q: Some(q.to_owned()), ..Default::default() })
            .send_empty()
            .await
            .expect_json::<CollectionJson>()
            .await
    }

    #[tokio::test]
    async fn test_any() {
        let context = TestContext::setup().await;
        context.populate().await;

        let response = search(&context, "any", "hawking").await;
        assert_eq!(
            format!("{}books/search/any?q=hawking&offset=0&limit=20", BASE_URL),
            response.collection.href
        );
        assert_eq!(vec!["9781846883668", "9788204094261"], isbns(response));
    }

    #[tokio::test]
    async fn test_by_field() {
        let context = TestContext::setup().await;
        context.populate().await;

        let response = search(&context, "author", "gribbin").await;
        assert_eq!(vec!["9781118175392", "9788204094261"], isbns(response));

        let response = search(&context, "title", "INFINITY").await;
        assert_eq!(vec!["9781846883668"], isbns(response));

        let response = search(&context, "isbn", "97818468836").await;
        assert_eq!(vec!["9781846883668"], isbns(response));

        let response = search(&context, "publisher.code", "82040").await;
        assert_eq!(vec!["9788204094261"], isbns(response));
    }

    #[tokio::test]
    async fn test_ordered_by_field() {
        let context = TestContext::setup().await;
        let publisher = context.add_publisher("82530", "Pax").await;
        context.add_book("9788253019734", "B title", "Steinbeck, John", &publisher).await;
        context.add_book("9788253019727", "A title", "Steinbeck, John", &publisher).await;
        context.add_book("9788253019741", "C title", "Steinbeck, John", &publisher).await;

        let response = search(&context, "title", "title").await;
        let titles = response
            .collection
            .items
            .iter()
            .map(|item| item.value("title").unwrap())
            .collect::<Vec<&str>>();
        assert_eq!(vec!["A title", "B title", "C title"], titles);
    }

    #[tokio::test]
    async fn test_blank_value_matches_all() {
        let context = TestContext::setup().await;
        context.populate().await;

        let response = search(&context, "title", "  ").await;
        assert_eq!(
            format!("{}books/search/title?offset=0&limit=20", BASE_URL),
            response.collection.href
        );
        assert_eq!(18, response.collection.items.len());
    }

    #[tokio::test]
    async fn test_paging_links_keep_value() {
        let context = TestContext::setup().await;
        context.populate().await;

        let response = OneShotBuilder::new(context.app(), route("author"))
            .with_query(SearchQuery {
                q: Some("gribbin".to_owned()),
                offset: Some(1),
                limit: Some(1),
            })
            .send_empty()
            .await
            .expect_json::<CollectionJson>()
            .await;
        let links = &response.collection.links;
        assert_eq!(
            Some(format!("{}books/search/author?q=gribbin&offset=0&limit=1", BASE_URL).as_str()),
            find_link(links, "prev")
        );
        assert_eq!(
            Some(format!("{}books/search/author?q=gribbin&offset=2&limit=1", BASE_URL).as_str()),
            find_link(links, "next")
        );
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.into_app(), route("color"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("Unknown search type 'color'")
            .await;
    }

    test_payload_must_be_empty!(TestContext::setup().await.into_app(), route("any"));
}
