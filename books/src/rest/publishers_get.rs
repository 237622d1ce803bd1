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

//! API to browse the publishers known to the catalog.

use crate::model::Page;
use crate::rest::collection_json::CollectionJson;
use crate::rest::presenter::{page_links, page_url, publishers_collection};
use crate::rest::{parse_query, AppState};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use catalog_core::model::blank_to_none;
use catalog_core::rest::{EmptyBody, RestResult};
use serde::Deserialize;
#[cfg(test)]
use serde::Serialize;

/// Query parameters for the publishers listing.
#[derive(Debug, Default, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub(crate) struct PublishersQuery {
    /// Prefix that the names of the returned publishers must start with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) name: Option<String>,

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
    query: Result<Query<PublishersQuery>, QueryRejection>,
    _: EmptyBody,
) -> RestResult<CollectionJson> {
    let query = parse_query(query)?;
    let name = blank_to_none(query.name);
    let page = Page::new(query.offset, query.limit);

    let publishers = driver.get_publishers(name.clone(), page).await?;

    let filters = match name {
        Some(name) => vec![("name", name)],
        None => vec![],
    };
    let href = page_url(&base_url, "publishers", &filters, page);
    let links = page_links(&base_url, "publishers", &filters, page, publishers.len());
    Ok(publishers_collection(&base_url, href, &publishers, links))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::collection_json::find_link;
    use crate::rest::testutils::*;
    use axum::http;
    use catalog_core::rest::testutils::OneShotBuilder;
    use catalog_core::test_payload_must_be_empty;

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/api/publishers".to_owned())
    }

    /// Extracts the codes of the publishers in a `response`, in order.
    fn codes(response: &CollectionJson) -> Vec<&str> {
        response.collection.items.iter().map(|item| item.value("code").unwrap()).collect()
    }

    #[tokio::test]
    async fn test_empty() {
        let context = TestContext::setup().await;

        let response = OneShotBuilder::new(context.into_app(), route())
            .send_empty()
            .await
            .expect_json::<CollectionJson>()
            .await;
        assert_eq!(format!("{}publishers?offset=0&limit=20", BASE_URL), response.collection.href);
        assert!(response.collection.items.is_empty());
        assert!(response.collection.template.is_some());
    }

    #[tokio::test]
    async fn test_ordered_by_code() {
        let context = TestContext::setup().await;
        context.add_publisher("82530", "Pax").await;
        context.add_publisher("18468", "Alma Books").await;
        context.add_publisher("82040", "Damm").await;

        let response = OneShotBuilder::new(context.into_app(), route())
            .send_empty()
            .await
            .expect_json::<CollectionJson>()
            .await;
        assert_eq!(vec!["18468", "82040", "82530"], codes(&response));
        let item = &response.collection.items[0];
        assert_eq!(Some("Alma Books"), item.value("name"));
        assert_eq!(
            Some(format!("{}books/search/publisher.code?q=18468", BASE_URL).as_str()),
            item.link("books")
        );
    }

    #[tokio::test]
    async fn test_name_prefix() {
        let context = TestContext::setup().await;
        context.populate().await;

        let response = OneShotBuilder::new(context.into_app(), route())
            .with_query(PublishersQuery {
                name: Some("Gyldendal".to_owned()),
                ..Default::default()
            })
            .send_empty()
            .await
            .expect_json::<CollectionJson>()
            .await;
        assert!(!response.collection.items.is_empty());
        for item in &response.collection.items {
            assert!(item.value("name").unwrap().starts_with("Gyldendal"));
        }
        assert_eq!(
            format!("{}publishers?name=Gyldendal&offset=0&limit=20", BASE_URL),
            response.collection.href
        );
    }

    #[tokio::test]
    async fn test_paging() {
        let context = TestContext::setup().await;
        context.populate().await;

        let response = OneShotBuilder::new(context.into_app(), route())
            .with_query(PublishersQuery { offset: Some(2), limit: Some(2), ..Default::default() })
            .send_empty()
            .await
            .expect_json::<CollectionJson>()
            .await;
        assert_eq!(2, response.collection.items.len());
        assert_eq!(
            Some(format!("{}publishers?offset=0&limit=2", BASE_URL).as_str()),
            find_link(&response.collection.links, "prev")
        );
        assert_eq!(
            Some(format!("{}publishers?offset=4&limit=2", BASE_URL).as_str()),
            find_link(&response.collection.links, "next")
        );
    }

    test_payload_must_be_empty!(TestContext::setup().await.into_app(), route());
}
