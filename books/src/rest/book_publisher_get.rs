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

//! API to fetch the publisher of a book.

use crate::model::Isbn;
use crate::rest::presenter::render_publisher;
use crate::rest::AppState;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use catalog_core::rest::{EmptyBody, RestResult};

/// GET handler for this API.
pub(crate) async fn handler(
    State((driver, base_url)): State<AppState>,
    Path(isbn): Path<String>,
    headers: HeaderMap,
    _: EmptyBody,
) -> RestResult<Response> {
    let isbn = Isbn::new(isbn)?;

    let publisher = driver.get_book_publisher(&isbn).await?;

    Ok(render_publisher(&headers, &base_url, &publisher))
}

#[cfg(test)]
mod tests {
    use crate::rest::collection_json::{CollectionJson, MEDIA_TYPE};
    use crate::rest::presenter::PublisherResponse;
    use crate::rest::testutils::*;
    use axum::http::{self, header};
    use catalog_core::rest::testutils::OneShotBuilder;
    use catalog_core::test_payload_must_be_empty;

    fn route(isbn: &str) -> (http::Method, String) {
        (http::Method::GET, format!("/api/books/{}/publisher", isbn))
    }

    #[tokio::test]
    async fn test_ok_json() {
        let context = TestContext::setup().await;
        let publisher = context.add_publisher("82530", "Pax").await;
        context.add_book("9788253019727", "Vredens druer", "Steinbeck, John", &publisher).await;

        let response = OneShotBuilder::new(context.into_app(), route("9788253019727"))
            .send_empty()
            .await
            .expect_json::<PublisherResponse>()
            .await;
        assert_eq!(PublisherResponse::from(&publisher), response);
    }

    #[tokio::test]
    async fn test_ok_collection_json() {
        let context = TestContext::setup().await;
        let publisher = context.add_publisher("82530", "Pax").await;
        context.add_book("9788253019727", "Vredens druer", "Steinbeck, John", &publisher).await;

        let response = OneShotBuilder::new(context.into_app(), route("9788253019727"))
            .with_header(header::ACCEPT, MEDIA_TYPE)
            .send_empty()
            .await
            .expect_json::<CollectionJson>()
            .await;
        let items = response.collection.items;
        assert_eq!(1, items.len());
        assert_eq!(format!("{}publishers/82530", BASE_URL), items[0].href);
        assert_eq!(Some("Pax"), items[0].value("name"));
    }

    #[tokio::test]
    async fn test_book_not_found() {
        let context = TestContext::setup().await;
        context.add_publisher("82530", "Pax").await;

        OneShotBuilder::new(context.into_app(), route("9788253019727"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("Book with isbn: '9788253019727' was not found")
            .await;
    }

    #[tokio::test]
    async fn test_invalid_isbn() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.into_app(), route("12345"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("ISBN must consist")
            .await;
    }

    test_payload_must_be_empty!(TestContext::setup().await.into_app(), route("9788253019727"));
}
