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

//! API to add a new book to the catalog.

use crate::model::{BookDraft, BookFields};
use crate::rest::presenter::BookResponse;
use crate::rest::AppState;
use axum::extract::State;
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use catalog_core::rest::{JsonOrForm, RestResult};

/// POST handler for this API.
///
/// Any `id` or `version` in the request are ignored: new books always get a fresh identifier.
pub(crate) async fn handler(
    State((driver, base_url)): State<AppState>,
    JsonOrForm(fields): JsonOrForm<BookFields>,
) -> RestResult<impl IntoResponse> {
    let draft = BookDraft::new(fields)?;

    let book = driver.create_book(draft).await?;

    let location = base_url.make_url(&format!("books/{}", book.isbn().as_str()));
    Ok((StatusCode::CREATED, [(LOCATION, location.to_string())], Json(BookResponse::from(&book))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;
    use axum::http;
    use catalog_core::rest::testutils::OneShotBuilder;
    use catalog_core::rest::UNKNOWN_REFERENCE_CODE;
    use catalog_core::test_payload_must_be_json_or_form;

    fn route() -> (http::Method, String) {
        (http::Method::POST, "/api/books".to_owned())
    }

    fn fields(isbn: &str, publisher_code: Option<&str>) -> BookFields {
        BookFields {
            isbn: Some(isbn.to_owned()),
            title: Some("Vredens druer".to_owned()),
            author: Some("Steinbeck, John".to_owned()),
            published: Some("1998-02-01T00:00:00".to_owned()),
            translator: Some("Nordahl Grieg".to_owned()),
            summary: Some("   ".to_owned()),
            publisher_code: publisher_code.map(str::to_owned),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_ok_json() {
        let context = TestContext::setup().await;
        let publisher = context.add_publisher("82530", "Pax").await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_json(fields("9788253019727", Some("82530")))
            .await
            .expect_status(http::StatusCode::CREATED)
            .take_response()
            .await;
        assert_eq!(
            format!("{}books/9788253019727", BASE_URL),
            response.headers().get(LOCATION).unwrap().to_str().unwrap()
        );

        let book = context.find_book("9788253019727").await.unwrap();
        assert_eq!("Vredens druer", book.title().as_str());
        assert_eq!(Some("1998-02-01".to_owned()), book.published().map(|d| d.to_string()));
        assert_eq!(Some("Nordahl Grieg"), book.translator().as_deref());
        assert_eq!(None, *book.summary());
        assert_eq!(&publisher, book.publisher());
    }

    #[tokio::test]
    async fn test_ok_form_defaults_publisher_from_isbn() {
        let context = TestContext::setup().await;
        context.add_publisher("82530", "Pax").await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_form(fields("9788253019727", None))
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_json::<BookResponse>()
            .await;
        assert_eq!("9788253019727", response.isbn);
        assert_eq!("82530", response.publisher.code);
        assert_eq!(1, response.version);

        assert!(context.find_book("9788253019727").await.is_some());
    }

    #[tokio::test]
    async fn test_ignores_id_and_version() {
        let context = TestContext::setup().await;
        context.add_publisher("82530", "Pax").await;

        let request = BookFields {
            id: Some("client-chosen".to_owned()),
            version: Some(7),
            ..fields("9788253019727", Some("82530"))
        };
        let response = OneShotBuilder::new(context.app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_json::<BookResponse>()
            .await;
        assert_ne!("client-chosen", response.id);
        assert_eq!(1, response.version);
    }

    #[tokio::test]
    async fn test_unknown_publisher() {
        let context = TestContext::setup().await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_json(fields("9788253019727", Some("82530")))
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("Publisher with code 82530 was not found")
            .await;
        assert_eq!(Some(UNKNOWN_REFERENCE_CODE), response.code);

        assert!(context.find_book("9788253019727").await.is_none());
    }

    #[tokio::test]
    async fn test_already_exists() {
        let context = TestContext::setup().await;
        let publisher = context.add_publisher("82530", "Pax").await;
        context.add_book("9788253019727", "Original", "Someone", &publisher).await;

        OneShotBuilder::new(context.app(), route())
            .send_json(fields("9788253019727", Some("82530")))
            .await
            .expect_status(http::StatusCode::CONFLICT)
            .expect_error("Book with isbn: '9788253019727' already exists")
            .await;

        let book = context.find_book("9788253019727").await.unwrap();
        assert_eq!("Original", book.title().as_str());
    }

    #[tokio::test]
    async fn test_invalid_fields() {
        let context = TestContext::setup().await;

        let request = BookFields {
            isbn: Some("12345".to_owned()),
            title: Some(" ".to_owned()),
            published: Some("yesterday".to_owned()),
            ..Default::default()
        };
        let response = OneShotBuilder::new(context.into_app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("Validation failed")
            .await;
        let mut paths = response.violations.iter().map(|v| v.path.as_str()).collect::<Vec<_>>();
        paths.sort();
        assert_eq!(vec!["author", "isbn", "published", "title"], paths);
    }

    test_payload_must_be_json_or_form!(TestContext::setup().await.into_app(), route());
}
