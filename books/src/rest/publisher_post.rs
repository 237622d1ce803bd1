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

//! API to add a new publisher to the catalog.

use crate::model::{PublisherDraft, PublisherFields};
use crate::rest::presenter::PublisherResponse;
use crate::rest::AppState;
use axum::extract::State;
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use catalog_core::rest::{JsonOrForm, RestResult};

/// POST handler for this API.
pub(crate) async fn handler(
    State((driver, base_url)): State<AppState>,
    JsonOrForm(fields): JsonOrForm<PublisherFields>,
) -> RestResult<impl IntoResponse> {
    let draft = PublisherDraft::new(fields)?;

    let publisher = driver.create_publisher(draft).await?;

    let location = base_url.make_url(&format!("publishers/{}", publisher.code().as_str()));
    Ok((
        StatusCode::CREATED,
        [(LOCATION, location.to_string())],
        Json(PublisherResponse::from(&publisher)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;
    use axum::http;
    use catalog_core::rest::testutils::OneShotBuilder;
    use catalog_core::test_payload_must_be_json_or_form;

    fn route() -> (http::Method, String) {
        (http::Method::POST, "/api/publishers".to_owned())
    }

    fn fields(code: &str, name: &str) -> PublisherFields {
        PublisherFields { code: Some(code.to_owned()), name: Some(name.to_owned()) }
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_form(fields("82530", "  Pax "))
            .await
            .expect_status(http::StatusCode::CREATED)
            .take_response()
            .await;
        assert_eq!(
            format!("{}publishers/82530", BASE_URL),
            response.headers().get(LOCATION).unwrap().to_str().unwrap()
        );

        let publisher = context.find_publisher("82530").await.unwrap();
        assert_eq!("Pax", publisher.name().as_str());
        assert_eq!(1, publisher.version().as_i64());
    }

    #[tokio::test]
    async fn test_already_exists() {
        let context = TestContext::setup().await;
        context.add_publisher("82530", "Pax").await;

        OneShotBuilder::new(context.app(), route())
            .send_json(fields("82530", "Other"))
            .await
            .expect_status(http::StatusCode::CONFLICT)
            .expect_error("Publisher with code: '82530' already exists")
            .await;

        let publisher = context.find_publisher("82530").await.unwrap();
        assert_eq!("Pax", publisher.name().as_str());
    }

    #[tokio::test]
    async fn test_invalid_fields() {
        let context = TestContext::setup().await;

        let response = OneShotBuilder::new(context.into_app(), route())
            .send_json(fields("1234", " "))
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("Validation failed")
            .await;
        let paths = response.violations.iter().map(|v| v.path.as_str()).collect::<Vec<_>>();
        assert_eq!(vec!["code", "name"], paths);
    }

    test_payload_must_be_json_or_form!(TestContext::setup().await.into_app(), route());
}
