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

//! API to create or update a book.

use crate::model::{BookDraft, BookFields};
use crate::rest::presenter::BookResponse;
use crate::rest::AppState;
use axum::extract::State;
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use catalog_core::rest::{JsonOrForm, RestResult};

/// PUT handler for this API.
///
/// The target book is located by its `id` if given, or else by its ISBN.  The `version`, if
/// given, must match the stored one for the update to succeed.
pub(crate) async fn handler(
    State((driver, base_url)): State<AppState>,
    JsonOrForm(fields): JsonOrForm<BookFields>,
) -> RestResult<impl IntoResponse> {
    let draft = BookDraft::new(fields)?;

    let saved = driver.put_book(draft).await?;

    let status = if saved.is_created() { StatusCode::CREATED } else { StatusCode::OK };
    let book = saved.into_inner();
    let location = base_url.make_url(&format!("books/{}", book.isbn().as_str()));
    Ok((status, [(LOCATION, location.to_string())], Json(BookResponse::from(&book))))
}
