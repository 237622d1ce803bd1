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

//! API to delete a book.

use crate::model::Isbn;
use crate::rest::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use catalog_core::rest::{EmptyBody, RestResult};

/// DELETE handler for this API.
///
/// Deleting a book that does not exist is not an error.
pub(crate) async fn handler(
    State((driver, _base_url)): State<AppState>,
    Path(isbn): Path<String>,
    _: EmptyBody,
) -> RestResult<StatusCode> {
    let isbn = Isbn::new(isbn)?;

    driver.delete_book(&isbn).await?;

    Ok(StatusCode::NO_CONTENT)
}
