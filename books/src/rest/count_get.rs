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

//! API to count the books in the catalog.

use crate::rest::AppState;
use axum::extract::State;
use axum::Json;
use catalog_core::rest::{EmptyBody, RestResult};
#[cfg(test)]
use serde::Deserialize;
use serde::Serialize;

/// Message returned by the server with the number of books.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub(crate) struct CountResponse {
    /// Total number of books in the catalog.
    pub(crate) count: i64,
}

/// GET handler for this API.
pub(crate) async fn handler(
    State((driver, _base_url)): State<AppState>,
    _: EmptyBody,
) -> RestResult<Json<CountResponse>> {
    let count = driver.count_books().await?;
    Ok(Json(CountResponse { count }))
}
