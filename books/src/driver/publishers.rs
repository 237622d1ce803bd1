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

//! Operations on publishers.

use crate::db;
use crate::driver::Driver;
use crate::model::{EntityId, Page, Publisher, PublisherCode, PublisherDraft};
use catalog_core::db::repository::{self, UnitOfWork};
use catalog_core::db::DbError;
use catalog_core::driver::{DriverError, DriverResult};
use catalog_core::model::blank_to_none;
use log::debug;

impl Driver {
    /// Gets the `page` of publishers ordered by code, optionally restricted to those whose name
    /// starts with `name_prefix`.
    pub(crate) async fn get_publishers(
        self,
        name_prefix: Option<String>,
        page: Page,
    ) -> DriverResult<Vec<Publisher>> {
        let name_prefix = blank_to_none(name_prefix);
        let publishers =
            db::get_publishers(&mut self.db.ex().await?, name_prefix.as_deref(), page).await?;
        Ok(publishers)
    }

    /// Gets the publisher identified by `code`.
    pub(crate) async fn get_publisher(self, code: &PublisherCode) -> DriverResult<Publisher> {
        match db::find_publisher_by_code(&mut self.db.ex().await?, code).await? {
            Some(publisher) => Ok(publisher),
            None => Err(DriverError::NotFound(format!(
                "Publisher with code: '{}' was not found",
                code
            ))),
        }
    }

    /// Creates a new publisher from `draft`.
    pub(crate) async fn create_publisher(self, draft: PublisherDraft) -> DriverResult<Publisher> {
        let code = draft.code().clone();
        let uow = UnitOfWork::begin(self.db.as_ref()).await?;
        let publisher = match repository::persist(uow, draft.into_publisher(EntityId::generate()))
            .await
        {
            Ok(publisher) => publisher,
            Err(DbError::AlreadyExists) => {
                return Err(DriverError::AlreadyExists(format!(
                    "Publisher with code: '{}' already exists",
                    code
                )));
            }
            Err(e) => return Err(e.into()),
        };
        debug!("Created publisher with code: {}. Name: {}", publisher.code(), publisher.name());
        Ok(publisher)
    }
}
