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

//! High-level data types.

mod book;
pub(crate) use book::*;
mod ids;
pub(crate) use ids::*;
mod publisher;
pub(crate) use publisher::*;
mod search;
pub(crate) use search::*;

/// Builders of valid entities for testing purposes.
#[cfg(test)]
pub(crate) mod testutils {
    use super::*;

    /// Creates a new publisher with `code` and `name` at its initial version.
    pub(crate) fn publisher(code: &str, name: &str) -> Publisher {
        let code = PublisherCode::new(code).unwrap();
        Publisher::new(EntityId::generate(), Version::initial(), code, name).unwrap()
    }

    /// Creates a new book with the given mandatory fields at its initial version.
    pub(crate) fn book(isbn: &str, title: &str, author: &str, publisher: &Publisher) -> Book {
        Book::new(
            EntityId::generate(),
            Version::initial(),
            Isbn::new(isbn).unwrap(),
            title,
            author,
            publisher.clone(),
        )
        .unwrap()
    }
}
