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

//! Identity and versioning of stored entities.

use catalog_core::model::{ModelError, ModelResult};
use derive_more::Display;

/// Opaque identifier of a stored entity.
#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
pub(crate) struct EntityId(String);

impl EntityId {
    /// Creates an identifier from a raw string, which must not be blank.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(ModelError("Id cannot be blank".to_owned()));
        }
        if s.len() > 64 {
            return Err(ModelError("Id is too long".to_owned()));
        }
        Ok(Self(s))
    }

    /// Generates a new random identifier.
    pub(crate) fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns a string view of the identifier.
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

/// Optimistic concurrency counter of an entity.  Starts at 1 and grows by one on every update.
#[derive(Clone, Copy, Debug, Display, Eq, Ord, PartialEq, PartialOrd)]
pub(crate) struct Version(i64);

impl Version {
    /// Returns the version assigned to new entities.
    pub(crate) fn initial() -> Self {
        Self(1)
    }

    /// Returns the version that follows this one.
    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Creates a version from an `i64` with range validation.
    pub(crate) fn new(version: i64) -> ModelResult<Self> {
        if version < 1 {
            return Err(ModelError(format!("Version must be positive but was {}", version)));
        }
        Ok(Self(version))
    }

    /// Returns the version as an `i64`.
    pub(crate) fn as_i64(self) -> i64 {
        self.0
    }
}
