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

//! Publishers and their codes.

use crate::model::{EntityId, Version};
use catalog_core::model::{blank_to_none, ModelError, ModelResult, Violations};
use derive_getters::Getters;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Number of digits in a publisher code.
const PUBLISHER_CODE_LENGTH: usize = 5;

/// Registrant code of a publisher, made of exactly 5 digits.
#[derive(Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct PublisherCode(String);

impl PublisherCode {
    /// Creates a publisher code from a raw string, validating its format.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.len() != PUBLISHER_CODE_LENGTH || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ModelError(format!(
                "Publisher code must consist of exactly {} digits",
                PUBLISHER_CODE_LENGTH
            )));
        }
        Ok(Self(s))
    }

    /// Extracts the publisher code from the 13 `digits` of a valid ISBN.
    pub(super) fn from_isbn_digits(digits: &str) -> Self {
        debug_assert!(digits.len() == 13 && digits.bytes().all(|b| b.is_ascii_digit()));
        Self(digits[3..3 + PUBLISHER_CODE_LENGTH].to_owned())
    }

    /// Returns a string view of the code.
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

/// A publisher of books.
///
/// Two publishers are the same if they have the same code, regardless of any other field.
#[derive(Clone, Debug, Getters)]
pub(crate) struct Publisher {
    /// Primary key.
    id: EntityId,

    /// Optimistic concurrency counter.
    version: Version,

    /// Unique registrant code.
    code: PublisherCode,

    /// Display name.
    name: String,
}

impl Publisher {
    /// Creates a new publisher, validating that its `name` is not blank.
    pub(crate) fn new<S: Into<String>>(
        id: EntityId,
        version: Version,
        code: PublisherCode,
        name: S,
    ) -> ModelResult<Self> {
        let name = validate_name(name.into())?;
        Ok(Self { id, version, code, name })
    }

    /// Replaces the version of the publisher.
    pub(crate) fn with_version(self, version: Version) -> Self {
        Self { version, ..self }
    }
}

impl PartialEq for Publisher {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Publisher {}

impl Hash for Publisher {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

/// Validates and normalizes the name of a publisher.
fn validate_name(name: String) -> ModelResult<String> {
    match blank_to_none(Some(name)) {
        Some(name) => Ok(name),
        None => Err(ModelError("Name cannot be blank".to_owned())),
    }
}

/// Untrusted values for the fields of a publisher, as received from a client.
#[derive(Debug, Default, Deserialize, Serialize)]
pub(crate) struct PublisherFields {
    /// Raw publisher code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) code: Option<String>,

    /// Raw publisher name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) name: Option<String>,
}

/// Validated contents of a publisher that has not been stored yet.
#[derive(Debug, Getters, PartialEq)]
pub(crate) struct PublisherDraft {
    /// Unique registrant code.
    code: PublisherCode,

    /// Display name.
    name: String,
}

impl PublisherDraft {
    /// Validates all `fields` and reports every problem found.
    pub(crate) fn new(fields: PublisherFields) -> Result<Self, Violations> {
        let mut violations = Violations::default();

        let code = match fields.code.as_deref() {
            Some(raw) => violations.check("code", Some(raw), PublisherCode::new(raw)),
            None => {
                violations.add("code", "Cannot be missing", None);
                None
            }
        };
        let name = violations.check(
            "name",
            fields.name.as_deref(),
            validate_name(fields.name.clone().unwrap_or_default()),
        );

        match (code, name) {
            (Some(code), Some(name)) if violations.is_empty() => Ok(Self { code, name }),
            _ => Err(violations),
        }
    }

    /// Turns the draft into a publisher identified by `id` at its initial version.
    pub(crate) fn into_publisher(self, id: EntityId) -> Publisher {
        Publisher { id, version: Version::initial(), code: self.code, name: self.name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_publisher_code_ok() {
        assert_eq!("01234", PublisherCode::new("01234").unwrap().as_str());
    }

    #[test]
    fn test_publisher_code_errors() {
        for raw in ["", "1234", "123456", "1234a", " 1234"] {
            assert_eq!(
                "Publisher code must consist of exactly 5 digits",
                PublisherCode::new(raw).unwrap_err().0,
                "Input was {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_publisher_name_is_trimmed_and_required() {
        let code = PublisherCode::new("12345").unwrap();
        let publisher =
            Publisher::new(EntityId::generate(), Version::initial(), code.clone(), "  Pax ")
                .unwrap();
        assert_eq!("Pax", publisher.name());

        assert_eq!(
            "Name cannot be blank",
            Publisher::new(EntityId::generate(), Version::initial(), code, " ").unwrap_err().0
        );
    }

    #[test]
    fn test_publisher_identity_is_code() {
        let code = PublisherCode::new("12345").unwrap();
        let p1 = Publisher::new(EntityId::generate(), Version::initial(), code.clone(), "First")
            .unwrap();
        let p2 = Publisher::new(EntityId::generate(), Version::new(7).unwrap(), code, "Second")
            .unwrap();
        let p3 = Publisher::new(
            p1.id().clone(),
            Version::initial(),
            PublisherCode::new("54321").unwrap(),
            "First",
        )
        .unwrap();
        assert_eq!(p1, p2);
        assert_ne!(p1, p3);

        let set: HashSet<Publisher> = [p1, p2, p3].into_iter().collect();
        assert_eq!(2, set.len());
    }

    #[test]
    fn test_publisher_draft_ok() {
        let draft = PublisherDraft::new(PublisherFields {
            code: Some("82530".to_owned()),
            name: Some("Pax".to_owned()),
        })
        .unwrap();
        let id = EntityId::generate();
        let publisher = draft.into_publisher(id.clone());
        assert_eq!(&id, publisher.id());
        assert_eq!(Version::initial(), *publisher.version());
        assert_eq!("82530", publisher.code().as_str());
        assert_eq!("Pax", publisher.name());
    }

    #[test]
    fn test_publisher_draft_collects_all_violations() {
        let violations = PublisherDraft::new(PublisherFields {
            code: Some("abc".to_owned()),
            name: Some("   ".to_owned()),
        })
        .unwrap_err()
        .into_inner();
        assert_eq!(2, violations.len());
        assert_eq!("code", violations[0].path);
        assert_eq!(Some("abc".to_owned()), violations[0].invalid_value);
        assert_eq!("name", violations[1].path);
    }

    #[test]
    fn test_publisher_draft_missing_fields() {
        let violations = PublisherDraft::new(PublisherFields::default()).unwrap_err().into_inner();
        let paths = violations.iter().map(|v| v.path.as_str()).collect::<Vec<&str>>();
        assert_eq!(vec!["code", "name"], paths);
    }
}
