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

//! Books and their ISBNs.

use crate::model::{EntityId, Publisher, PublisherCode, Version};
use catalog_core::model::{blank_to_none, ModelError, ModelResult, Violations};
use derive_getters::Getters;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use time::{Date, Month};

/// Number of digits in an ISBN.
const ISBN_LENGTH: usize = 13;

/// International Standard Book Number, made of exactly 13 digits.
#[derive(Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct Isbn(String);

impl Isbn {
    /// Creates an ISBN from a raw string, validating its format.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.len() != ISBN_LENGTH || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ModelError(format!("ISBN must consist of exactly {} digits", ISBN_LENGTH)));
        }
        Ok(Self(s))
    }

    /// Returns a string view of the ISBN.
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the ISBN with its groups separated by dashes, as in `978-1-84688-366-8`.
    pub(crate) fn formatted(&self) -> String {
        let s = &self.0;
        format!("{}-{}-{}-{}-{}", &s[0..3], &s[3..4], &s[4..9], &s[9..12], &s[12..13])
    }

    /// Returns the publisher code embedded in the ISBN.
    ///
    /// This is only a default for submissions that omit the publisher: the publisher a book is
    /// attached to is stored separately and need not match this value.
    pub(crate) fn publisher_code(&self) -> PublisherCode {
        PublisherCode::from_isbn_digits(&self.0)
    }
}

/// Parses a publication date from either `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`.  The time part,
/// if any, is discarded.
pub(crate) fn parse_date(s: &str) -> ModelResult<Date> {
    let invalid = || ModelError(format!("Invalid date '{}'; expected YYYY-MM-DD", s));

    let date = match s.split_once('T') {
        Some((date, _time)) => date,
        None => s,
    };
    let mut parts = date.splitn(3, '-');
    let (year, month, day) = match (parts.next(), parts.next(), parts.next()) {
        (Some(y), Some(m), Some(d)) if y.len() == 4 && m.len() == 2 && d.len() == 2 => (y, m, d),
        _ => return Err(invalid()),
    };

    let year = year.parse::<i32>().map_err(|_| invalid())?;
    let month = month.parse::<u8>().map_err(|_| invalid())?;
    let day = day.parse::<u8>().map_err(|_| invalid())?;
    let month = Month::try_from(month).map_err(|_| invalid())?;
    Date::from_calendar_date(year, month, day).map_err(|_| invalid())
}

/// Validates and normalizes a required free-form text field.
fn validate_required(s: String) -> ModelResult<String> {
    match blank_to_none(Some(s)) {
        Some(s) => Ok(s),
        None => Err(ModelError("Cannot be blank".to_owned())),
    }
}

/// A book in the catalog.
///
/// Two books are the same if they have the same ISBN, regardless of any other field.
#[derive(Clone, Debug, Getters)]
pub(crate) struct Book {
    /// Primary key.
    id: EntityId,

    /// Optimistic concurrency counter.
    version: Version,

    /// Unique ISBN of the book.
    isbn: Isbn,

    /// Title of the book.
    title: String,

    /// Author or authors of the book.
    author: String,

    /// Date of publication, if known.
    published: Option<Date>,

    /// Translator or translators of the book, if any.
    translator: Option<String>,

    /// Summary of the contents of the book, if any.
    summary: Option<String>,

    /// Publisher of the book.
    publisher: Publisher,
}

impl Book {
    /// Creates a new book with its mandatory fields, validating that `title` and `author` are not
    /// blank.
    pub(crate) fn new<T: Into<String>, A: Into<String>>(
        id: EntityId,
        version: Version,
        isbn: Isbn,
        title: T,
        author: A,
        publisher: Publisher,
    ) -> ModelResult<Self> {
        let title =
            validate_required(title.into()).map_err(|e| ModelError(format!("Title: {}", e)))?;
        let author =
            validate_required(author.into()).map_err(|e| ModelError(format!("Author: {}", e)))?;
        Ok(Self {
            id,
            version,
            isbn,
            title,
            author,
            published: None,
            translator: None,
            summary: None,
            publisher,
        })
    }

    /// Sets the publication date.
    pub(crate) fn with_published(mut self, published: Option<Date>) -> Self {
        self.published = published;
        self
    }

    /// Sets the translator.  Blank values are treated as absent.
    pub(crate) fn with_translator<S: AsRef<str>>(mut self, translator: Option<S>) -> Self {
        self.translator = blank_to_none(translator);
        self
    }

    /// Sets the summary.  Blank values are treated as absent.
    pub(crate) fn with_summary<S: AsRef<str>>(mut self, summary: Option<S>) -> Self {
        self.summary = blank_to_none(summary);
        self
    }

    /// Replaces the version of the book.
    pub(crate) fn with_version(self, version: Version) -> Self {
        Self { version, ..self }
    }
}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        self.isbn == other.isbn
    }
}

impl Eq for Book {}

impl Hash for Book {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.isbn.hash(state);
    }
}

/// Untrusted values for the fields of a book, as received from a client either as a JSON document
/// or as a form.
#[derive(Debug, Default, Deserialize, Serialize)]
#[cfg_attr(test, derive(PartialEq))]
pub(crate) struct BookFields {
    /// Raw identifier of the book to update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) id: Option<String>,

    /// Version of the book the client based its update on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) version: Option<i64>,

    /// Raw ISBN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) isbn: Option<String>,

    /// Raw title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) title: Option<String>,

    /// Raw author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) author: Option<String>,

    /// Raw publication date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) published: Option<String>,

    /// Raw translator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) translator: Option<String>,

    /// Raw summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) summary: Option<String>,

    /// Raw code of the publisher of the book.
    #[serde(
        default,
        rename = "publisher-code",
        alias = "publisherCode",
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) publisher_code: Option<String>,
}

/// Validated contents of a book submitted by a client, which may or may not exist yet.
#[derive(Debug, Getters)]
pub(crate) struct BookDraft {
    /// Identifier of the book to update, if the client knows it.
    id: Option<EntityId>,

    /// Version of the book the client based its update on, if any.
    version: Option<Version>,

    /// Unique ISBN of the book.
    isbn: Isbn,

    /// Title of the book.
    title: String,

    /// Author or authors of the book.
    author: String,

    /// Date of publication, if known.
    published: Option<Date>,

    /// Translator or translators of the book, if any.
    translator: Option<String>,

    /// Summary of the contents of the book, if any.
    summary: Option<String>,

    /// Code of the publisher of the book.
    publisher_code: PublisherCode,
}

impl BookDraft {
    /// Validates all `fields` and reports every problem found.
    pub(crate) fn new(fields: BookFields) -> Result<Self, Violations> {
        let mut violations = Violations::default();

        let id = match fields.id.as_deref() {
            Some(raw) if !raw.is_empty() => violations.check("id", Some(raw), EntityId::new(raw)),
            _ => None,
        };
        let version = match fields.version {
            Some(raw) => {
                violations.check("version", Some(&raw.to_string()), Version::new(raw)).map(Some)
            }
            None => Some(None),
        };

        let isbn = match fields.isbn.as_deref() {
            Some(raw) => violations.check("isbn", Some(raw), Isbn::new(raw)),
            None => {
                violations.add("isbn", "Cannot be missing", None);
                None
            }
        };
        let title = violations.check(
            "title",
            fields.title.as_deref(),
            validate_required(fields.title.clone().unwrap_or_default()),
        );
        let author = violations.check(
            "author",
            fields.author.as_deref(),
            validate_required(fields.author.clone().unwrap_or_default()),
        );
        let published = match blank_to_none(fields.published.as_deref()) {
            Some(raw) => violations.check("published", Some(&raw), parse_date(&raw)).map(Some),
            None => Some(None),
        };
        let publisher_code = match fields.publisher_code.as_deref() {
            Some(raw) => violations.check("publisher.code", Some(raw), PublisherCode::new(raw)),
            None => isbn.as_ref().map(Isbn::publisher_code),
        };

        match (version, isbn, title, author, published, publisher_code) {
            (
                Some(version),
                Some(isbn),
                Some(title),
                Some(author),
                Some(published),
                Some(publisher_code),
            ) if violations.is_empty() => Ok(Self {
                id,
                version,
                isbn,
                title,
                author,
                published,
                translator: blank_to_none(fields.translator),
                summary: blank_to_none(fields.summary),
                publisher_code,
            }),
            _ => Err(violations),
        }
    }

    /// Turns the draft into a book identified by `id` at `version` and attached to `publisher`.
    ///
    /// The `publisher` must be the one whose code was named in the draft.
    pub(crate) fn into_book(self, id: EntityId, version: Version, publisher: Publisher) -> Book {
        debug_assert_eq!(&self.publisher_code, publisher.code());
        Book {
            id,
            version,
            isbn: self.isbn,
            title: self.title,
            author: self.author,
            published: self.published,
            translator: self.translator,
            summary: self.summary,
            publisher,
        }
    }
}
