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

//! Search criteria and pagination.

use catalog_core::model::ModelError;
use std::fmt;
use std::str::FromStr;

/// Field selector that controls which attribute of a book a free-text search matches against.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SearchType {
    /// Matches any of the other fields.
    Any,

    /// Matches the ISBN.
    Isbn,

    /// Matches the title.
    Title,

    /// Matches the author.
    Author,

    /// Matches the summary.
    Summary,

    /// Matches the code of the publisher.
    PublisherCode,

    /// Matches the name of the publisher.
    PublisherName,
}

impl SearchType {
    /// All search types, in the order in which they are advertised to clients.
    pub(crate) const ALL: [SearchType; 7] = [
        SearchType::Any,
        SearchType::Isbn,
        SearchType::Title,
        SearchType::Author,
        SearchType::Summary,
        SearchType::PublisherCode,
        SearchType::PublisherName,
    ];

    /// Returns the token that identifies this search type in URLs.
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            SearchType::Any => "any",
            SearchType::Isbn => "isbn",
            SearchType::Title => "title",
            SearchType::Author => "author",
            SearchType::Summary => "summary",
            SearchType::PublisherCode => "publisher.code",
            SearchType::PublisherName => "publisher.name",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SearchType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ModelError(format!("Unknown search type '{}'", s)))
    }
}

/// Window of results to return from a query.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Page {
    /// Number of results to skip.  Never negative.
    offset: i64,

    /// Maximum number of results to return.  Always positive.
    limit: i64,
}

impl Page {
    /// Number of results returned when the client does not ask for a specific limit.
    pub(crate) const DEFAULT_LIMIT: i64 = 20;

    /// Creates a page from optional client-supplied values, applying defaults and clamping them to
    /// their valid ranges.
    pub(crate) fn new(offset: Option<i64>, limit: Option<i64>) -> Self {
        let offset = offset.unwrap_or(0).max(0);
        let limit = limit.unwrap_or(Self::DEFAULT_LIMIT).max(1);
        Self { offset, limit }
    }

    /// Returns the number of results to skip.
    pub(crate) fn offset(&self) -> i64 {
        self.offset
    }

    /// Returns the maximum number of results to return.
    pub(crate) fn limit(&self) -> i64 {
        self.limit
    }

    /// Returns the page before this one, if this is not the first one.
    pub(crate) fn prev(&self) -> Option<Page> {
        if self.offset > 0 {
            Some(Page { offset: (self.offset - self.limit).max(0), limit: self.limit })
        } else {
            None
        }
    }

    /// Returns the page after this one given the number of results `returned` for this page.
    ///
    /// A full page suggests that more results may exist, so this yields a next page whenever
    /// `returned` reaches the limit.  This can produce a trailing empty page when the total
    /// number of results is a multiple of the limit.
    pub(crate) fn next(&self, returned: usize) -> Option<Page> {
        let returned = i64::try_from(returned).unwrap_or(i64::MAX);
        if returned >= self.limit {
            Some(Page { offset: self.offset.saturating_add(self.limit), limit: self.limit })
        } else {
            None
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}
