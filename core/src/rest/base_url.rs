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

//! The `BaseUrl` type.

use crate::env::get_required_var;
use url::Url;

/// Common error message for URLs built via hardcoded values.
const URL_MUST_BE_VALID: &str = "URLs built in-process must be valid";

/// Checks if `base` has the right format to be a base URL and returns an error if it is not.
fn ensure_valid_base(base: &Url) -> Result<(), String> {
    if base.cannot_be_a_base() || !base.path().ends_with('/') {
        return Err(format!("URL '{}' cannot be a base: missing trailing slash", base));
    }
    Ok(())
}

/// Contains the public base URL of a service and allows building absolute links within it.
///
/// Every hypermedia link emitted by a service is resolved against this base, so the value must
/// match the address clients use to reach the API root (such as `https://example.com/api/`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BaseUrl(Url);

impl BaseUrl {
    /// Creates a base URL from an already-parsed URL.
    pub fn new(base: Url) -> Result<Self, String> {
        ensure_valid_base(&base)?;
        Ok(Self(base))
    }

    /// Creates a base URL from the `<prefix>_BACKEND_BASE_URL` environment variable.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let base = get_required_var::<Url>(prefix, "BACKEND_BASE_URL")?;
        Self::new(base)
    }

    /// Creates a base URL from a fixed string, which must represent a valid URL.
    #[cfg(any(test, feature = "testutils"))]
    pub fn from_static(base: &'static str) -> Self {
        Self::new(Url::parse(base).unwrap()).unwrap()
    }

    /// Generates a URL given a `path`, which must be relative.  The `path` can be empty to obtain
    /// a reference to the root.
    pub fn make_url(&self, path: &str) -> Url {
        assert!(!path.starts_with('/'));
        self.0.join(path).expect(URL_MUST_BE_VALID)
    }

    /// Generates a URL given a relative `path` and a list of query `pairs`, which are encoded as
    /// necessary.  Produces no query string at all if `pairs` is empty.
    pub fn make_url_with_query<K, V>(&self, path: &str, pairs: &[(K, V)]) -> Url
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut url = self.make_url(path);
        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (k, v) in pairs {
                query.append_pair(k.as_ref(), v.as_ref());
            }
        }
        url
    }
}
