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

//! Data types for the Collection+JSON hypermedia representation.
//!
//! A document carries a `collection` with its own `href`, navigational `links`, the `items` that
//! compose it, the `queries` a client may issue next and a `template` describing how to write new
//! items.  Every value is rendered as a string.

use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::Json;
#[cfg(test)]
use serde::Deserialize;
use serde::Serialize;
use url::Url;

/// Media type of Collection+JSON documents.
pub(crate) const MEDIA_TYPE: &str = "application/vnd.collection+json";

/// Version of the Collection+JSON format we emit.
const VERSION: &str = "1.0";

/// Top-level Collection+JSON document.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub(crate) struct CollectionJson {
    /// The only collection in the document.
    pub(crate) collection: Collection,
}

impl IntoResponse for CollectionJson {
    fn into_response(self) -> Response {
        ([(CONTENT_TYPE, MEDIA_TYPE)], Json(self)).into_response()
    }
}

/// A collection of items with its hypermedia controls.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub(crate) struct Collection {
    /// Version of the format.
    pub(crate) version: String,

    /// Canonical URL of this collection.
    pub(crate) href: String,

    /// Navigational links, such as those to adjacent pages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) links: Vec<Link>,

    /// Items in the collection.
    #[serde(default)]
    pub(crate) items: Vec<Item>,

    /// Queries that can be issued against the collection.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) queries: Vec<Query>,

    /// Description of the fields needed to write a new item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) template: Option<Template>,
}

impl Collection {
    /// Creates an empty collection whose canonical URL is `href`.
    pub(crate) fn new(href: Url) -> Self {
        Self {
            version: VERSION.to_owned(),
            href: href.to_string(),
            links: vec![],
            items: vec![],
            queries: vec![],
            template: None,
        }
    }

    /// Adds the navigational `links` to the collection.
    pub(crate) fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links.extend(links);
        self
    }

    /// Adds the `items` to the collection.
    pub(crate) fn with_items(mut self, items: Vec<Item>) -> Self {
        self.items.extend(items);
        self
    }

    /// Adds the `queries` to the collection.
    pub(crate) fn with_queries(mut self, queries: Vec<Query>) -> Self {
        self.queries.extend(queries);
        self
    }

    /// Sets the write `template` of the collection.
    pub(crate) fn with_template(mut self, template: Template) -> Self {
        self.template = Some(template);
        self
    }
}

impl From<Collection> for CollectionJson {
    fn from(collection: Collection) -> Self {
        Self { collection }
    }
}

/// A link to a related resource.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize, PartialEq))]
pub(crate) struct Link {
    /// Relation of the target to the resource holding the link.
    pub(crate) rel: String,

    /// Target of the link.
    pub(crate) href: String,

    /// Human-readable label for the link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) prompt: Option<String>,
}

impl Link {
    /// Creates a link to `href` with relation `rel` and an optional human `prompt`.
    pub(crate) fn new<R: Into<String>>(rel: R, href: Url, prompt: Option<&str>) -> Self {
        Self { rel: rel.into(), href: href.to_string(), prompt: prompt.map(str::to_owned) }
    }
}

/// A named value, possibly labeled for humans.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize, PartialEq))]
pub(crate) struct Data {
    /// Name of the field.
    pub(crate) name: String,

    /// Value of the field, if it has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) value: Option<String>,

    /// Human-readable label for the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) prompt: Option<String>,
}

impl Data {
    /// Creates a field `name` with `value` labeled as `prompt`.
    pub(crate) fn new<V: Into<String>>(name: &str, value: Option<V>, prompt: Option<&str>) -> Self {
        Self {
            name: name.to_owned(),
            value: value.map(Into::into),
            prompt: prompt.map(str::to_owned),
        }
    }
}

/// A resource within a collection.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub(crate) struct Item {
    /// Canonical URL of the resource.
    pub(crate) href: String,

    /// Fields of the resource.
    pub(crate) data: Vec<Data>,

    /// Links to related resources.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) links: Vec<Link>,
}

impl Item {
    /// Creates an item for the resource at `href` with its `data` fields and related `links`.
    pub(crate) fn new(href: Url, data: Vec<Data>, links: Vec<Link>) -> Self {
        Self { href: href.to_string(), data, links }
    }

    /// Gets the value of the field `name`, if present.
    #[cfg(test)]
    pub(crate) fn value(&self, name: &str) -> Option<&str> {
        self.data.iter().find(|d| d.name == name).and_then(|d| d.value.as_deref())
    }

    /// Gets the target of the link with relation `rel`, if present.
    #[cfg(test)]
    pub(crate) fn link(&self, rel: &str) -> Option<&str> {
        self.links.iter().find(|l| l.rel == rel).map(|l| l.href.as_str())
    }
}

/// A parameterized query that clients can fill in and issue.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub(crate) struct Query {
    /// Relation of the query to the collection.
    pub(crate) rel: String,

    /// Target of the query.
    pub(crate) href: String,

    /// Human-readable label for the query.
    pub(crate) prompt: String,

    /// Parameters of the query.
    pub(crate) data: Vec<Data>,
}

/// Description of the fields that make up a new item.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub(crate) struct Template {
    /// Fields to fill in.
    pub(crate) data: Vec<Data>,
}

/// Gets the target of the link with relation `rel` in `links`, if present.
#[cfg(test)]
pub(crate) fn find_link<'a>(links: &'a [Link], rel: &str) -> Option<&'a str> {
    links.iter().find(|l| l.rel == rel).map(|l| l.href.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_serialization_skips_empty_parts() {
        let collection = Collection::new(Url::parse("http://example.com/api/books").unwrap());
        let json = serde_json::to_value(CollectionJson::from(collection)).unwrap();
        assert_eq!(
            json!({
                "collection": {
                    "version": "1.0",
                    "href": "http://example.com/api/books",
                    "items": [],
                }
            }),
            json
        );
    }

    #[test]
    fn test_item_serialization() {
        let href = Url::parse("http://example.com/api/books/1").unwrap();
        let item = Item::new(
            href.clone(),
            vec![
                Data::new("title", Some("Fonk"), Some("Title")),
                Data::new::<String>("summary", None, Some("Summary")),
            ],
            vec![Link::new("self", href, Some("This book"))],
        );
        assert_eq!(
            json!({
                "href": "http://example.com/api/books/1",
                "data": [
                    {"name": "title", "value": "Fonk", "prompt": "Title"},
                    {"name": "summary", "prompt": "Summary"},
                ],
                "links": [
                    {
                        "rel": "self",
                        "href": "http://example.com/api/books/1",
                        "prompt": "This book",
                    },
                ],
            }),
            serde_json::to_value(&item).unwrap()
        );
        assert_eq!(Some("Fonk"), item.value("title"));
        assert_eq!(None, item.value("summary"));
        assert_eq!(Some("http://example.com/api/books/1"), item.link("self"));
    }

    #[test]
    fn test_into_response_sets_media_type() {
        let collection = Collection::new(Url::parse("http://example.com/api/").unwrap());
        let response = CollectionJson::from(collection).into_response();
        assert_eq!(MEDIA_TYPE, response.headers().get(CONTENT_TYPE).unwrap().to_str().unwrap());
    }
}
