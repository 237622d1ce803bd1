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

//! Generic types shared by the model layers of all services.
//!
//! Simple newtypes report a single problem via `ModelError`.  Composite entities built from
//! untrusted input report every problem they find at once via `Violations`, so that callers can
//! present an itemized list back to the user.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Model errors.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct ModelError(pub String);

/// Result type for this module.
pub type ModelResult<T> = Result<T, ModelError>;

/// A single validation problem affecting one field of an entity.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Name of the field that failed validation, such as `isbn` or `publisher.code`.
    pub path: String,

    /// Description of the problem.
    pub message: String,

    /// The value that was rejected, if there was one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_value: Option<String>,
}

/// Collection of validation problems found while building an entity.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    /// Records a new problem for the field at `path`.
    pub fn add<P, M>(&mut self, path: P, message: M, invalid_value: Option<&str>)
    where
        P: Into<String>,
        M: Into<String>,
    {
        self.0.push(Violation {
            path: path.into(),
            message: message.into(),
            invalid_value: invalid_value.map(str::to_owned),
        });
    }

    /// Unwraps the outcome of validating the field at `path`, recording its error if any.
    ///
    /// The `raw` value is the untrusted input that was validated and is attached to the violation.
    pub fn check<T>(&mut self, path: &str, raw: Option<&str>, result: ModelResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.add(path, e.0, raw);
                None
            }
        }
    }

    /// Returns true if no problems have been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the recorded problems.
    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    /// Consumes the collection and returns the recorded problems.
    pub fn into_inner(self) -> Vec<Violation> {
        self.0
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed")?;
        for (i, v) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}: {}", sep, v.path, v.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

/// Returns `None` if `s` is absent or only contains whitespace, or the trimmed string otherwise.
pub fn blank_to_none<S: AsRef<str>>(s: Option<S>) -> Option<String> {
    s.and_then(|s| {
        let s = s.as_ref().trim();
        if s.is_empty() {
            None
        } else {
            Some(s.to_owned())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violations_check_collects_errors() {
        let mut violations = Violations::default();
        assert_eq!(Some(3), violations.check("ok", Some("3"), Ok(3)));
        assert_eq!(
            None::<u8>,
            violations.check("bad", Some("x"), Err(ModelError("Not a number".to_owned())))
        );
        assert!(!violations.is_empty());
        assert_eq!(
            vec![Violation {
                path: "bad".to_owned(),
                message: "Not a number".to_owned(),
                invalid_value: Some("x".to_owned()),
            }],
            violations.into_inner()
        );
    }

    #[test]
    fn test_violations_display() {
        let mut violations = Violations::default();
        assert_eq!("Validation failed", violations.to_string());

        violations.add("title", "Cannot be blank", None);
        violations.add("isbn", "Must have 13 digits", Some("123"));
        assert_eq!(
            "Validation failed: title: Cannot be blank; isbn: Must have 13 digits",
            violations.to_string()
        );
    }

    #[test]
    fn test_violation_serialization_omits_missing_value() {
        let violation =
            Violation { path: "a".to_owned(), message: "b".to_owned(), invalid_value: None };
        assert_eq!(r#"{"path":"a","message":"b"}"#, serde_json::to_string(&violation).unwrap());
    }

    #[test]
    fn test_blank_to_none() {
        assert_eq!(None, blank_to_none(None::<&str>));
        assert_eq!(None, blank_to_none(Some("")));
        assert_eq!(None, blank_to_none(Some("  \t ")));
        assert_eq!(Some("foo".to_owned()), blank_to_none(Some(" foo ")));
    }
}
