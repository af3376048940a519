//! Directive identifiers
//!
//! An [`Id`] is a dotted name such as `HTML.Allowed` or
//! `Filter.ExtractStyleBlocks.Escaping`. Bare names (`Allowed`) are also
//! well-formed: the normalizer checks segment syntax only and leaves
//! qualification to whoever consumes the identifier.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Segment separator in dotted identifiers
pub const SEPARATOR: char = '.';

/// Identifier normalization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier '{0}' must be dot-separated segments of letters, digits and underscores")]
    Malformed(String),
}

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*$").expect("identifier pattern is valid")
    })
}

/// A normalized, immutable identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Id(String);

impl Id {
    /// Normalize a raw identifier string
    pub fn make(raw: &str) -> Result<Self, IdError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }
        if !id_pattern().is_match(trimmed) {
            return Err(IdError::Malformed(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Root namespace (`HTML` in `HTML.Allowed`), `None` for a bare name
    pub fn namespace(&self) -> Option<&str> {
        self.0.split_once(SEPARATOR).map(|(namespace, _)| namespace)
    }

    /// Everything after the root namespace, or the whole name when bare
    pub fn directive(&self) -> &str {
        self.0
            .split_once(SEPARATOR)
            .map(|(_, directive)| directive)
            .unwrap_or(&self.0)
    }

    pub fn is_qualified(&self) -> bool {
        self.namespace().is_some()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Id {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::make(s)
    }
}

impl TryFrom<String> for Id {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::make(&value)
    }
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_trims_whitespace() {
        let id = Id::make("  HTML.Allowed \n").unwrap();
        assert_eq!(id.as_str(), "HTML.Allowed");
        assert_eq!(id, Id::make("HTML.Allowed").unwrap());
    }

    #[test]
    fn test_namespace_and_directive() {
        let id = Id::make("Filter.ExtractStyleBlocks.Escaping").unwrap();
        assert_eq!(id.namespace(), Some("Filter"));
        assert_eq!(id.directive(), "ExtractStyleBlocks.Escaping");
        assert!(id.is_qualified());
    }

    #[test]
    fn test_bare_names_are_accepted() {
        let id = Id::make("Allowed").unwrap();
        assert_eq!(id.namespace(), None);
        assert_eq!(id.directive(), "Allowed");
        assert!(!id.is_qualified());
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(Id::make("   "), Err(IdError::Empty));
        for raw in ["HTML.", ".Allowed", "HTML..Allowed", "HTML.Al lowed", "HTML.Allowed!"] {
            assert!(matches!(Id::make(raw), Err(IdError::Malformed(_))), "{raw}");
        }
    }
}
