//! Schema fragment records
//!
//! A [`Record`] is the flat key/value form of one schema fragment. Reading a
//! value through [`Record::get`] marks its key as accessed, which is what
//! lets the builder report keys it never looked at.
//!
//! ## Fragment text
//!
//! [`Record::parse`] reads the hand-written form:
//!
//! ```text
//! HTML.Allowed
//! TYPE: itext/null
//! VERSION: 2.0.0
//! DEFAULT: NULL
//! --DESCRIPTION--
//! Whitelist of elements and attributes,
//! one entry per line.
//! --# comments like this are skipped
//! ----
//! ```

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;

// =============================================================================
// Field Table
// =============================================================================

/// A recognized record key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Type,
    Default,
    Description,
    Allowed,
    ValueAliases,
    Aliases,
    Version,
    DeprecatedUse,
    DeprecatedVersion,
}

/// How a fragment kind treats a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    Required,
    Optional,
    /// Never read; reported by the unused-key audit if present
    Ignored,
}

/// One row of [`FIELD_TABLE`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: Field,
    pub namespace: Usage,
    pub directive: Usage,
}

const fn row(field: Field, namespace: Usage, directive: Usage) -> FieldSpec {
    FieldSpec {
        field,
        namespace,
        directive,
    }
}

/// Every recognized field, in the order directive fields are processed
pub const FIELD_TABLE: [FieldSpec; 10] = [
    row(Field::Id, Usage::Required, Usage::Required),
    row(Field::Type, Usage::Ignored, Usage::Required),
    row(Field::Default, Usage::Ignored, Usage::Optional),
    row(Field::Description, Usage::Optional, Usage::Optional),
    row(Field::Allowed, Usage::Ignored, Usage::Optional),
    row(Field::ValueAliases, Usage::Ignored, Usage::Optional),
    row(Field::Aliases, Usage::Ignored, Usage::Optional),
    row(Field::Version, Usage::Ignored, Usage::Optional),
    row(Field::DeprecatedUse, Usage::Ignored, Usage::Optional),
    row(Field::DeprecatedVersion, Usage::Ignored, Usage::Optional),
];

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Id,
        Field::Type,
        Field::Default,
        Field::Description,
        Field::Allowed,
        Field::ValueAliases,
        Field::Aliases,
        Field::Version,
        Field::DeprecatedUse,
        Field::DeprecatedVersion,
    ];

    /// Key as written in a fragment
    pub const fn key(self) -> &'static str {
        match self {
            Field::Id => "ID",
            Field::Type => "TYPE",
            Field::Default => "DEFAULT",
            Field::Description => "DESCRIPTION",
            Field::Allowed => "ALLOWED",
            Field::ValueAliases => "VALUE-ALIASES",
            Field::Aliases => "ALIASES",
            Field::Version => "VERSION",
            Field::DeprecatedUse => "DEPRECATED-USE",
            Field::DeprecatedVersion => "DEPRECATED-VERSION",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.key() == key)
    }

    pub fn usage(self) -> &'static FieldSpec {
        // FIELD_TABLE lists every variant exactly once, in declaration order
        &FIELD_TABLE[self as usize]
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// Record
// =============================================================================

/// Ordered key/value fragment with access tracking
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    values: IndexMap<String, String>,
    accessed: HashSet<String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value; replacing keeps the key's original position
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Existence check; does not count as an access
    pub fn contains(&self, field: Field) -> bool {
        self.contains_key(field.key())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Read a field, marking it accessed
    pub fn get(&mut self, field: Field) -> Option<&str> {
        self.get_key(field.key())
    }

    /// Read any key, marking it accessed
    pub fn get_key(&mut self, key: &str) -> Option<&str> {
        let value = self.values.get(key)?;
        if !self.accessed.contains(key) {
            self.accessed.insert(key.to_string());
        }
        Some(value.as_str())
    }

    /// Read a value without marking it accessed
    pub fn peek(&self, field: Field) -> Option<&str> {
        self.values.get(field.key()).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_accessed(&self, key: &str) -> bool {
        self.accessed.contains(key)
    }

    /// Accessed keys, in record order
    pub fn accessed(&self) -> impl Iterator<Item = &str> {
        self.keys().filter(|key| self.is_accessed(key))
    }

    /// Keys never read, in record order
    pub fn unused_keys(&self) -> impl Iterator<Item = &str> {
        self.keys().filter(|key| !self.is_accessed(key))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse fragment text into a record
    ///
    /// The first line without a colon outside a `--KEY--` block is taken as
    /// the ID. Later colon-free lines become empty-valued keys of their own,
    /// so the unused-key audit reports them. Parsing stops at a `----` line.
    pub fn parse(text: &str) -> Self {
        let mut record = Record::new();
        let mut block: Option<(String, String)> = None;

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line == "----" {
                break;
            }
            if line.starts_with("--#") {
                continue;
            }
            if line.starts_with("--") {
                if let Some((key, value)) = block.take() {
                    record.insert(key, value.trim_end());
                }
                let key = line.trim_matches(|c: char| c == '-' || c == ' ');
                block = Some((key.to_string(), String::new()));
                continue;
            }
            if let Some((_, value)) = block.as_mut() {
                value.push_str(line);
                value.push('\n');
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            match line.split_once(':') {
                Some((key, value)) => record.insert(key.trim(), value.trim()),
                None if !record.contains(Field::Id) => record.insert(Field::Id.key(), line.trim()),
                None => record.insert(line.trim(), ""),
            }
        }

        if let Some((key, value)) = block {
            record.insert(key, value.trim_end());
        }
        record
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}
