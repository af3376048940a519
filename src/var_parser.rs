//! Typed values and the parsers that produce them
//!
//! A directive declares one [`VarType`]; its DEFAULT and both sides of its
//! VALUE-ALIASES are coerced into [`Value`]s of that type by a [`VarParser`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declared type of a directive
///
/// Tags outside the known set are kept as [`VarType::Other`]; whether they
/// mean anything is up to the [`VarParser`] that later reads a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VarType {
    /// Single-line string
    String,
    /// Case-insensitive string, stored lowercased
    IString,
    /// Multi-line string
    Text,
    /// Case-insensitive multi-line string, stored lowercased
    IText,
    Int,
    Float,
    Bool,
    /// Set of strings
    Lookup,
    /// Ordered list of strings
    List,
    /// String to string map
    Hash,
    /// Anything; kept as raw text
    Mixed,
    /// Unrecognized tag, stored as written
    Other(String),
}

impl VarType {
    pub const KNOWN: [VarType; 11] = [
        VarType::String,
        VarType::IString,
        VarType::Text,
        VarType::IText,
        VarType::Int,
        VarType::Float,
        VarType::Bool,
        VarType::Lookup,
        VarType::List,
        VarType::Hash,
        VarType::Mixed,
    ];

    /// Tag as written in a TYPE field
    pub fn as_str(&self) -> &str {
        match self {
            VarType::String => "string",
            VarType::IString => "istring",
            VarType::Text => "text",
            VarType::IText => "itext",
            VarType::Int => "int",
            VarType::Float => "float",
            VarType::Bool => "bool",
            VarType::Lookup => "lookup",
            VarType::List => "list",
            VarType::Hash => "hash",
            VarType::Mixed => "mixed",
            VarType::Other(tag) => tag,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, VarType::Other(_))
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for VarType {
    fn from(tag: &str) -> Self {
        VarType::KNOWN
            .into_iter()
            .find(|t| t.as_str() == tag)
            .unwrap_or_else(|| VarType::Other(tag.to_string()))
    }
}

impl From<String> for VarType {
    fn from(tag: String) -> Self {
        VarType::from(tag.as_str())
    }
}

impl From<VarType> for String {
    fn from(var_type: VarType) -> Self {
        var_type.as_str().to_string()
    }
}

/// A value of some [`VarType`]
///
/// Floats compare and hash by bit pattern so values can key a map.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<String>),
    Lookup(BTreeSet<String>),
    Hash(BTreeMap<String, String>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Lookup(a), Value::Lookup(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::List(items) => items.hash(state),
            Value::Lookup(items) => items.hash(state),
            Value::Hash(map) => map.hash(state),
        }
    }
}

/// Typed-value parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VarParserError {
    #[error("Unknown type '{0}'")]
    UnknownType(String),

    #[error("Expected type {expected}, got '{raw}'")]
    Expected { expected: VarType, raw: String },

    #[error("Malformed hash entry '{0}', expected key:value")]
    MalformedHashEntry(String),
}

/// Converts raw literal text into a [`Value`] of a declared type
pub trait VarParser {
    fn parse(&self, raw: &str, var_type: &VarType, allows_null: bool) -> Result<Value, VarParserError>;
}

/// Lenient parser for human-authored text
///
/// Scalars are read from their obvious textual form; collections are
/// comma-separated (or newline-separated when the text spans lines).
#[derive(Debug, Clone, Copy, Default)]
pub struct FlexibleParser;

impl FlexibleParser {
    pub fn new() -> Self {
        Self
    }

    fn items(raw: &str) -> Vec<&str> {
        let pieces: Vec<&str> = if raw.contains(['\n', '\r']) {
            raw.split(|c: char| c == ',' || c == '\n' || c == '\r').collect()
        } else {
            raw.split(',').collect()
        };
        pieces
            .into_iter()
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect()
    }

    fn expected(var_type: &VarType, raw: &str) -> VarParserError {
        VarParserError::Expected {
            expected: var_type.clone(),
            raw: raw.to_string(),
        }
    }
}

impl VarParser for FlexibleParser {
    fn parse(&self, raw: &str, var_type: &VarType, allows_null: bool) -> Result<Value, VarParserError> {
        let trimmed = raw.trim();
        if allows_null && trimmed.eq_ignore_ascii_case("null") {
            return Ok(Value::Null);
        }

        match var_type {
            VarType::String | VarType::Text | VarType::Mixed => Ok(Value::String(raw.to_string())),
            VarType::IString | VarType::IText => Ok(Value::String(raw.to_lowercase())),
            VarType::Int => trimmed
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| Self::expected(var_type, raw)),
            VarType::Float => trimmed
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| Self::expected(var_type, raw)),
            VarType::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "off" | "no" => Ok(Value::Bool(false)),
                _ => Err(Self::expected(var_type, raw)),
            },
            VarType::List => Ok(Value::List(
                Self::items(raw).into_iter().map(String::from).collect(),
            )),
            VarType::Lookup => Ok(Value::Lookup(
                Self::items(raw).into_iter().map(String::from).collect(),
            )),
            VarType::Hash => {
                let mut map = BTreeMap::new();
                for item in Self::items(raw) {
                    let (key, value) = item
                        .split_once(':')
                        .ok_or_else(|| VarParserError::MalformedHashEntry(item.to_string()))?;
                    map.insert(key.trim().to_string(), value.trim().to_string());
                }
                Ok(Value::Hash(map))
            }
            VarType::Other(tag) => Err(VarParserError::UnknownType(tag.clone())),
        }
    }
}
