//! Error types for the schema builder

use thiserror::Error;

use crate::id::{Id, IdError};
use crate::literal::LiteralError;
use crate::record::Field;
use crate::var_parser::VarParserError;

/// Result type for builder operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema builder errors
///
/// Every variant that occurs after the directive's ID has been normalized
/// carries that ID, so a failed load can point at the offending fragment.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Hash does not have any ID")]
    MissingId,

    #[error("TYPE in directive hash '{id}' not defined")]
    MissingType { id: Id },

    #[error("Malformed identifier '{raw}' in {field}: {source}")]
    MalformedId {
        field: Field,
        raw: String,
        /// Set when the malformed value is DEPRECATED-USE of an already named directive
        id: Option<Id>,
        #[source]
        source: IdError,
    },

    #[error("Malformed alias '{alias}' in ALIASES in directive hash '{id}': {source}")]
    MalformedAlias {
        id: Id,
        alias: String,
        #[source]
        source: IdError,
    },

    #[error("{source} in TYPE/DEFAULT in directive hash '{id}'")]
    InvalidDefault {
        id: Id,
        raw: String,
        #[source]
        source: VarParserError,
    },

    #[error("{source} in {alias} => {value} in VALUE-ALIASES in directive hash '{id}'")]
    InvalidValueAlias {
        id: Id,
        alias: String,
        value: String,
        #[source]
        source: VarParserError,
    },

    #[error("{source} in {field} in directive hash '{id}'")]
    LiteralSyntax {
        id: Id,
        field: Field,
        #[source]
        source: LiteralError,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    /// The directive the error belongs to, when it was known at the point of failure
    pub fn directive_id(&self) -> Option<&Id> {
        match self {
            SchemaError::MissingType { id }
            | SchemaError::MalformedAlias { id, .. }
            | SchemaError::InvalidDefault { id, .. }
            | SchemaError::InvalidValueAlias { id, .. }
            | SchemaError::LiteralSyntax { id, .. } => Some(id),
            SchemaError::MalformedId { id, .. } => id.as_ref(),
            SchemaError::MissingId | SchemaError::Json(_) => None,
        }
    }
}
