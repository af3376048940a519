//! Purifier Schema Builder
//!
//! Turns hand-written configuration schema fragments into typed namespace
//! and directive definitions.
//!
//! ## Features
//!
//! - **Fragment Records**: Ordered key/value fragments with access tracking
//! - **Typed Directives**: DEFAULT and VALUE-ALIASES coerced to the declared TYPE
//! - **Safe Literals**: ALLOWED / VALUE-ALIASES read by a non-executing grammar
//! - **Unused-Key Audit**: Keys the builder never read are reported, not fatal
//!
//! ## Example
//!
//! ```
//! use purifier_schema::{Interchange, InterchangeBuilder, Value};
//!
//! let mut interchange = Interchange::new();
//! let mut builder = InterchangeBuilder::new();
//! builder
//!     .build_text(&mut interchange, "Core.Encoding\nTYPE: istring\nDEFAULT: UTF-8\n")
//!     .unwrap();
//!
//! let directive = &interchange.directives()[0];
//! assert_eq!(directive.default, Some(Value::String("utf-8".into())));
//! ```

pub mod audit;
pub mod builder;
pub mod config;
pub mod error;
pub mod id;
pub mod interchange;
pub mod literal;
pub mod record;
pub mod var_parser;

pub use audit::{CollectingReporter, Diagnostic, Reporter, Severity, TracingReporter};
pub use builder::InterchangeBuilder;
pub use config::BuilderConfig;
pub use error::{Result, SchemaError};
pub use id::{Id, IdError};
pub use interchange::{Directive, Interchange, Namespace};
pub use literal::{Literal, LiteralArray, LiteralError, LiteralEvaluator};
pub use record::{Field, Record, FIELD_TABLE};
pub use var_parser::{FlexibleParser, Value, VarParser, VarParserError, VarType};
