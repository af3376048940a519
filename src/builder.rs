//! Fragment builder
//!
//! Turns one [`Record`] into a [`Namespace`] or [`Directive`] and appends it
//! to an [`Interchange`]. The record's ID picks the path: no dot means a
//! namespace, anything dotted is a directive. Directive fields are processed
//! in [`FIELD_TABLE`] order, and nothing is appended unless every field
//! validates.

use indexmap::IndexMap;

use crate::audit::{find_unused, Reporter, TracingReporter};
use crate::config::BuilderConfig;
use crate::error::{Result, SchemaError};
use crate::id::{Id, SEPARATOR};
use crate::interchange::{Directive, Interchange, Namespace};
use crate::literal::{LiteralArray, LiteralEvaluator};
use crate::record::{Field, Record, Usage, FIELD_TABLE};
use crate::var_parser::{FlexibleParser, Value, VarParser, VarType};

/// Separates the type tag from the nullable marker in TYPE (`int/null`)
pub const TYPE_SEPARATOR: char = '/';

/// Builds interchange entities from schema fragment records
pub struct InterchangeBuilder<P = FlexibleParser, R = TracingReporter> {
    var_parser: P,
    reporter: R,
    evaluator: LiteralEvaluator,
    config: BuilderConfig,
}

impl InterchangeBuilder {
    pub fn new() -> Self {
        Self::with_config(BuilderConfig::default())
    }

    pub fn with_config(config: BuilderConfig) -> Self {
        Self::with_parts(FlexibleParser::new(), TracingReporter, config)
    }
}

impl Default for InterchangeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: VarParser, R: Reporter> InterchangeBuilder<P, R> {
    pub fn with_parts(var_parser: P, reporter: R, config: BuilderConfig) -> Self {
        Self {
            var_parser,
            reporter,
            evaluator: LiteralEvaluator::new(config.literal.max_depth),
            config,
        }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut R {
        &mut self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// Build one record into `interchange`, then audit it for unused keys
    pub fn build(&mut self, interchange: &mut Interchange, mut record: Record) -> Result<()> {
        let is_directive = record
            .peek(Field::Id)
            .ok_or(SchemaError::MissingId)?
            .contains(SEPARATOR);

        if is_directive {
            self.build_directive(interchange, &mut record)?;
        } else {
            self.build_namespace(interchange, &mut record)?;
        }
        self.audit(&record);
        Ok(())
    }

    /// Parse fragment text and build it
    pub fn build_text(&mut self, interchange: &mut Interchange, text: &str) -> Result<()> {
        self.build(interchange, Record::parse(text))
    }

    /// Build a namespace; the ID is used verbatim as its name
    pub fn build_namespace(&self, interchange: &mut Interchange, record: &mut Record) -> Result<()> {
        let name = record.get(Field::Id).ok_or(SchemaError::MissingId)?;
        let mut namespace = Namespace::new(name);

        for spec in &FIELD_TABLE {
            if spec.namespace != Usage::Optional {
                continue;
            }
            if let Some(raw) = record.get(spec.field) {
                apply_namespace(&mut namespace, spec.field, raw);
            }
        }

        tracing::debug!(namespace = %namespace.name, "built namespace");
        interchange.add_namespace(namespace);
        Ok(())
    }

    /// Build a directive
    pub fn build_directive(&self, interchange: &mut Interchange, record: &mut Record) -> Result<()> {
        let raw_id = record.get(Field::Id).ok_or(SchemaError::MissingId)?;
        let id = Id::make(raw_id).map_err(|source| SchemaError::MalformedId {
            field: Field::Id,
            raw: raw_id.to_string(),
            id: None,
            source,
        })?;

        let raw_type = record
            .get(Field::Type)
            .ok_or_else(|| SchemaError::MissingType { id: id.clone() })?;
        let (var_type, allows_null) = parse_type(raw_type);

        let mut directive = Directive::new(id, var_type, allows_null);
        for spec in &FIELD_TABLE {
            if spec.directive != Usage::Optional {
                continue;
            }
            if let Some(raw) = record.get(spec.field) {
                self.apply(&mut directive, spec.field, raw)?;
            }
        }

        tracing::debug!(
            id = %directive.id,
            var_type = %directive.var_type,
            aliases = directive.aliases.len(),
            "built directive"
        );
        interchange.add_directive(directive);
        Ok(())
    }

    /// Report unused keys of a built record; returns how many were reported
    pub fn audit(&mut self, record: &Record) -> usize {
        if !self.config.audit.enabled {
            return 0;
        }
        find_unused(record, self.config.audit.level, &mut self.reporter)
    }

    fn apply(&self, directive: &mut Directive, field: Field, raw: &str) -> Result<()> {
        match field {
            Field::Default => {
                let default = self
                    .var_parser
                    .parse(raw, &directive.var_type, directive.type_allows_null)
                    .map_err(|source| SchemaError::InvalidDefault {
                        id: directive.id.clone(),
                        raw: raw.to_string(),
                        source,
                    })?;
                directive.default = Some(default);
            }
            Field::Description => directive.description = Some(raw.to_string()),
            Field::Allowed => {
                // Tokens stay raw; only DEFAULT and VALUE-ALIASES go through the var parser
                let tokens = self
                    .evaluate(&directive.id, field, raw)?
                    .into_tokens()
                    .map_err(|source| literal_error(&directive.id, field, source))?;
                directive.allowed = Some(tokens.into_iter().collect());
            }
            Field::ValueAliases => {
                let aliases = self.value_aliases(directive, raw)?;
                directive.value_aliases = Some(aliases);
            }
            Field::Aliases => {
                let aliases = parse_aliases(&directive.id, raw)?;
                directive.aliases.extend(aliases);
            }
            Field::Version => directive.version = Some(raw.to_string()),
            Field::DeprecatedUse => {
                let target = Id::make(raw).map_err(|source| SchemaError::MalformedId {
                    field,
                    raw: raw.to_string(),
                    id: Some(directive.id.clone()),
                    source,
                })?;
                directive.deprecated_use = Some(target);
            }
            Field::DeprecatedVersion => directive.deprecated_version = Some(raw.to_string()),
            // resolved before the optional fields
            Field::Id | Field::Type => {}
        }
        Ok(())
    }

    fn evaluate(&self, id: &Id, field: Field, raw: &str) -> Result<LiteralArray> {
        self.evaluator
            .evaluate(raw)
            .map_err(|source| literal_error(id, field, source))
    }

    fn value_aliases(&self, directive: &Directive, raw: &str) -> Result<IndexMap<Value, Value>> {
        let pairs = self
            .evaluate(&directive.id, Field::ValueAliases, raw)?
            .into_pairs()
            .map_err(|source| literal_error(&directive.id, Field::ValueAliases, source))?;

        let (var_type, allows_null) = (&directive.var_type, directive.type_allows_null);
        let mut aliases = IndexMap::with_capacity(pairs.len());
        for (alias, value) in pairs {
            let parsed = self
                .var_parser
                .parse(&alias, var_type, allows_null)
                .and_then(|a| Ok((a, self.var_parser.parse(&value, var_type, allows_null)?)));
            let (alias_value, canonical) = parsed.map_err(|source| SchemaError::InvalidValueAlias {
                id: directive.id.clone(),
                alias: alias.clone(),
                value: value.clone(),
                source,
            })?;
            aliases.insert(alias_value, canonical);
        }
        Ok(aliases)
    }
}

fn apply_namespace(namespace: &mut Namespace, field: Field, raw: &str) {
    match field {
        Field::Description => namespace.description = Some(raw.to_string()),
        // ignored for namespaces in FIELD_TABLE
        Field::Id
        | Field::Type
        | Field::Default
        | Field::Allowed
        | Field::ValueAliases
        | Field::Aliases
        | Field::Version
        | Field::DeprecatedUse
        | Field::DeprecatedVersion => {}
    }
}

fn literal_error(id: &Id, field: Field, source: crate::literal::LiteralError) -> SchemaError {
    SchemaError::LiteralSyntax {
        id: id.clone(),
        field,
        source,
    }
}

/// Split TYPE into its tag and nullable marker; any second segment allows null
fn parse_type(raw: &str) -> (VarType, bool) {
    let mut segments = raw.split(TYPE_SEPARATOR);
    let tag = segments.next().unwrap_or_default().trim();
    let allows_null = segments.next().is_some();
    (VarType::from(tag), allows_null)
}

/// Comma-separated identifiers; blank entries are skipped
fn parse_aliases(id: &Id, raw: &str) -> Result<Vec<Id>> {
    raw.trim()
        .split(',')
        .map(str::trim)
        .filter(|alias| !alias.is_empty())
        .map(|alias| {
            Id::make(alias).map_err(|source| SchemaError::MalformedAlias {
                id: id.clone(),
                alias: alias.to_string(),
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::CollectingReporter;

    fn builder() -> InterchangeBuilder<FlexibleParser, CollectingReporter> {
        InterchangeBuilder::with_parts(
            FlexibleParser::new(),
            CollectingReporter::new(),
            BuilderConfig::default(),
        )
    }

    fn id(raw: &str) -> Id {
        Id::make(raw).unwrap()
    }

    #[test]
    fn test_parse_type() {
        assert_eq!(parse_type("int"), (VarType::Int, false));
        assert_eq!(parse_type("int/"), (VarType::Int, true));
        assert_eq!(parse_type("string/null"), (VarType::String, true));
        assert_eq!(parse_type("integer"), (VarType::Other("integer".to_string()), false));
    }

    #[test]
    fn test_parse_aliases() {
        let aliases = parse_aliases(&id("A.b"), "  Core.Old,, Legacy ,\n").unwrap();
        assert_eq!(aliases, vec![id("Core.Old"), id("Legacy")]);
        assert!(parse_aliases(&id("A.b"), "").unwrap().is_empty());
        assert!(matches!(
            parse_aliases(&id("A.b"), "Good.One, bad alias"),
            Err(SchemaError::MalformedAlias { alias, .. }) if alias == "bad alias"
        ));
    }

    #[test]
    fn test_namespace_ignores_directive_fields() {
        let mut b = builder();
        let mut interchange = Interchange::new();
        let record: Record = [("ID", "Core"), ("TYPE", "int"), ("DESCRIPTION", "Core features")]
            .into_iter()
            .collect();
        b.build(&mut interchange, record).unwrap();

        let ns = &interchange.namespaces()[0];
        assert_eq!(ns.description.as_deref(), Some("Core features"));
        assert_eq!(b.reporter().keys(), vec!["TYPE"]);
        assert!(b.reporter().diagnostics()[0].is_recognized());
    }

    #[test]
    fn test_finer_entry_points_skip_audit() {
        let b = builder();
        let mut interchange = Interchange::new();
        let mut record: Record = [("ID", "Core.Encoding"), ("TYPE", "string"), ("FOO", "x")]
            .into_iter()
            .collect();
        b.build_directive(&mut interchange, &mut record).unwrap();

        assert_eq!(interchange.directives().len(), 1);
        assert!(b.reporter().diagnostics().is_empty());
        assert_eq!(record.unused_keys().collect::<Vec<_>>(), vec!["FOO"]);
    }

    #[test]
    fn test_audit_can_be_disabled() {
        let mut config = BuilderConfig::default();
        config.audit.enabled = false;
        let mut b = InterchangeBuilder::with_parts(FlexibleParser::new(), CollectingReporter::new(), config);
        let mut interchange = Interchange::new();
        let record: Record = [("ID", "Core"), ("FOO", "x")].into_iter().collect();
        b.build(&mut interchange, record).unwrap();
        assert!(b.into_reporter().diagnostics().is_empty());
    }

    #[test]
    fn test_reporter_can_be_drained_between_builds() {
        let mut b = builder();
        let mut interchange = Interchange::new();
        b.build(&mut interchange, [("ID", "Core"), ("FOO", "x")].into_iter().collect())
            .unwrap();

        let drained = b.reporter_mut().take();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].key, "FOO");
        assert!(b.reporter().diagnostics().is_empty());

        b.build(&mut interchange, [("ID", "HTML"), ("BAR", "y")].into_iter().collect())
            .unwrap();
        assert_eq!(b.reporter().keys(), vec!["BAR"]);
    }

    #[test]
    fn test_literal_depth_comes_from_config() {
        let mut config = BuilderConfig::default();
        config.literal.max_depth = 0;
        let b = InterchangeBuilder::with_parts(FlexibleParser::new(), CollectingReporter::new(), config);
        assert_eq!(b.config().literal.max_depth, 0);
        assert_eq!(b.evaluator.max_depth(), 0);
        let mut interchange = Interchange::new();
        let mut record: Record = [("ID", "A.b"), ("TYPE", "string"), ("ALLOWED", "['x']")]
            .into_iter()
            .collect();
        let err = b.build_directive(&mut interchange, &mut record).unwrap_err();
        assert!(matches!(err, SchemaError::LiteralSyntax { field: Field::Allowed, .. }));
    }

    #[test]
    fn test_deprecated_use_error_carries_directive() {
        let b = builder();
        let mut interchange = Interchange::new();
        let mut record: Record = [("ID", "Core.Old"), ("TYPE", "bool"), ("DEPRECATED-USE", "Core..New")]
            .into_iter()
            .collect();
        let err = b.build_directive(&mut interchange, &mut record).unwrap_err();
        match err {
            SchemaError::MalformedId { field, raw, id, .. } => {
                assert_eq!(field, Field::DeprecatedUse);
                assert_eq!(raw, "Core..New");
                assert_eq!(id, Some(Id::make("Core.Old").unwrap()));
            }
            other => panic!("Expected MalformedId, got {:?}", other),
        }
        assert!(interchange.is_empty());
    }
}
