//! Interchange: the typed schema model
//!
//! Holds every [`Namespace`] and [`Directive`] built during one schema load.
//! The collection is append-only and keeps insertion order; it does not
//! reject duplicate names.

use indexmap::{IndexMap, IndexSet};
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::error::Result;
use crate::id::Id;
use crate::var_parser::{Value, VarType};

/// A grouping of directives
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Namespace {
    /// Name exactly as written in the fragment's ID
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// A single configuration directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Directive {
    pub id: Id,
    #[serde(rename = "type")]
    pub var_type: VarType,
    pub type_allows_null: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Permitted raw tokens; compared as text, never type-parsed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<IndexSet<String>>,
    /// Alias value to canonical value
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_value_aliases"
    )]
    pub value_aliases: Option<IndexMap<Value, Value>>,
    pub aliases: Vec<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated_use: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated_version: Option<String>,
}

// Values are not string keys, so aliases go out as [alias, canonical] pairs
fn serialize_value_aliases<S: Serializer>(
    aliases: &Option<IndexMap<Value, Value>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let Some(aliases) = aliases else {
        return serializer.serialize_none();
    };
    let mut seq = serializer.serialize_seq(Some(aliases.len()))?;
    for pair in aliases {
        seq.serialize_element(&pair)?;
    }
    seq.end()
}

impl Directive {
    pub fn new(id: Id, var_type: VarType, type_allows_null: bool) -> Self {
        Self {
            id,
            var_type,
            type_allows_null,
            default: None,
            description: None,
            allowed: None,
            value_aliases: None,
            aliases: Vec::new(),
            version: None,
            deprecated_use: None,
            deprecated_version: None,
        }
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated_use.is_some() || self.deprecated_version.is_some()
    }

    /// Whether a raw token is permitted; `true` when the directive has no ALLOWED list
    pub fn allows(&self, token: &str) -> bool {
        self.allowed
            .as_ref()
            .map_or(true, |allowed| allowed.contains(token))
    }

    /// Canonical value for an alias, or the value itself
    pub fn resolve_alias<'a>(&'a self, value: &'a Value) -> &'a Value {
        self.value_aliases
            .as_ref()
            .and_then(|aliases| aliases.get(value))
            .unwrap_or(value)
    }
}

/// The registry sink for built entities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Interchange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    namespaces: Vec<Namespace>,
    directives: Vec<Directive>,
}

impl Interchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn add_namespace(&mut self, namespace: Namespace) {
        self.namespaces.push(namespace);
    }

    pub fn add_directive(&mut self, directive: Directive) {
        self.directives.push(directive);
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// First namespace with this name
    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.name == name)
    }

    /// First directive with this ID
    pub fn directive(&self, id: &Id) -> Option<&Directive> {
        self.directives.iter().find(|d| &d.id == id)
    }

    /// Directives whose ID is rooted in the given namespace
    pub fn directives_in<'a>(&'a self, namespace: &'a str) -> impl Iterator<Item = &'a Directive> {
        self.directives
            .iter()
            .filter(move |d| d.id.namespace() == Some(namespace))
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty() && self.directives.is_empty()
    }

    /// Export as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directive(id: &str) -> Directive {
        Directive::new(Id::make(id).unwrap(), VarType::String, false)
    }

    #[test]
    fn test_append_keeps_order_and_duplicates() {
        let mut interchange = Interchange::new();
        assert!(interchange.is_empty());
        interchange.add_directive(directive("Core.Encoding"));
        interchange.add_directive(directive("HTML.Doctype"));
        interchange.add_directive(directive("Core.Encoding"));

        let ids: Vec<_> = interchange.directives().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["Core.Encoding", "HTML.Doctype", "Core.Encoding"]);
        assert_eq!(interchange.directives_in("Core").count(), 2);
    }

    #[test]
    fn test_lookup() {
        let mut interchange = Interchange::named("HTML Purifier");
        interchange.add_namespace(Namespace::new("Core"));
        interchange.add_directive(directive("Core.Encoding"));

        assert!(interchange.namespace("Core").is_some());
        assert!(interchange.namespace("HTML").is_none());
        assert!(interchange
            .directive(&Id::make("Core.Encoding").unwrap())
            .is_some());
    }

    #[test]
    fn test_allows_and_resolve_alias() {
        let mut d = directive("HTML.Doctype");
        assert!(d.allows("anything"));

        d.allowed = Some(["XHTML 1.0 Strict".to_string()].into_iter().collect());
        assert!(d.allows("XHTML 1.0 Strict"));
        assert!(!d.allows("HTML 5"));

        let alias = Value::String("strict".into());
        let canonical = Value::String("XHTML 1.0 Strict".into());
        d.value_aliases = Some([(alias.clone(), canonical.clone())].into_iter().collect());
        assert_eq!(d.resolve_alias(&alias), &canonical);
        assert_eq!(d.resolve_alias(&canonical), &canonical);
    }

    #[test]
    fn test_json_export() {
        let mut interchange = Interchange::new();
        let mut d = Directive::new(Id::make("Core.Encoding").unwrap(), VarType::IString, true);
        d.default = Some(Value::String("utf-8".into()));
        d.value_aliases = Some(
            [(Value::String("utf8".into()), Value::String("utf-8".into()))]
                .into_iter()
                .collect(),
        );
        interchange.add_directive(d);

        let json: serde_json::Value =
            serde_json::from_str(&interchange.to_json_pretty().unwrap()).unwrap();
        let exported = &json["directives"][0];
        assert_eq!(exported["id"], "Core.Encoding");
        assert_eq!(exported["type"], "istring");
        assert_eq!(exported["typeAllowsNull"], true);
        assert_eq!(exported["default"], "utf-8");
        assert_eq!(exported["valueAliases"][0][0], "utf8");
        assert!(exported.get("allowed").is_none());
    }
}
