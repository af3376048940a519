//! Unused-key audit
//!
//! After a fragment builds successfully, any key the builder never read is
//! reported as a [`Diagnostic`]. These are usually typos (`DESCRIPTON`) or
//! fields that do not apply to the fragment kind (`TYPE` on a namespace).
//! Diagnostics go to an injectable [`Reporter`] and never fail a build.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::{Field, Record};

/// Severity stamped on unused-key diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Notice,
    Warning,
}

/// A key present in a record but never read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub key: String,
    /// The record's raw ID, if it had one
    pub record: Option<String>,
    /// Set when the key is a recognized field that this fragment kind ignores
    pub field: Option<Field>,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn is_recognized(&self) -> bool {
        self.field.is_some()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "String hash key '{}' not used by builder", self.key)?;
        if let Some(record) = &self.record {
            write!(f, " in '{}'", record)?;
        }
        Ok(())
    }
}

/// Receives audit diagnostics
pub trait Reporter {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Emits diagnostics as tracing events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&mut self, diagnostic: Diagnostic) {
        let record = diagnostic.record.as_deref().unwrap_or("");
        match diagnostic.severity {
            Severity::Notice => tracing::info!(
                key = %diagnostic.key,
                record,
                recognized = diagnostic.is_recognized(),
                "{}",
                diagnostic
            ),
            Severity::Warning => tracing::warn!(
                key = %diagnostic.key,
                record,
                recognized = diagnostic.is_recognized(),
                "{}",
                diagnostic
            ),
        }
    }
}

/// Keeps diagnostics in memory
#[derive(Debug, Clone, Default)]
pub struct CollectingReporter {
    diagnostics: Vec<Diagnostic>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn keys(&self) -> Vec<&str> {
        self.diagnostics.iter().map(|d| d.key.as_str()).collect()
    }

    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

impl Reporter for CollectingReporter {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// Report every key of `record` that was never accessed; returns how many
pub fn find_unused<R: Reporter + ?Sized>(record: &Record, severity: Severity, reporter: &mut R) -> usize {
    let id = record.peek(Field::Id).map(String::from);
    let mut count = 0;
    for key in record.unused_keys() {
        reporter.report(Diagnostic {
            key: key.to_string(),
            record: id.clone(),
            field: Field::from_key(key),
            severity,
        });
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_only_unused_keys() {
        let mut record: Record = [("ID", "Core"), ("DESCRIPTON", "typo"), ("TYPE", "int")]
            .into_iter()
            .collect();
        record.get(Field::Id);

        let mut reporter = CollectingReporter::new();
        assert_eq!(find_unused(&record, Severity::Warning, &mut reporter), 2);

        let diagnostics = reporter.diagnostics();
        assert_eq!(reporter.keys(), vec!["DESCRIPTON", "TYPE"]);
        assert!(!diagnostics[0].is_recognized());
        assert_eq!(diagnostics[1].field, Some(Field::Type));
        assert_eq!(diagnostics[1].severity, Severity::Warning);
        assert_eq!(
            diagnostics[0].to_string(),
            "String hash key 'DESCRIPTON' not used by builder in 'Core'"
        );
    }

    #[test]
    fn test_fully_read_record_is_clean() {
        let mut record: Record = [("ID", "Core")].into_iter().collect();
        record.get(Field::Id);
        let mut reporter = CollectingReporter::new();
        assert_eq!(find_unused(&record, Severity::Notice, &mut reporter), 0);
        assert!(reporter.diagnostics().is_empty());
    }
}
