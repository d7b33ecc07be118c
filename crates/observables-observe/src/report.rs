//! Change reports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use observables_core::Phase;

use crate::record::ChangeRecord;

/// Unique identifier for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(Uuid);

impl ReportId {
    /// Create a new random report ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A diagnostic message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level.
    pub level: DiagnosticLevel,
    /// Message.
    pub message: String,
    /// Additional context.
    pub context: Option<String>,
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    /// Informational.
    Info,
    /// Warning.
    Warning,
    /// Error.
    Error,
}

/// Summary of a recorded change stream.
///
/// Counts are taken from after-phase records only, so each applied change
/// counts once whether or not its before phase was recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeReport {
    /// Unique report ID.
    pub report_id: ReportId,
    /// Optional heading.
    pub title: Option<String>,
    /// Applied changes per `container.operation`.
    pub counts: BTreeMap<String, usize>,
    /// Records the report was built from.
    pub records: Vec<ChangeRecord>,
    /// Records lost to a recorder size limit.
    pub dropped: u64,
    /// Diagnostic messages.
    pub diagnostics: Vec<Diagnostic>,
}

impl ChangeReport {
    /// Create a report from records.
    pub fn new(records: Vec<ChangeRecord>, dropped: u64) -> Self {
        let mut counts = BTreeMap::new();
        for record in records.iter().filter(|record| record.phase == Phase::After) {
            *counts
                .entry(format!("{}.{}", record.container, record.operation))
                .or_insert(0) += 1;
        }

        Self {
            report_id: ReportId::new(),
            title: None,
            counts,
            records,
            dropped,
            diagnostics: Vec::new(),
        }
    }

    /// Set the heading.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add a diagnostic message.
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add an info diagnostic.
    pub fn add_info(&mut self, message: impl Into<String>) {
        self.push_diagnostic(DiagnosticLevel::Info, message.into(), None);
    }

    /// Add a warning diagnostic.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.push_diagnostic(DiagnosticLevel::Warning, message.into(), None);
    }

    /// Add an error diagnostic with context.
    pub fn add_error(&mut self, message: impl Into<String>, context: Option<String>) {
        self.push_diagnostic(DiagnosticLevel::Error, message.into(), context);
    }

    /// Number of applied changes.
    pub fn change_count(&self) -> usize {
        self.counts.values().sum()
    }

    /// Number of error diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.level == DiagnosticLevel::Error)
            .count()
    }

    /// Check if any error diagnostic was added.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Format as human-readable text.
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        match &self.title {
            Some(title) => output.push_str(&format!("Change Report: {}\n", title)),
            None => output.push_str(&format!("Change Report: {}\n", self.report_id)),
        }
        output.push('\n');

        output.push_str("Changes:\n");
        for record in &self.records {
            output.push_str(&format!("  {}\n", record));
        }
        if self.records.is_empty() {
            output.push_str("  (none)\n");
        }

        output.push('\n');
        output.push_str(&format!("Summary: {} applied\n", self.change_count()));
        for (operation, count) in &self.counts {
            output.push_str(&format!("  {:<16} {}\n", operation, count));
        }
        if self.dropped > 0 {
            output.push_str(&format!("  ({} records dropped)\n", self.dropped));
        }

        if !self.diagnostics.is_empty() {
            output.push_str("\nDiagnostics:\n");
            for diag in &self.diagnostics {
                let level = match diag.level {
                    DiagnosticLevel::Info => "INFO",
                    DiagnosticLevel::Warning => "WARN",
                    DiagnosticLevel::Error => "ERROR",
                };
                output.push_str(&format!("  [{}] {}\n", level, diag.message));
                if let Some(context) = &diag.context {
                    output.push_str(&format!("        {}\n", context));
                }
            }
        }

        output
    }

    /// Format as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Format as pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    fn push_diagnostic(&mut self, level: DiagnosticLevel, message: String, context: Option<String>) {
        self.diagnostics.push(Diagnostic {
            level,
            message,
            context,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ContainerKind;
    use observables_core::ObservableId;

    fn record(phase: Phase, container: ContainerKind, operation: &str) -> ChangeRecord {
        ChangeRecord {
            sequence: 0,
            phase,
            source: ObservableId::new(),
            label: None,
            container,
            operation: operation.to_string(),
            locator: None,
            old_value: None,
            new_value: None,
            details: None,
        }
    }

    #[test]
    fn test_report_id() {
        assert_ne!(ReportId::new(), ReportId::new());
    }

    #[test]
    fn test_counts_use_after_phase() {
        let records = vec![
            record(Phase::Before, ContainerKind::List, "append"),
            record(Phase::After, ContainerKind::List, "append"),
            record(Phase::After, ContainerKind::List, "append"),
            record(Phase::After, ContainerKind::Dict, "create"),
        ];
        let report = ChangeReport::new(records, 0);

        assert_eq!(report.counts.get("list.append"), Some(&2));
        assert_eq!(report.counts.get("dict.create"), Some(&1));
        assert_eq!(report.change_count(), 3);
    }

    #[test]
    fn test_diagnostics() {
        let mut report = ChangeReport::new(Vec::new(), 0);
        report.add_info("started");
        report.add_warning("nothing recorded");
        assert!(!report.has_errors());

        report.add_error("step 2 failed", Some("Key not found: \"x\"".to_string()));
        assert!(report.has_errors());
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.diagnostics.len(), 3);
    }

    #[test]
    fn test_to_text() {
        let records = vec![record(Phase::After, ContainerKind::Object, "create")];
        let mut report = ChangeReport::new(records, 4).with_title("demo");
        report.add_error("boom", None);

        let text = report.to_text();
        assert!(text.contains("Change Report: demo"));
        assert!(text.contains("object.create"));
        assert!(text.contains("4 records dropped"));
        assert!(text.contains("[ERROR] boom"));
    }

    #[test]
    fn test_to_json() {
        let records = vec![record(Phase::After, ContainerKind::Value, "set")];
        let report = ChangeReport::new(records, 0);

        let json = report.to_json();
        assert_eq!(json["counts"]["value.set"], 1);
        assert_eq!(json["records"][0]["phase"], "after");
        assert!(report.to_json_pretty().contains("\"dropped\": 0"));
    }
}
