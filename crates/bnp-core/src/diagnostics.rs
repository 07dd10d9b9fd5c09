//! Issue collection for input validation and plan reporting.
//!
//! Collects warnings and errors with a category and an optional entity
//! reference (e.g. "forecast[BR-6104, SKU-WHITE, 2026-06-03]"), so a failed
//! validation names the offending record.

use serde::{Deserialize, Serialize};

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Unusual but the operation continued (e.g. defaulted value)
    Warning,
    /// The record or operation is unusable
    Error,
}

/// A single diagnostic issue encountered during an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Category for grouping (e.g. "forecast", "labor", "trucks", "inventory")
    pub category: String,
    pub message: String,
    /// Optional entity reference naming the offending record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(severity: Severity, category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            entity: None,
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;
        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }
        Ok(())
    }
}

/// Accumulated diagnostics from an operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, category: impl Into<String>, message: impl Into<String>) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    pub fn add_error(&mut self, category: impl Into<String>, message: impl Into<String>) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message));
    }

    pub fn add_error_with_entity(
        &mut self,
        category: impl Into<String>,
        message: impl Into<String>,
        entity: impl Into<String>,
    ) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message).with_entity(entity));
    }

    pub fn push(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// First error-severity issue, if any.
    pub fn first_error(&self) -> Option<&DiagnosticIssue> {
        self.issues.iter().find(|i| i.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut diag = Diagnostics::new();
        diag.add_warning("forecast", "zero demand for SKU-RYE");
        diag.add_error_with_entity(
            "inventory",
            "frozen stock at location without frozen storage",
            "BR-6104",
        );

        assert_eq!(diag.warning_count(), 1);
        assert_eq!(diag.error_count(), 1);
        assert!(diag.has_errors());
        assert_eq!(
            diag.first_error().unwrap().entity.as_deref(),
            Some("BR-6104")
        );
    }

    #[test]
    fn test_display_includes_entity() {
        let issue = DiagnosticIssue::new(Severity::Error, "trucks", "zero pallet capacity")
            .with_entity("T-MON-AM");
        let text = issue.to_string();
        assert!(text.contains("[error:trucks]"));
        assert!(text.contains("T-MON-AM"));
    }
}
