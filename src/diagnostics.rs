//! Editor diagnostics
//!
//! Findings map 1:1 onto diagnostics (`range`, `message`, `severity`) in the
//! shape editors expect. Publishing goes through a [`DiagnosticSink`]; the
//! crate ships a terminal sink for `watch` and an in-memory one.

use crate::models::{Finding, Severity};
use console::style;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Source label attached to every diagnostic
pub const DIAGNOSTIC_SOURCE: &str = "codesight";

/// Editor-side severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Information,
}

impl From<Severity> for DiagnosticSeverity {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Critical | Severity::High => DiagnosticSeverity::Error,
            Severity::Medium => DiagnosticSeverity::Warning,
            Severity::Low | Severity::Info => DiagnosticSeverity::Information,
        }
    }
}

/// Zero-based position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub range: Range,
    pub message: String,
    pub severity: DiagnosticSeverity,
    pub source: String,
    /// Rule that produced the finding
    pub code: String,
}

impl From<&Finding> for Diagnostic {
    fn from(finding: &Finding) -> Self {
        let loc = &finding.location;
        let start = Position {
            line: loc.start_line,
            character: loc.start_column.unwrap_or(0),
        };
        // Without an end column the range runs to the end of the last line
        let end = Position {
            line: loc.last_line(),
            character: loc.end_column.unwrap_or(u32::MAX),
        };
        let message = if finding.suggestion.is_empty() {
            finding.message.clone()
        } else {
            format!("{}\n{}", finding.message, finding.suggestion)
        };
        Self {
            range: Range { start, end },
            message,
            severity: finding.severity.into(),
            source: DIAGNOSTIC_SOURCE.to_string(),
            code: finding.rule.clone(),
        }
    }
}

/// Map findings to diagnostics, preserving order
pub fn to_diagnostics(findings: &[Finding]) -> Vec<Diagnostic> {
    findings.iter().map(Diagnostic::from).collect()
}

/// Receives the full diagnostic set for a unit, replacing the previous one
pub trait DiagnosticSink: Send + Sync {
    fn publish(&self, path: &str, diagnostics: Vec<Diagnostic>);

    fn clear(&self, path: &str) {
        self.publish(path, Vec::new());
    }
}

/// Prints diagnostics to stderr
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl DiagnosticSink for ConsoleSink {
    fn publish(&self, path: &str, diagnostics: Vec<Diagnostic>) {
        if diagnostics.is_empty() {
            eprintln!("{} {}", style("✓").green(), style(path).dim());
            return;
        }
        eprintln!("{} ({} issues)", style(path).bold(), diagnostics.len());
        for d in &diagnostics {
            let label = match d.severity {
                DiagnosticSeverity::Error => style("error").red().bold(),
                DiagnosticSeverity::Warning => style("warning").yellow(),
                DiagnosticSeverity::Information => style("info").blue(),
            };
            let headline = d.message.lines().next().unwrap_or_default();
            eprintln!(
                "  {:>5}  {:<8} {} {}",
                d.range.start.line + 1,
                label,
                headline,
                style(format!("[{}]", d.code)).dim()
            );
        }
    }
}

/// Keeps the latest diagnostics per path
#[derive(Debug, Default)]
pub struct MemorySink {
    published: Mutex<BTreeMap<String, Vec<Diagnostic>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<Vec<Diagnostic>> {
        self.published
            .lock()
            .ok()
            .and_then(|map| map.get(path).cloned())
    }

    pub fn paths(&self) -> Vec<String> {
        self.published
            .lock()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl DiagnosticSink for MemorySink {
    fn publish(&self, path: &str, diagnostics: Vec<Diagnostic>) {
        if let Ok(mut map) = self.published.lock() {
            map.insert(path.to_string(), diagnostics);
        }
    }
}
