//! Base detector trait and types
//!
//! This module defines the core abstractions for line-oriented detection:
//! - `Detector` trait that all detectors must implement
//! - `SourceView` shared, pre-split view of a source unit
//! - `DetectorResult` / `DetectionSummary` for capturing execution results
//! - `DetectorConfig` for thresholds and the scan profile

use crate::models::{Finding, Language, Severity, SourceUnit};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result from running a single detector
#[derive(Debug, Clone)]
pub struct DetectorResult {
    /// Name of the detector that produced these results
    pub detector_name: String,
    /// Findings produced by the detector
    pub findings: Vec<Finding>,
    /// Execution time in milliseconds
    pub duration_ms: u64,
    /// Whether the detector completed successfully
    pub success: bool,
    /// Error message if the detector failed
    pub error: Option<String>,
}

impl DetectorResult {
    /// Create a successful result
    pub fn success(detector_name: String, findings: Vec<Finding>, duration_ms: u64) -> Self {
        Self {
            detector_name,
            findings,
            duration_ms,
            success: true,
            error: None,
        }
    }

    /// Create a failed result
    pub fn failure(detector_name: String, error: String, duration_ms: u64) -> Self {
        Self {
            detector_name,
            findings: Vec::new(),
            duration_ms,
            success: false,
            error: Some(error),
        }
    }
}

/// Which duplication variant and strictness to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanProfile {
    /// Windowed duplication (short lines, nearby repeats)
    #[default]
    Standard,
    /// File-wide duplication with a higher repeat count
    Review,
}

impl std::str::FromStr for ScanProfile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(ScanProfile::Standard),
            "review" => Ok(ScanProfile::Review),
            other => Err(format!("Unknown profile '{}'. Valid: standard, review", other)),
        }
    }
}

/// Configuration options for detectors
#[derive(Debug, Clone, Default)]
pub struct DetectorConfig {
    /// Scan profile
    pub profile: ScanProfile,
    /// Maximum findings to return per detector
    pub max_findings: Option<usize>,
    /// Detector-specific thresholds and options
    pub options: HashMap<String, serde_json::Value>,
}

impl DetectorConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scan profile
    pub fn with_profile(mut self, profile: ScanProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Set maximum findings
    pub fn with_max_findings(mut self, max: usize) -> Self {
        self.max_findings = Some(max);
        self
    }

    /// Set a custom option
    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Get a typed option value
    pub fn get_option<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.options
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get an option with a default value
    pub fn get_option_or<T: serde::de::DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get_option(key).unwrap_or(default)
    }
}

/// Pre-split, read-only view of a source unit shared by all detectors
pub struct SourceView<'a> {
    pub unit: &'a SourceUnit,
    pub language: Language,
    pub lines: Vec<&'a str>,
}

impl<'a> SourceView<'a> {
    pub fn new(unit: &'a SourceUnit) -> Self {
        Self {
            unit,
            language: unit.language(),
            lines: unit.text.lines().collect(),
        }
    }

    pub fn path(&self) -> &str {
        &self.unit.path
    }

    /// Whether line `idx` is (entirely) a comment
    pub fn is_comment(&self, idx: usize) -> bool {
        self.lines
            .get(idx)
            .map(|l| is_comment_line(l, self.language))
            .unwrap_or(false)
    }
}

/// Trait for all line-oriented detectors
///
/// Detectors are pure functions of the source view: no shared state, no I/O.
/// Running a detector twice on identical input must yield identical findings.
///
/// # Example Implementation
///
/// ```ignore
/// pub struct MyDetector;
///
/// impl Detector for MyDetector {
///     fn name(&self) -> &'static str { "my-detector" }
///     fn description(&self) -> &'static str { "Detects my specific pattern" }
///     fn category(&self) -> Category { Category::CodeSmell }
///     fn detect(&self, source: &SourceView) -> Result<Vec<Finding>> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait Detector: Send + Sync {
    /// Unique identifier for this detector (e.g. "long-function")
    fn name(&self) -> &'static str;

    /// Human-readable description of what this detector finds
    fn description(&self) -> &'static str;

    /// Category of issues this detector finds
    fn category(&self) -> crate::models::Category;

    /// Run detection over a single source unit
    ///
    /// An `Err` is treated as "could not classify": the engine logs it and
    /// carries on with no findings from this detector.
    fn detect(&self, source: &SourceView) -> Result<Vec<Finding>>;
}

/// Summary statistics from running all detectors
#[derive(Debug, Clone, Default)]
pub struct DetectionSummary {
    /// Total number of detectors run
    pub detectors_run: usize,
    /// Number of detectors that succeeded
    pub detectors_succeeded: usize,
    /// Number of detectors that failed
    pub detectors_failed: usize,
    /// Total findings across all detectors
    pub total_findings: usize,
    /// Findings by severity
    pub by_severity: HashMap<Severity, usize>,
    /// Total execution time in milliseconds
    pub total_duration_ms: u64,
}

impl DetectionSummary {
    /// Update summary with a detector result
    pub fn add_result(&mut self, result: &DetectorResult) {
        self.detectors_run += 1;
        self.total_duration_ms += result.duration_ms;

        if result.success {
            self.detectors_succeeded += 1;
            self.total_findings += result.findings.len();

            for finding in &result.findings {
                *self.by_severity.entry(finding.severity).or_insert(0) += 1;
            }
        } else {
            self.detectors_failed += 1;
        }
    }

    /// Fold another summary into this one
    pub fn merge(&mut self, other: &DetectionSummary) {
        self.detectors_run += other.detectors_run;
        self.detectors_succeeded += other.detectors_succeeded;
        self.detectors_failed += other.detectors_failed;
        self.total_findings += other.total_findings;
        self.total_duration_ms += other.total_duration_ms;
        for (severity, count) in &other.by_severity {
            *self.by_severity.entry(*severity).or_insert(0) += count;
        }
    }
}

/// Check whether a line is a comment-only line
pub fn is_comment_line(line: &str, language: Language) -> bool {
    let trimmed = line.trim_start();
    if trimmed.starts_with("//")
        || trimmed.starts_with("/*")
        || trimmed.starts_with("*")
        || trimmed.starts_with("<!--")
    {
        return true;
    }
    if language.hash_comments() || language == Language::Other {
        return trimmed.starts_with('#') && !trimmed.starts_with("#[") && !trimmed.starts_with("#!");
    }
    false
}

/// Replace the contents of string literals with spaces, keeping offsets.
///
/// Quotes themselves are kept so callers can still see that a literal exists.
pub fn mask_string_literals(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in line.chars() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                    out.extend(std::iter::repeat(' ').take(c.len_utf8()));
                } else if c == '\\' {
                    escaped = true;
                    out.push(' ');
                } else if c == q {
                    quote = None;
                    out.push(c);
                } else {
                    // Keep byte offsets stable for multi-byte characters
                    out.extend(std::iter::repeat(' ').take(c.len_utf8()));
                }
            }
            None => {
                if c == '"' || c == '\'' || c == '`' {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
    }
    out
}

/// Leading whitespace width (tabs count as 4)
pub fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}
