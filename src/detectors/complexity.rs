//! Line Complexity Detector
//!
//! Single-line proxy for cyclomatic complexity: counts branching keywords
//! and short-circuit operators on each line. Not a control-flow graph.

use crate::detectors::base::{Detector, DetectorConfig, SourceView};
use crate::models::{Category, Finding, Location, Severity};
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

static BRANCH_PATTERN: OnceLock<Regex> = OnceLock::new();

fn get_pattern() -> &'static Regex {
    BRANCH_PATTERN.get_or_init(|| {
        Regex::new(r"\b(if|else|switch|case|for|while|catch)\b|&&|\|\|").expect("valid regex")
    })
}

pub struct ComplexityDetector {
    medium: usize,
    high: usize,
}

impl ComplexityDetector {
    pub fn new() -> Self {
        Self { medium: 5, high: 10 }
    }

    pub fn with_config(config: &DetectorConfig) -> Self {
        Self {
            medium: config.get_option_or("complexity_medium", 5),
            high: config.get_option_or("complexity_high", 10),
        }
    }

    /// Number of branch tokens on a line
    pub fn branch_count(line: &str) -> usize {
        get_pattern().find_iter(line).count()
    }
}

impl Default for ComplexityDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for ComplexityDetector {
    fn name(&self) -> &'static str {
        "line-complexity"
    }

    fn description(&self) -> &'static str {
        "Detects lines packed with branching logic"
    }

    fn category(&self) -> Category {
        Category::CodeSmell
    }

    fn detect(&self, source: &SourceView) -> Result<Vec<Finding>> {
        let mut findings = vec![];

        for (idx, line) in source.lines.iter().enumerate() {
            if source.is_comment(idx) {
                continue;
            }
            let count = Self::branch_count(line);
            let severity = if count >= self.high {
                Severity::High
            } else if count >= self.medium {
                Severity::Medium
            } else {
                continue;
            };

            findings.push(
                Finding::local(
                    self.name(),
                    self.category(),
                    severity,
                    format!("High complexity: {} branch points on one line", count),
                    Location::line(source.path(), idx as u32),
                )
                .with_suggestion(
                    "Extract conditions into well-named helpers or use early returns.",
                ),
            );
        }

        Ok(findings)
    }
}
