//! Missing documentation detector
//!
//! A public function is documented when the line directly above it (skipping
//! decorators and attributes) is a comment, or, for Python, when the first
//! body line is a docstring.

use crate::detectors::base::{is_comment_line, Detector, SourceView};
use crate::detectors::signatures::is_public_function;
use crate::models::{Category, Finding, Language, Location, Severity};
use anyhow::Result;

pub struct MissingDocstringsDetector;

impl MissingDocstringsDetector {
    pub fn new() -> Self {
        Self
    }

    fn is_annotation(line: &str) -> bool {
        let trimmed = line.trim_start();
        trimmed.starts_with('@') || trimmed.starts_with("#[")
    }

    fn has_leading_doc(source: &SourceView, idx: usize) -> bool {
        let mut cursor = idx;
        while cursor > 0 {
            cursor -= 1;
            let line = source.lines[cursor];
            if Self::is_annotation(line) {
                continue;
            }
            let trimmed = line.trim();
            return is_comment_line(line, source.language) || trimmed.ends_with("*/");
        }
        false
    }

    fn has_docstring(source: &SourceView, idx: usize) -> bool {
        source
            .lines
            .iter()
            .skip(idx + 1)
            .find(|l| !l.trim().is_empty())
            .map(|l| {
                let t = l.trim_start().trim_start_matches(['r', 'u', 'b', 'R', 'U', 'B']);
                t.starts_with("\"\"\"") || t.starts_with("'''") || t.starts_with('"')
            })
            .unwrap_or(false)
    }
}

impl Default for MissingDocstringsDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for MissingDocstringsDetector {
    fn name(&self) -> &'static str {
        "missing-docs"
    }

    fn description(&self) -> &'static str {
        "Detects public functions without documentation"
    }

    fn category(&self) -> Category {
        Category::Documentation
    }

    fn detect(&self, source: &SourceView) -> Result<Vec<Finding>> {
        let mut findings = vec![];

        for (idx, line) in source.lines.iter().enumerate() {
            if source.is_comment(idx) || !is_public_function(line, source.language) {
                continue;
            }
            if Self::has_leading_doc(source, idx) {
                continue;
            }
            if source.language == Language::Python && Self::has_docstring(source, idx) {
                continue;
            }

            findings.push(
                Finding::local(
                    self.name(),
                    self.category(),
                    Severity::Low,
                    "Public function has no documentation",
                    Location::line(source.path(), idx as u32),
                )
                .with_suggestion("Document what the function does, its inputs and its result."),
            );
        }

        Ok(findings)
    }
}
