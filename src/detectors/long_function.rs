//! Long Function Detector
//!
//! Finds function bodies that span too many lines. Brace-delimited
//! languages are measured with a balance counter starting at the signature
//! line; indentation-scoped languages (Python) by the indented block.

use crate::detectors::base::{indent_width, Detector, DetectorConfig, SourceView};
use crate::detectors::signatures::is_function_start;
use crate::models::{Category, Finding, Location, Severity};
use anyhow::Result;

/// Maximum lines scanned forward from a signature
const MAX_LOOKAHEAD: usize = 2_000;

/// Thresholds for long function detection
#[derive(Debug, Clone)]
pub struct LongFunctionThresholds {
    /// Spans above this many lines are medium
    pub medium_lines: usize,
    /// Spans above this many lines are high
    pub high_lines: usize,
}

impl Default for LongFunctionThresholds {
    fn default() -> Self {
        Self {
            medium_lines: 20,
            high_lines: 50,
        }
    }
}

pub struct LongFunctionDetector {
    thresholds: LongFunctionThresholds,
}

impl LongFunctionDetector {
    pub fn new() -> Self {
        Self::with_thresholds(LongFunctionThresholds::default())
    }

    pub fn with_thresholds(thresholds: LongFunctionThresholds) -> Self {
        Self { thresholds }
    }

    pub fn with_config(config: &DetectorConfig) -> Self {
        let defaults = LongFunctionThresholds::default();
        Self::with_thresholds(LongFunctionThresholds {
            medium_lines: config.get_option_or("long_function_medium", defaults.medium_lines),
            high_lines: config.get_option_or("long_function_high", defaults.high_lines),
        })
    }

    /// Last line of a brace-delimited body starting at `start`
    fn brace_span_end(lines: &[&str], start: usize) -> Option<usize> {
        let mut balance: i64 = 0;
        let mut opened = false;
        let end = (start + MAX_LOOKAHEAD).min(lines.len());

        for (idx, line) in lines.iter().enumerate().take(end).skip(start) {
            for c in line.chars() {
                match c {
                    '{' => {
                        balance += 1;
                        opened = true;
                    }
                    '}' => balance -= 1,
                    _ => {}
                }
            }
            if opened && balance <= 0 {
                return Some(idx);
            }
            // A signature followed by `;` or an expression body never opened a block
            if !opened && idx > start + 2 {
                return None;
            }
        }
        None
    }

    /// Last line of an indentation-scoped body starting at `start`
    fn indent_span_end(lines: &[&str], start: usize) -> Option<usize> {
        let base = indent_width(lines[start]);
        let end = (start + MAX_LOOKAHEAD).min(lines.len());
        let mut last_body = None;

        for (idx, line) in lines.iter().enumerate().take(end).skip(start + 1) {
            if line.trim().is_empty() {
                continue;
            }
            if indent_width(line) <= base {
                break;
            }
            last_body = Some(idx);
        }
        last_body
    }

    fn severity_for(&self, span: usize) -> Option<Severity> {
        if span > self.thresholds.high_lines {
            Some(Severity::High)
        } else if span > self.thresholds.medium_lines {
            Some(Severity::Medium)
        } else {
            None
        }
    }
}

impl Default for LongFunctionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for LongFunctionDetector {
    fn name(&self) -> &'static str {
        "long-function"
    }

    fn description(&self) -> &'static str {
        "Detects functions whose body spans too many lines"
    }

    fn category(&self) -> Category {
        Category::CodeSmell
    }

    fn detect(&self, source: &SourceView) -> Result<Vec<Finding>> {
        let mut findings = vec![];
        let lines = &source.lines;

        for (start, line) in lines.iter().enumerate() {
            if source.is_comment(start) || !is_function_start(line, source.language) {
                continue;
            }

            let end = if source.language.is_indent_scoped() {
                Self::indent_span_end(lines, start)
            } else {
                Self::brace_span_end(lines, start)
            };
            let Some(end) = end else { continue };

            let span = end - start + 1;
            let Some(severity) = self.severity_for(span) else {
                continue;
            };

            findings.push(
                Finding::local(
                    self.name(),
                    self.category(),
                    severity,
                    format!(
                        "Function is {} lines long (threshold: {})",
                        span, self.thresholds.medium_lines
                    ),
                    Location::span(source.path(), start as u32, end as u32),
                )
                .with_suggestion("Break into smaller, focused functions."),
            );
        }

        Ok(findings)
    }
}
