//! Duplicate Line Detector
//!
//! Flags repeated trimmed lines. Two variants, picked by the scan profile:
//! - standard: an identical line within a ±window of lines
//! - review: an identical line anywhere in the file, occurring at least N times
//!
//! Every matching line is flagged independently.

use crate::detectors::base::{Detector, DetectorConfig, ScanProfile, SourceView};
use crate::models::{Category, Finding, Location, Severity};
use anyhow::Result;
use std::collections::HashMap;
use tracing::debug;

pub struct DuplicateCodeDetector {
    profile: ScanProfile,
    window: usize,
    min_length: usize,
    review_min_length: usize,
    review_min_occurrences: usize,
}

impl DuplicateCodeDetector {
    pub fn new() -> Self {
        Self::with_config(&DetectorConfig::default())
    }

    pub fn with_config(config: &DetectorConfig) -> Self {
        Self {
            profile: config.profile,
            window: config.get_option_or("duplicate_window", 20),
            min_length: config.get_option_or("duplicate_min_length", 10),
            review_min_length: config.get_option_or("review_min_length", 20),
            review_min_occurrences: config.get_option_or("review_min_occurrences", 3),
        }
    }

    fn min_length(&self) -> usize {
        match self.profile {
            ScanProfile::Standard => self.min_length,
            ScanProfile::Review => self.review_min_length,
        }
    }

    fn is_duplicate(&self, idx: usize, positions: &[usize]) -> bool {
        match self.profile {
            ScanProfile::Standard => positions
                .iter()
                .any(|&other| other != idx && other.abs_diff(idx) <= self.window),
            ScanProfile::Review => positions.len() >= self.review_min_occurrences,
        }
    }
}

impl Default for DuplicateCodeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for DuplicateCodeDetector {
    fn name(&self) -> &'static str {
        "duplicate-code"
    }

    fn description(&self) -> &'static str {
        "Detects repeated lines of code"
    }

    fn category(&self) -> Category {
        Category::CodeSmell
    }

    fn detect(&self, source: &SourceView) -> Result<Vec<Finding>> {
        let min_length = self.min_length();
        let mut positions: HashMap<&str, Vec<usize>> = HashMap::new();

        for (idx, line) in source.lines.iter().enumerate() {
            let trimmed = line.trim();
            if trimmed.len() < min_length || source.is_comment(idx) {
                continue;
            }
            positions.entry(trimmed).or_default().push(idx);
        }

        let mut findings = vec![];
        for (idx, line) in source.lines.iter().enumerate() {
            let Some(seen) = positions.get(line.trim()) else {
                continue;
            };
            if seen.len() < 2 || !self.is_duplicate(idx, seen) {
                continue;
            }

            findings.push(
                Finding::local(
                    self.name(),
                    self.category(),
                    Severity::Low,
                    format!("Duplicate line, repeated {} times in this file", seen.len()),
                    Location::line(source.path(), idx as u32),
                )
                .with_suggestion("Extract the repeated logic into a shared function or constant."),
            );
        }

        debug!(
            "duplicate-code: {} findings in {} ({:?})",
            findings.len(),
            source.path(),
            self.profile
        );
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceUnit;

    fn detect_with(profile: ScanProfile, text: &str) -> Vec<Finding> {
        let unit = SourceUnit::from_path("dup.ts", text);
        let config = DetectorConfig::new().with_profile(profile);
        DuplicateCodeDetector::with_config(&config)
            .detect(&SourceView::new(&unit))
            .unwrap()
    }

    #[test]
    fn test_three_repeats_yield_three_findings() {
        let text = "\
const result = computeValue(a, b);
log(result);
const result = computeValue(a, b);
emit();
const result = computeValue(a, b);
";
        for profile in [ScanProfile::Standard, ScanProfile::Review] {
            let findings = detect_with(profile, text);
            assert_eq!(findings.len(), 3, "profile {:?}", profile);
            let lines: Vec<u32> = findings.iter().map(|f| f.location.start_line).collect();
            assert_eq!(lines, vec![0, 2, 4]);
        }
    }

    #[test]
    fn test_standard_window_bounds() {
        let mut text = String::from("let total = sum(values);\n");
        text.push_str(&"x();\n".repeat(25));
        text.push_str("let total = sum(values);\n");
        assert!(detect_with(ScanProfile::Standard, &text).is_empty());
    }

    #[test]
    fn test_review_needs_three_occurrences() {
        let text = "\
const response = await fetchUserProfile(id);
const response = await fetchUserProfile(id);
";
        assert!(detect_with(ScanProfile::Review, text).is_empty());
        assert_eq!(detect_with(ScanProfile::Standard, text).len(), 2);
    }

    #[test]
    fn test_short_lines_ignored() {
        let text = "return x;\nreturn x;\nreturn x;\n";
        assert!(detect_with(ScanProfile::Standard, text).is_empty());
    }
}
