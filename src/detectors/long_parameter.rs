//! Long parameter list detector
//!
//! Matches function-definition lines, extracts the parameter list (which may
//! continue over several lines) and flags lists longer than the threshold.
//! Receiver parameters (`self`, `this`, `cls`) are not counted.

use crate::detectors::base::{Detector, DetectorConfig, SourceView};
use crate::detectors::signatures::{extract_parameters, is_function_start};
use crate::models::{Category, Finding, Location, Severity};
use anyhow::Result;

/// Lines joined when a parameter list wraps
const SIGNATURE_LOOKAHEAD: usize = 10;

pub struct LongParameterListDetector {
    max_params: usize,
}

impl LongParameterListDetector {
    pub fn new() -> Self {
        Self { max_params: 5 }
    }

    pub fn with_config(config: &DetectorConfig) -> Self {
        Self {
            max_params: config.get_option_or("max_params", 5),
        }
    }
}

impl Default for LongParameterListDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for LongParameterListDetector {
    fn name(&self) -> &'static str {
        "long-parameter-list"
    }

    fn description(&self) -> &'static str {
        "Detects functions with too many parameters"
    }

    fn category(&self) -> Category {
        Category::BestPractice
    }

    fn detect(&self, source: &SourceView) -> Result<Vec<Finding>> {
        let mut findings = vec![];

        for (idx, line) in source.lines.iter().enumerate() {
            if source.is_comment(idx) || !is_function_start(line, source.language) {
                continue;
            }
            let Some(params) = extract_parameters(&source.lines, idx, SIGNATURE_LOOKAHEAD) else {
                continue;
            };
            if params.len() <= self.max_params {
                continue;
            }

            findings.push(
                Finding::local(
                    self.name(),
                    self.category(),
                    Severity::Medium,
                    format!(
                        "Function takes {} parameters (max: {})",
                        params.len(),
                        self.max_params
                    ),
                    Location::line(source.path(), idx as u32),
                )
                .with_suggestion("Group related parameters into an object or struct."),
            );
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceUnit;

    fn run(path: &str, text: &str) -> Vec<Finding> {
        let unit = SourceUnit::from_path(path, text);
        LongParameterListDetector::new()
            .detect(&SourceView::new(&unit))
            .unwrap()
    }

    #[test]
    fn test_flags_six_parameters() {
        let findings = run("a.js", "function create(a, b, c, d, e, f) {\n  return a;\n}\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Medium);
        assert_eq!(findings[0].category, Category::BestPractice);
        assert!(findings[0].message.contains("6 parameters"));
    }

    #[test]
    fn test_five_parameters_ok() {
        assert!(run("a.js", "function create(a, b, c, d, e) {\n}\n").is_empty());
    }

    #[test]
    fn test_self_not_counted_and_multiline() {
        let text = "\
class Service:
    def configure(self, host, port,
                  user, password, timeout):
        pass
";
        assert!(run("svc.py", text).is_empty());

        let text = "\
def configure(host, port,
              user, password,
              timeout, retries):
    pass
";
        assert_eq!(run("svc.py", text).len(), 1);
    }

    #[test]
    fn test_calls_not_flagged() {
        assert!(run("a.js", "  create(a, b, c, d, e, f);\n").is_empty());
    }
}
