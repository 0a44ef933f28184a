//! Eval usage detector
//!
//! Flags `eval(` calls. Occurrences inside string literals and comments
//! are ignored.

use crate::detectors::base::{mask_string_literals, Detector, SourceView};
use crate::models::{Category, Finding, Location, Severity};
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

static EVAL_CALL: OnceLock<Regex> = OnceLock::new();

fn eval_call() -> &'static Regex {
    EVAL_CALL.get_or_init(|| Regex::new(r"\beval\s*\(").expect("valid regex"))
}

pub struct EvalDetector;

impl EvalDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EvalDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for EvalDetector {
    fn name(&self) -> &'static str {
        "eval-usage"
    }

    fn description(&self) -> &'static str {
        "Detects dynamic code execution through eval()"
    }

    fn category(&self) -> Category {
        Category::Security
    }

    fn detect(&self, source: &SourceView) -> Result<Vec<Finding>> {
        let mut findings = vec![];

        for (idx, line) in source.lines.iter().enumerate() {
            if source.is_comment(idx) {
                continue;
            }
            let masked = mask_string_literals(line);
            let Some(m) = eval_call().find(&masked) else {
                continue;
            };

            findings.push(
                Finding::local(
                    self.name(),
                    self.category(),
                    Severity::High,
                    "Use of eval() executes arbitrary code",
                    Location::line(source.path(), idx as u32)
                        .with_columns(m.start() as u32, m.end() as u32),
                )
                .with_suggestion("Parse data explicitly (e.g. JSON.parse) instead of evaluating it."),
            );
        }

        Ok(findings)
    }
}
