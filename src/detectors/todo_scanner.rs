//! TODO/FIXME Scanner
//!
//! Reports `TODO:`, `FIXME:` and `HACK:` markers as informational findings
//! carrying the marker text.

use crate::detectors::base::{Detector, SourceView};
use crate::models::{Category, Finding, Location, Severity};
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

static TODO_PATTERN: OnceLock<Regex> = OnceLock::new();

fn get_pattern() -> &'static Regex {
    TODO_PATTERN
        .get_or_init(|| Regex::new(r"\b(TODO|FIXME|HACK):\s*(.*)").expect("valid regex"))
}

pub struct TodoScanner;

impl TodoScanner {
    pub fn new() -> Self {
        Self
    }

    fn suggestion_for(tag: &str) -> &'static str {
        match tag {
            "FIXME" => "Fix the flagged defect or open a tracked issue for it.",
            "HACK" => "Replace the workaround with a proper solution.",
            _ => "Complete the pending work or track it in the issue tracker.",
        }
    }
}

impl Default for TodoScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for TodoScanner {
    fn name(&self) -> &'static str {
        "todo-scanner"
    }

    fn description(&self) -> &'static str {
        "Finds TODO, FIXME, HACK comments"
    }

    fn category(&self) -> Category {
        Category::CodeSmell
    }

    fn detect(&self, source: &SourceView) -> Result<Vec<Finding>> {
        let mut findings = vec![];

        for (idx, line) in source.lines.iter().enumerate() {
            let Some(caps) = get_pattern().captures(line) else {
                continue;
            };
            let tag = caps.get(1).map(|m| m.as_str()).unwrap_or("TODO");
            let text = caps
                .get(2)
                .map(|m| m.as_str().trim().trim_end_matches("*/").trim())
                .unwrap_or("");
            let column = caps.get(0).map(|m| m.start()).unwrap_or(0);

            findings.push(
                Finding::local(
                    self.name(),
                    self.category(),
                    Severity::Info,
                    format!("{}: {}", tag, text),
                    Location::line(source.path(), idx as u32)
                        .with_columns(column as u32, line.len() as u32),
                )
                .with_suggestion(Self::suggestion_for(tag)),
            );
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceUnit;

    #[test]
    fn test_markers_carry_text() {
        let text = "\
// TODO: handle retries
let x = 1; // FIXME: off by one
# HACK: patch until upstream fix
// todo: lowercase is ignored
// TODO without colon
";
        let unit = SourceUnit::from_path("a.js", text);
        let findings = TodoScanner::new().detect(&SourceView::new(&unit)).unwrap();
        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].message, "TODO: handle retries");
        assert_eq!(findings[1].message, "FIXME: off by one");
        assert_eq!(findings[1].location.start_line, 1);
        assert_eq!(findings[2].message, "HACK: patch until upstream fix");
        assert!(findings.iter().all(|f| f.severity == Severity::Info));
    }
}
