//! SQL Injection Detector
//!
//! Flags lines that build a `SELECT` statement through string concatenation
//! or interpolation. Only the uppercase keyword is matched.

use crate::detectors::base::{Detector, SourceView};
use crate::models::{Category, Finding, Location, Severity};
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

static SELECT_KEYWORD: OnceLock<Regex> = OnceLock::new();
static DYNAMIC_STRING: OnceLock<Regex> = OnceLock::new();

fn select_keyword() -> &'static Regex {
    SELECT_KEYWORD.get_or_init(|| Regex::new(r"\bSELECT\b").expect("valid regex"))
}

/// Concatenation (`" +`, `+ '`, `" . $`) or interpolation (`${`, f-strings,
/// `%s`, `.format(`, `$"`)
fn dynamic_string() -> &'static Regex {
    DYNAMIC_STRING.get_or_init(|| {
        Regex::new(
            r#"["'`]\s*\+|\+\s*["'`]|["']\s*\.\s*\$|\$\{|\bf["']|%s|%d|\.format\(|\$""#,
        )
        .expect("valid regex")
    })
}

pub struct SqlInjectionDetector;

impl SqlInjectionDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SqlInjectionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for SqlInjectionDetector {
    fn name(&self) -> &'static str {
        "sql-injection"
    }

    fn description(&self) -> &'static str {
        "Detects SQL queries assembled from dynamic strings"
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
            let Some(keyword) = select_keyword().find(line) else {
                continue;
            };
            if !dynamic_string().is_match(line) {
                continue;
            }

            findings.push(
                Finding::local(
                    self.name(),
                    self.category(),
                    Severity::High,
                    "Possible SQL injection: query built from dynamic string",
                    Location::line(source.path(), idx as u32)
                        .with_columns(keyword.start() as u32, line.len() as u32),
                )
                .with_suggestion("Use parameterized queries or prepared statements."),
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
        SqlInjectionDetector::new()
            .detect(&SourceView::new(&unit))
            .unwrap()
    }

    #[test]
    fn test_concatenation_and_interpolation() {
        let text = "\
const q = \"SELECT * FROM users WHERE id = \" + userId;
const q2 = `SELECT name FROM t WHERE id = ${id}`;
";
        let findings = run("a.js", text);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].severity, Severity::High);

        let py = run("a.py", "cur.execute(f\"SELECT * FROM t WHERE name = '{name}'\")\n");
        assert_eq!(py.len(), 1);
    }

    #[test]
    fn test_static_or_lowercase_queries_ignored() {
        let text = "\
const q = \"SELECT * FROM users WHERE id = ?\";
const q2 = \"select * from t where a = \" + b;
// SELECT \" + old
";
        assert!(run("a.js", text).is_empty());
    }
}
