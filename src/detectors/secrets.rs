//! Secret detection
//!
//! Flags credentials assigned to quoted literals (`password = "..."`,
//! `api_key: '...'`). The literal is never echoed back in the finding.

use crate::detectors::base::{Detector, SourceView};
use crate::models::{Category, Finding, Location, Severity};
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

static SECRET_PATTERNS: OnceLock<Vec<SecretPattern>> = OnceLock::new();

struct SecretPattern {
    name: &'static str,
    pattern: Regex,
}

fn assignment(keyword: &str) -> Regex {
    let source = format!(
        r#"(?i)\b\w*({})\w*["']?\s*[:=]\s*["']([^"']+)["']"#,
        keyword
    );
    Regex::new(&source).expect("valid secret regex")
}

fn get_patterns() -> &'static Vec<SecretPattern> {
    SECRET_PATTERNS.get_or_init(|| {
        vec![
            SecretPattern {
                name: "Hardcoded password",
                pattern: assignment("password|passwd|pwd"),
            },
            SecretPattern {
                name: "Hardcoded API key",
                pattern: assignment("api_key|apikey|api-key"),
            },
            SecretPattern {
                name: "Hardcoded secret",
                pattern: assignment("secret"),
            },
            SecretPattern {
                name: "Hardcoded token",
                pattern: assignment("token"),
            },
        ]
    })
}

/// Values that are obviously not real credentials
fn is_placeholder(value: &str) -> bool {
    let lower = value.to_lowercase();
    lower.contains("example")
        || lower.contains("placeholder")
        || lower.contains("your_")
        || lower.contains("your-")
        || lower.contains("xxx")
        || lower.starts_with("${")
        || lower.starts_with('<')
        || lower.chars().all(|c| c == '*')
}

pub struct SecretDetector;

impl SecretDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SecretDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for SecretDetector {
    fn name(&self) -> &'static str {
        "hardcoded-secret"
    }

    fn description(&self) -> &'static str {
        "Detects credentials assigned to string literals"
    }

    fn category(&self) -> Category {
        Category::Security
    }

    fn detect(&self, source: &SourceView) -> Result<Vec<Finding>> {
        let mut findings = vec![];

        for (idx, line) in source.lines.iter().enumerate() {
            // One finding per line even when several signatures match
            let hit = get_patterns().iter().find_map(|sp| {
                sp.pattern
                    .captures(line)
                    .filter(|caps| !caps.get(2).is_some_and(|v| is_placeholder(v.as_str())))
                    .map(|caps| (sp.name, caps.get(0).map(|m| m.start()).unwrap_or(0)))
            });
            let Some((name, column)) = hit else {
                continue;
            };

            findings.push(
                Finding::local(
                    self.name(),
                    self.category(),
                    Severity::Critical,
                    format!("{} detected", name),
                    Location::line(source.path(), idx as u32)
                        .with_columns(column as u32, line.len() as u32),
                )
                .with_suggestion(
                    "Load credentials from environment variables or a secrets manager.",
                ),
            );
        }

        Ok(findings)
    }
}
