//! Magic numbers detector
//!
//! Flags unexplained integer literals outside an allow-list. String
//! contents, comments, `#define`s and UPPER_SNAKE constant declarations
//! are ignored; a lowercase `const` binding is an ordinary variable.

use crate::detectors::base::{mask_string_literals, Detector, DetectorConfig, SourceView};
use crate::models::{Category, Finding, Location, Severity};
use anyhow::Result;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

static NUMBER_PATTERN: OnceLock<Regex> = OnceLock::new();
static CONSTANT_DECL: OnceLock<Regex> = OnceLock::new();

fn get_pattern() -> &'static Regex {
    NUMBER_PATTERN.get_or_init(|| Regex::new(r"\b\d+(?:\.\d+)?\b").expect("valid regex"))
}

fn constant_decl() -> &'static Regex {
    CONSTANT_DECL.get_or_init(|| {
        Regex::new(
            r"^\s*(enum|#define)\b|^\s*((export|pub(\([^)]*\))?|public|private|protected|internal|const|final|static|readonly|let|var)\s+)*([\w<>\[\],]+\s+)?[A-Z][A-Z0-9_]*\s*(:[^=]+)?=[^=]",
        )
        .expect("valid regex")
    })
}

/// Default allowed literals
pub const DEFAULT_ALLOWED: [u64; 6] = [0, 1, 2, 10, 100, 1000];

pub struct MagicNumbersDetector {
    allowed: HashSet<u64>,
}

impl MagicNumbersDetector {
    pub fn new() -> Self {
        Self {
            allowed: DEFAULT_ALLOWED.into_iter().collect(),
        }
    }

    pub fn with_config(config: &DetectorConfig) -> Self {
        let allowed: Vec<u64> = config.get_option_or("magic_number_allow", DEFAULT_ALLOWED.to_vec());
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    fn is_allowed(&self, literal: &str) -> bool {
        literal
            .parse::<u64>()
            .map(|n| self.allowed.contains(&n))
            .unwrap_or(false)
    }
}

impl Default for MagicNumbersDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for MagicNumbersDetector {
    fn name(&self) -> &'static str {
        "magic-numbers"
    }

    fn description(&self) -> &'static str {
        "Detects unexplained numeric literals"
    }

    fn category(&self) -> Category {
        Category::BestPractice
    }

    fn detect(&self, source: &SourceView) -> Result<Vec<Finding>> {
        let mut findings = vec![];

        for (idx, line) in source.lines.iter().enumerate() {
            if source.is_comment(idx) || constant_decl().is_match(line) {
                continue;
            }
            let masked = mask_string_literals(line);
            // Ignore anything after a trailing line comment
            let code = match masked.find("//") {
                Some(pos) => &masked[..pos],
                None => masked.as_str(),
            };

            for m in get_pattern().find_iter(code) {
                let literal = m.as_str();
                if literal.contains('.') || self.is_allowed(literal) {
                    continue;
                }
                findings.push(
                    Finding::local(
                        self.name(),
                        self.category(),
                        Severity::Low,
                        format!("Magic number {} should be a named constant", literal),
                        Location::line(source.path(), idx as u32)
                            .with_columns(m.start() as u32, m.end() as u32),
                    )
                    .with_suggestion(format!(
                        "Extract {} into a constant with a descriptive name.",
                        literal
                    )),
                );
            }
        }

        Ok(findings)
    }
}
