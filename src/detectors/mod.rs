//! Local pattern detectors
//!
//! Line-oriented heuristic scanners over raw source text. No parser, no
//! external service: every detector is a pure function of the unit's lines.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  LocalPatternDetector                       │
//! │  - builds the default detector set from DetectorConfig      │
//! │  - detect(unit) never fails                                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     DetectorEngine                          │
//! │  - runs detectors in parallel (rayon)                       │
//! │  - contains detector errors and panics                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!              ┌───────────────┼───────────────┐
//!              ▼               ▼               ▼
//! ┌──────────────────┐ ┌──────────────┐ ┌──────────────────┐
//! │ Structural       │ │ Lexical      │ │ Security         │
//! │ (long function,  │ │ (magic nums, │ │ (secrets, SQL,   │
//! │  params, loops)  │ │  TODO, dups) │ │  eval)           │
//! └──────────────────┘ └──────────────┘ └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use codesight::detectors::{DetectorConfig, LocalPatternDetector};
//! use codesight::models::SourceUnit;
//!
//! let detector = LocalPatternDetector::new(DetectorConfig::default());
//! let unit = SourceUnit::from_path("app.js", text);
//! let findings = detector.detect(&unit);
//! ```

mod base;
mod complexity;
mod duplicate_code;
mod engine;
mod eval_detector;
mod long_function;
mod long_parameter;
mod loop_hotspots;
mod magic_numbers;
mod missing_docstrings;
mod secrets;
pub mod signatures;
mod sql_injection;
mod todo_scanner;

pub use base::{
    indent_width, is_comment_line, mask_string_literals, DetectionSummary, Detector,
    DetectorConfig, DetectorResult, ScanProfile, SourceView,
};
pub use complexity::ComplexityDetector;
pub use duplicate_code::DuplicateCodeDetector;
pub use engine::DetectorEngine;
pub use eval_detector::EvalDetector;
pub use long_function::{LongFunctionDetector, LongFunctionThresholds};
pub use long_parameter::LongParameterListDetector;
pub use loop_hotspots::LoopHotspotDetector;
pub use magic_numbers::MagicNumbersDetector;
pub use missing_docstrings::MissingDocstringsDetector;
pub use secrets::SecretDetector;
pub use sql_injection::SqlInjectionDetector;
pub use todo_scanner::TodoScanner;

use crate::models::{Finding, SourceUnit};
use rayon::prelude::*;
use std::sync::Arc;

/// Create the default set of detectors, configured from `config`
pub fn default_detectors(config: &DetectorConfig) -> Vec<Arc<dyn Detector>> {
    vec![
        // Structural
        Arc::new(LongFunctionDetector::with_config(config)),
        Arc::new(ComplexityDetector::with_config(config)),
        Arc::new(LongParameterListDetector::with_config(config)),
        Arc::new(LoopHotspotDetector::new()),
        // Lexical
        Arc::new(DuplicateCodeDetector::with_config(config)),
        Arc::new(MagicNumbersDetector::with_config(config)),
        Arc::new(TodoScanner::new()),
        Arc::new(MissingDocstringsDetector::new()),
        // Security
        Arc::new(SecretDetector::new()),
        Arc::new(SqlInjectionDetector::new()),
        Arc::new(EvalDetector::new()),
    ]
}

/// Runs the full local detector set over source units.
///
/// Holds no state beyond its configured detectors; `detect` on identical
/// input always yields identical findings.
pub struct LocalPatternDetector {
    engine: DetectorEngine,
}

impl LocalPatternDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self::with_disabled(config, Vec::new())
    }

    /// Build with some detectors switched off by name
    pub fn with_disabled(config: DetectorConfig, disabled: Vec<String>) -> Self {
        let mut engine = DetectorEngine::new()
            .with_detector_limit(config.max_findings)
            .with_disabled(disabled);
        engine.register_all(default_detectors(&config));
        Self { engine }
    }

    /// Build from an explicit detector list
    pub fn from_detectors(detectors: Vec<Arc<dyn Detector>>) -> Self {
        let mut engine = DetectorEngine::new();
        engine.register_all(detectors);
        Self { engine }
    }

    pub fn detector_names(&self) -> Vec<&'static str> {
        self.engine.detector_names()
    }

    /// Findings for one unit. Never fails; detectors that cannot classify
    /// a unit contribute nothing.
    pub fn detect(&self, unit: &SourceUnit) -> Vec<Finding> {
        self.detect_with_summary(unit).0
    }

    pub fn detect_with_summary(&self, unit: &SourceUnit) -> (Vec<Finding>, DetectionSummary) {
        self.engine.run(unit)
    }

    /// Findings for many units, in input order
    pub fn detect_all(&self, units: &[SourceUnit]) -> Vec<(String, Vec<Finding>)> {
        units
            .par_iter()
            .map(|unit| (unit.path.clone(), self.detect(unit)))
            .collect()
    }
}

impl Default for LocalPatternDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Severity};

    const SAMPLE: &str = "\
const password = \"hunter2\";

function handler(req, res, db, cache, logger, metrics) {
  // TODO: validate input
  const q = \"SELECT * FROM users WHERE id = \" + req.id;
  for (const row of rows) {
    const data = await db.query(q);
  }
  setTimeout(flush, 3000);
  return eval(req.body);
}
";

    #[test]
    fn test_default_set_covers_every_concern() {
        let detector = LocalPatternDetector::default();
        let findings = detector.detect(&SourceUnit::from_path("handler.js", SAMPLE));

        let has = |rule: &str| findings.iter().any(|f| f.rule == rule);
        assert!(has("hardcoded-secret"));
        assert!(has("long-parameter-list"));
        assert!(has("todo-scanner"));
        assert!(has("sql-injection"));
        assert!(has("loop-hotspot"));
        assert!(has("magic-numbers"));
        assert!(has("eval-usage"));
        assert!(findings
            .iter()
            .any(|f| f.category == Category::Security && f.severity == Severity::Critical));
    }

    #[test]
    fn test_detect_is_idempotent() {
        let detector = LocalPatternDetector::default();
        let unit = SourceUnit::from_path("handler.js", SAMPLE);
        let mut first = detector.detect(&unit);
        let mut second = detector.detect(&unit);
        let key = |f: &Finding| (f.rule.clone(), f.location.start_line, f.location.start_column);
        first.sort_by_key(key);
        second.sort_by_key(key);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_unit() {
        let detector = LocalPatternDetector::default();
        assert!(detector.detect(&SourceUnit::from_path("empty.py", "")).is_empty());
    }

    #[test]
    fn test_disabled_detectors() {
        let detector =
            LocalPatternDetector::with_disabled(DetectorConfig::default(), vec!["eval-usage".into()]);
        let findings = detector.detect(&SourceUnit::from_path("handler.js", SAMPLE));
        assert!(!findings.iter().any(|f| f.rule == "eval-usage"));
    }

    #[test]
    fn test_detect_all_keeps_order() {
        let detector = LocalPatternDetector::default();
        let units = vec![
            SourceUnit::from_path("a.js", "eval(x);\n"),
            SourceUnit::from_path("b.js", "let y = 1;\n"),
        ];
        let results = detector.detect_all(&units);
        assert_eq!(results[0].0, "a.js");
        assert_eq!(results[0].1.len(), 1);
        assert!(results[1].1.is_empty());
    }

    #[test]
    fn test_from_detectors() {
        let detectors: Vec<Arc<dyn Detector>> = vec![Arc::new(EvalDetector::new())];
        let detector = LocalPatternDetector::from_detectors(detectors);
        assert_eq!(detector.detector_names(), vec!["eval-usage"]);
        let findings = detector.detect(&SourceUnit::from_path("handler.js", SAMPLE));
        assert!(findings.iter().all(|f| f.rule == "eval-usage"));
        assert_eq!(findings.len(), 1);
    }
}
