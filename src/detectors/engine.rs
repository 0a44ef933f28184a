//! Detector execution engine
//!
//! The DetectorEngine runs every registered detector over one source unit:
//! - detectors run in parallel using rayon (they share nothing)
//! - a detector that errors or panics contributes no findings
//! - findings come back in registration order, so output is deterministic

use crate::detectors::base::{DetectionSummary, Detector, DetectorResult, SourceView};
use crate::models::{Finding, SourceUnit};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Maximum findings to keep per unit
const MAX_FINDINGS_LIMIT: usize = 10_000;

/// Orchestrates local detection across all registered detectors
pub struct DetectorEngine {
    detectors: Vec<Arc<dyn Detector>>,
    disabled: HashSet<String>,
    max_findings: usize,
    max_findings_per_detector: Option<usize>,
}

impl DetectorEngine {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
            disabled: HashSet::new(),
            max_findings: MAX_FINDINGS_LIMIT,
            max_findings_per_detector: None,
        }
    }

    /// Set the maximum number of findings returned per unit
    pub fn with_max_findings(mut self, max: usize) -> Self {
        self.max_findings = max;
        self
    }

    /// Cap each detector's findings
    pub fn with_detector_limit(mut self, max: Option<usize>) -> Self {
        self.max_findings_per_detector = max;
        self
    }

    /// Skip detectors by name
    pub fn with_disabled(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.disabled.extend(names);
        self
    }

    pub fn register(&mut self, detector: Arc<dyn Detector>) {
        debug!("Registering detector: {}", detector.name());
        self.detectors.push(detector);
    }

    pub fn register_all(&mut self, detectors: impl IntoIterator<Item = Arc<dyn Detector>>) {
        for detector in detectors {
            self.register(detector);
        }
    }

    pub fn detector_count(&self) -> usize {
        self.detectors.len()
    }

    pub fn detector_names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    fn active(&self) -> impl Iterator<Item = &Arc<dyn Detector>> {
        self.detectors
            .iter()
            .filter(|d| !self.disabled.contains(d.name()))
    }

    /// Run all active detectors over one unit
    pub fn run(&self, unit: &SourceUnit) -> (Vec<Finding>, DetectionSummary) {
        let start = Instant::now();
        let view = SourceView::new(unit);
        let active: Vec<&Arc<dyn Detector>> = self.active().collect();

        let results: Vec<DetectorResult> = active
            .par_iter()
            .map(|detector| self.run_single_detector(detector, &view))
            .collect();

        let mut summary = DetectionSummary::default();
        let mut findings = Vec::new();
        for result in results {
            summary.add_result(&result);
            findings.extend(result.findings);
        }

        if findings.len() > self.max_findings {
            warn!(
                "Truncating {} findings to {} for {}",
                findings.len(),
                self.max_findings,
                unit.path
            );
            findings.truncate(self.max_findings);
        }

        debug!(
            "Detection on {} finished: {} findings from {} detectors in {:?}",
            unit.path,
            findings.len(),
            summary.detectors_run,
            start.elapsed()
        );
        (findings, summary)
    }

    fn run_single_detector(&self, detector: &Arc<dyn Detector>, view: &SourceView) -> DetectorResult {
        let name = detector.name().to_string();
        let start = Instant::now();

        let detect_result =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| detector.detect(view)));
        let duration = start.elapsed().as_millis() as u64;

        match detect_result {
            Ok(Ok(mut findings)) => {
                if let Some(max) = self.max_findings_per_detector {
                    findings.truncate(max);
                }
                debug!(
                    "Detector {} found {} findings in {}ms",
                    name,
                    findings.len(),
                    duration
                );
                DetectorResult::success(name, findings, duration)
            }
            Ok(Err(e)) => {
                warn!("Detector {} failed on {}: {}", name, view.path(), e);
                DetectorResult::failure(name, e.to_string(), duration)
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };
                warn!("Detector {} panicked on {}: {}", name, view.path(), panic_msg);
                DetectorResult::failure(name, format!("panic: {}", panic_msg), duration)
            }
        }
    }
}

impl Default for DetectorEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Location, Severity};
    use anyhow::{anyhow, Result};

    struct FixedDetector(&'static str);

    impl Detector for FixedDetector {
        fn name(&self) -> &'static str {
            self.0
        }
        fn description(&self) -> &'static str {
            "always one finding"
        }
        fn category(&self) -> Category {
            Category::CodeSmell
        }
        fn detect(&self, source: &SourceView) -> Result<Vec<Finding>> {
            Ok(vec![Finding::local(
                self.0,
                Category::CodeSmell,
                Severity::Low,
                "fixed",
                Location::line(source.path(), 0),
            )])
        }
    }

    struct FailingDetector;

    impl Detector for FailingDetector {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn description(&self) -> &'static str {
            "always errors"
        }
        fn category(&self) -> Category {
            Category::CodeSmell
        }
        fn detect(&self, _source: &SourceView) -> Result<Vec<Finding>> {
            Err(anyhow!("cannot classify"))
        }
    }

    struct PanickingDetector;

    impl Detector for PanickingDetector {
        fn name(&self) -> &'static str {
            "panicking"
        }
        fn description(&self) -> &'static str {
            "always panics"
        }
        fn category(&self) -> Category {
            Category::CodeSmell
        }
        fn detect(&self, _source: &SourceView) -> Result<Vec<Finding>> {
            panic!("boom")
        }
    }

    #[test]
    fn test_failures_are_contained() {
        let mut engine = DetectorEngine::new();
        engine.register(Arc::new(FixedDetector("first")));
        engine.register(Arc::new(FailingDetector));
        engine.register(Arc::new(PanickingDetector));
        engine.register(Arc::new(FixedDetector("second")));

        let unit = SourceUnit::from_path("a.js", "x");
        let (findings, summary) = engine.run(&unit);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].rule, "first");
        assert_eq!(findings[1].rule, "second");
        assert_eq!(summary.detectors_run, 4);
        assert_eq!(summary.detectors_failed, 2);
    }

    #[test]
    fn test_disabled_and_limits() {
        let mut engine = DetectorEngine::new()
            .with_disabled(vec!["first".to_string()])
            .with_max_findings(1);
        engine.register_all([
            Arc::new(FixedDetector("first")) as Arc<dyn Detector>,
            Arc::new(FixedDetector("second")),
            Arc::new(FixedDetector("third")),
        ]);
        assert_eq!(engine.detector_count(), 3);

        let unit = SourceUnit::from_path("a.js", "x");
        let (findings, summary) = engine.run(&unit);
        assert_eq!(summary.detectors_run, 2);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, "second");
    }
}
