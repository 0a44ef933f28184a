//! Analysis pipeline
//!
//! Orchestrates one analysis:
//! 1. Run the local detectors over the unit
//! 2. Ask the model for more findings (optional, best-effort)
//! 3. Score the union
//!
//! Re-analysis triggered by edits goes through the [`Debouncer`].

mod debounce;

pub use debounce::{Debouncer, DEFAULT_QUIET};

use crate::ai::{AugmentationCoordinator, ModelAsk};
use crate::config::CodesightConfig;
use crate::detectors::LocalPatternDetector;
use crate::models::{AnalysisResult, SourceUnit};
use crate::scoring::{combine, ScoringEngine};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

struct Augmentation {
    coordinator: AugmentationCoordinator,
    ask: Arc<dyn ModelAsk>,
}

/// Detection, augmentation and scoring for source units.
///
/// Holds no per-analysis state, so one analyzer can serve concurrent
/// analyses of different units.
pub struct Analyzer {
    detector: LocalPatternDetector,
    scoring: ScoringEngine,
    augmentation: Option<Augmentation>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(LocalPatternDetector::default(), ScoringEngine::default())
    }
}

impl Analyzer {
    pub fn new(detector: LocalPatternDetector, scoring: ScoringEngine) -> Self {
        Self {
            detector,
            scoring,
            augmentation: None,
        }
    }

    /// Local-only analyzer built from configuration
    pub fn from_config(config: &CodesightConfig) -> Self {
        let detector = LocalPatternDetector::with_disabled(
            config.to_detector_config(),
            config.detectors.disabled.clone(),
        );
        Self::new(detector, ScoringEngine::new(config.scoring.clone()))
    }

    /// Enable model augmentation through `ask`
    pub fn with_augmentation(
        mut self,
        coordinator: AugmentationCoordinator,
        ask: Arc<dyn ModelAsk>,
    ) -> Self {
        self.augmentation = Some(Augmentation { coordinator, ask });
        self
    }

    pub fn has_augmentation(&self) -> bool {
        self.augmentation.is_some()
    }

    pub fn detector(&self) -> &LocalPatternDetector {
        &self.detector
    }

    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }

    /// Local detectors only. Synchronous.
    pub fn analyze_local(&self, unit: &SourceUnit) -> AnalysisResult {
        let findings = self.detector.detect(unit);
        self.scoring.score_unit(&unit.path, &findings)
    }

    pub async fn analyze(&self, unit: &SourceUnit) -> AnalysisResult {
        self.analyze_with(unit, None).await
    }

    /// Full analysis. A cancelled or failed model call leaves the local
    /// findings in place.
    pub async fn analyze_with(
        &self,
        unit: &SourceUnit,
        cancel: Option<&CancellationToken>,
    ) -> AnalysisResult {
        let mut findings = self.detector.detect(unit);
        let local = findings.len();

        if let Some(aug) = &self.augmentation {
            let extra = aug
                .coordinator
                .augment_with(unit, aug.ask.as_ref(), cancel)
                .await;
            findings.extend(extra);
        }

        debug!(
            "{}: {} local, {} AI findings",
            unit.path,
            local,
            findings.len() - local
        );
        self.scoring.score_unit(&unit.path, &findings)
    }

    /// Per-unit results in input order. Local detection runs in parallel.
    pub async fn analyze_each(&self, units: &[SourceUnit]) -> Vec<AnalysisResult> {
        let local = self.detector.detect_all(units);
        let mut results = Vec::with_capacity(units.len());

        for (unit, (_, mut findings)) in units.iter().zip(local) {
            if let Some(aug) = &self.augmentation {
                findings.extend(aug.coordinator.augment(unit, aug.ask.as_ref()).await);
            }
            results.push(self.scoring.score_unit(&unit.path, &findings));
        }
        results
    }

    /// One combined result for many units
    pub async fn analyze_all(&self, units: &[SourceUnit]) -> AnalysisResult {
        let results = self.analyze_each(units).await;
        let combined = combine(&results);
        info!(
            "Analyzed {} units: score {}, {} findings",
            units.len(),
            combined.overall_score,
            combined.findings.len()
        );
        combined
    }
}

/// Read a file into a source unit. `root` shortens the recorded path.
pub fn load_unit(path: &Path, root: Option<&Path>) -> Result<SourceUnit> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let display = root
        .and_then(|r| path.strip_prefix(r).ok())
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/");
    Ok(SourceUnit::from_path(display, text))
}
