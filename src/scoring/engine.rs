//! Scoring engine and result reducer

use crate::config::ScoringConfig;
use crate::models::{AnalysisResult, Category, Finding};
use std::collections::BTreeMap;
use tracing::{debug, info};

const URGENT_SECURITY: &str =
    "Urgent: review and fix the security issues before shipping this code";
const ADD_TESTS: &str = "Add tests for the untested paths and edge cases";
const IMPROVE_DOCS: &str = "Document public functions and modules";

fn quality_message(category: Category) -> String {
    format!("Address {} issues to improve code quality", category.label())
}

/// Turns findings into an [`AnalysisResult`]. Pure: the same findings always
/// produce the same result.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a finding set
    pub fn score(&self, findings: &[Finding]) -> AnalysisResult {
        let mut overall_penalty = 0.0;
        let mut penalties: BTreeMap<Category, f64> =
            Category::SCORED.iter().map(|c| (*c, 0.0)).collect();

        for finding in findings {
            let base = finding.severity.penalty();
            overall_penalty += base;

            let bucket = finding.category.scoring_bucket();
            let weighted = if bucket == Category::Security {
                base * self.config.security_multiplier
            } else {
                base
            };
            *penalties.entry(bucket).or_insert(0.0) += weighted;
        }

        let category_scores: BTreeMap<Category, u32> = penalties
            .into_iter()
            .map(|(category, penalty)| (category, to_score(penalty)))
            .collect();
        let overall_score = to_score(overall_penalty);
        let recommendations = self.recommendations(&category_scores);

        debug!(
            "Scored {} findings: overall {}, security {}",
            findings.len(),
            overall_score,
            category_scores.get(&Category::Security).copied().unwrap_or(100)
        );

        AnalysisResult {
            overall_score,
            category_scores,
            findings: findings.to_vec(),
            recommendations,
            units: Vec::new(),
        }
    }

    /// Score the findings of one source unit
    pub fn score_unit(&self, path: &str, findings: &[Finding]) -> AnalysisResult {
        let mut result = self.score(findings);
        result.units.push(path.to_string());
        result
    }

    /// Recompute scores and recommendations from a result's findings.
    /// Applying it twice changes nothing.
    pub fn rescore(&self, result: &AnalysisResult) -> AnalysisResult {
        let mut rescored = self.score(&result.findings);
        rescored.units = result.units.clone();
        rescored
    }

    /// Recommendations for a set of category scores, first-seen order
    pub fn recommendations(&self, scores: &BTreeMap<Category, u32>) -> Vec<String> {
        let thresholds = &self.config.thresholds;
        let score = |c: Category| scores.get(&c).copied().unwrap_or(100);
        let mut out: Vec<String> = Vec::new();
        let mut push = |message: String| {
            if !out.contains(&message) {
                out.push(message);
            }
        };

        for category in Category::SCORED {
            if score(category) < thresholds.quality {
                push(quality_message(category));
            }
        }
        if score(Category::Security) < thresholds.security {
            push(URGENT_SECURITY.to_string());
        }
        if score(Category::Testing) < thresholds.testing {
            push(ADD_TESTS.to_string());
        }
        if score(Category::Documentation) < thresholds.documentation {
            push(IMPROVE_DOCS.to_string());
        }
        out
    }

    pub fn combine(&self, results: &[AnalysisResult]) -> AnalysisResult {
        combine(results)
    }
}

fn to_score(penalty: f64) -> u32 {
    (100.0 - penalty).round().clamp(0.0, 100.0) as u32
}

fn mean(values: impl Iterator<Item = u32>, count: usize) -> u32 {
    let total: f64 = values.map(f64::from).sum();
    (total / count as f64).round().clamp(0.0, 100.0) as u32
}

/// Reduce several results into one: mean scores, concatenated findings,
/// deduplicated recommendations and units. No results give a fresh one.
pub fn combine(results: &[AnalysisResult]) -> AnalysisResult {
    if results.is_empty() {
        return AnalysisResult::fresh();
    }
    let n = results.len();

    let overall_score = mean(results.iter().map(|r| r.overall_score), n);
    let category_scores = Category::SCORED
        .iter()
        .map(|c| (*c, mean(results.iter().map(|r| r.category_score(*c)), n)))
        .collect();

    let mut findings = Vec::new();
    let mut recommendations: Vec<String> = Vec::new();
    let mut units: Vec<String> = Vec::new();
    for result in results {
        findings.extend(result.findings.iter().cloned());
        for rec in &result.recommendations {
            if !recommendations.contains(rec) {
                recommendations.push(rec.clone());
            }
        }
        for unit in &result.units {
            if !units.contains(unit) {
                units.push(unit.clone());
            }
        }
    }

    info!(
        "Combined {} results: overall {}, {} findings",
        n,
        overall_score,
        findings.len()
    );

    AnalysisResult {
        overall_score,
        category_scores,
        findings,
        recommendations,
        units,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, Severity};

    fn finding(category: Category, severity: Severity) -> Finding {
        Finding::local("test", category, severity, "issue", Location::line("a.js", 0))
    }

    #[test]
    fn test_no_findings_is_fresh() {
        let result = ScoringEngine::default().score(&[]);
        assert_eq!(result.overall_score, 100);
        assert!(result.category_scores.values().all(|s| *s == 100));
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn test_critical_security_finding() {
        let result = ScoringEngine::default().score(&[finding(Category::Security, Severity::Critical)]);
        assert_eq!(result.overall_score, 80);
        assert_eq!(result.category_scores[&Category::Security], 70);
        assert_eq!(result.category_scores[&Category::CodeSmell], 100);
    }

    #[test]
    fn test_multiplier_rounds_once() {
        let engine = ScoringEngine::default();
        let result = engine.score(&[
            finding(Category::Security, Severity::Low),
            finding(Category::Security, Severity::Low),
            finding(Category::Security, Severity::Low),
        ]);
        // 3 × 2 × 1.5 = 9
        assert_eq!(result.category_scores[&Category::Security], 91);
        assert_eq!(result.overall_score, 94);

        let result = engine.score(&[finding(Category::Security, Severity::Low)]);
        assert_eq!(result.category_scores[&Category::Security], 97);
    }

    #[test]
    fn test_ai_detected_scored_as_code_smell() {
        let result = ScoringEngine::default().score(&[finding(Category::AiDetected, Severity::High)]);
        assert_eq!(result.category_scores[&Category::CodeSmell], 90);
        assert!(!result.category_scores.contains_key(&Category::AiDetected));
    }

    #[test]
    fn test_scores_clamped() {
        let findings: Vec<Finding> = (0..12)
            .map(|_| finding(Category::Security, Severity::Critical))
            .collect();
        let result = ScoringEngine::default().score(&findings);
        assert_eq!(result.overall_score, 0);
        assert_eq!(result.category_scores[&Category::Security], 0);
    }

    #[test]
    fn test_info_costs_nothing() {
        let result = ScoringEngine::default().score(&[finding(Category::CodeSmell, Severity::Info)]);
        assert_eq!(result.overall_score, 100);
        assert_eq!(result.findings.len(), 1);
    }

    #[test]
    fn test_recommendations() {
        let engine = ScoringEngine::default();
        let result = engine.score(&[finding(Category::Security, Severity::Critical)]);
        assert_eq!(
            result.recommendations,
            vec![quality_message(Category::Security), URGENT_SECURITY.to_string()]
        );

        let result = engine.score(&[finding(Category::Security, Severity::Medium)]);
        assert_eq!(result.category_scores[&Category::Security], 93);

        // Below the security threshold only
        let result = engine.score(&[
            finding(Category::Security, Severity::Medium),
            finding(Category::Security, Severity::Medium),
        ]);
        assert_eq!(result.category_scores[&Category::Security], 85);
        assert_eq!(result.recommendations, vec![URGENT_SECURITY.to_string()]);

        let findings: Vec<Finding> = (0..5)
            .map(|_| finding(Category::Documentation, Severity::High))
            .collect();
        let result = engine.score(&findings);
        assert_eq!(result.category_scores[&Category::Documentation], 50);
        assert!(result.recommendations.contains(&IMPROVE_DOCS.to_string()));
    }

    #[test]
    fn test_custom_multiplier() {
        let engine = ScoringEngine::new(ScoringConfig {
            security_multiplier: 3.0,
            ..Default::default()
        });
        let result = engine.score(&[finding(Category::Security, Severity::High)]);
        assert_eq!(result.category_scores[&Category::Security], 70);
        assert_eq!(result.overall_score, 90);
    }

    #[test]
    fn test_rescore_is_idempotent() {
        let engine = ScoringEngine::default();
        let result = engine.score_unit(
            "a.js",
            &[
                finding(Category::Testing, Severity::High),
                finding(Category::Performance, Severity::Medium),
            ],
        );
        let once = engine.rescore(&result);
        assert_eq!(once, result);
        assert_eq!(engine.rescore(&once), once);
    }

    #[test]
    fn test_combine() {
        let engine = ScoringEngine::default();
        let a = engine.score_unit("a.js", &[finding(Category::Security, Severity::Critical)]);
        let b = engine.score_unit(
            "b.js",
            &[
                finding(Category::Security, Severity::Critical),
                finding(Category::CodeSmell, Severity::Critical),
            ],
        );
        assert_eq!(a.overall_score, 80);
        assert_eq!(b.overall_score, 60);

        let combined = combine(&[a.clone(), b.clone()]);
        assert_eq!(combined.overall_score, 70);
        assert_eq!(combined.category_scores[&Category::Security], 70);
        assert_eq!(combined.category_scores[&Category::CodeSmell], 90);
        assert_eq!(combined.findings.len(), 3);
        assert_eq!(combined.units, vec!["a.js", "b.js"]);

        let mut expected = a.recommendations.clone();
        for rec in &b.recommendations {
            if !expected.contains(rec) {
                expected.push(rec.clone());
            }
        }
        assert_eq!(combined.recommendations, expected);
        assert_eq!(
            combined
                .recommendations
                .iter()
                .filter(|r| r.as_str() == URGENT_SECURITY)
                .count(),
            1
        );
    }

    #[test]
    fn test_combine_empty_is_fresh() {
        assert_eq!(combine(&[]), AnalysisResult::fresh());
    }

    #[test]
    fn test_combine_rounds_mean() {
        let mut a = AnalysisResult::fresh();
        let mut b = AnalysisResult::fresh();
        a.overall_score = 81;
        b.overall_score = 80;
        assert_eq!(combine(&[a, b]).overall_score, 81);
    }
}
