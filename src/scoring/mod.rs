//! Category scoring
//!
//! Converts a finding set into a deterministic, weighted quality report.
//!
//! # Scoring Formula
//!
//! ```text
//! Every score starts at 100.
//!
//! Per finding:
//!   overall        -= penalty(severity)
//!   category score -= penalty(severity) × (1.5 if security else 1.0)
//!
//! Penalties: critical 20, high 10, medium 5, low 2, info 0
//! All scores are clamped to [0, 100].
//! ```
//!
//! The security multiplier only affects the security score; the overall
//! score always uses the base penalty.
//!
//! # Example
//!
//! One critical security finding:
//! - overall = 100 - 20 = 80
//! - security = 100 - 20 × 1.5 = 70
//!
//! # Recommendations
//!
//! Derived from fixed thresholds after scoring (category < 80, security < 90,
//! testing < 70, documentation < 60), deduplicated in first-seen order.

mod engine;

pub use engine::{combine, ScoringEngine};
