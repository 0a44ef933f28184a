//! Codesight - local-first code quality analysis
//!
//! Line-oriented pattern detectors find issues in a single source unit, an
//! optional text model adds more, and a weighted scorer turns the findings
//! into an overall score, per-category scores and recommendations.
//!
//! ```rust,ignore
//! use codesight::models::SourceUnit;
//! use codesight::pipeline::Analyzer;
//!
//! let unit = SourceUnit::from_path("src/app.ts", source);
//! let result = Analyzer::default().analyze_local(&unit);
//! println!("{} ({})", result.overall_score, result.grade());
//! ```

pub mod ai;
pub mod cli;
pub mod config;
pub mod detectors;
pub mod diagnostics;
pub mod models;
pub mod pipeline;
pub mod reporters;
pub mod scoring;
