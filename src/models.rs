//! Core data models for Codesight
//!
//! These models are shared by the local detectors, the AI decoder and the
//! scoring engine: the analysed source unit, individual findings, and the
//! aggregated analysis result.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Language family of a source unit.
///
/// Detectors pick their lexical signature sets from this. Unknown languages
/// fall back to C-like heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    Rust,
    Go,
    Java,
    CSharp,
    Cpp,
    Php,
    Ruby,
    #[default]
    Other,
}

impl Language {
    /// Resolve an editor language id (e.g. `typescriptreact`, `python`).
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "javascript" | "javascriptreact" | "js" | "jsx" => Language::JavaScript,
            "typescript" | "typescriptreact" | "ts" | "tsx" => Language::TypeScript,
            "python" | "py" => Language::Python,
            "rust" | "rs" => Language::Rust,
            "go" | "golang" => Language::Go,
            "java" | "kotlin" => Language::Java,
            "csharp" | "c#" | "cs" => Language::CSharp,
            "c" | "cpp" | "c++" | "objective-c" => Language::Cpp,
            "php" => Language::Php,
            "ruby" | "rb" => Language::Ruby,
            _ => Language::Other,
        }
    }

    /// Resolve by file extension.
    pub fn from_path(path: &str) -> Self {
        let ext = std::path::Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        match ext {
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" | "mts" | "cts" => Language::TypeScript,
            "py" | "pyi" => Language::Python,
            "rs" => Language::Rust,
            "go" => Language::Go,
            "java" | "kt" | "kts" => Language::Java,
            "cs" => Language::CSharp,
            "c" | "h" | "cpp" | "cc" | "cxx" | "hpp" => Language::Cpp,
            "php" => Language::Php,
            "rb" => Language::Ruby,
            _ => Language::Other,
        }
    }

    /// Editor language id for this family
    pub fn tag(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Java => "java",
            Language::CSharp => "csharp",
            Language::Cpp => "cpp",
            Language::Php => "php",
            Language::Ruby => "ruby",
            Language::Other => "plaintext",
        }
    }

    /// Whether blocks are delimited by indentation rather than braces
    pub fn is_indent_scoped(&self) -> bool {
        matches!(self, Language::Python)
    }

    /// Whether `#` starts a line comment
    pub fn hash_comments(&self) -> bool {
        matches!(self, Language::Python | Language::Ruby | Language::Php)
    }
}

/// One file's text plus its language tag, the unit of analysis.
///
/// Immutable once constructed; detectors only ever borrow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    pub path: String,
    pub language_tag: String,
    pub text: String,
}

impl SourceUnit {
    pub fn new(
        path: impl Into<String>,
        language_tag: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            language_tag: language_tag.into(),
            text: text.into(),
        }
    }

    /// Build a unit whose language is inferred from the path extension
    pub fn from_path(path: impl Into<String>, text: impl Into<String>) -> Self {
        let path = path.into();
        let tag = Language::from_path(&path).tag();
        Self::new(path, tag, text)
    }

    /// Language family, preferring the explicit tag over the extension
    pub fn language(&self) -> Language {
        match Language::from_tag(&self.language_tag) {
            Language::Other => Language::from_path(&self.path),
            lang => lang,
        }
    }

    pub fn lines(&self) -> Vec<&str> {
        self.text.lines().collect()
    }

    /// Number of lines, never less than one so clamping always has a target
    pub fn line_count(&self) -> usize {
        self.text.lines().count().max(1)
    }

    /// Clamp a (possibly out of range) zero-based line into this unit
    pub fn clamp_line(&self, line: i64) -> u32 {
        let last = self.line_count() as i64 - 1;
        line.clamp(0, last) as u32
    }
}

/// Severity levels for findings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Points subtracted from a 100 baseline per finding
    pub fn penalty(&self) -> f64 {
        match self {
            Severity::Critical => 20.0,
            Severity::High => 10.0,
            Severity::Medium => 5.0,
            Severity::Low => 2.0,
            Severity::Info => 0.0,
        }
    }

    /// Lenient parse of free-form severity labels. Unknown labels map to `Info`.
    pub fn parse_lenient(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "critical" | "blocker" | "fatal" => Severity::Critical,
            "high" | "error" | "major" | "severe" => Severity::High,
            "medium" | "warning" | "warn" | "moderate" => Severity::Medium,
            "low" | "minor" => Severity::Low,
            _ => Severity::Info,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!(
                "Unknown severity '{}'. Valid values: info, low, medium, high, critical",
                other
            )),
        }
    }
}

/// Issue category. `AiDetected` is scored as `CodeSmell`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    CodeSmell,
    BestPractice,
    Security,
    Performance,
    Testing,
    Documentation,
    AiDetected,
}

impl Category {
    /// The six categories that carry a score
    pub const SCORED: [Category; 6] = [
        Category::CodeSmell,
        Category::BestPractice,
        Category::Security,
        Category::Performance,
        Category::Testing,
        Category::Documentation,
    ];

    /// Category whose score a finding of this category affects
    pub fn scoring_bucket(&self) -> Category {
        match self {
            Category::AiDetected => Category::CodeSmell,
            other => *other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::CodeSmell => "code_smell",
            Category::BestPractice => "best_practice",
            Category::Security => "security",
            Category::Performance => "performance",
            Category::Testing => "testing",
            Category::Documentation => "documentation",
            Category::AiDetected => "ai_detected",
        }
    }

    /// Human-readable label for reports
    pub fn label(&self) -> &'static str {
        match self {
            Category::CodeSmell => "Code Smells",
            Category::BestPractice => "Best Practices",
            Category::Security => "Security",
            Category::Performance => "Performance",
            Category::Testing => "Testing",
            Category::Documentation => "Documentation",
            Category::AiDetected => "AI Detected",
        }
    }

    /// Lenient parse of free-form category labels. Unknown labels map to `AiDetected`.
    pub fn parse_lenient(label: &str) -> Self {
        let normalized = label.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "security" | "vulnerability" | "injection" | "secret" => Category::Security,
            "performance" | "perf" | "efficiency" => Category::Performance,
            "code_smell" | "smell" | "complexity" | "maintainability" | "duplication" => {
                Category::CodeSmell
            }
            "best_practice" | "best_practices" | "style" | "convention" => Category::BestPractice,
            "testing" | "test" | "tests" | "coverage" => Category::Testing,
            "documentation" | "docs" | "doc" | "comment" => Category::Documentation,
            _ => Category::AiDetected,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a finding came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    #[default]
    Local,
    Ai,
}

/// Zero-based location of a finding inside a source unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Location {
    pub path: String,
    pub start_line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_column: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u32>,
}

impl Location {
    /// Single-line location
    pub fn line(path: impl Into<String>, line: u32) -> Self {
        Self {
            path: path.into(),
            start_line: line,
            ..Default::default()
        }
    }

    /// Multi-line span
    pub fn span(path: impl Into<String>, start: u32, end: u32) -> Self {
        Self {
            path: path.into(),
            start_line: start,
            end_line: Some(end),
            ..Default::default()
        }
    }

    pub fn with_columns(mut self, start: u32, end: u32) -> Self {
        self.start_column = Some(start);
        self.end_column = Some(end);
        self
    }

    /// End line, defaulting to a single-line range
    pub fn last_line(&self) -> u32 {
        self.end_line.unwrap_or(self.start_line).max(self.start_line)
    }
}

/// A detected issue
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    /// Detector (or `ai`) that produced the finding
    #[serde(default)]
    pub rule: String,
    pub category: Category,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub suggestion: String,
    pub location: Location,
    #[serde(default)]
    pub auto_fix_available: bool,
    #[serde(default)]
    pub origin: Origin,
}

impl Finding {
    /// Locally detected finding with no suggestion yet
    pub fn local(
        rule: impl Into<String>,
        category: Category,
        severity: Severity,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            rule: rule.into(),
            category,
            severity,
            message: message.into(),
            suggestion: String::new(),
            location,
            auto_fix_available: false,
            origin: Origin::Local,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    pub fn with_auto_fix(mut self) -> Self {
        self.auto_fix_available = true;
        self
    }
}

/// Summary of findings by severity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingsSummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    pub total: usize,
}

impl FindingsSummary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = Self::default();
        for f in findings {
            match f.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
                Severity::Info => summary.info += 1,
            }
            summary.total += 1;
        }
        summary
    }
}

/// Aggregate result over one or more source units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub overall_score: u32,
    pub category_scores: BTreeMap<Category, u32>,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<String>,
    pub units: Vec<String>,
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self::fresh()
    }
}

impl AnalysisResult {
    /// All scores at 100, no findings
    pub fn fresh() -> Self {
        Self {
            overall_score: 100,
            category_scores: Category::SCORED.iter().map(|c| (*c, 100)).collect(),
            findings: Vec::new(),
            recommendations: Vec::new(),
            units: Vec::new(),
        }
    }

    pub fn category_score(&self, category: Category) -> u32 {
        self.category_scores
            .get(&category.scoring_bucket())
            .copied()
            .unwrap_or(100)
    }

    pub fn summary(&self) -> FindingsSummary {
        FindingsSummary::from_findings(&self.findings)
    }

    pub fn grade(&self) -> &'static str {
        grade_from_score(self.overall_score)
    }

    /// Findings grouped by category, in first-seen category order
    pub fn findings_by_category(&self) -> Vec<(Category, Vec<&Finding>)> {
        let mut groups: Vec<(Category, Vec<&Finding>)> = Vec::new();
        for finding in &self.findings {
            match groups.iter_mut().find(|(c, _)| *c == finding.category) {
                Some((_, items)) => items.push(finding),
                None => groups.push((finding.category, vec![finding])),
            }
        }
        groups
    }

    /// Copy with only findings at or above `min` (scores untouched)
    pub fn filtered(&self, min: Severity) -> Self {
        let mut copy = self.clone();
        copy.findings.retain(|f| f.severity >= min);
        copy
    }
}

/// Letter grade for a score
pub fn grade_from_score(score: u32) -> &'static str {
    match score {
        s if s >= 90 => "A",
        s if s >= 80 => "B",
        s if s >= 70 => "C",
        s if s >= 60 => "D",
        _ => "F",
    }
}
