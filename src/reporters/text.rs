//! Text (terminal) reporter with colors and formatting

use crate::models::{AnalysisResult, Category, Finding, Severity};
use anyhow::Result;

/// Number of findings listed before the rest are summarized
const MAX_LISTED: usize = 20;

/// Grade colors (ANSI escape codes)
fn grade_color(grade: &str) -> &'static str {
    match grade {
        "A" => "\x1b[32m", // Green
        "B" => "\x1b[92m", // Light green
        "C" => "\x1b[33m", // Yellow
        "D" => "\x1b[91m", // Light red
        "F" => "\x1b[31m", // Red
        _ => "\x1b[0m",
    }
}

/// Severity colors
fn severity_color(severity: &Severity) -> &'static str {
    match severity {
        Severity::Critical => "\x1b[31m", // Red
        Severity::High => "\x1b[91m",     // Light red
        Severity::Medium => "\x1b[33m",   // Yellow
        Severity::Low => "\x1b[34m",      // Blue
        Severity::Info => "\x1b[90m",     // Gray
    }
}

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Severity tag
fn severity_tag(severity: &Severity) -> &'static str {
    match severity {
        Severity::Critical => "[C]",
        Severity::High => "[H]",
        Severity::Medium => "[M]",
        Severity::Low => "[L]",
        Severity::Info => "[I]",
    }
}

/// Render result as formatted terminal output
pub fn render(result: &AnalysisResult) -> Result<String> {
    let mut out = String::new();

    // Header
    let grade = result.grade();
    let grade_c = grade_color(grade);
    out.push_str(&format!("\n{BOLD}Codesight Analysis{RESET}\n"));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!(
        "Score: {BOLD}{}/100{RESET}  Grade: {grade_c}{BOLD}{}{RESET}  Files: {}\n\n",
        result.overall_score,
        grade,
        result.units.len()
    ));

    // Category scores, two per line
    out.push_str(&format!("{BOLD}SCORES{RESET}\n"));
    for pair in Category::SCORED.chunks(2) {
        out.push(' ');
        for category in pair {
            out.push_str(&format!(
                " {:<15} {}",
                category.label(),
                format_score(result.category_score(*category))
            ));
        }
        out.push('\n');
    }
    out.push('\n');

    // Findings summary
    let fs = result.summary();
    out.push_str(&format!("{BOLD}FINDINGS{RESET} ({} total)\n", fs.total));

    let mut summary_parts = Vec::new();
    if fs.critical > 0 {
        summary_parts.push(format!("\x1b[31m{} critical{RESET}", fs.critical));
    }
    if fs.high > 0 {
        summary_parts.push(format!("\x1b[91m{} high{RESET}", fs.high));
    }
    if fs.medium > 0 {
        summary_parts.push(format!("\x1b[33m{} medium{RESET}", fs.medium));
    }
    if fs.low > 0 {
        summary_parts.push(format!("\x1b[34m{} low{RESET}", fs.low));
    }
    if fs.info > 0 {
        summary_parts.push(format!("\x1b[90m{} info{RESET}", fs.info));
    }
    if !summary_parts.is_empty() {
        out.push_str(&format!("  {}\n\n", summary_parts.join(" | ")));
    }

    // Most severe first
    if !result.findings.is_empty() {
        let mut sorted: Vec<&Finding> = result.findings.iter().collect();
        sorted.sort_by(|a, b| b.severity.cmp(&a.severity));

        out.push_str(&format!(
            "{DIM}  SEV  RULE                  MESSAGE                                  LOCATION{RESET}\n"
        ));
        out.push_str(&format!(
            "{DIM}  ─────────────────────────────────────────────────────────────────────────────{RESET}\n"
        ));

        for finding in sorted.iter().take(MAX_LISTED) {
            let sev_c = severity_color(&finding.severity);
            let sev_tag = severity_tag(&finding.severity);
            out.push_str(&format!(
                "  {sev_c}{}{RESET}  {:<20}  {:<40}  {DIM}{}{RESET}\n",
                sev_tag,
                finding.rule,
                truncate(&finding.message, 40),
                format_location(finding)
            ));
        }

        let remaining = sorted.len().saturating_sub(MAX_LISTED);
        if remaining > 0 {
            out.push_str(&format!(
                "\n  {DIM}...and {} more (use --format markdown for the full list){RESET}\n",
                remaining
            ));
        }
        out.push('\n');
    }

    if !result.recommendations.is_empty() {
        out.push_str(&format!("{BOLD}RECOMMENDATIONS{RESET}\n"));
        for rec in &result.recommendations {
            out.push_str(&format!("  → {}\n", rec));
        }
        out.push('\n');
    }

    Ok(out)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// `path:line`, shortened from the left
fn format_location(finding: &Finding) -> String {
    let path = &finding.location.path;
    let short = if path.chars().count() > 28 {
        let skip = path.chars().count() - 25;
        format!("...{}", path.chars().skip(skip).collect::<String>())
    } else {
        path.clone()
    };
    format!("{}:{}", short, finding.location.start_line + 1)
}

/// Format score with color
fn format_score(score: u32) -> String {
    let color = if score >= 80 {
        "\x1b[32m"
    } else if score >= 60 {
        "\x1b[33m"
    } else {
        "\x1b[31m"
    };
    format!("{color}{:>3}{RESET}", score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_result;

    #[test]
    fn test_text_render() {
        let text = render(&test_result()).unwrap();
        assert!(text.contains("Codesight Analysis"));
        assert!(text.contains("75/100"));
        assert!(text.contains("hardcoded-secret"));
        assert!(text.contains("src/main.js:10"));
        assert!(text.contains("RECOMMENDATIONS"));
    }

    #[test]
    fn test_most_severe_listed_first() {
        let text = render(&test_result()).unwrap();
        assert!(text.find("[C]").unwrap() < text.find("[M]").unwrap());
    }

    #[test]
    fn test_truncate_is_char_safe() {
        let long = "é".repeat(50);
        assert_eq!(truncate(&long, 10).chars().count(), 10);
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn test_empty_result() {
        let text = render(&AnalysisResult::fresh()).unwrap();
        assert!(text.contains("0 total"));
        assert!(!text.contains("RECOMMENDATIONS"));
    }
}
