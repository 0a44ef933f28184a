//! Markdown reporter for GitHub-flavored Markdown output
//!
//! Generates reports suitable for:
//! - Pull request comments
//! - Saved review notes
//! - Documentation

use crate::models::{AnalysisResult, Category, Finding, Severity};
use anyhow::Result;
use chrono::Local;

/// Maximum findings to show per category
const MAX_FINDINGS_PER_CATEGORY: usize = 15;

/// Render result as GitHub-flavored Markdown
pub fn render(result: &AnalysisResult) -> Result<String> {
    let mut md = String::new();

    md.push_str(&render_header(result));
    md.push('\n');

    md.push_str(&render_category_scores(result));
    md.push('\n');

    md.push_str(&render_findings_summary(result));
    md.push('\n');

    md.push_str(&render_recommendations(result));
    md.push('\n');

    md.push_str(&render_detailed_findings(result));
    md.push('\n');

    md.push_str(&render_footer());

    Ok(md)
}

fn render_header(result: &AnalysisResult) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let units = match result.units.len() {
        0 => String::new(),
        1 => format!("\nFile: `{}`\n", result.units[0]),
        n => format!("\nFiles analyzed: {}\n", n),
    };

    format!(
        r#"# Code Quality Report

**Grade: {}** | **Score: {}/100**
{}
Generated: {}
"#,
        result.grade(),
        result.overall_score,
        units,
        timestamp
    )
}

fn render_category_scores(result: &AnalysisResult) -> String {
    let mut md = String::from(
        "## Category Scores\n\n| Category | Score | Status |\n|----------|-------|--------|\n",
    );
    for category in Category::SCORED {
        let score = result.category_score(category);
        md.push_str(&format!(
            "| {} | {}/100 | {} |\n",
            category.label(),
            score,
            score_indicator(score)
        ));
    }
    md
}

fn render_findings_summary(result: &AnalysisResult) -> String {
    let fs = result.summary();

    format!(
        r#"## Findings Summary

| Severity | Count |
|----------|-------|
| Critical | {} |
| High | {} |
| Medium | {} |
| Low | {} |
| Info | {} |
| **Total** | **{}** |
"#,
        fs.critical, fs.high, fs.medium, fs.low, fs.info, fs.total
    )
}

fn render_recommendations(result: &AnalysisResult) -> String {
    let mut md = String::from("## Recommendations\n\n");
    if result.recommendations.is_empty() {
        md.push_str("Nothing urgent. Keep it up.\n");
        return md;
    }
    for rec in &result.recommendations {
        md.push_str(&format!("- {}\n", rec));
    }
    md
}

fn render_detailed_findings(result: &AnalysisResult) -> String {
    let mut md = String::from("## Findings\n\n");

    if result.findings.is_empty() {
        md.push_str("No issues found.\n");
        return md;
    }

    for (category, findings) in result.findings_by_category() {
        md.push_str(&format!(
            "### {} ({})\n\n",
            category.label(),
            findings.len()
        ));

        let hidden = findings.len().saturating_sub(MAX_FINDINGS_PER_CATEGORY);
        for finding in findings.into_iter().take(MAX_FINDINGS_PER_CATEGORY) {
            md.push_str(&render_finding(finding));
        }

        if hidden > 0 {
            md.push_str(&format!("*...and {} more*\n\n", hidden));
        }
    }

    md
}

fn render_finding(finding: &Finding) -> String {
    let loc = &finding.location;
    let lines = if loc.last_line() > loc.start_line {
        format!("{}-{}", loc.start_line + 1, loc.last_line() + 1)
    } else {
        (loc.start_line + 1).to_string()
    };

    let mut md = format!(
        "- **{}** `{}` at `{}:{}`: {}\n",
        severity_label(finding.severity),
        finding.rule,
        loc.path,
        lines,
        finding.message
    );
    if !finding.suggestion.is_empty() {
        md.push_str(&format!("  > **Fix:** {}\n", finding.suggestion));
    }
    md
}

fn render_footer() -> String {
    "---\n\n*Generated by codesight*\n".to_string()
}

fn score_indicator(score: u32) -> &'static str {
    if score >= 80 {
        "Good"
    } else if score >= 60 {
        "Fair"
    } else {
        "Poor"
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "Critical",
        Severity::High => "High",
        Severity::Medium => "Medium",
        Severity::Low => "Low",
        Severity::Info => "Info",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_result;

    #[test]
    fn test_markdown_render_has_header() {
        let md = render(&test_result()).unwrap();
        assert!(md.starts_with("# Code Quality Report"));
        assert!(md.contains("Grade: C"));
        assert!(md.contains("75/100"));
        assert!(md.contains("File: `src/main.js`"));
    }

    #[test]
    fn test_markdown_groups_by_category() {
        let md = render(&test_result()).unwrap();
        assert!(md.contains("### Security (1)"));
        assert!(md.contains("### Code Smells (1)"));
        assert!(md.contains("`src/main.js:10`"));
        assert!(md.contains("`src/main.js:21-54`"));
        assert!(md.contains("> **Fix:** Load it from the environment"));
        assert!(md.find("### Security").unwrap() < md.find("### Code Smells").unwrap());
    }

    #[test]
    fn test_markdown_lists_scores_and_recommendations() {
        let result = test_result();
        let md = render(&result).unwrap();
        assert!(md.contains("| Security | 70/100 | Fair |"));
        for rec in &result.recommendations {
            assert!(md.contains(rec.as_str()));
        }
    }

    #[test]
    fn test_markdown_empty_findings() {
        let md = render(&AnalysisResult::fresh()).unwrap();
        assert!(md.contains("No issues found"));
        assert!(md.contains("Nothing urgent"));
    }
}
