//! Last-resort field scraping
//!
//! Scans independently for `type`, `description` and `line` fields and zips
//! the occurrences by position. Never fails; the records may be partial.

use super::RawRecord;
use regex::Regex;
use std::sync::OnceLock;

static TYPE_FIELD: OnceLock<Regex> = OnceLock::new();
static DESCRIPTION_FIELD: OnceLock<Regex> = OnceLock::new();
static LINE_FIELD: OnceLock<Regex> = OnceLock::new();

/// Severity given to scraped records
pub const SCRAPED_SEVERITY: &str = "info";
/// Suggestion given to scraped records
pub const SCRAPED_SUGGESTION: &str = "Review code";
/// Type given to scraped records without one
pub const UNKNOWN_TYPE: &str = "unknown";

fn type_field() -> &'static Regex {
    TYPE_FIELD.get_or_init(|| {
        Regex::new(r#"["']?\btype\b["']?\s*[:=]\s*(?:"([^"\n]*)"|'([^'\n]*)')"#)
            .expect("valid regex")
    })
}

fn description_field() -> &'static Regex {
    // Closing quote optional: truncated replies often end mid-description
    DESCRIPTION_FIELD.get_or_init(|| {
        Regex::new(
            r#"["']?\bdescription\b["']?\s*[:=]\s*(?:"((?:[^"\\\n]|\\.)*)"?|'((?:[^'\\\n]|\\.)*)'?)"#,
        )
        .expect("valid regex")
    })
}

fn line_field() -> &'static Regex {
    LINE_FIELD.get_or_init(|| {
        Regex::new(r#"["']?\bline\b["']?\s*[:=]\s*["']?(-?\d+)"#).expect("valid regex")
    })
}

fn captured(caps: &regex::Captures) -> String {
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().replace("\\\"", "\"").trim().to_string())
        .unwrap_or_default()
}

/// Scrape records out of arbitrary text
pub fn scrape(text: &str) -> Vec<RawRecord> {
    let types: Vec<String> = type_field().captures_iter(text).map(|c| captured(&c)).collect();
    let descriptions: Vec<String> = description_field()
        .captures_iter(text)
        .map(|c| captured(&c))
        .collect();
    let lines: Vec<i64> = line_field()
        .captures_iter(text)
        .filter_map(|c| c.get(1).and_then(|m| m.as_str().parse().ok()))
        .collect();

    let count = types.len().max(descriptions.len());
    (0..count)
        .map(|i| RawRecord {
            kind: Some(
                types
                    .get(i)
                    .filter(|t| !t.is_empty())
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_TYPE.to_string()),
            ),
            severity: Some(SCRAPED_SEVERITY.to_string()),
            description: descriptions.get(i).cloned(),
            suggestion: Some(SCRAPED_SUGGESTION.to_string()),
            line: lines.get(i).copied(),
            end_line: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zips_by_position() {
        let text = r#"{"patterns": [ {"type": "security", "description": "SQL built from input", "line": 4},
            {"type": "performance" "description": "N+1 query" line: 9 }, {{{ "#;
        let records = scrape(text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind.as_deref(), Some("security"));
        assert_eq!(records[0].line, Some(4));
        assert_eq!(records[1].description.as_deref(), Some("N+1 query"));
        assert_eq!(records[1].line, Some(9));
        assert_eq!(records[1].severity.as_deref(), Some("info"));
        assert_eq!(records[1].suggestion.as_deref(), Some("Review code"));
    }

    #[test]
    fn test_missing_fields_default() {
        let records = scrape(r#"{"description": "something odd", "description": "cut off mid"#);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind.as_deref(), Some("unknown"));
        assert_eq!(records[1].description.as_deref(), Some("cut off mid"));
        assert_eq!(records[0].line, None);
    }

    #[test]
    fn test_nothing_to_scrape() {
        assert!(scrape("{ totally: unrelated }").is_empty());
    }
}
