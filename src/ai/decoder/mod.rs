//! Resilient finding decoder
//!
//! Recovers structured findings from a model reply that is frequently not
//! valid JSON. Strategies are tried in order, first success wins:
//!
//! 1. extraction of the JSON-like candidates (nothing found: empty result)
//! 2. direct parse of each candidate
//! 3. repair, then parse, of each candidate
//! 4. field scraping (never fails)
//!
//! A parse only succeeds when it yields records, or an explicit empty list
//! under a list key such as `{"patterns": []}`.
//!
//! Decoding never returns an error. Every record is normalized into a
//! [`Finding`] with its line clamped into the unit.

mod extract;
mod repair;
mod scrape;

pub use extract::{candidates, extract_json_fragment, locate, strip_markdown_fences};
pub use repair::repair;
pub use scrape::scrape;

use crate::models::{Category, Finding, Location, Origin, Severity, SourceUnit};
use serde_json::Value;
use std::borrow::Cow;
use tracing::debug;

/// Rule name carried by decoded findings
pub const AI_RULE: &str = "ai";

/// Keys under which a reply may list its records
const LIST_KEYS: [&str; 4] = ["patterns", "findings", "issues", "results"];

/// Which strategy produced the records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    Direct,
    Repaired,
    Scraped,
}

/// One loosely-typed record as the model wrote it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    /// `type` (or `category`) label
    pub kind: Option<String>,
    pub severity: Option<String>,
    pub description: Option<String>,
    pub suggestion: Option<String>,
    /// 1-based line as numbered in the prompt
    pub line: Option<i64>,
    pub end_line: Option<i64>,
}

fn string_field(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match obj.get(*k)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn int_field(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|k| match obj.get(*k)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Array(items) => items.first().and_then(|v| v.as_i64()),
        _ => None,
    })
}

impl RawRecord {
    /// Read a record from a JSON object; anything else is not a record
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let record = Self {
            kind: string_field(obj, &["type", "category", "kind"]),
            severity: string_field(obj, &["severity", "level", "priority"]),
            description: string_field(obj, &["description", "message", "issue", "title"]),
            suggestion: string_field(obj, &["suggestion", "fix", "recommendation"]),
            line: int_field(obj, &["line", "line_number", "lineNumber", "startLine", "start_line"]),
            end_line: int_field(obj, &["endLine", "end_line"]),
        };
        (record.kind.is_some() || record.description.is_some()).then_some(record)
    }
}

/// Records held by a parsed value: a list under a known key, a bare array,
/// or a single record object. `None` when the value holds no records and is
/// not an explicit empty list under a known key.
fn records_from_value(value: &Value) -> Option<Vec<RawRecord>> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(obj) => match LIST_KEYS.iter().find_map(|k| obj.get(*k)) {
            Some(Value::Array(items)) if items.is_empty() => return Some(Vec::new()),
            Some(Value::Array(items)) => items.iter().collect(),
            Some(_) => return None,
            None => vec![value],
        },
        _ => return None,
    };
    let records: Vec<RawRecord> = items.into_iter().filter_map(RawRecord::from_value).collect();
    (!records.is_empty()).then_some(records)
}

/// What each strategy sees: the candidate fragments and the whole reply
struct Extracted<'a> {
    fragments: Vec<Cow<'a, str>>,
    response: &'a str,
}

fn parse_value(text: &str) -> Option<Vec<RawRecord>> {
    let value: Value = serde_json::from_str(text).ok()?;
    records_from_value(&value)
}

fn parse_direct(input: &Extracted) -> Option<Vec<RawRecord>> {
    input.fragments.iter().find_map(|f| parse_value(f))
}

fn parse_repaired(input: &Extracted) -> Option<Vec<RawRecord>> {
    input.fragments.iter().find_map(|f| parse_value(&repair(f)))
}

/// Scrapes the whole reply: fields past a broken fragment still count
fn parse_scraped(input: &Extracted) -> Option<Vec<RawRecord>> {
    Some(scrape(input.response))
}

type Strategy = fn(&Extracted) -> Option<Vec<RawRecord>>;

const STRATEGIES: [(DecodeStrategy, Strategy); 3] = [
    (DecodeStrategy::Direct, parse_direct),
    (DecodeStrategy::Repaired, parse_repaired),
    (DecodeStrategy::Scraped, parse_scraped),
];

/// Stateless decoder for model replies
#[derive(Debug, Clone, Copy, Default)]
pub struct ResilientFindingDecoder;

impl ResilientFindingDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Raw records and the strategy that produced them, or `None` when the
    /// reply holds nothing JSON-like
    pub fn decode_records(&self, response: &str) -> Option<(DecodeStrategy, Vec<RawRecord>)> {
        let fragments = candidates(response);
        if fragments.is_empty() {
            return None;
        }
        let input = Extracted { fragments, response };
        STRATEGIES.iter().find_map(|(strategy, parse)| {
            parse(&input).map(|records| {
                debug!("Decoded {} records via {:?}", records.len(), strategy);
                (*strategy, records)
            })
        })
    }

    /// Findings for `unit` recovered from `response`. Never fails.
    pub fn decode(&self, response: &str, unit: &SourceUnit) -> Vec<Finding> {
        match self.decode_records(response) {
            Some((_, records)) => records.iter().map(|r| normalize(r, unit)).collect(),
            None => {
                debug!("No JSON-like content in model reply for {}", unit.path);
                Vec::new()
            }
        }
    }
}

/// Turn a raw record into a finding located inside `unit`
pub fn normalize(record: &RawRecord, unit: &SourceUnit) -> Finding {
    let category = record
        .kind
        .as_deref()
        .map(Category::parse_lenient)
        .unwrap_or(Category::AiDetected);
    let severity = record
        .severity
        .as_deref()
        .map(Severity::parse_lenient)
        .unwrap_or_default();

    // Prompt lines are 1-based
    let start = unit.clamp_line(record.line.unwrap_or(1).saturating_sub(1));
    let mut location = Location::line(&unit.path, start);
    if let Some(end) = record.end_line {
        let end = unit.clamp_line(end.saturating_sub(1)).max(start);
        if end > start {
            location.end_line = Some(end);
        }
    }

    Finding {
        rule: AI_RULE.to_string(),
        category,
        severity,
        message: record
            .description
            .clone()
            .unwrap_or_else(|| "AI-detected issue".to_string()),
        suggestion: record
            .suggestion
            .clone()
            .unwrap_or_else(|| scrape::SCRAPED_SUGGESTION.to_string()),
        location,
        auto_fix_available: false,
        origin: Origin::Ai,
    }
}
