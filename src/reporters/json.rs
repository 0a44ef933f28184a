//! JSON reporter
//!
//! Outputs the full AnalysisResult as pretty-printed JSON, plus the grade
//! and severity summary. Useful for piping to jq or further processing.

use crate::models::AnalysisResult;
use anyhow::Result;
use serde_json::json;

fn document(result: &AnalysisResult) -> Result<serde_json::Value> {
    let mut value = serde_json::to_value(result)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("grade".to_string(), json!(result.grade()));
        obj.insert("summary".to_string(), serde_json::to_value(result.summary())?);
    }
    Ok(value)
}

/// Render result as JSON
pub fn render(result: &AnalysisResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(&document(result)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_result;

    #[test]
    fn test_json_render_valid() {
        let result = test_result();
        let json_str = render(&result).expect("render JSON");
        let parsed: serde_json::Value = serde_json::from_str(&json_str).expect("parse JSON");
        assert_eq!(parsed["overall_score"], 75);
        assert_eq!(parsed["grade"], "C");
        assert_eq!(parsed["category_scores"]["security"], 70);
        assert_eq!(parsed["summary"]["critical"], 1);
        assert_eq!(parsed["findings"].as_array().expect("findings array").len(), 2);
    }

    #[test]
    fn test_json_round_trips_result() {
        let result = test_result();
        let json_str = render(&result).expect("render JSON");
        let back: AnalysisResult = serde_json::from_str(&json_str).expect("parse result");
        assert_eq!(back, result);
    }

    #[test]
    fn test_json_empty_findings() {
        let json_str = render(&AnalysisResult::fresh()).expect("render JSON");
        let parsed: serde_json::Value = serde_json::from_str(&json_str).expect("parse JSON");
        assert_eq!(parsed["findings"].as_array().expect("findings array").len(), 0);
        assert_eq!(parsed["grade"], "A");
    }
}
