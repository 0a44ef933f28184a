//! Prompt building for AI review
//!
//! The source sample is bounded by a character budget and numbered with
//! 1-based line numbers so the model can point at lines.

use crate::models::SourceUnit;

/// System prompt sent with every review request
pub const SYSTEM_PROMPT: &str = "You are a senior code reviewer. You find bugs, security \
problems, performance issues and maintainability problems. You reply with JSON only, no prose.";

const RESPONSE_SHAPE: &str = r#"{"patterns": [{"type": "security|performance|code_smell|best_practice|testing|documentation", "severity": "critical|high|medium|low|info", "description": "...", "suggestion": "...", "line": 1}]}"#;

/// First `max_chars` characters of the unit's text
pub fn sample_source(text: &str, max_chars: usize) -> (String, bool) {
    let truncated = text.chars().count() > max_chars;
    let sample = if truncated {
        text.chars().take(max_chars).collect()
    } else {
        text.to_string()
    };
    (sample, truncated)
}

/// Build the review prompt for one unit
pub fn build_review_prompt(unit: &SourceUnit, max_chars: usize) -> String {
    let (sample, truncated) = sample_source(&unit.text, max_chars);
    let mut numbered = String::with_capacity(sample.len() + sample.len() / 8);
    for (i, line) in sample.lines().enumerate() {
        numbered.push_str(&format!("{:>4} | {}\n", i + 1, line));
    }

    let mut prompt = String::new();
    prompt.push_str(&format!(
        "Review this {} file `{}` for issues that simple pattern matching would miss.\n\n",
        unit.language().tag(),
        unit.path
    ));
    prompt.push_str("```\n");
    prompt.push_str(&numbered);
    if truncated {
        prompt.push_str("... [truncated] ...\n");
    }
    prompt.push_str("```\n\n");
    prompt.push_str("Respond ONLY with a JSON object of this shape:\n");
    prompt.push_str(RESPONSE_SHAPE);
    prompt.push_str("\n\nUse the line numbers shown above. Return {\"patterns\": []} if there are no issues.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_is_bounded() {
        let text = "x".repeat(5000);
        let (sample, truncated) = sample_source(&text, 2000);
        assert_eq!(sample.chars().count(), 2000);
        assert!(truncated);

        let (sample, truncated) = sample_source("short", 2000);
        assert_eq!(sample, "short");
        assert!(!truncated);
    }

    #[test]
    fn test_sample_counts_characters_not_bytes() {
        let text = "é".repeat(10);
        let (sample, _) = sample_source(&text, 4);
        assert_eq!(sample, "éééé");
    }

    #[test]
    fn test_prompt_shape() {
        let unit = SourceUnit::from_path("src/app.ts", "const a = 1;\nconst b = 2;\n");
        let prompt = build_review_prompt(&unit, 2000);
        assert!(prompt.contains("src/app.ts"));
        assert!(prompt.contains("   1 | const a = 1;"));
        assert!(prompt.contains("   2 | const b = 2;"));
        assert!(prompt.contains("\"patterns\""));
        assert!(!prompt.contains("[truncated]"));
    }
}
