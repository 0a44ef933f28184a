//! Textual repairs for almost-JSON
//!
//! A bounded, ordered set of rewrites. String contents are never touched by
//! the structural passes: the text is split into code and string segments
//! first and only code segments are rewritten.

use regex::Regex;
use std::sync::OnceLock;

static BARE_KEY: OnceLock<Regex> = OnceLock::new();
static LEADING_ZEROS: OnceLock<Regex> = OnceLock::new();
static MISSING_SEPARATOR: OnceLock<Regex> = OnceLock::new();
static TRAILING_COMMA: OnceLock<Regex> = OnceLock::new();

fn bare_key() -> &'static Regex {
    BARE_KEY.get_or_init(|| {
        Regex::new(r"(^|[{,])(\s*)([A-Za-z_$][\w$-]*)(\s*):").expect("valid regex")
    })
}

fn leading_zeros() -> &'static Regex {
    LEADING_ZEROS.get_or_init(|| Regex::new(r"([:\[,]\s*)(-?)0+(\d)").expect("valid regex"))
}

fn missing_separator() -> &'static Regex {
    MISSING_SEPARATOR.get_or_init(|| Regex::new(r"([}\]])(\s*)([{\[])").expect("valid regex"))
}

fn trailing_comma() -> &'static Regex {
    TRAILING_COMMA.get_or_init(|| Regex::new(r",(\s*[}\]])").expect("valid regex"))
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    /// Structural text outside any string
    Code(String),
    /// A complete double-quoted string literal, quotes included
    Str(String),
}

/// Smart quotes to ASCII, control characters dropped
fn normalize_characters(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Remove `//` line comments and `/* */` block comments outside strings
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' && i + 1 < chars.len() {
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            if c == q || c == '\n' {
                quote = None;
            }
            i += 1;
            continue;
        }

        match (c, chars.get(i + 1)) {
            ('"', _) | ('\'', _) => {
                quote = Some(c);
                out.push(c);
                i += 1;
            }
            ('/', Some('/')) => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            ('/', Some('*')) => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Rewrite single-quoted strings as double-quoted ones
fn normalize_single_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        match quote {
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                    out.push('"');
                } else {
                    out.push(c);
                }
            }
            Some(q) => {
                if c == '\\' {
                    match chars.next() {
                        // `\'` needs no escape inside a double-quoted string
                        Some('\'') if q == '\'' => out.push('\''),
                        Some(next) => {
                            out.push('\\');
                            out.push(next);
                        }
                        None => out.push('\\'),
                    }
                } else if c == q || c == '\n' {
                    quote = None;
                    if c == '\n' {
                        out.push('\n');
                    } else {
                        out.push('"');
                    }
                } else if c == '"' {
                    out.push_str("\\\"");
                } else {
                    out.push(c);
                }
            }
        }
    }
    out
}

/// Split into code and string segments. A string still open at a newline
/// (or at the end of the text) is closed there.
fn segments(text: &str) -> Vec<Segment> {
    let mut result = Vec::new();
    let mut code = String::new();
    let mut literal: Option<String> = None;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match literal.as_mut() {
            None => {
                if c == '"' {
                    if !code.is_empty() {
                        result.push(Segment::Code(std::mem::take(&mut code)));
                    }
                    literal = Some(String::from('"'));
                } else {
                    code.push(c);
                }
            }
            Some(s) => match c {
                '\\' => {
                    s.push('\\');
                    if let Some(next) = chars.next() {
                        s.push(next);
                    }
                }
                '"' => {
                    s.push('"');
                    result.extend(literal.take().map(Segment::Str));
                }
                '\n' => {
                    s.push('"');
                    result.extend(literal.take().map(Segment::Str));
                    code.push('\n');
                }
                other => s.push(other),
            },
        }
    }

    if let Some(mut s) = literal {
        // A dangling backslash would escape the closing quote
        if s.ends_with('\\') && !s.ends_with("\\\\") {
            s.pop();
        }
        s.push('"');
        result.push(Segment::Str(s));
    }
    if !code.is_empty() {
        result.push(Segment::Code(code));
    }
    result
}

fn repair_code(code: &str) -> String {
    let fixed = bare_key().replace_all(code, "${1}${2}\"${3}\"${4}:");
    let fixed = leading_zeros().replace_all(&fixed, "${1}${2}${3}");
    let fixed = missing_separator().replace_all(&fixed, "${1},${2}${3}");
    trailing_comma().replace_all(&fixed, "${1}").into_owned()
}

/// Whether a comma is missing between a code segment and the string after it
fn needs_comma_before_string(code: &str, previous_is_string: bool) -> bool {
    let trimmed = code.trim_end();
    if trimmed.is_empty() {
        // Two strings separated only by whitespace: `"a" "b"`
        return previous_is_string && !code.is_empty();
    }
    let has_gap = trimmed.len() < code.len();
    match trimmed.chars().last() {
        Some('}') | Some(']') => true,
        Some(c) if c.is_ascii_alphanumeric() => has_gap,
        _ => false,
    }
}

/// Apply every repair in order
pub fn repair(text: &str) -> String {
    let text = normalize_characters(text);
    let text = strip_comments(&text);
    let text = normalize_single_quotes(&text);

    let segments = segments(&text);
    let mut out = String::with_capacity(text.len() + 16);
    let mut previous_is_string = false;

    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Str(s) => {
                out.push_str(s);
                previous_is_string = true;
            }
            Segment::Code(code) => {
                let mut fixed = repair_code(code);
                // Separator missing right before a string literal
                if let Some(Segment::Str(_)) = segments.get(i + 1) {
                    if needs_comma_before_string(&fixed, previous_is_string) {
                        let gap_start = fixed.trim_end().len();
                        fixed.insert(gap_start, ',');
                    }
                }
                out.push_str(&fixed);
                previous_is_string = false;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parses(text: &str) -> serde_json::Value {
        serde_json::from_str(&repair(text)).unwrap_or_else(|e| {
            panic!("repair of {:?} gave {:?}: {}", text, repair(text), e)
        })
    }

    #[test]
    fn test_bare_keys_single_quotes_trailing_comma() {
        let value = parses(r#"{type: 'security', description: "hardcoded secret", line: 3,}"#);
        assert_eq!(value["type"], "security");
        assert_eq!(value["description"], "hardcoded secret");
        assert_eq!(value["line"], 3);
    }

    #[test]
    fn test_comments_stripped() {
        let value = parses(
            "{\n  // the finding\n  \"type\": \"perf\", /* inline */ \"url\": \"http://x\"\n}",
        );
        assert_eq!(value["type"], "perf");
        assert_eq!(value["url"], "http://x");
    }

    #[test]
    fn test_leading_zeros() {
        let value = parses(r#"{"line": 007, "ratio": 0.5, "zero": 0}"#);
        assert_eq!(value["line"], 7);
        assert_eq!(value["ratio"], 0.5);
        assert_eq!(value["zero"], 0);
    }

    #[test]
    fn test_missing_separators() {
        let value = parses(r#"{"patterns": [{"type": "a"} {"type": "b"}]}"#);
        assert_eq!(value["patterns"].as_array().map(|a| a.len()), Some(2));

        let value = parses("{\"patterns\": [{\"type\": \"a\"}]\n\"count\": 1}");
        assert_eq!(value["count"], 1);

        let value = parses("{\"line\": 3\n\"type\": \"x\"}");
        assert_eq!(value["type"], "x");
    }

    #[test]
    fn test_unterminated_string_closed_at_line_end() {
        let value = parses("{\"type\": \"security\n, \"line\": 2}");
        assert_eq!(value["type"], "security");
        assert_eq!(value["line"], 2);
    }

    #[test]
    fn test_apostrophes_inside_strings_survive() {
        let value = parses(r#"{"description": "don't do this", note: 'say "hi"'}"#);
        assert_eq!(value["description"], "don't do this");
        assert_eq!(value["note"], "say \"hi\"");
    }

    #[test]
    fn test_string_contents_not_rewritten() {
        let value = parses(r#"{"description": "use {a: 1}, not [1,]", "line": 1}"#);
        assert_eq!(value["description"], "use {a: 1}, not [1,]");
    }

    #[test]
    fn test_smart_quotes() {
        let value = parses("{\u{201C}type\u{201D}: \u{201C}security\u{201D}}");
        assert_eq!(value["type"], "security");
    }
}
