//! Locating the JSON-like part of a model reply
//!
//! Priority: an object holding a `patterns` key, then a run of adjacent
//! objects, then any object, then any array. Balanced fragments are
//! preferred; when the reply is too broken to balance, the span from the
//! first opener to the last closer is used.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

static PATTERNS_KEY: OnceLock<Regex> = OnceLock::new();

fn patterns_key() -> &'static Regex {
    PATTERNS_KEY.get_or_init(|| Regex::new(r#"["']?\bpatterns\b["']?\s*:"#).expect("valid regex"))
}

/// Strip markdown code fences from a response
pub fn strip_markdown_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let clean = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    clean.strip_suffix("```").unwrap_or(clean).trim()
}

/// Extract the first balanced fragment between matching delimiters.
///
/// Delimiters inside double-quoted strings are ignored; stray closers before
/// the first opener are skipped.
pub fn extract_json_fragment(text: &str, open: char, close: char) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;
    let mut start_idx = None;

    for (i, c) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        if c == '\\' && in_string {
            escape_next = true;
            continue;
        }
        if c == '"' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }

        if c == open {
            if depth == 0 {
                start_idx = Some(i);
            }
            depth += 1;
        } else if c == close && depth > 0 {
            depth -= 1;
            if depth == 0 {
                return start_idx.map(|start| &text[start..i + close.len_utf8()]);
            }
        }
    }
    None
}

/// First opener to last closer, when both exist in order
fn loose_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..end + close.len_utf8()])
}

/// The object that encloses the `patterns` key
fn object_with_patterns(text: &str) -> Option<&str> {
    let key = patterns_key().find(text)?.start();
    let openers: Vec<usize> = text[..key].match_indices('{').map(|(i, _)| i).collect();

    // Nearest opener whose balanced fragment reaches past the key
    for &start in openers.iter().rev() {
        if let Some(fragment) = extract_json_fragment(&text[start..], '{', '}') {
            if start + fragment.len() > key {
                return Some(fragment);
            }
        }
    }
    let start = *openers.last()?;
    loose_span(&text[start..], '{', '}')
}

/// Any object. An array that opens first and encloses the object wins, so a
/// bare list of records is not cut down to its first element.
fn any_object(text: &str) -> Option<&str> {
    let object_start = text.find('{')?;
    if let Some(array_start) = text.find('[') {
        if array_start < object_start {
            if let Some(array) = extract_json_fragment(&text[array_start..], '[', ']') {
                if array_start + array.len() > object_start {
                    return Some(array);
                }
            }
        }
    }
    extract_json_fragment(text, '{', '}').or_else(|| loose_span(text, '{', '}'))
}

fn any_array(text: &str) -> Option<&str> {
    extract_json_fragment(text, '[', ']').or_else(|| loose_span(text, '[', ']'))
}

/// Two or more top-level objects separated only by whitespace or commas,
/// joined into one array
fn adjacent_objects(text: &str) -> Option<String> {
    let mut rest = &text[text.find('{')?..];
    let mut objects = Vec::new();

    while let Some(object) = extract_json_fragment(rest, '{', '}') {
        objects.push(object);
        rest = rest[object.len()..].trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if !rest.starts_with('{') {
            break;
        }
    }
    (objects.len() > 1).then(|| format!("[{}]", objects.join(",")))
}

/// Locate the JSON-like substring of a reply, if any
pub fn locate(response: &str) -> Option<&str> {
    let text = strip_markdown_fences(response);
    object_with_patterns(text)
        .or_else(|| any_object(text))
        .or_else(|| any_array(text))
}

/// Every distinct fragment worth parsing, best first. Empty when the reply
/// holds nothing JSON-like.
pub fn candidates(response: &str) -> Vec<Cow<'_, str>> {
    let text = strip_markdown_fences(response);
    let options = [
        object_with_patterns(text).map(Cow::Borrowed),
        adjacent_objects(text).map(Cow::Owned),
        any_object(text).map(Cow::Borrowed),
        any_array(text).map(Cow::Borrowed),
    ];

    let mut found: Vec<Cow<str>> = Vec::new();
    for fragment in options.into_iter().flatten() {
        if !found.contains(&fragment) {
            found.push(fragment);
        }
    }
    found
}
