//! Per-language lexical signatures
//!
//! Function-start and public-function patterns used by the structural
//! detectors. These are heuristics over single lines, not a grammar.

use crate::models::Language;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

static FUNCTION_START: OnceLock<HashMap<Language, Vec<Regex>>> = OnceLock::new();
static PUBLIC_FUNCTION: OnceLock<HashMap<Language, Vec<Regex>>> = OnceLock::new();
static CONTROL_KEYWORD: OnceLock<Regex> = OnceLock::new();

const ALL_LANGUAGES: [Language; 11] = [
    Language::JavaScript,
    Language::TypeScript,
    Language::Python,
    Language::Rust,
    Language::Go,
    Language::Java,
    Language::CSharp,
    Language::Cpp,
    Language::Php,
    Language::Ruby,
    Language::Other,
];

const JS_FUNCTION: &[&str] = &[
    r"^\s*(export\s+)?(default\s+)?(async\s+)?function\b",
    r"^\s*(export\s+)?(const|let|var)\s+[\w$]+\s*(:[^=]+)?=\s*(async\s*)?(\([^)]*\)?|[\w$]+)\s*(:\s*[^=]+)?=>",
    r"^\s*(public\s+|private\s+|protected\s+|static\s+|async\s+|readonly\s+)*[\w$]+\s*\([^)]*\)\s*(:\s*[^{;]+)?\{\s*$",
];

const C_LIKE_FUNCTION: &[&str] = &[
    r"^\s*([\w\[\]<>,.?*&:]+\s+)+[\w$]+\s*\([^;]*\)?\s*(throws\s+[\w.,\s]+)?\{?\s*$",
];

const PYTHON_FUNCTION: &[&str] = &[r"^\s*(async\s+)?def\s+\w+\s*\("];
const RUST_FUNCTION: &[&str] =
    &[r"^\s*(pub(\([^)]*\))?\s+)?(const\s+)?(async\s+)?(unsafe\s+)?(extern\s+\S+\s+)?fn\s+\w+"];
const GO_FUNCTION: &[&str] = &[r"^\s*func\b"];
const PHP_FUNCTION: &[&str] =
    &[r"^\s*((public|private|protected|static|final|abstract)\s+)*function\s+&?\w+\s*\("];
const RUBY_FUNCTION: &[&str] = &[r"^\s*def\s+[\w.?!]+"];

const JS_PUBLIC: &[&str] = &[
    r"^\s*export\s+(default\s+)?(async\s+)?function\b",
    r"^\s*export\s+(const|let)\s+[\w$]+\s*(:[^=]+)?=\s*(async\s*)?(\(|function\b)",
];
const PYTHON_PUBLIC: &[&str] = &[r"^\s*(async\s+)?def\s+[A-Za-z]\w*\s*\("];
const RUST_PUBLIC: &[&str] = &[r"^\s*pub\s+(const\s+)?(async\s+)?(unsafe\s+)?fn\s+\w+"];
const GO_PUBLIC: &[&str] = &[r"^func\s+(\([^)]*\)\s*)?[A-Z]\w*\s*[\[(]"];
const JAVA_PUBLIC: &[&str] = &[r"^\s*public\s+([\w\[\]<>,.?]+\s+)*\w+\s*\([^;]*$"];
const PHP_PUBLIC: &[&str] = &[r"^\s*public\s+(static\s+)?function\s+\w+\s*\("];
const RUBY_PUBLIC: &[&str] = &[r"^\s*def\s+(self\.)?[a-z]\w*[?!]?"];

fn function_sources(language: Language) -> Vec<&'static str> {
    match language {
        Language::JavaScript | Language::TypeScript => JS_FUNCTION.to_vec(),
        Language::Python => PYTHON_FUNCTION.to_vec(),
        Language::Rust => RUST_FUNCTION.to_vec(),
        Language::Go => GO_FUNCTION.to_vec(),
        Language::Java | Language::CSharp | Language::Cpp => C_LIKE_FUNCTION.to_vec(),
        Language::Php => PHP_FUNCTION.to_vec(),
        Language::Ruby => RUBY_FUNCTION.to_vec(),
        Language::Other => [JS_FUNCTION, PYTHON_FUNCTION, RUST_FUNCTION, GO_FUNCTION]
            .concat(),
    }
}

fn public_sources(language: Language) -> Vec<&'static str> {
    match language {
        Language::JavaScript | Language::TypeScript => JS_PUBLIC.to_vec(),
        Language::Python => PYTHON_PUBLIC.to_vec(),
        Language::Rust => RUST_PUBLIC.to_vec(),
        Language::Go => GO_PUBLIC.to_vec(),
        Language::Java | Language::CSharp => JAVA_PUBLIC.to_vec(),
        Language::Php => PHP_PUBLIC.to_vec(),
        Language::Ruby => RUBY_PUBLIC.to_vec(),
        Language::Cpp => Vec::new(),
        Language::Other => [JS_PUBLIC, RUST_PUBLIC, JAVA_PUBLIC].concat(),
    }
}

fn compile_table(sources: fn(Language) -> Vec<&'static str>) -> HashMap<Language, Vec<Regex>> {
    ALL_LANGUAGES
        .iter()
        .map(|lang| {
            let compiled = sources(*lang)
                .into_iter()
                .map(|src| Regex::new(src).expect("valid signature regex"))
                .collect();
            (*lang, compiled)
        })
        .collect()
}

fn control_keyword() -> &'static Regex {
    CONTROL_KEYWORD.get_or_init(|| {
        Regex::new(
            r"^\s*(\}\s*)?(if|else|for|foreach|while|switch|case|catch|return|new|throw|do|try|await|yield|using|lock|synchronized|elif|with|match|typeof|sizeof|delete)\b",
        )
        .expect("valid regex")
    })
}

/// Whether the line looks like the start of a function definition
pub fn is_function_start(line: &str, language: Language) -> bool {
    if control_keyword().is_match(line) {
        return false;
    }
    // Prototypes and calls ending in `;` are not definitions
    if line.trim_end().ends_with(';') {
        return false;
    }
    let table = FUNCTION_START.get_or_init(|| compile_table(function_sources));
    table
        .get(&language)
        .map(|patterns| patterns.iter().any(|p| p.is_match(line)))
        .unwrap_or(false)
}

/// Whether the line looks like a public (exported) function definition
pub fn is_public_function(line: &str, language: Language) -> bool {
    if control_keyword().is_match(line) || line.trim_end().ends_with(';') {
        return false;
    }
    let table = PUBLIC_FUNCTION.get_or_init(|| compile_table(public_sources));
    table
        .get(&language)
        .map(|patterns| patterns.iter().any(|p| p.is_match(line)))
        .unwrap_or(false)
}

/// Extract the parameter list of a function starting at `start`.
///
/// Joins up to `max_lines` lines to find the balanced parameter parentheses.
/// Go receivers (`func (r *T) Name(...)`) are skipped.
pub fn extract_parameters(lines: &[&str], start: usize, max_lines: usize) -> Option<Vec<String>> {
    let end = (start + max_lines).min(lines.len());
    let joined = lines.get(start..end)?.join("\n");

    let mut text = joined.as_str();
    if let Some(rest) = text.trim_start().strip_prefix("func") {
        if rest.trim_start().starts_with('(') {
            // Skip the receiver group
            let rest = rest.trim_start();
            let close = matching_paren(rest, 0)?;
            text = &rest[close + 1..];
        }
    }

    let open = text.find('(')?;
    let close = matching_paren(text, open)?;
    let inner = &text[open + 1..close];

    let mut params = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in inner.chars() {
        match c {
            '(' | '[' | '{' | '<' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' | '>' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth <= 0 => {
                params.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    params.push(current);

    Some(
        params
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty() && !is_receiver_param(p))
            .collect(),
    )
}

fn is_receiver_param(param: &str) -> bool {
    let name = param.split(':').next().unwrap_or(param).trim();
    matches!(name, "self" | "&self" | "&mut self" | "mut self" | "cls" | "this")
}

/// Byte offset of the parenthesis closing the one at `open`
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in text[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_start_js() {
        let js = Language::JavaScript;
        assert!(is_function_start("function foo(a, b) {", js));
        assert!(is_function_start("export async function load() {", js));
        assert!(is_function_start("const add = (a, b) => {", js));
        assert!(is_function_start("  render() {", js));
        assert!(!is_function_start("  if (x) {", js));
        assert!(!is_function_start("  foo(a, b);", js));
        assert!(!is_function_start("} else if (y) {", js));
    }

    #[test]
    fn test_function_start_other_languages() {
        assert!(is_function_start("def handle(self, x):", Language::Python));
        assert!(is_function_start("pub async fn run(&self) -> Result<()> {", Language::Rust));
        assert!(is_function_start("func (s *Server) Start() error {", Language::Go));
        assert!(is_function_start("    public static int sum(int a, int b) {", Language::Java));
        assert!(!is_function_start("    return compute(a, b);", Language::Java));
        assert!(!is_function_start("    while (running) {", Language::Java));
    }

    #[test]
    fn test_public_function() {
        assert!(is_public_function("export function api() {", Language::TypeScript));
        assert!(!is_public_function("function helper() {", Language::TypeScript));
        assert!(is_public_function("pub fn open() {", Language::Rust));
        assert!(!is_public_function("fn private() {", Language::Rust));
        assert!(is_public_function("def process(data):", Language::Python));
        assert!(!is_public_function("def _internal(data):", Language::Python));
        assert!(is_public_function("func Serve(addr string) error {", Language::Go));
        assert!(!is_public_function("func serve(addr string) error {", Language::Go));
    }

    #[test]
    fn test_extract_parameters() {
        let lines = vec!["function f(a, b, c: Map<string, number>, d) {"];
        let params = extract_parameters(&lines, 0, 5).unwrap();
        assert_eq!(params.len(), 4);

        let multi = vec!["def build(self,", "          a,", "          b):"];
        let params = extract_parameters(&multi, 0, 5).unwrap();
        assert_eq!(params, vec!["a", "b"]);

        let go = vec!["func (s *Server) Handle(w http.ResponseWriter, r *http.Request) {"];
        let params = extract_parameters(&go, 0, 5).unwrap();
        assert_eq!(params.len(), 2);

        let empty = vec!["fn main() {"];
        assert!(extract_parameters(&empty, 0, 5).unwrap().is_empty());
    }
}
