//! Loop hotspot detector
//!
//! Performance anti-patterns inside loop bodies:
//! - `await` inside a loop (serialized async work)
//! - a loop nested inside another loop
//!
//! Loop bodies are tracked with a brace-depth stack, or an indentation stack
//! for indentation-scoped languages.

use crate::detectors::base::{indent_width, mask_string_literals, Detector, SourceView};
use crate::models::{Category, Finding, Location, Severity};
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

static LOOP_HEADER: OnceLock<Regex> = OnceLock::new();
static AWAIT_KEYWORD: OnceLock<Regex> = OnceLock::new();

fn loop_header() -> &'static Regex {
    LOOP_HEADER.get_or_init(|| {
        Regex::new(r"^\s*(\}\s*)?(for|foreach|while|loop|do)\b|\.forEach\s*\(").expect("valid regex")
    })
}

fn await_keyword() -> &'static Regex {
    AWAIT_KEYWORD.get_or_init(|| Regex::new(r"\bawait\b|\.await\b").expect("valid regex"))
}

/// Open loop on the tracking stack
struct OpenLoop {
    header: usize,
    /// Brace depth (or indentation width) at the header
    level: usize,
    opened: bool,
}

pub struct LoopHotspotDetector;

impl LoopHotspotDetector {
    pub fn new() -> Self {
        Self
    }

    fn finding(&self, source: &SourceView, idx: usize, message: &str, suggestion: &str) -> Finding {
        Finding::local(
            self.name(),
            self.category(),
            Severity::Medium,
            message,
            Location::line(source.path(), idx as u32),
        )
        .with_suggestion(suggestion)
    }

    fn check_line(&self, source: &SourceView, idx: usize, code: &str, findings: &mut Vec<Finding>) {
        if await_keyword().is_match(code) && !code.contains("for await") {
            findings.push(self.finding(
                source,
                idx,
                "await inside a loop runs asynchronous work sequentially",
                "Collect the futures and await them together (e.g. Promise.all / join_all).",
            ));
        }
        if loop_header().is_match(code) {
            findings.push(self.finding(
                source,
                idx,
                "Nested loop may have quadratic cost",
                "Index the inner collection (e.g. a map or set) instead of rescanning it.",
            ));
        }
    }

    fn detect_braced(&self, source: &SourceView) -> Vec<Finding> {
        let mut findings = vec![];
        let mut stack: Vec<OpenLoop> = Vec::new();
        let mut depth = 0usize;

        for (idx, line) in source.lines.iter().enumerate() {
            if source.is_comment(idx) {
                continue;
            }
            let code = mask_string_literals(line);

            if !stack.is_empty() {
                self.check_line(source, idx, &code, &mut findings);
            }
            if loop_header().is_match(&code) {
                stack.push(OpenLoop {
                    header: idx,
                    level: depth,
                    opened: false,
                });
            }

            for c in code.chars() {
                match c {
                    '{' => {
                        depth += 1;
                        if let Some(top) = stack.last_mut() {
                            if depth == top.level + 1 {
                                top.opened = true;
                            }
                        }
                    }
                    '}' => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }

            // Closed bodies, and brace-less bodies one statement after their header
            while let Some(top) = stack.last() {
                let closed = top.opened && depth <= top.level;
                let braceless = !top.opened && idx > top.header;
                let single_line = top.opened && idx == top.header && depth <= top.level;
                if closed || single_line || (braceless && idx > top.header + 1) {
                    stack.pop();
                } else {
                    break;
                }
            }
        }
        findings
    }

    fn detect_indented(&self, source: &SourceView) -> Vec<Finding> {
        let mut findings = vec![];
        let mut stack: Vec<OpenLoop> = Vec::new();

        for (idx, line) in source.lines.iter().enumerate() {
            if line.trim().is_empty() || source.is_comment(idx) {
                continue;
            }
            let indent = indent_width(line);
            while stack.last().is_some_and(|top| indent <= top.level) {
                stack.pop();
            }

            let code = mask_string_literals(line);
            if !stack.is_empty() {
                self.check_line(source, idx, &code, &mut findings);
            }
            if loop_header().is_match(&code) {
                stack.push(OpenLoop {
                    header: idx,
                    level: indent,
                    opened: true,
                });
            }
        }
        findings
    }
}

impl Default for LoopHotspotDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for LoopHotspotDetector {
    fn name(&self) -> &'static str {
        "loop-hotspot"
    }

    fn description(&self) -> &'static str {
        "Detects awaits and nested loops inside loop bodies"
    }

    fn category(&self) -> Category {
        Category::Performance
    }

    fn detect(&self, source: &SourceView) -> Result<Vec<Finding>> {
        if source.language.is_indent_scoped() {
            Ok(self.detect_indented(source))
        } else {
            Ok(self.detect_braced(source))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceUnit;

    fn run(path: &str, text: &str) -> Vec<Finding> {
        let unit = SourceUnit::from_path(path, text);
        LoopHotspotDetector::new()
            .detect(&SourceView::new(&unit))
            .unwrap()
    }

    #[test]
    fn test_await_in_loop() {
        let text = "\
async function load(ids) {
  for (const id of ids) {
    const user = await fetchUser(id);
  }
  const done = await flush();
}
";
        let findings = run("a.js", text);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.start_line, 2);
        assert_eq!(findings[0].category, Category::Performance);
    }

    #[test]
    fn test_nested_loop() {
        let text = "\
for (let i = 0; i < n; i++) {
  for (let j = 0; j < n; j++) {
    total += grid[i][j];
  }
}
while (running) { tick(); }
";
        let findings = run("a.ts", text);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.start_line, 1);
    }

    #[test]
    fn test_python_nested_loop() {
        let text = "\
for a in items:
    for b in items:
        pairs.append((a, b))
for c in items:
    print(c)
";
        let findings = run("p.py", text);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.start_line, 1);
    }

    #[test]
    fn test_for_await_not_flagged() {
        let text = "\
for (const x of xs) {
  for await (const chunk of stream) {}
}
";
        let findings = run("a.js", text);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("Nested loop"));
    }
}
