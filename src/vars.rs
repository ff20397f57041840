//! Comment-preserving rendering of the cluster vars file.
//!
//! The sample document is edited at line granularity: a replacement rule
//! rewrites exactly one `key: value` line (the first match, keeping its
//! indentation and line terminator), override vars are spliced in after the
//! anchor comment, and every untouched line survives byte-for-byte. No YAML
//! parsing happens here — structural validation of the result is out of
//! scope, line preservation is the contract.

use std::fmt;

use serde_json::{Map, Value};

/// One ordered `key -> value` replacement against the sample document.
#[derive(Debug, Clone)]
pub struct KeyRule {
    pub key: String,
    pub value: Value,
}

impl KeyRule {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// What happened to a single key during a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The first matching `key:` line was rewritten in place.
    Replaced,
    /// The key was not present in the sample; nothing was changed.
    Skipped,
    /// The key was appended as an override var.
    Appended,
}

/// Per-key render outcome, in application order: rules first, overrides after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub key: String,
    pub outcome: Outcome,
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            Outcome::Replaced => write!(f, "{} (replaced)", self.key),
            Outcome::Skipped => write!(f, "{} (not in sample, skipped)", self.key),
            Outcome::Appended => write!(f, "{} (appended override)", self.key),
        }
    }
}

/// Line-level template engine for `key: value` documents.
pub struct TemplateEngine {
    anchor: String,
    quote_keys: Vec<String>,
}

impl TemplateEngine {
    pub fn new(anchor: impl Into<String>, quote_keys: Vec<String>) -> Self {
        Self {
            anchor: anchor.into(),
            quote_keys,
        }
    }

    /// Applies `rules` in order, then splices `overrides` in after the
    /// anchor line (or at end of document when the anchor is absent).
    /// Returns the full rendered text and the per-key report.
    pub fn render(
        &self,
        sample: &str,
        rules: &[KeyRule],
        overrides: &Map<String, Value>,
    ) -> (String, Vec<ReportEntry>) {
        let mut lines: Vec<String> = sample
            .split_inclusive('\n')
            .map(str::to_string)
            .collect();
        let mut report = Vec::with_capacity(rules.len() + overrides.len());

        // Phase 1: in-place replacements, first matching line per key
        for rule in rules {
            let mut outcome = Outcome::Skipped;
            for line in lines.iter_mut() {
                let (content, terminator) = split_terminator(line);
                if let Some(indent) = match_key_line(content, &rule.key) {
                    *line = format!(
                        "{indent}{}: {}{terminator}",
                        rule.key,
                        self.format_value(&rule.key, &rule.value)
                    );
                    outcome = Outcome::Replaced;
                    break;
                }
            }
            report.push(ReportEntry {
                key: rule.key.clone(),
                outcome,
            });
        }

        // Phase 2: override insertion after the anchor
        if !overrides.is_empty() {
            let inserted: Vec<String> = overrides
                .iter()
                .map(|(key, value)| format!("{key}: {}\n", self.format_value(key, value)))
                .collect();

            let anchor_at = lines
                .iter()
                .position(|line| split_terminator(line).0.trim_end() == self.anchor);

            match anchor_at {
                Some(i) => {
                    // The anchor may be the final line of a file without a
                    // trailing newline; give it one so the splice stays
                    // line-per-line.
                    if !lines[i].ends_with('\n') {
                        lines[i].push('\n');
                    }
                    for (offset, line) in inserted.into_iter().enumerate() {
                        lines.insert(i + 1 + offset, line);
                    }
                }
                None => {
                    if let Some(last) = lines.last_mut() {
                        if !last.ends_with('\n') {
                            last.push('\n');
                        }
                    }
                    lines.extend(inserted);
                }
            }

            for key in overrides.keys() {
                report.push(ReportEntry {
                    key: key.clone(),
                    outcome: Outcome::Appended,
                });
            }
        }

        (lines.concat(), report)
    }

    /// Textual form of a value on its `key: value` line.
    ///
    /// Deterministic per `(key, value)`:
    /// - booleans are lowercase `true`/`false`,
    /// - null is the empty string,
    /// - always-quote keys and Jinja expressions (`{{ ... }}`) are
    ///   double-quoted,
    /// - everything else keeps its plain form (non-scalars as compact JSON).
    pub fn format_value(&self, key: &str, value: &Value) -> String {
        match value {
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
            _ => {
                let plain = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                if self.quote_keys.iter().any(|k| k == key) || is_templated(value) {
                    format!("\"{plain}\"")
                } else {
                    plain
                }
            }
        }
    }
}

/// A string holding both delimiters of a Jinja expression stays quoted so
/// the downstream tool re-evaluates it instead of reading a bare scalar.
fn is_templated(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.contains("{{") && s.contains("}}"))
}

/// Splits a line into its content and its terminator (`"\n"` or `""`).
fn split_terminator(line: &str) -> (&str, &str) {
    match line.strip_suffix('\n') {
        Some(content) => (content, "\n"),
        None => (line, ""),
    }
}

/// Matches `^(indent)key\s*:` and returns the captured indentation.
fn match_key_line<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let stripped = line.trim_start_matches([' ', '\t']);
    let indent = &line[..line.len() - stripped.len()];
    let rest = stripped.strip_prefix(key)?;
    let rest = rest.trim_start_matches([' ', '\t']);
    rest.starts_with(':').then_some(indent)
}
