//! Response Normalization
//!
//! Model replies are not contractually guaranteed to match the
//! requested JSON shape: they arrive as clean JSON, JSON wrapped in
//! commentary, single-quoted pseudo-JSON, labeled lines in two
//! languages, or plain prose. This module coerces any of those into
//! exactly one canonical record through a fixed-order cascade of
//! extraction strategies. Most-structured wins; the terminal fallback
//! never fails but is flagged as degraded.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::utils::text::ellipsize;

/// Keyword used when prose arrives with no context label to attach it to
pub const DEFAULT_CONTEXT_LABEL: &str = "Search Command";

/// Fallback keyword length bound when no context label exists
const FALLBACK_KEYWORD_BYTES: usize = 100;

lazy_static! {
    // 'key': → "key":
    static ref SINGLE_QUOTED_KEY: Regex =
        Regex::new(r"'([^']+)'(\s*:)").expect("static pattern");
    // : 'value' → : "value"
    static ref SINGLE_QUOTED_VALUE: Regex =
        Regex::new(r":\s*'([^']*)'").expect("static pattern");
    // Smallest substring shaped like {keyword: …, explanation: …}
    static ref EMBEDDED_OBJECT: Regex = Regex::new(
        r#"\{\s*["']?keyword["']?\s*:\s*["']?.*?["']?\s*,\s*["']?explanation["']?\s*:\s*["']?.*?["']?\s*\}"#
    )
    .expect("static pattern");
    // Quoted keyword value, either quote style
    static ref KEYWORD_VALUE: Regex =
        Regex::new(r#"["']keyword["']\s*:\s*(?:"([^"]*)"|'([^']*)')"#).expect("static pattern");
    static ref EXPLANATION_VALUE: Regex =
        Regex::new(r#"["']explanation["']\s*:\s*(?:"([^"]*)"|'([^']*)')"#).expect("static pattern");
    // Quoted field key marker, used by the plain-text short-circuit
    static ref QUOTED_FIELD_MARKER: Regex =
        Regex::new(r#"["'](?:keyword|explanation)["']\s*:"#).expect("static pattern");
}

/// The canonical output unit all callers consume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRecord {
    pub keyword: String,
    pub explanation: String,
}

impl KeywordRecord {
    /// Both fields non-empty after trimming
    pub fn is_valid(&self) -> bool {
        !self.keyword.trim().is_empty() && !self.explanation.trim().is_empty()
    }

    /// Trimmed record, or None when either field is empty
    fn validated(keyword: &str, explanation: &str) -> Option<Self> {
        let keyword = keyword.trim();
        let explanation = explanation.trim();
        if keyword.is_empty() || explanation.is_empty() {
            return None;
        }
        Some(Self {
            keyword: keyword.to_string(),
            explanation: explanation.to_string(),
        })
    }
}

/// Which cascade stage produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PlainText,
    WholeBody,
    EmbeddedObject,
    KeyValue,
    LabeledLines,
    Fallback,
}

/// One normalized reply: the record plus how it was extracted
#[derive(Debug, Clone)]
pub struct NormalizedReply {
    pub record: KeywordRecord,
    pub stage: Stage,
}

impl NormalizedReply {
    /// True when only the terminal fallback produced the record.
    /// Degraded output is still a result, not an error; callers should
    /// render it as low-confidence.
    pub fn is_degraded(&self) -> bool {
        self.stage == Stage::Fallback
    }
}

/// Label families recognized by the labeled-line scan
#[derive(Debug, Clone)]
pub struct LabelSet {
    pub keyword: Vec<String>,
    pub explanation: Vec<String>,
}

impl Default for LabelSet {
    fn default() -> Self {
        Self {
            keyword: vec![
                "keyword".to_string(),
                "关键词".to_string(),
                "关键字".to_string(),
            ],
            explanation: vec![
                "explanation".to_string(),
                "description".to_string(),
                "解释".to_string(),
                "描述".to_string(),
            ],
        }
    }
}

impl LabelSet {
    pub fn new(keyword: Vec<String>, explanation: Vec<String>) -> Self {
        let defaults = Self::default();
        Self {
            keyword: if keyword.is_empty() {
                defaults.keyword
            } else {
                keyword
            },
            explanation: if explanation.is_empty() {
                defaults.explanation
            } else {
                explanation
            },
        }
    }

    fn alternation(labels: &[String]) -> String {
        labels
            .iter()
            .map(|l| regex::escape(l))
            .collect::<Vec<_>>()
            .join("|")
    }
}

type StrategyFn = fn(&ResponseNormalizer, &str, Option<&str>) -> Option<KeywordRecord>;

/// Precedence order is the contract: first success wins, later stages
/// never run.
const CASCADE: &[(Stage, StrategyFn)] = &[
    (Stage::PlainText, ResponseNormalizer::plain_text),
    (Stage::WholeBody, ResponseNormalizer::whole_body),
    (Stage::EmbeddedObject, ResponseNormalizer::embedded_object),
    (Stage::KeyValue, ResponseNormalizer::key_value),
    (Stage::LabeledLines, ResponseNormalizer::labeled_lines),
];

/// Turns one raw reply body into exactly one record
pub struct ResponseNormalizer {
    keyword_line: Regex,
    explanation_line: Regex,
    label_marker: Regex,
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self::new(LabelSet::default())
    }
}

impl ResponseNormalizer {
    pub fn new(labels: LabelSet) -> Self {
        let keyword_alt = LabelSet::alternation(&labels.keyword);
        let explanation_alt = LabelSet::alternation(&labels.explanation);

        // Labels are regex-escaped above, so these always compile
        let keyword_line = Regex::new(&format!(r"(?i)^(?:{keyword_alt})[:：]\s*(.+)$"))
            .expect("escaped label pattern");
        let explanation_line = Regex::new(&format!(r"(?i)^(?:{explanation_alt})[:：]\s*(.+)$"))
            .expect("escaped label pattern");
        let label_marker = Regex::new(&format!(
            r"(?mi)^[ \t]*(?:{keyword_alt}|{explanation_alt})[:：]"
        ))
        .expect("escaped label pattern");

        Self {
            keyword_line,
            explanation_line,
            label_marker,
        }
    }

    /// Run the cascade over one raw reply body.
    ///
    /// `context_label` is the term currently being explained, if any;
    /// it seeds the plain-text stage and the degraded fallback. Pure
    /// function of its inputs.
    pub fn normalize(&self, raw: &str, context_label: Option<&str>) -> NormalizedReply {
        let context = context_label.filter(|label| !label.trim().is_empty());

        for (stage, strategy) in CASCADE {
            if let Some(record) = strategy(self, raw, context) {
                return NormalizedReply {
                    record,
                    stage: *stage,
                };
            }
        }

        NormalizedReply {
            record: self.fallback(raw, context),
            stage: Stage::Fallback,
        }
    }

    /// True when the text carries any keyword/explanation field marker:
    /// a quoted key in either quote style, or a recognized label at the
    /// start of a line.
    fn contains_field_markers(&self, text: &str) -> bool {
        QUOTED_FIELD_MARKER.is_match(text) || self.label_marker.is_match(text)
    }

    /// Stage 1: a reply with no field markers at all is pure prose;
    /// treat all of it as the explanation for the current context.
    fn plain_text(&self, text: &str, context: Option<&str>) -> Option<KeywordRecord> {
        if self.contains_field_markers(text) {
            return None;
        }
        KeywordRecord::validated(context.unwrap_or(DEFAULT_CONTEXT_LABEL), text)
    }

    /// Stage 2: parse the whole body as one JSON value after quote
    /// normalization. Arrays yield only their first element; extras are
    /// discarded, never merged.
    fn whole_body(&self, text: &str, _context: Option<&str>) -> Option<KeywordRecord> {
        let processed = normalize_quotes(text);
        let value: serde_json::Value = serde_json::from_str(processed.trim()).ok()?;

        match value {
            serde_json::Value::Object(_) => record_from_value(&value),
            serde_json::Value::Array(items) => items.first().and_then(record_from_value),
            _ => None,
        }
    }

    /// Stage 3: the body did not parse whole (fences, commentary).
    /// Find the smallest embedded object with both keys and parse it
    /// alone.
    fn embedded_object(&self, text: &str, _context: Option<&str>) -> Option<KeywordRecord> {
        let found = EMBEDDED_OBJECT.find(text)?;
        let processed = normalize_quotes(found.as_str());
        let value: serde_json::Value = serde_json::from_str(&processed).ok()?;
        record_from_value(&value)
    }

    /// Stage 4: independent quoted-value extraction, no requirement
    /// that the surrounding text parses at all.
    fn key_value(&self, text: &str, _context: Option<&str>) -> Option<KeywordRecord> {
        let keyword = quoted_capture(&KEYWORD_VALUE, text)?;
        let explanation = quoted_capture(&EXPLANATION_VALUE, text)?;
        KeywordRecord::validated(&keyword, &explanation)
    }

    /// Stage 5: line-oriented label scan. First match per field wins;
    /// scanning continues so the two fields may sit on non-adjacent
    /// lines.
    fn labeled_lines(&self, text: &str, _context: Option<&str>) -> Option<KeywordRecord> {
        let mut keyword: Option<String> = None;
        let mut explanation: Option<String> = None;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if keyword.is_none() {
                if let Some(captures) = self.keyword_line.captures(line) {
                    keyword = Some(captures[1].trim().to_string());
                    continue;
                }
            }
            if explanation.is_none() {
                if let Some(captures) = self.explanation_line.captures(line) {
                    explanation = Some(captures[1].trim().to_string());
                }
            }
        }

        KeywordRecord::validated(&keyword?, &explanation?)
    }

    /// Stage 6: always succeeds. The record is degraded: keyword from
    /// context or a bounded excerpt, explanation verbatim.
    fn fallback(&self, raw: &str, context: Option<&str>) -> KeywordRecord {
        let keyword = match context {
            Some(label) => label.to_string(),
            None => ellipsize(raw, FALLBACK_KEYWORD_BYTES),
        };
        KeywordRecord {
            keyword,
            explanation: raw.to_string(),
        }
    }
}

/// Convert single-quoted keys and values to double-quoted and drop
/// redundant single-quote escapes.
fn normalize_quotes(text: &str) -> String {
    let keys = SINGLE_QUOTED_KEY.replace_all(text, "\"${1}\"${2}");
    let values = SINGLE_QUOTED_VALUE.replace_all(&keys, ": \"${1}\"");
    values.replace("\\'", "'")
}

fn record_from_value(value: &serde_json::Value) -> Option<KeywordRecord> {
    let keyword = value.get("keyword")?.as_str()?;
    let explanation = value.get("explanation")?.as_str()?;
    KeywordRecord::validated(keyword, explanation)
}

fn quoted_capture(pattern: &Regex, text: &str) -> Option<String> {
    let captures = pattern.captures(text)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> ResponseNormalizer {
        ResponseNormalizer::default()
    }

    #[test]
    fn test_plain_prose_becomes_explanation() {
        let reply = normalizer().normalize("Hello world", None);
        assert_eq!(reply.stage, Stage::PlainText);
        assert_eq!(reply.record.keyword, DEFAULT_CONTEXT_LABEL);
        assert_eq!(reply.record.explanation, "Hello world");
    }

    #[test]
    fn test_plain_prose_uses_context_label() {
        let reply = normalizer().normalize("restricts results to PDFs", Some("filetype:pdf"));
        assert_eq!(reply.record.keyword, "filetype:pdf");
        assert!(!reply.is_degraded());
    }

    #[test]
    fn test_whole_body_object() {
        let reply = normalizer().normalize(
            r#"{"keyword": "filetype:pdf machine learning", "explanation": "finds PDFs"}"#,
            None,
        );
        assert_eq!(reply.stage, Stage::WholeBody);
        assert_eq!(reply.record.keyword, "filetype:pdf machine learning");
        assert_eq!(reply.record.explanation, "finds PDFs");
    }

    #[test]
    fn test_single_quoted_object_matches_double_quoted() {
        let single = normalizer().normalize(
            r#"{'keyword': 'site:edu "AI"', 'explanation': 'restricts to edu'}"#,
            None,
        );
        let double = normalizer().normalize(
            r#"{"keyword": "site:edu \"AI\"", "explanation": "restricts to edu"}"#,
            None,
        );
        assert_eq!(single.record.explanation, double.record.explanation);
        assert_eq!(single.record.explanation, "restricts to edu");
    }

    #[test]
    fn test_array_takes_first_element_only() {
        let reply = normalizer().normalize(
            r#"[{"keyword": "first", "explanation": "one"}, {"keyword": "second", "explanation": "two"}]"#,
            None,
        );
        assert_eq!(reply.stage, Stage::WholeBody);
        assert_eq!(reply.record.keyword, "first");
        assert_eq!(reply.record.explanation, "one");
    }

    #[test]
    fn test_embedded_object_in_commentary() {
        let text = "Sure! Here is your command:\n```json\n{\"keyword\": \"site:*.gov budget\", \"explanation\": \"government pages\"}\n```\nHope this helps.";
        let reply = normalizer().normalize(text, None);
        assert_eq!(reply.stage, Stage::EmbeddedObject);
        assert_eq!(reply.record.keyword, "site:*.gov budget");
    }

    #[test]
    fn test_key_value_extraction_without_parseable_object() {
        // No braces anywhere, so neither object-based stage can fire
        let text = r#"result: "keyword": "inurl:blog rust", "explanation": "blog posts", done"#;
        let reply = normalizer().normalize(text, None);
        assert_eq!(reply.stage, Stage::KeyValue);
        assert_eq!(reply.record.keyword, "inurl:blog rust");
        assert_eq!(reply.record.explanation, "blog posts");
    }

    #[test]
    fn test_labeled_lines_english() {
        let reply = normalizer().normalize("keyword: foo\nexplanation: bar", None);
        assert_eq!(reply.stage, Stage::LabeledLines);
        assert_eq!(reply.record.keyword, "foo");
        assert_eq!(reply.record.explanation, "bar");
    }

    #[test]
    fn test_labeled_lines_chinese_fullwidth_colon() {
        let reply = normalizer().normalize("关键词：foo\n解释：bar", None);
        assert_eq!(reply.stage, Stage::LabeledLines);
        assert_eq!(reply.record.keyword, "foo");
        assert_eq!(reply.record.explanation, "bar");
    }

    #[test]
    fn test_labeled_lines_non_adjacent() {
        let text = "keyword: site:edu thesis\nsome chatter in between\nexplanation: university pages";
        let reply = normalizer().normalize(text, None);
        assert_eq!(reply.record.keyword, "site:edu thesis");
        assert_eq!(reply.record.explanation, "university pages");
    }

    #[test]
    fn test_fallback_uses_context_label() {
        // Explainer-style reply: has "explanation" but no "keyword" field
        let text = r#"{"search_command": "a", "explanation": {"nested": true}}"#;
        let reply = normalizer().normalize(text, Some("site:edu"));
        assert!(reply.is_degraded());
        assert_eq!(reply.record.keyword, "site:edu");
        assert_eq!(reply.record.explanation, text);
    }

    #[test]
    fn test_fallback_truncates_without_context() {
        let long = "词".repeat(200);
        let marked = format!("\"keyword\": {long}");
        let reply = normalizer().normalize(&marked, None);
        assert!(reply.is_degraded());
        assert!(reply.record.keyword.ends_with('…'));
        assert!(reply.record.keyword.len() < marked.len());
        assert_eq!(reply.record.explanation, marked);
    }

    #[test]
    fn test_custom_labels() {
        let labels = LabelSet::new(
            vec!["term".to_string()],
            vec!["meaning".to_string()],
        );
        let custom = ResponseNormalizer::new(labels);
        let reply = custom.normalize("term: foo\nmeaning: bar", None);
        assert_eq!(reply.stage, Stage::LabeledLines);
        assert_eq!(reply.record.keyword, "foo");
    }

    #[test]
    fn test_normalize_quotes() {
        assert_eq!(
            normalize_quotes(r#"{'keyword': 'a', 'explanation': 'b'}"#),
            r#"{"keyword": "a", "explanation": "b"}"#
        );
        assert_eq!(normalize_quotes(r#"it\'s"#), "it's");
    }

    #[test]
    fn test_empty_input_degrades() {
        let reply = normalizer().normalize("", None);
        assert!(reply.is_degraded());
    }
}
