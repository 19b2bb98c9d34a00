//! Leaf-value highlighting inside pretty-printed JSON text.
//!
//! Highlighting runs in two phases. [`annotation_spans`] scans the text once
//! for key tokens and ranges that are already wrapped, then resolves every
//! requested field into non-overlapping spans (earlier fields win). The
//! renderers then insert the markers in a single pass. Because ranges that
//! already carry markers are never matched again, [`annotate`] is idempotent.

use regex::Regex;
use serde::Serialize;
use std::ops::Range;

/// Prefix of an opening marker; the full marker is `<span class="TAG">`.
pub const MARKER_OPEN_PREFIX: &str = "<span class=\"";
pub const MARKER_CLOSE: &str = "</span>";

/// Leaf shapes that may follow a key: string, number, boolean, null, or a
/// one-line array without nested brackets.
const LEAF_VALUE: &str =
    r#""(?:[^"\\]|\\.)*"|-?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?|true|false|null|\[[^\[\]\n]*\]"#;

/// Half-open byte range of `text` wrapped by one marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationSpan {
    pub start: usize,
    pub end: usize,
    pub tag: String,
    /// Requested field that produced the span.
    pub field: String,
}

impl AnnotationSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

#[derive(Debug, Default)]
struct TextScan {
    keys: Vec<usize>,
    marked: Vec<Range<usize>>,
}

impl TextScan {
    fn is_marked(&self, start: usize, end: usize) -> bool {
        self.marked
            .iter()
            .any(|range| range.start < end && start < range.end)
    }
}

/// Wraps every leaf value of `fields` in `text` with `<span class="TAG">`.
pub fn annotate<S: AsRef<str>>(text: &str, fields: &[S], tag: &str) -> String {
    render_spans(text, &annotation_spans(text, fields, tag))
}

/// Resolves `fields` (in order) to non-overlapping spans, sorted by start.
pub fn annotation_spans<S: AsRef<str>>(
    text: &str,
    fields: &[S],
    tag: &str,
) -> Vec<AnnotationSpan> {
    let scan = scan_text(text);
    let mut spans: Vec<AnnotationSpan> = Vec::new();

    for field in fields {
        let field = field.as_ref();
        let Some(pattern) = leaf_pattern(field) else {
            continue;
        };

        for &key_start in &scan.keys {
            let Some(found) = pattern.find(&text[key_start..]) else {
                continue;
            };
            let end = key_start + found.end();
            let taken = spans.iter().any(|span| span.overlaps(key_start, end));
            if taken || scan.is_marked(key_start, end) {
                continue;
            }
            spans.push(AnnotationSpan {
                start: key_start,
                end,
                tag: tag.to_string(),
                field: field.to_string(),
            });
        }
    }

    spans.sort_by_key(|span| span.start);
    spans
}

/// Inserts markers around `spans`, copying everything else verbatim.
pub fn render_spans(text: &str, spans: &[AnnotationSpan]) -> String {
    render_with(text, spans, |out, segment| out.push_str(segment), |tag| tag.to_string())
}

/// Like [`render_spans`] but HTML-escapes the document text and tags, for
/// embedding in a page.
pub fn render_spans_html(text: &str, spans: &[AnnotationSpan]) -> String {
    render_with(text, spans, |out, segment| push_escaped(out, segment), escape_html)
}

fn render_with<W, T>(text: &str, spans: &[AnnotationSpan], mut write: W, tag_text: T) -> String
where
    W: FnMut(&mut String, &str),
    T: Fn(&str) -> String,
{
    let mut ordered: Vec<&AnnotationSpan> = spans.iter().collect();
    ordered.sort_by_key(|span| span.start);

    let mut out = String::with_capacity(text.len() + spans.len() * 40);
    let mut cursor = 0;
    for span in ordered {
        if span.start < cursor || span.end > text.len() {
            continue;
        }
        write(&mut out, &text[cursor..span.start]);
        out.push_str(MARKER_OPEN_PREFIX);
        out.push_str(&tag_text(&span.tag));
        out.push_str("\">");
        write(&mut out, &text[span.start..span.end]);
        out.push_str(MARKER_CLOSE);
        cursor = span.end;
    }
    write(&mut out, &text[cursor..]);
    out
}

fn leaf_pattern(field: &str) -> Option<Regex> {
    let pattern = format!(
        r#"^"(?i:{})"\s*:\s*(?:{})"#,
        regex::escape(field),
        LEAF_VALUE
    );
    Regex::new(&pattern).ok()
}

/// Finds key tokens (quoted strings followed by `:`) and ranges already
/// wrapped by markers. Marker tags are skipped so their attribute quotes are
/// never taken for JSON strings.
fn scan_text(text: &str) -> TextScan {
    let bytes = text.as_bytes();
    let mut scan = TextScan::default();
    let mut open: Vec<usize> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                let start = i;
                i = skip_string(bytes, i);
                let mut j = i;
                while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                if j < bytes.len() && bytes[j] == b':' {
                    scan.keys.push(start);
                }
            }
            b'<' if text[i..].starts_with(MARKER_OPEN_PREFIX) => {
                open.push(i);
                i = match text[i..].find('>') {
                    Some(offset) => i + offset + 1,
                    None => bytes.len(),
                };
            }
            b'<' if text[i..].starts_with(MARKER_CLOSE) => {
                i += MARKER_CLOSE.len();
                if let Some(start) = open.pop() {
                    scan.marked.push(start..i);
                }
            }
            _ => i += 1,
        }
    }

    for start in open {
        scan.marked.push(start..bytes.len());
    }
    scan
}

/// Returns the index just past the closing quote of the string at `start`.
fn skip_string(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn push_escaped(out: &mut String, segment: &str) {
    for ch in segment.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    push_escaped(&mut out, raw);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_string_leaf_once() {
        let out = annotate(r#"{"a": "x"}"#, &["a"], "T");
        assert_eq!(out, r#"{<span class="T">"a": "x"</span>}"#);
        assert_eq!(out.matches(MARKER_OPEN_PREFIX).count(), 1);
    }

    #[test]
    fn annotate_is_idempotent() {
        let text = "{\n  \"id\": 12,\n  \"name\": \"Widget\",\n  \"tags\": [],\n  \"ok\": true\n}";
        let fields = ["name", "id", "ok", "tags"];
        let once = annotate(text, &fields, "highlight-response");
        let twice = annotate(&once, &fields, "highlight-response");
        assert_eq!(once, twice);
        assert_eq!(once.matches(MARKER_CLOSE).count(), 4);
    }

    #[test]
    fn highlights_every_leaf_shape() {
        let text = "{\n  \"s\": \"v\",\n  \"n\": -4.5e3,\n  \"b\": false,\n  \"z\": null,\n  \"a\": [1, 2]\n}";
        let spans = annotation_spans(text, &["s", "n", "b", "z", "a"], "T");
        let covered: Vec<&str> = spans.iter().map(|s| &text[s.range()]).collect();
        assert_eq!(
            covered,
            vec![
                "\"s\": \"v\"",
                "\"n\": -4.5e3",
                "\"b\": false",
                "\"z\": null",
                "\"a\": [1, 2]"
            ]
        );
    }

    #[test]
    fn nested_objects_and_multiline_arrays_are_not_leaves() {
        let text = "{\n  \"user\": {\n    \"id\": 3\n  },\n  \"list\": [\n    1\n  ]\n}";
        assert!(annotation_spans(text, &["user", "list"], "T").is_empty());

        let spans = annotation_spans(text, &["id"], "T");
        assert_eq!(spans.len(), 1);
        assert_eq!(&text[spans[0].range()], "\"id\": 3");
    }

    #[test]
    fn field_names_match_case_insensitively() {
        let out = annotate(r#"{"UserId": 9}"#, &["userid"], "T");
        assert_eq!(out, r#"{<span class="T">"UserId": 9</span>}"#);
    }

    #[test]
    fn string_values_are_never_taken_for_keys() {
        let text = r#"{"note": "see \"id\": 5", "label": "id", "id": 1}"#;
        let spans = annotation_spans(text, &["id"], "T");
        assert_eq!(spans.len(), 1);
        assert_eq!(&text[spans[0].range()], r#""id": 1"#);
    }

    #[test]
    fn escaped_quotes_stay_inside_string_values() {
        let text = r#"{"title": "say \"hi\"", "n": 1}"#;
        let spans = annotation_spans(text, &["title"], "T");
        assert_eq!(&text[spans[0].range()], r#""title": "say \"hi\"""#);
    }

    #[test]
    fn regex_metacharacters_in_fields_are_literal() {
        let text = r#"{"a.b": 1, "axb": 2, "c+": 3}"#;
        let spans = annotation_spans(text, &["a.b", "c+", "(unbalanced"], "T");
        let covered: Vec<&str> = spans.iter().map(|s| &text[s.range()]).collect();
        assert_eq!(covered, vec![r#""a.b": 1"#, r#""c+": 3"#]);
    }

    #[test]
    fn earlier_field_keeps_a_contested_span() {
        let text = r#"{"Id": 1}"#;
        let spans = annotation_spans(text, &["ID", "id"], "T");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].field, "ID");
    }

    #[test]
    fn existing_markers_of_another_tag_are_left_alone() {
        let text = r#"{<span class="first">"a": 1</span>, "b": 2}"#;
        let out = annotate(text, &["a", "b"], "second");
        assert_eq!(
            out,
            r#"{<span class="first">"a": 1</span>, <span class="second">"b": 2</span>}"#
        );
    }

    #[test]
    fn repeated_keys_are_all_highlighted() {
        let text = "[\n  {\n    \"id\": 1\n  },\n  {\n    \"id\": 2\n  }\n]";
        let spans = annotation_spans(text, &["id"], "T");
        assert_eq!(spans.len(), 2);
        assert!(spans[0].end <= spans[1].start);
    }

    #[test]
    fn html_render_escapes_document_text() {
        let text = r#"{"html": "<b>&</b>", "x": 1}"#;
        let spans = annotation_spans(text, &["x"], "highlight-request");
        let html = render_spans_html(text, &spans);
        assert_eq!(
            html,
            r#"{&quot;html&quot;: &quot;&lt;b&gt;&amp;&lt;/b&gt;&quot;, <span class="highlight-request">&quot;x&quot;: 1</span>}"#
        );
    }

    #[test]
    fn no_fields_means_no_change() {
        let text = r#"{"a": 1}"#;
        let empty: [&str; 0] = [];
        assert_eq!(annotate(text, &empty, "T"), text);
    }
}
