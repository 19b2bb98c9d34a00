//! Self-contained HTML page showing the highlighted request and response.
//!
//! The renderer locates sections through the `data-scope` attribute and
//! highlighted elements through [`Scope::class_name`].

use crate::config::FieldsToHighlight;
use crate::highlight::{annotation_spans, escape_html, render_spans_html};
use crate::validator::Scope;

const PAGE_STYLE: &str = r#"
body {
  font-family: 'Consolas', 'Monaco', 'Courier New', monospace;
  margin: 40px auto;
  background-color: #f8f9fa;
  max-width: 1400px;
  padding: 0 20px;
}
.section {
  background: #ffffff;
  border-radius: 12px;
  padding: 50px;
  margin-bottom: 40px;
  border: 1px solid #e9ecef;
}
.section h2 {
  border-bottom: 3px solid #007acc;
  padding-bottom: 15px;
  font-size: 24px;
}
.json-content {
  color: #000000;
  padding: 30px;
  white-space: pre-wrap;
  word-break: break-word;
  font-size: 14px;
  line-height: 1.8;
  min-height: 500px;
  border: 2px solid #cbd5e0;
  border-radius: 8px;
}
.highlight-request, .highlight-response {
  padding: 8px 12px;
  border-radius: 6px;
  font-weight: 700;
  font-size: 16px;
  display: inline-block;
  margin: 3px;
}
.highlight-request {
  background-color: #ffeb3b;
  color: #000000;
  border: 3px solid #ff9800;
}
.highlight-response {
  background-color: #4caf50;
  color: #ffffff;
  border: 3px solid #2e7d32;
}
.none { color: #666666; font-style: italic; }
.timestamp { color: #666666; font-size: 16px; }
"#;

/// Builds the evidence page from the pretty-printed envelopes. `fields`
/// should already be the corrected field lists.
pub fn render_page(
    request_text: &str,
    response_text: &str,
    fields: &FieldsToHighlight,
    generated_at: &str,
) -> String {
    let request_section = json_section(Scope::Request, request_text, &fields.request);
    let response_section = json_section(Scope::Response, response_text, &fields.response);
    let summary = format!(
        "<section class=\"section summary\">\n<h2>Highlighted Fields</h2>\n<h3>Request fields</h3>\n<div>{}</div>\n<h3>Response fields</h3>\n<div>{}</div>\n</section>",
        field_chips(Scope::Request, &fields.request),
        field_chips(Scope::Response, &fields.response),
    );

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n<title>API Test Results</title>\n<style>{PAGE_STYLE}</style>\n</head>\n<body>\n<header>\n<h1>API Test Results</h1>\n<p class=\"timestamp\">Generated on: {}</p>\n</header>\n{request_section}\n{response_section}\n{summary}\n</body>\n</html>\n",
        escape_html(generated_at),
    )
}

fn json_section(scope: Scope, text: &str, fields: &[String]) -> String {
    let spans = annotation_spans(text, fields, scope.class_name());
    format!(
        "<section class=\"section\" data-scope=\"{}\">\n<h2>{} Details</h2>\n<div class=\"json-content\">{}</div>\n</section>",
        scope.as_str(),
        scope.title(),
        render_spans_html(text, &spans),
    )
}

fn field_chips(scope: Scope, fields: &[String]) -> String {
    if fields.is_empty() {
        return "<span class=\"none\">No fields selected</span>".to_string();
    }
    fields
        .iter()
        .map(|field| {
            format!(
                "<span class=\"chip {}\">{}</span>",
                scope.class_name(),
                escape_html(field)
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}
