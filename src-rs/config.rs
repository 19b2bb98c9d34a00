//! Run inputs: the caller's test config, the captured response, and the
//! layout report handed back by the renderer.

use crate::envelope::HttpMethod;
use crate::error::Result;
use crate::regions::BoundingBox;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

pub const DEFAULT_EVIDENCE_PREFIX: &str = "api-test-results";

/// Field lists the caller wants highlighted, per scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldsToHighlight {
    #[serde(default)]
    pub request: Vec<String>,
    #[serde(default)]
    pub response: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConfig {
    pub api_url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: Map<String, Value>,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub fields_to_highlight: FieldsToHighlight,
    #[serde(
        rename = "excelFileName",
        alias = "evidencePrefix",
        default = "default_evidence_prefix"
    )]
    pub evidence_prefix: String,
    #[serde(default)]
    pub test_case_name: Option<String>,
}

fn default_evidence_prefix() -> String {
    DEFAULT_EVIDENCE_PREFIX.to_string()
}

/// Response as recorded by the HTTP collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedResponse {
    pub status: u16,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub headers: Map<String, Value>,
    #[serde(default)]
    pub data: Value,
}

impl CapturedResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Rendered geometry of one section: its container and highlighted elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeLayout {
    pub container: BoundingBox,
    #[serde(default)]
    pub boxes: Vec<BoundingBox>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutReport {
    #[serde(default)]
    pub request: Option<ScopeLayout>,
    #[serde(default)]
    pub response: Option<ScopeLayout>,
}

/// Reads a JSON document from `path`, or from stdin when `path` is `-`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&raw)?)
}

/// Root directory for generated pages, crops and manifests.
pub fn out_root() -> PathBuf {
    env::var("APIEV_OUT_DIR")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            env::var("APIEV_TMP_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from(".api-evidence"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_config_applies_defaults() {
        let config: TestConfig =
            serde_json::from_value(json!({"apiUrl": "https://api.test/posts/1"})).unwrap();
        assert_eq!(config.method, HttpMethod::Get);
        assert!(config.body.is_none());
        assert!(config.fields_to_highlight.request.is_empty());
        assert_eq!(config.evidence_prefix, DEFAULT_EVIDENCE_PREFIX);
    }

    #[test]
    fn test_config_reads_caller_field_names() {
        let config: TestConfig = serde_json::from_value(json!({
            "apiUrl": "https://api.test/posts",
            "method": "post",
            "headers": {"Content-Type": "application/json"},
            "body": {"title": "t"},
            "fieldsToHighlight": {"request": ["title"], "response": ["id"]},
            "excelFileName": "create-post",
            "testCaseName": "C101"
        }))
        .unwrap();
        assert_eq!(config.method, HttpMethod::Post);
        assert_eq!(config.fields_to_highlight.response, vec!["id"]);
        assert_eq!(config.evidence_prefix, "create-post");
        assert_eq!(config.test_case_name.as_deref(), Some("C101"));
    }

    #[test]
    fn null_body_is_absent() {
        let config: TestConfig =
            serde_json::from_value(json!({"apiUrl": "u", "body": null})).unwrap();
        assert!(config.body.is_none());
    }

    #[test]
    fn load_json_reads_layout_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("layout.json");
        fs::write(
            &path,
            r#"{"response": {"container": {"x": 0, "y": 0, "width": 800, "height": 600}}}"#,
        )
        .unwrap();
        let layout: LayoutReport = load_json(&path).unwrap();
        assert!(layout.request.is_none());
        let response = layout.response.unwrap();
        assert!(response.boxes.is_empty());
        assert_eq!(response.container.width, 800.0);
    }

    #[test]
    fn unknown_method_is_a_parse_error() {
        let parsed: std::result::Result<TestConfig, _> =
            serde_json::from_value(json!({"apiUrl": "u", "method": "TRACE"}));
        assert!(parsed.is_err());
    }
}
