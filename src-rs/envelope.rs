//! Request/response envelopes and their canonical pretty-printed text.

use crate::config::{CapturedResponse, TestConfig};
use crate::error::{EvidenceError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HttpMethod {
    #[default]
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 6] = [
        HttpMethod::Get,
        HttpMethod::Head,
        HttpMethod::Options,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// Methods whose requests carry a body on the wire.
    pub fn carries_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = EvidenceError;

    fn from_str(raw: &str) -> Result<Self> {
        let upper = raw.trim().to_ascii_uppercase();
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == upper)
            .ok_or_else(|| EvidenceError::UnknownMethod(raw.to_string()))
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = EvidenceError;

    fn try_from(raw: String) -> Result<Self> {
        raw.parse()
    }
}

impl From<HttpMethod> for String {
    fn from(method: HttpMethod) -> Self {
        method.as_str().to_string()
    }
}

/// `{url, method, headers, body}` as shown in the request section.
pub fn request_envelope(config: &TestConfig) -> Value {
    json!({
        "url": config.api_url,
        "method": config.method.as_str(),
        "headers": Value::Object(config.headers.clone()),
        "body": config.body.clone().unwrap_or(Value::Null),
    })
}

/// `{status, statusText, headers, data}` as shown in the response section.
pub fn response_envelope(response: &CapturedResponse) -> Value {
    json!({
        "status": response.status,
        "statusText": response.status_text,
        "headers": Value::Object(response.headers.clone()),
        "data": response.data,
    })
}

/// Two-space indented serialization, keys in document order.
pub fn to_pretty_json(value: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
