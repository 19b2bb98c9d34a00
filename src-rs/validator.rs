//! Checks requested highlight fields against the actual request/response
//! documents and proposes corrections.

use crate::catalog::{extract_catalog, FieldCatalog};
use crate::config::{FieldsToHighlight, TestConfig};
use crate::envelope::HttpMethod;
use crate::suggest::suggest_fields;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Request,
    Response,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Request => "request",
            Scope::Response => "response",
        }
    }

    /// CSS class carried by highlighted elements of this scope.
    pub fn class_name(self) -> &'static str {
        match self {
            Scope::Request => "highlight-request",
            Scope::Response => "highlight-response",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Scope::Request => "Request",
            Scope::Response => "Response",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub scope: Scope,
    pub reason: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub corrected_fields: FieldsToHighlight,
    pub warnings: Vec<String>,
}

/// Outcome of validating one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeValidation {
    pub issues: Vec<ValidationIssue>,
    pub valid_fields: Vec<String>,
}

/// Display-ready form of a [`ValidationResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_fields: Option<FieldsToHighlight>,
}

/// Fixed rule tables the validator is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRules {
    pub request_always_valid: Vec<String>,
    pub response_meta: Vec<String>,
    pub read_only_methods: Vec<HttpMethod>,
    pub body_methods: Vec<HttpMethod>,
}

impl Default for FieldRules {
    fn default() -> Self {
        Self {
            request_always_valid: ["url", "method", "headers"].map(String::from).to_vec(),
            response_meta: ["status", "statusText", "headers", "data"]
                .map(String::from)
                .to_vec(),
            read_only_methods: vec![HttpMethod::Get, HttpMethod::Head, HttpMethod::Options],
            body_methods: vec![HttpMethod::Post, HttpMethod::Put, HttpMethod::Patch],
        }
    }
}

impl FieldRules {
    pub fn is_read_only(&self, method: HttpMethod) -> bool {
        self.read_only_methods.contains(&method)
    }

    pub fn accepts_body(&self, method: HttpMethod) -> bool {
        self.body_methods.contains(&method)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldValidator {
    rules: FieldRules,
}

impl FieldValidator {
    pub fn new(rules: FieldRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &FieldRules {
        &self.rules
    }

    /// Catalog a request exposes: the always-valid envelope fields plus every
    /// field of a structured body.
    ///
    /// The method does not narrow the catalog; a GET that carries a body still
    /// exposes its fields.
    pub fn request_catalog(&self, _method: HttpMethod, body: Option<&Value>) -> FieldCatalog {
        let mut catalog =
            FieldCatalog::with_fields(self.rules.request_always_valid.iter().cloned());
        if let Some(body @ (Value::Object(_) | Value::Array(_))) = body {
            catalog.merge(&extract_catalog(body));
        }
        catalog
    }

    pub fn response_catalog(&self, response: &Value) -> FieldCatalog {
        let mut catalog = extract_catalog(response);
        catalog.extend(self.rules.response_meta.iter().cloned());
        catalog
    }

    pub fn validate_request_fields(
        &self,
        requested: &[String],
        method: HttpMethod,
        body: Option<&Value>,
    ) -> ScopeValidation {
        let catalog = self.request_catalog(method, body);
        check_fields(
            requested,
            &catalog,
            &self.rules.request_always_valid,
            Scope::Request,
            "Field does not exist in request",
        )
    }

    pub fn validate_response_fields(
        &self,
        requested: &[String],
        response: &Value,
    ) -> ScopeValidation {
        let catalog = self.response_catalog(response);
        check_fields(
            requested,
            &catalog,
            &[],
            Scope::Response,
            "Field does not exist in API response",
        )
    }

    /// Validates both scopes of `config`.
    ///
    /// Response fields are only checked when `response` is present (a
    /// pre-flight call passes `None`). Never fails: every mismatch becomes a
    /// [`ValidationIssue`].
    pub fn validate(&self, config: &TestConfig, response: Option<&Value>) -> ValidationResult {
        let requested = &config.fields_to_highlight;
        let mut issues = Vec::new();
        let mut corrected = requested.clone();

        if !requested.request.is_empty() {
            let outcome = self.validate_request_fields(
                &requested.request,
                config.method,
                config.body.as_ref(),
            );
            if !outcome.issues.is_empty() {
                issues.extend(outcome.issues);
                corrected.request = outcome.valid_fields;
            }
        }

        let response = response.filter(|value| !value.is_null());
        if let Some(response) = response {
            if !requested.response.is_empty() {
                let outcome = self.validate_response_fields(&requested.response, response);
                if !outcome.issues.is_empty() {
                    issues.extend(outcome.issues);
                    corrected.response = outcome.valid_fields;
                }
            }
        }

        let mut warnings = Vec::new();
        if !issues.is_empty() {
            warnings.push(format!(
                "Removed {} invalid field(s) from highlighting",
                issues.len()
            ));
            warnings.push(format!(
                "Proceeding with {} request field(s) and {} response field(s)",
                corrected.request.len(),
                corrected.response.len()
            ));
        }

        ValidationResult {
            valid: issues.is_empty(),
            issues,
            corrected_fields: corrected,
            warnings,
        }
    }
}

fn check_fields(
    requested: &[String],
    catalog: &FieldCatalog,
    always_valid: &[String],
    scope: Scope,
    reason: &str,
) -> ScopeValidation {
    let mut outcome = ScopeValidation::default();
    for field in requested {
        if always_valid.contains(field) || catalog.matches(field) {
            outcome.valid_fields.push(field.clone());
        } else {
            outcome.issues.push(ValidationIssue {
                field: field.clone(),
                scope,
                reason: reason.to_string(),
                suggestions: suggest_fields(field, catalog.as_slice()),
            });
        }
    }
    outcome
}

impl ValidationResult {
    pub fn summary(&self) -> ValidationSummary {
        if self.valid && self.issues.is_empty() {
            return ValidationSummary {
                success: true,
                message: "All fields validated successfully".to_string(),
                corrected_fields: None,
            };
        }

        let mut message = String::from("Field validation issues found:\n\n");
        for (idx, issue) in self.issues.iter().enumerate() {
            message.push_str(&format!(
                "{}. Field \"{}\" ({}):\n",
                idx + 1,
                issue.field,
                issue.scope
            ));
            message.push_str(&format!("   Issue: {}\n", issue.reason));
            if !issue.suggestions.is_empty() {
                message.push_str(&format!(
                    "   Suggestions: {}\n",
                    issue.suggestions.join(", ")
                ));
            }
            message.push('\n');
        }

        if !self.warnings.is_empty() {
            message.push_str("Actions taken:\n");
            for warning in &self.warnings {
                message.push_str(&format!("- {warning}\n"));
            }
        }

        ValidationSummary {
            success: false,
            message,
            corrected_fields: Some(self.corrected_fields.clone()),
        }
    }
}
