//! Evidence helpers for API test runs: field validation with suggestions,
//! JSON leaf highlighting, and grouping of highlighted regions into
//! screenshot clips.

pub mod catalog;
pub mod config;
pub mod envelope;
pub mod error;
pub mod evidence;
pub mod highlight;
pub mod page;
pub mod regions;
pub mod suggest;
pub mod validator;

pub use catalog::{extract_catalog, FieldCatalog};
pub use config::{CapturedResponse, FieldsToHighlight, LayoutReport, ScopeLayout, TestConfig};
pub use envelope::HttpMethod;
pub use error::{EvidenceError, Result};
pub use highlight::{annotate, annotation_spans, AnnotationSpan};
pub use regions::{
    group_regions, plan_capture, BoundingBox, CapturePlan, ClipRectangle, GroupingProfile,
    RegionGroup,
};
pub use suggest::suggest_fields;
pub use validator::{FieldValidator, Scope, ValidationIssue, ValidationResult};
