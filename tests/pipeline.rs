use api_evidence::config::{CapturedResponse, LayoutReport, ScopeLayout, TestConfig};
use api_evidence::envelope::{request_envelope, response_envelope, to_pretty_json};
use api_evidence::evidence::{capture_evidence, EvidenceManifest, EvidenceNames};
use api_evidence::highlight::{annotate, annotation_spans, MARKER_CLOSE};
use api_evidence::page::render_page;
use api_evidence::{BoundingBox, CapturePlan, FieldValidator, GroupingProfile, Scope};
use image::{Rgba, RgbaImage};
use serde_json::json;
use tempfile::tempdir;

fn sample_config() -> TestConfig {
    serde_json::from_value(json!({
        "apiUrl": "https://api.example.test/orders",
        "method": "post",
        "headers": { "Content-Type": "application/json" },
        "body": { "customer": { "email": "a@b.test" }, "items": [{ "sku": "X1", "qty": 2 }] },
        "fieldsToHighlight": {
            "request": ["email", "sku", "quantity"],
            "response": ["orderId", "stauts", "total"]
        },
        "excelFileName": "create-order",
        "testCaseName": "Create order"
    }))
    .unwrap()
}

fn sample_response() -> CapturedResponse {
    serde_json::from_value(json!({
        "status": 201,
        "statusText": "Created",
        "headers": { "content-type": "application/json" },
        "data": { "orderId": "o-1", "status": "pending", "total": 19.5 }
    }))
    .unwrap()
}

#[test]
fn validation_corrects_fields_before_highlighting() {
    let config = sample_config();
    let response = sample_response();
    let result = FieldValidator::default().validate(&config, Some(&response.data));

    assert!(!result.valid);
    assert_eq!(result.issues.len(), 2);
    assert_eq!(result.corrected_fields.request, vec!["email", "sku"]);
    assert_eq!(result.corrected_fields.response, vec!["orderId", "total"]);

    let typo = result
        .issues
        .iter()
        .find(|issue| issue.field == "stauts")
        .unwrap();
    assert_eq!(typo.scope, Scope::Response);
    assert_eq!(typo.suggestions.first().map(String::as_str), Some("status"));

    let request_text = to_pretty_json(&request_envelope(&config)).unwrap();
    let response_text = to_pretty_json(&response_envelope(&response)).unwrap();

    let request_marked = annotate(
        &request_text,
        &result.corrected_fields.request,
        Scope::Request.class_name(),
    );
    assert_eq!(request_marked.matches(MARKER_CLOSE).count(), 2);
    assert!(request_marked
        .contains("<span class=\"highlight-request\">\"email\": \"a@b.test\"</span>"));

    let spans = annotation_spans(
        &response_text,
        &result.corrected_fields.response,
        Scope::Response.class_name(),
    );
    let covered: Vec<&str> = spans.iter().map(|s| &response_text[s.range()]).collect();
    assert_eq!(covered, vec!["\"orderId\": \"o-1\"", "\"total\": 19.5"]);

    let html = render_page(
        &request_text,
        &response_text,
        &result.corrected_fields,
        "2026-01-01T00:00:00Z",
    );
    assert_eq!(html.matches("<span class=\"highlight-response\">").count(), 2);
}

#[test]
fn capture_writes_grouped_crops_and_manifest() {
    let dir = tempdir().unwrap();
    let screenshot = dir.path().join("page.png");
    RgbaImage::from_pixel(800, 1600, Rgba([255, 255, 255, 255]))
        .save(&screenshot)
        .unwrap();

    let layout = LayoutReport {
        request: Some(ScopeLayout {
            container: BoundingBox::new(40.0, 100.0, 720.0, 600.0),
            boxes: vec![
                BoundingBox::new(80.0, 200.0, 200.0, 30.0),
                BoundingBox::new(80.0, 250.0, 160.0, 30.0),
            ],
        }),
        response: Some(ScopeLayout {
            container: BoundingBox::new(40.0, 800.0, 720.0, 700.0),
            boxes: vec![
                BoundingBox::new(80.0, 850.0, 200.0, 30.0),
                BoundingBox::new(80.0, 1300.0, 200.0, 30.0),
            ],
        }),
    };
    let names = EvidenceNames::new(dir.path().join("out"), "Create Order");
    let (full_page, scopes) =
        capture_evidence(&screenshot, &layout, &GroupingProfile::STANDARD, &names).unwrap();

    let config = sample_config();
    let response = sample_response();
    let validation = FieldValidator::default().validate(&config, Some(&response.data));
    let mut manifest = EvidenceManifest::new(&config, &response, validation);
    manifest.full_page = Some(full_page);
    manifest.scopes = scopes;

    let labels: Vec<&str> = manifest
        .images()
        .into_iter()
        .map(|c| c.label.as_str())
        .collect();
    assert_eq!(
        labels,
        vec![
            "Full Page Screenshot",
            "Request Fields - Group 1",
            "Response Fields - Group 1",
            "Response Fields - Group 2",
        ]
    );
    assert!(manifest.passed);

    for (scope, layout) in manifest.scopes.iter().zip([&layout.request, &layout.response]) {
        let container = layout.as_ref().unwrap().container;
        let Some(CapturePlan::Regions { groups }) = &scope.plan else {
            panic!("expected grouped plan for {}", scope.scope);
        };
        for group in groups {
            assert!(group.clip.x >= container.x && group.clip.right() <= container.right());
            assert!(group.clip.y >= container.y && group.clip.bottom() <= container.bottom());
        }
    }

    for capture in manifest.images() {
        assert!(capture.path.exists(), "{}", capture.path.display());
        let name = capture.path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("create-order_"), "{name}");
    }

    let value = serde_json::to_value(&manifest).unwrap();
    assert_eq!(value["scopes"][1]["plan"]["kind"], "regions");
    assert_eq!(
        value["validation"]["correctedFields"]["response"],
        json!(["orderId", "total"])
    );
}
