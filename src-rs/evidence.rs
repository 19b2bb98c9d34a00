//! Evidence capture: crops per-group screenshots out of a full-page capture
//! and records them in a manifest sidecar.

use crate::config::{CapturedResponse, LayoutReport, ScopeLayout, TestConfig};
use crate::error::{EvidenceError, Result};
use crate::regions::{plan_capture, CapturePlan, ClipRectangle, GroupingProfile};
use crate::validator::{Scope, ValidationResult};
use chrono::Utc;
use image::{imageops, RgbaImage};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct SavedCapture {
    pub path: PathBuf,
    pub label: String,
    pub clip: ClipRectangle,
    /// Highlighted elements inside the clip; zero for a whole-section capture.
    pub members: usize,
}

/// Evidence produced for one section of the page.
#[derive(Debug, Clone, Serialize)]
pub struct ScopeEvidence {
    pub scope: Scope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<CapturePlan>,
    pub captures: Vec<SavedCapture>,
    /// Why this section was skipped, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScopeEvidence {
    fn skipped(scope: Scope, reason: String) -> Self {
        Self {
            scope,
            plan: None,
            captures: Vec::new(),
            error: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvidenceManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub test_case_name: Option<String>,
    pub api_url: String,
    pub method: String,
    pub status: u16,
    pub status_text: String,
    pub passed: bool,
    pub validation: ValidationResult,
    pub full_page: Option<SavedCapture>,
    pub scopes: Vec<ScopeEvidence>,
}

impl EvidenceManifest {
    pub fn new(
        config: &TestConfig,
        response: &CapturedResponse,
        validation: ValidationResult,
    ) -> Self {
        Self {
            manifest_version: MANIFEST_VERSION,
            generated_at: timestamp_iso(),
            test_case_name: config.test_case_name.clone(),
            api_url: config.api_url.clone(),
            method: config.method.to_string(),
            status: response.status,
            status_text: response.status_text.clone(),
            passed: response.is_success(),
            validation,
            full_page: None,
            scopes: Vec::new(),
        }
    }

    /// Every saved image in page order: full page, then request, then response.
    pub fn images(&self) -> Vec<&SavedCapture> {
        self.full_page
            .iter()
            .chain(self.scopes.iter().flat_map(|s| s.captures.iter()))
            .collect()
    }
}

/// Output naming shared by every file of one run.
#[derive(Debug, Clone)]
pub struct EvidenceNames {
    pub out_dir: PathBuf,
    pub prefix: String,
    pub stamp: String,
}

impl EvidenceNames {
    pub fn new(out_dir: impl Into<PathBuf>, prefix: &str) -> Self {
        Self {
            out_dir: out_dir.into(),
            prefix: slugify(prefix),
            stamp: run_stamp(),
        }
    }

    pub fn full_page(&self) -> PathBuf {
        self.out_dir
            .join(format!("{}_full_{}.png", self.prefix, self.stamp))
    }

    pub fn group(&self, scope: Scope, number: usize) -> PathBuf {
        self.out_dir.join(format!(
            "{}_{}_group{}_{}.png",
            self.prefix, scope, number, self.stamp
        ))
    }

    pub fn section(&self, scope: Scope) -> PathBuf {
        self.out_dir
            .join(format!("{}_{}_full_{}.png", self.prefix, scope, self.stamp))
    }

    pub fn page(&self) -> PathBuf {
        self.out_dir
            .join(format!("{}_{}.html", self.prefix, self.stamp))
    }

    pub fn manifest(&self) -> PathBuf {
        self.out_dir
            .join(format!("{}_{}.json", self.prefix, self.stamp))
    }
}

/// Cuts `clip` out of `image`, rounding outward to whole pixels. Returns
/// `None` when nothing of the clip lies on the image.
pub fn crop_clip(image: &RgbaImage, clip: &ClipRectangle) -> Option<RgbaImage> {
    let (img_w, img_h) = image.dimensions();
    let x0 = clip.x.floor().clamp(0.0, f64::from(img_w)) as u32;
    let y0 = clip.y.floor().clamp(0.0, f64::from(img_h)) as u32;
    let x1 = clip.right().ceil().clamp(0.0, f64::from(img_w)) as u32;
    let y1 = clip.bottom().ceil().clamp(0.0, f64::from(img_h)) as u32;
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(imageops::crop_imm(image, x0, y0, x1 - x0, y1 - y0).to_image())
}

/// Plans and saves the captures of one section.
///
/// Invalid geometry only skips this section; the returned evidence carries
/// the reason. Write failures are returned as errors.
pub fn capture_scope(
    image: &RgbaImage,
    scope: Scope,
    layout: &ScopeLayout,
    profile: &GroupingProfile,
    names: &EvidenceNames,
) -> Result<ScopeEvidence> {
    let plan = match plan_capture(&layout.boxes, &layout.container, profile) {
        Ok(plan) => plan,
        Err(EvidenceError::InvalidInput(reason)) => {
            warn!(%scope, %reason, "skipping evidence capture");
            return Ok(ScopeEvidence::skipped(scope, reason));
        }
        Err(err) => return Err(err),
    };

    let mut captures = Vec::new();
    match &plan {
        CapturePlan::WholeContainer { container } => {
            warn!(%scope, "no highlighted fields rendered; capturing whole section");
            let path = names.section(scope);
            if save_crop(image, container, &path)? {
                captures.push(SavedCapture {
                    label: evidence_label(&path),
                    path,
                    clip: *container,
                    members: 0,
                });
            }
        }
        CapturePlan::Regions { groups } => {
            info!(
                %scope,
                fields = layout.boxes.len(),
                groups = groups.len(),
                "grouped highlighted fields"
            );
            for (idx, group) in groups.iter().enumerate() {
                let path = names.group(scope, idx + 1);
                if save_crop(image, &group.clip, &path)? {
                    debug!(%scope, group = idx + 1, members = group.boxes.len(), "captured group");
                    captures.push(SavedCapture {
                        label: evidence_label(&path),
                        path,
                        clip: group.clip,
                        members: group.boxes.len(),
                    });
                }
            }
        }
    }

    Ok(ScopeEvidence {
        scope,
        plan: Some(plan),
        captures,
        error: None,
    })
}

/// Copies the full-page capture next to the crops and captures every section
/// present in `layout`, request first.
pub fn capture_evidence(
    image_path: &Path,
    layout: &LayoutReport,
    profile: &GroupingProfile,
    names: &EvidenceNames,
) -> Result<(SavedCapture, Vec<ScopeEvidence>)> {
    let image = image::open(image_path)?.to_rgba8();
    let (img_w, img_h) = image.dimensions();

    let full_path = names.full_page();
    ensure_parent_dir(&full_path)?;
    image.save(&full_path)?;
    let full_page = SavedCapture {
        label: evidence_label(&full_path),
        path: full_path,
        clip: ClipRectangle::new(0.0, 0.0, f64::from(img_w), f64::from(img_h)),
        members: 0,
    };

    let mut scopes = Vec::new();
    for (scope, section) in [
        (Scope::Request, &layout.request),
        (Scope::Response, &layout.response),
    ] {
        match section {
            Some(section) => scopes.push(capture_scope(&image, scope, section, profile, names)?),
            None => {
                warn!(%scope, "layout has no section; nothing captured");
                scopes.push(ScopeEvidence::skipped(
                    scope,
                    format!("layout report has no {scope} section"),
                ));
            }
        }
    }

    let total: usize = scopes.iter().map(|s| s.captures.len()).sum();
    info!(images = total + 1, "evidence captured");
    Ok((full_page, scopes))
}

fn save_crop(image: &RgbaImage, clip: &ClipRectangle, path: &Path) -> Result<bool> {
    let Some(cropped) = crop_clip(image, clip) else {
        warn!(path = %path.display(), "clip lies outside the captured image; skipped");
        return Ok(false);
    };
    ensure_parent_dir(path)?;
    cropped.save(path)?;
    Ok(true)
}

/// Human-readable caption for an evidence image, derived from its file name.
pub fn evidence_label(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    for scope in [Scope::Request, Scope::Response] {
        if name.contains(&format!("_{scope}_full_")) {
            return format!("{} Section", scope.title());
        }
        if name.contains(&format!("_{scope}_group")) {
            return match group_number(name) {
                Some(n) => format!("{} Fields - Group {n}", scope.title()),
                None => format!("{} Fields", scope.title()),
            };
        }
    }
    if name.contains("_full_") {
        return "Full Page Screenshot".to_string();
    }
    "Screenshot".to_string()
}

fn group_number(name: &str) -> Option<usize> {
    let rest = &name[name.find("_group")? + "_group".len()..];
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

pub fn write_json_pretty(path: &Path, value: &impl Serialize) -> Result<()> {
    ensure_parent_dir(path)?;
    let raw = serde_json::to_string_pretty(value)?;
    fs::write(path, raw)?;
    Ok(())
}

pub fn write_text_file(path: &Path, content: &str) -> Result<()> {
    ensure_parent_dir(path)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Manifest payload as a JSON value, for printing.
pub fn manifest_value(manifest: &EvidenceManifest) -> Result<Value> {
    Ok(serde_json::to_value(manifest)?)
}

pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() || matches!(lower, '.' | '_' | '-') {
            out.push(lower);
        } else if lower.is_ascii_whitespace() {
            out.push('-');
        }
    }
    if out.is_empty() {
        "evidence".to_string()
    } else {
        out
    }
}

pub fn timestamp_iso() -> String {
    Utc::now().to_rfc3339()
}

fn run_stamp() -> String {
    let rand = rand::thread_rng().gen_range(1000..9999);
    format!("{}-{rand}", Utc::now().format("%Y%m%d-%H%M%S"))
}
