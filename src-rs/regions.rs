//! Clustering of highlighted element boxes into padded screenshot regions.

use crate::error::{EvidenceError, Result};
use serde::{Deserialize, Serialize};

/// Axis-aligned box in the coordinate space of one rendered container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    fn check(&self, what: &str) -> Result<()> {
        let fields = [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(EvidenceError::InvalidInput(format!(
                    "{what} has invalid {name}: {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Capture rectangle derived from a group; always inside the container.
pub type ClipRectangle = BoundingBox;

/// Tunables for grouping and padding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupingProfile {
    /// Largest vertical gap between consecutive boxes that still joins them.
    pub vertical_gap_threshold: f64,
    pub horizontal_padding: f64,
    pub vertical_padding: f64,
    /// Multiplier applied to `horizontal_padding` when widening a clip.
    pub width_expansion: f64,
    /// Multiplier applied to `vertical_padding` when heightening a clip.
    pub height_expansion: f64,
}

impl GroupingProfile {
    /// Preset used for request/response evidence captures.
    pub const STANDARD: GroupingProfile = GroupingProfile {
        vertical_gap_threshold: 100.0,
        horizontal_padding: 50.0,
        vertical_padding: 80.0,
        width_expansion: 3.0,
        height_expansion: 2.0,
    };

    fn check(&self) -> Result<()> {
        let fields = [
            ("vertical_gap_threshold", self.vertical_gap_threshold),
            ("horizontal_padding", self.horizontal_padding),
            ("vertical_padding", self.vertical_padding),
            ("width_expansion", self.width_expansion),
            ("height_expansion", self.height_expansion),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(EvidenceError::InvalidInput(format!(
                    "grouping profile has invalid {name}: {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for GroupingProfile {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionGroup {
    /// Positions of the members in the caller's input slice.
    pub indices: Vec<usize>,
    pub boxes: Vec<BoundingBox>,
    pub clip: ClipRectangle,
}

/// What the screenshot step should capture for one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapturePlan {
    /// Nothing was highlighted; capture the whole container.
    WholeContainer { container: BoundingBox },
    Regions { groups: Vec<RegionGroup> },
}

impl CapturePlan {
    pub fn clips(&self) -> Vec<ClipRectangle> {
        match self {
            CapturePlan::WholeContainer { container } => vec![*container],
            CapturePlan::Regions { groups } => groups.iter().map(|g| g.clip).collect(),
        }
    }
}

/// Clusters `boxes` top to bottom and derives one padded clip per cluster.
///
/// Boxes join the current group while the gap below the group's last box is
/// at most `profile.vertical_gap_threshold`. Every clip is clamped to
/// `container`. Non-finite or negative geometry is rejected.
pub fn group_regions(
    boxes: &[BoundingBox],
    container: &BoundingBox,
    profile: &GroupingProfile,
) -> Result<Vec<RegionGroup>> {
    container.check("container")?;
    profile.check()?;
    for (idx, bbox) in boxes.iter().enumerate() {
        bbox.check(&format!("box {idx}"))?;
    }
    if boxes.is_empty() {
        return Ok(Vec::new());
    }

    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|a, b| boxes[*a].y.total_cmp(&boxes[*b].y));

    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = vec![order[0]];
    for &idx in &order[1..] {
        let last = &boxes[current[current.len() - 1]];
        let gap = boxes[idx].y - last.bottom();
        if gap <= profile.vertical_gap_threshold {
            current.push(idx);
        } else {
            clusters.push(std::mem::replace(&mut current, vec![idx]));
        }
    }
    clusters.push(current);

    Ok(clusters
        .into_iter()
        .map(|indices| {
            let members: Vec<BoundingBox> = indices.iter().map(|&i| boxes[i]).collect();
            let clip = clip_for(&members, container, profile);
            RegionGroup {
                indices,
                boxes: members,
                clip,
            }
        })
        .collect())
}

/// [`group_regions`], or a whole-container capture when nothing was found.
pub fn plan_capture(
    boxes: &[BoundingBox],
    container: &BoundingBox,
    profile: &GroupingProfile,
) -> Result<CapturePlan> {
    let groups = group_regions(boxes, container, profile)?;
    if groups.is_empty() {
        return Ok(CapturePlan::WholeContainer {
            container: *container,
        });
    }
    Ok(CapturePlan::Regions { groups })
}

fn clip_for(
    members: &[BoundingBox],
    container: &BoundingBox,
    profile: &GroupingProfile,
) -> ClipRectangle {
    let min_x = members.iter().map(|b| b.x).fold(f64::INFINITY, f64::min);
    let min_y = members.iter().map(|b| b.y).fold(f64::INFINITY, f64::min);
    let max_x = members.iter().map(BoundingBox::right).fold(0.0, f64::max);
    let max_y = members.iter().map(BoundingBox::bottom).fold(0.0, f64::max);

    let width = container
        .width
        .min(max_x - min_x + profile.horizontal_padding * profile.width_expansion);
    let height = container
        .height
        .min(max_y - min_y + profile.vertical_padding * profile.height_expansion);

    // Padding may push the origin past either edge; keep it on the container
    // and trim the far side.
    let x = (min_x - profile.horizontal_padding)
        .max(container.x)
        .min(container.right());
    let y = (min_y - profile.vertical_padding)
        .max(container.y)
        .min(container.bottom());

    BoundingBox {
        x,
        y,
        width: width.min(container.right() - x),
        height: height.min(container.bottom() - y),
    }
}
