//! Comment anchor position model.
//!
//! Converts pointer coordinates (client pixels) into scroll-independent
//! percentage coordinates relative to the proposal container, and, when the
//! pointer lands on a sticky-positioned element, relative to that element's
//! own box as well. The overlay layer (see [`crate::overlay`]) turns these
//! stored anchors back into pixels at render time.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Pointer displacement (in percentage points, per axis) below which a
/// down/up pair is treated as a click rather than a drag.
pub const CLICK_THRESHOLD_PCT: f64 = 0.5;

/// Upper bound for every stored percentage coordinate.
pub const MAX_PERCENT: f64 = 100.0;

/// Name of the data attribute placed on deliberately anchorable regions.
pub const ANCHOR_ATTRIBUTE: &str = "data-anchor-id";

/// Maximum length of an anchor reference value.
pub const MAX_ANCHOR_REF_LENGTH: usize = 512;

/// A CSS identifier (class names, element ids, anchor ids).
static CSS_IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[_a-zA-Z][_a-zA-Z0-9-]*$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A point in client pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A bounding box in client pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Inclusive on the top/left edges, exclusive on the bottom/right edges.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x < self.right()
            && point.y >= self.top
            && point.y < self.bottom()
    }

    fn ensure_measurable(&self) -> Result<(), CoreError> {
        let finite = [self.left, self.top, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.width <= 0.0 || self.height <= 0.0 {
            return Err(CoreError::Validation(format!(
                "reference box must have a positive finite size, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// A coordinate expressed as percentages (0-100) of a reference box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentPoint {
    pub x: f64,
    pub y: f64,
}

impl PercentPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp both axes into `[0, 100]`.
    pub fn clamped(self) -> Self {
        Self {
            x: clamp_percent(self.x),
            y: clamp_percent(self.y),
        }
    }
}

fn clamp_percent(v: f64) -> f64 {
    v.clamp(0.0, MAX_PERCENT)
}

/// Convert a pixel point into percentages of `reference`.
///
/// The result is not clamped; points outside the box map outside `[0, 100]`.
pub fn to_percent(point: Point, reference: &Rect) -> Result<PercentPoint, CoreError> {
    reference.ensure_measurable()?;
    Ok(PercentPoint {
        x: (point.x - reference.left) / reference.width * MAX_PERCENT,
        y: (point.y - reference.top) / reference.height * MAX_PERCENT,
    })
}

/// Convert percentages of `reference` back into a pixel point.
pub fn to_pixels(percent: PercentPoint, reference: &Rect) -> Point {
    Point {
        x: reference.left + percent.x / MAX_PERCENT * reference.width,
        y: reference.top + percent.y / MAX_PERCENT * reference.height,
    }
}

// ---------------------------------------------------------------------------
// Element description
// ---------------------------------------------------------------------------

/// CSS positioning mode of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionMode {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

/// What the host knows about one element in a hit-test chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementInfo {
    /// Lowercase tag name, e.g. `"header"`.
    pub tag: String,
    /// The element's `id` attribute, if any.
    pub id: Option<String>,
    /// The element's `data-anchor-id` attribute, if any.
    pub anchor_id: Option<String>,
    pub classes: Vec<String>,
    /// 1-based position among its parent's children.
    pub sibling_index: usize,
    pub position: PositionMode,
    /// Current bounding box in client pixels.
    pub rect: Rect,
}

impl ElementInfo {
    pub fn is_sticky(&self) -> bool {
        self.position == PositionMode::Sticky
    }
}

/// Return the innermost sticky element of a hit-test chain (innermost first).
pub fn find_sticky(chain: &[ElementInfo]) -> Option<&ElementInfo> {
    chain.iter().find(|el| el.is_sticky())
}

// ---------------------------------------------------------------------------
// Anchor references
// ---------------------------------------------------------------------------

/// How an [`AnchorRef`] identifies its element, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorRefKind {
    ElementId,
    AnchorAttribute,
    /// Generated from tag, classes and sibling index. May stop matching
    /// after a layout change.
    Structural,
}

impl AnchorRefKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ElementId => "element_id",
            Self::AnchorAttribute => "anchor_attribute",
            Self::Structural => "structural",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "element_id" => Ok(Self::ElementId),
            "anchor_attribute" => Ok(Self::AnchorAttribute),
            "structural" => Ok(Self::Structural),
            _ => Err(CoreError::Validation(format!(
                "Invalid anchor reference kind '{s}'. Must be one of: element_id, anchor_attribute, structural"
            ))),
        }
    }
}

/// Identifies the sticky element a set of coordinates is relative to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRef {
    pub kind: AnchorRefKind,
    pub value: String,
}

impl AnchorRef {
    /// Render as a CSS selector the host can query.
    pub fn selector(&self) -> String {
        match self.kind {
            AnchorRefKind::ElementId => format!("#{}", self.value),
            AnchorRefKind::AnchorAttribute => format!("[{ANCHOR_ATTRIBUTE}=\"{}\"]", self.value),
            AnchorRefKind::Structural => self.value.clone(),
        }
    }

    /// Whether this reference survives layout changes.
    pub fn is_stable(&self) -> bool {
        self.kind != AnchorRefKind::Structural
    }

    /// Does `element` match this reference?
    pub fn matches(&self, element: &ElementInfo) -> bool {
        match self.kind {
            AnchorRefKind::ElementId => element.id.as_deref() == Some(self.value.as_str()),
            AnchorRefKind::AnchorAttribute => {
                element.anchor_id.as_deref() == Some(self.value.as_str())
            }
            AnchorRefKind::Structural => structural_selector(element) == self.value,
        }
    }
}

/// Build the best available reference for an element.
///
/// Priority: explicit id, then `data-anchor-id`, then a structural selector.
/// Values that are not valid CSS identifiers are skipped.
pub fn anchor_ref_for(element: &ElementInfo) -> AnchorRef {
    if let Some(id) = element.id.as_deref().filter(|v| is_css_ident(v)) {
        return AnchorRef {
            kind: AnchorRefKind::ElementId,
            value: id.to_string(),
        };
    }
    if let Some(anchor_id) = element.anchor_id.as_deref().filter(|v| is_css_ident(v)) {
        return AnchorRef {
            kind: AnchorRefKind::AnchorAttribute,
            value: anchor_id.to_string(),
        };
    }
    AnchorRef {
        kind: AnchorRefKind::Structural,
        value: structural_selector(element),
    }
}

/// `tag.class-a.class-b:nth-child(n)`, keeping only valid class names.
pub fn structural_selector(element: &ElementInfo) -> String {
    let tag = if element.tag.is_empty() {
        "*"
    } else {
        element.tag.as_str()
    };
    let mut selector = tag.to_ascii_lowercase();
    for class in element.classes.iter().filter(|c| is_css_ident(c)) {
        selector.push('.');
        selector.push_str(class);
    }
    selector.push_str(&format!(":nth-child({})", element.sibling_index.max(1)));
    selector
}

fn is_css_ident(value: &str) -> bool {
    CSS_IDENT_RE.is_match(value)
}

/// Validate a stored anchor reference value.
pub fn validate_anchor_ref(anchor_ref: &AnchorRef) -> Result<(), CoreError> {
    if anchor_ref.value.trim().is_empty() {
        return Err(CoreError::Validation(
            "anchor reference must not be empty".to_string(),
        ));
    }
    if anchor_ref.value.len() > MAX_ANCHOR_REF_LENGTH {
        return Err(CoreError::Validation(format!(
            "anchor reference exceeds {MAX_ANCHOR_REF_LENGTH} characters"
        )));
    }
    if anchor_ref.kind != AnchorRefKind::Structural && !is_css_ident(&anchor_ref.value) {
        return Err(CoreError::Validation(format!(
            "anchor reference '{}' is not a valid identifier",
            anchor_ref.value
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Anchors
// ---------------------------------------------------------------------------

/// Where a comment attaches, in percentages of its reference box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Anchor {
    Point { x: f64, y: f64 },
    Region { x: f64, y: f64, width: f64, height: f64 },
}

impl Anchor {
    /// Top-left corner (or the point itself).
    pub fn origin(&self) -> PercentPoint {
        match *self {
            Self::Point { x, y } | Self::Region { x, y, .. } => PercentPoint { x, y },
        }
    }

    /// `(width, height)` for regions.
    pub fn extent(&self) -> Option<(f64, f64)> {
        match *self {
            Self::Point { .. } => None,
            Self::Region { width, height, .. } => Some((width, height)),
        }
    }

    pub fn is_region(&self) -> bool {
        matches!(self, Self::Region { .. })
    }

    /// Build from the flat column representation used in storage.
    pub fn from_parts(
        x: f64,
        y: f64,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<Self, CoreError> {
        match (width, height) {
            (None, None) => Ok(Self::Point { x, y }),
            (Some(width), Some(height)) => Ok(Self::Region {
                x,
                y,
                width,
                height,
            }),
            _ => Err(CoreError::Validation(
                "width and height must be provided together".to_string(),
            )),
        }
    }
}

/// Decide between a point and a region anchor from a pointer down/up pair.
///
/// Both inputs are clamped into `[0, 100]` first.
pub fn classify_gesture(down: PercentPoint, up: PercentPoint) -> Anchor {
    let down = down.clamped();
    let up = up.clamped();
    let dx = (up.x - down.x).abs();
    let dy = (up.y - down.y).abs();

    if dx < CLICK_THRESHOLD_PCT && dy < CLICK_THRESHOLD_PCT {
        return Anchor::Point {
            x: down.x,
            y: down.y,
        };
    }

    Anchor::Region {
        x: down.x.min(up.x),
        y: down.y.min(up.y),
        width: dx,
        height: dy,
    }
}

/// Coordinates relative to a sticky element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickyAnchor {
    pub anchor_ref: AnchorRef,
    pub anchor: Anchor,
}

/// The full anchor recorded for a comment: container-relative coordinates as
/// the fallback, sticky-relative ones as the primary when applicable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentAnchor {
    pub container: Anchor,
    pub sticky: Option<StickyAnchor>,
}

impl CommentAnchor {
    pub fn point(x: f64, y: f64) -> Self {
        Self {
            container: Anchor::Point { x, y },
            sticky: None,
        }
    }
}

/// Capture an anchor from a pointer down/up pair.
///
/// `chain` is the hit-test chain under the pointer-down position, innermost
/// element first.
pub fn capture_anchor(
    down: Point,
    up: Point,
    container: &Rect,
    chain: &[ElementInfo],
) -> Result<CommentAnchor, CoreError> {
    let container_anchor = classify_gesture(to_percent(down, container)?, to_percent(up, container)?);

    let sticky = match find_sticky(chain) {
        Some(el) => {
            let anchor = classify_gesture(to_percent(down, &el.rect)?, to_percent(up, &el.rect)?);
            Some(StickyAnchor {
                anchor_ref: anchor_ref_for(el),
                anchor,
            })
        }
        None => None,
    };

    Ok(CommentAnchor {
        container: container_anchor,
        sticky,
    })
}

/// Validate an anchor's coordinates.
///
/// Origins must lie in `[0, 100]`; regions must have non-negative extents
/// that stay inside the reference box.
pub fn validate_anchor(anchor: &Anchor) -> Result<(), CoreError> {
    let origin = anchor.origin();
    for (label, v) in [("pos_x", origin.x), ("pos_y", origin.y)] {
        if !v.is_finite() || !(0.0..=MAX_PERCENT).contains(&v) {
            return Err(CoreError::Validation(format!(
                "{label} must be between 0 and {MAX_PERCENT}, got {v}"
            )));
        }
    }

    if let Some((width, height)) = anchor.extent() {
        for (label, v, start) in [("width", width, origin.x), ("height", height, origin.y)] {
            if !v.is_finite() || v < 0.0 {
                return Err(CoreError::Validation(format!(
                    "{label} must be a non-negative number, got {v}"
                )));
            }
            // Small tolerance for float accumulation in clients.
            if start + v > MAX_PERCENT + 1e-9 {
                return Err(CoreError::Validation(format!(
                    "{label} extends past the reference box ({start} + {v} > {MAX_PERCENT})"
                )));
            }
        }
    }

    Ok(())
}

/// Validate a full comment anchor including the optional sticky part.
pub fn validate_comment_anchor(anchor: &CommentAnchor) -> Result<(), CoreError> {
    validate_anchor(&anchor.container)?;
    if let Some(sticky) = &anchor.sticky {
        validate_anchor_ref(&sticky.anchor_ref)?;
        validate_anchor(&sticky.anchor)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
