// Core types shared by every UI surface implementation

use serde::{Deserialize, Serialize};
use std::fmt;

/// How an element's text must relate to the expected string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMatch {
    /// Text content contains the string
    Contains(String),
    /// Trimmed text content equals the string
    Exact(String),
}

impl TextMatch {
    /// Check a candidate element's text content
    pub fn matches(&self, text: &str) -> bool {
        match self {
            TextMatch::Contains(needle) => text.contains(needle.as_str()),
            TextMatch::Exact(expected) => text.trim() == expected,
        }
    }
}

/// Locates one element: CSS selector, optional text filter, then the n-th match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    /// CSS selector
    pub selector: String,

    /// Optional filter on the element's text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextMatch>,

    /// Which of the filtered matches to use (0 = first)
    #[serde(default, skip_serializing_if = "is_zero")]
    pub index: usize,
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

impl Locator {
    /// First element matching a CSS selector
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            text: None,
            index: 0,
        }
    }

    /// Require the element's text to contain `needle`
    pub fn containing(mut self, needle: impl Into<String>) -> Self {
        self.text = Some(TextMatch::Contains(needle.into()));
        self
    }

    /// Require the element's trimmed text to equal `text`
    pub fn exact(mut self, text: impl Into<String>) -> Self {
        self.text = Some(TextMatch::Exact(text.into()));
        self
    }

    /// Pick the n-th match instead of the first
    pub fn nth(mut self, index: usize) -> Self {
        self.index = index;
        self
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selector)?;
        match &self.text {
            Some(TextMatch::Contains(s)) => write!(f, " containing {:?}", s)?,
            Some(TextMatch::Exact(s)) => write!(f, " with text {:?}", s)?,
            None => {}
        }
        if self.index > 0 {
            write!(f, " [#{}]", self.index)?;
        }
        Ok(())
    }
}

/// Opaque handle to an element resolved by a surface during the current run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub usize);

/// Element geometry in CSS pixels, relative to the page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Padding applied around an element crop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Padding {
    /// Same padding on every side
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// No padding
    pub const fn none() -> Self {
        Self::uniform(0.0)
    }

    /// Padding only below the element
    pub const fn below(value: f64) -> Self {
        Self {
            top: 0.0,
            right: 0.0,
            bottom: value,
            left: 0.0,
        }
    }
}

impl Default for Padding {
    fn default() -> Self {
        Self::none()
    }
}

/// A rectangular capture region in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ClipRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Derive a crop from an element's bounding box.
    ///
    /// The origin is clamped at zero; the size always includes the full
    /// padding. `max_height` caps the final height. Returns `None` when the
    /// resulting rectangle is empty.
    pub fn around(bbox: &BoundingBox, padding: &Padding, max_height: Option<f64>) -> Option<Self> {
        let x = (bbox.x - padding.left).max(0.0);
        let y = (bbox.y - padding.top).max(0.0);
        let width = bbox.width + padding.left + padding.right;
        let mut height = bbox.height + padding.top + padding.bottom;
        if let Some(cap) = max_height {
            height = height.min(cap);
        }

        if width <= 0.0 || height <= 0.0 || !width.is_finite() || !height.is_finite() {
            return None;
        }

        Some(Self {
            x,
            y,
            width,
            height,
        })
    }
}

/// Which part of the page a screenshot covers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShotRegion {
    /// The visible viewport
    Viewport,
    /// The whole scrollable page
    FullPage,
    /// A fixed rectangle
    Clip(ClipRect),
}

/// Viewport size preset for common capture targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ViewportSize {
    /// 1280x720
    Compact,
    /// 1440x900 - Default, marketing screenshots
    Laptop,
    /// 1920x1080 - User guide screenshots
    FullHd,
    /// Custom dimensions
    Custom(u32, u32),
}

impl ViewportSize {
    /// Get the dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            ViewportSize::Compact => (1280, 720),
            ViewportSize::Laptop => (1440, 900),
            ViewportSize::FullHd => (1920, 1080),
            ViewportSize::Custom(w, h) => (*w, *h),
        }
    }

    /// Parse from string (e.g., "1440x900", "laptop", "fullhd")
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "compact" | "small" | "720p" => Some(ViewportSize::Compact),
            "laptop" | "default" | "standard" => Some(ViewportSize::Laptop),
            "fullhd" | "full-hd" | "1080p" | "hd" => Some(ViewportSize::FullHd),
            other => {
                let (w, h) = other.split_once('x')?;
                let w: u32 = w.parse().ok()?;
                let h: u32 = h.parse().ok()?;
                if w == 0 || h == 0 {
                    return None;
                }
                Some(ViewportSize::from_dimensions(w, h))
            }
        }
    }

    /// The preset with these dimensions, or `Custom`
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        Self::all_presets()
            .into_iter()
            .find(|p| p.dimensions() == (width, height))
            .unwrap_or(ViewportSize::Custom(width, height))
    }

    /// All named presets
    pub fn all_presets() -> Vec<ViewportSize> {
        vec![
            ViewportSize::Compact,
            ViewportSize::Laptop,
            ViewportSize::FullHd,
        ]
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        ViewportSize::Laptop
    }
}

impl fmt::Display for ViewportSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.dimensions();
        write!(f, "{}x{}", w, h)
    }
}

impl From<ViewportSize> for String {
    fn from(size: ViewportSize) -> Self {
        size.to_string()
    }
}

impl TryFrom<String> for ViewportSize {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ViewportSize::parse(&value).ok_or_else(|| {
            format!(
                "invalid viewport '{}', use compact, laptop, fullhd or WxH",
                value
            )
        })
    }
}

/// Result type for surface operations
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// Error types for surface operations
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    /// Could not reach or attach to the UI surface
    #[error("Connection error: {0}")]
    Connect(String),

    /// Element lookup failed (as opposed to finding nothing)
    #[error("Query error for '{selector}': {message}")]
    Query { selector: String, message: String },

    /// Click, select, type or key press failed
    #[error("Action error: {0}")]
    Action(String),

    /// Screenshot or crop failed
    #[error("Capture error: {0}")]
    Capture(String),

    /// A handle that the surface does not know about
    #[error("Stale element handle {0:?}")]
    StaleElement(ElementId),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for SurfaceError {
    fn from(err: image::ImageError) -> Self {
        SurfaceError::Capture(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_presets() {
        assert_eq!(ViewportSize::parse("laptop"), Some(ViewportSize::Laptop));
        assert_eq!(ViewportSize::parse("FullHD"), Some(ViewportSize::FullHd));
        assert_eq!(ViewportSize::Laptop.dimensions(), (1440, 900));
        assert_eq!(ViewportSize::FullHd.dimensions(), (1920, 1080));
    }

    #[test]
    fn test_viewport_custom() {
        assert_eq!(ViewportSize::parse("1024x768"), Some(ViewportSize::Custom(1024, 768)));
        assert_eq!(ViewportSize::parse("0x768"), None);
        assert_eq!(ViewportSize::parse("1024"), None);
        assert_eq!(ViewportSize::parse("wide"), None);
    }

    #[test]
    fn test_viewport_serde_as_string() {
        let json = serde_json::to_string(&ViewportSize::FullHd).unwrap();
        assert_eq!(json, "\"1920x1080\"");
        let parsed: ViewportSize = serde_json::from_str("\"laptop\"").unwrap();
        assert_eq!(parsed, ViewportSize::Laptop);
        assert!(serde_json::from_str::<ViewportSize>("\"huge\"").is_err());
    }

    #[test]
    fn test_viewport_serde_keeps_presets() {
        for size in ViewportSize::all_presets() {
            let json = serde_json::to_string(&size).unwrap();
            let back: ViewportSize = serde_json::from_str(&json).unwrap();
            assert_eq!(back, size, "{}", json);
        }
        assert_eq!(ViewportSize::parse("1920x1080"), Some(ViewportSize::FullHd));
        assert_eq!(ViewportSize::from_dimensions(1440, 900), ViewportSize::Laptop);

        let odd: ViewportSize = serde_json::from_str("\"1366x768\"").unwrap();
        assert_eq!(odd, ViewportSize::Custom(1366, 768));
        assert_eq!(serde_json::to_string(&odd).unwrap(), "\"1366x768\"");
    }

    #[test]
    fn test_clip_around_pads_and_clamps() {
        let bbox = BoundingBox {
            x: 10.0,
            y: 5.0,
            width: 100.0,
            height: 40.0,
        };
        let clip = ClipRect::around(&bbox, &Padding::uniform(20.0), None).unwrap();
        assert_eq!(clip, ClipRect::new(0.0, 0.0, 140.0, 80.0));
    }

    #[test]
    fn test_clip_around_caps_height() {
        let bbox = BoundingBox {
            x: 300.0,
            y: 400.0,
            width: 600.0,
            height: 500.0,
        };
        let padding = Padding {
            top: 10.0,
            right: 0.0,
            bottom: 10.0,
            left: 0.0,
        };
        let clip = ClipRect::around(&bbox, &padding, Some(200.0)).unwrap();
        assert_eq!(clip, ClipRect::new(300.0, 390.0, 600.0, 200.0));
    }

    #[test]
    fn test_clip_around_empty_box() {
        let bbox = BoundingBox {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        };
        assert!(ClipRect::around(&bbox, &Padding::none(), None).is_none());
    }

    #[test]
    fn test_text_match() {
        assert!(TextMatch::Contains("Settings".into()).matches("⚙ Settings"));
        assert!(TextMatch::Exact("Project".into()).matches("  Project "));
        assert!(!TextMatch::Exact("Project".into()).matches("Project scope"));
    }

    #[test]
    fn test_locator_display() {
        let locator = Locator::css("button").containing("Add Server").nth(1);
        assert_eq!(locator.to_string(), "button containing \"Add Server\" [#1]");
    }
}
