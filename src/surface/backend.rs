//! Surface abstraction for driving and capturing a rendered UI.
//!
//! This module provides a unified interface for different automation targets:
//! - Chrome DevTools Protocol pages (Electron hosts and web-preview builds)
//! - MockSurface (scripted in-memory UI for offline runs and testing)

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::debug;

use super::types::{BoundingBox, ElementId, Locator, ShotRegion, SurfaceResult, ViewportSize};

/// Poll interval used while waiting for an element to appear
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Trait for UI surfaces
///
/// A surface is one live connection to a rendered UI. Implementations only
/// expose primitives; sequencing and error policy live in the sequencer.
#[async_trait]
pub trait UiSurface: Send {
    /// Resize the rendering viewport
    async fn set_viewport(&mut self, size: ViewportSize) -> SurfaceResult<()>;

    /// Resolve a locator. `Ok(None)` means the element is not present.
    async fn query(&mut self, locator: &Locator) -> SurfaceResult<Option<ElementId>>;

    /// Click an element
    async fn click(&mut self, element: ElementId) -> SurfaceResult<()>;

    /// Choose an `<option>` of a `<select>` by value.
    /// Returns `false` if no option carries that value.
    async fn select_option(&mut self, element: ElementId, value: &str) -> SurfaceResult<bool>;

    /// Send keystrokes to an element
    async fn type_text(&mut self, element: ElementId, text: &str) -> SurfaceResult<()>;

    /// Replace an input's value and notify listeners
    async fn fill(&mut self, element: ElementId, text: &str) -> SurfaceResult<()>;

    /// Press a named key, on an element or on the document when `None`
    async fn press_key(&mut self, element: Option<ElementId>, key: &str) -> SurfaceResult<()>;

    /// Measure an element. `Ok(None)` if it has no layout box.
    async fn bounding_box(&mut self, element: ElementId) -> SurfaceResult<Option<BoundingBox>>;

    /// Capture a PNG of the given region
    async fn screenshot(&mut self, region: ShotRegion) -> SurfaceResult<Vec<u8>>;

    /// Release the connection. Safe to call more than once.
    async fn disconnect(&mut self) -> SurfaceResult<()>;

    /// Get the source type identifier (e.g., "cdp", "mock")
    fn source_type(&self) -> &str;
}

/// Opens surfaces. Split from `UiSurface` so a run can own the connect step.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to the UI and return a ready-to-drive surface
    async fn connect(&self) -> SurfaceResult<Box<dyn UiSurface>>;

    /// Human-readable description of where this connector points
    fn describe(&self) -> String;
}

/// Poll for a locator until it resolves or `timeout` elapses.
///
/// A zero timeout performs exactly one query.
pub async fn wait_for(
    surface: &mut dyn UiSurface,
    locator: &Locator,
    timeout: Duration,
) -> SurfaceResult<Option<ElementId>> {
    let start = Instant::now();
    loop {
        if let Some(id) = surface.query(locator).await? {
            debug!(
                "found '{}' after {}ms",
                locator,
                start.elapsed().as_millis()
            );
            return Ok(Some(id));
        }
        if start.elapsed() >= timeout {
            return Ok(None);
        }
        tokio::time::sleep(WAIT_POLL_INTERVAL.min(timeout)).await;
    }
}
