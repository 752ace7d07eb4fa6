pub mod backend;
pub mod cdp;
pub mod framebuffer;
pub mod mock;
pub mod types;

pub use backend::{Connector, UiSurface, WAIT_POLL_INTERVAL, wait_for};
pub use cdp::{CdpConnector, CdpSurface, CdpTarget};
pub use framebuffer::MockFramebuffer;
pub use mock::{MockApp, MockConnector, MockElement, MockEvent, MockJournal, MockSurface, demo_app};
pub use types::{
    BoundingBox, ClipRect, ElementId, Locator, Padding, ShotRegion, SurfaceError, SurfaceResult,
    TextMatch, ViewportSize,
};
