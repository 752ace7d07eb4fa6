//! Shotlist - itinerary-driven UI screenshot capture.
//!
//! This crate provides:
//! - A `UiSurface` abstraction with a Chrome DevTools Protocol backend and a
//!   scripted mock for offline runs
//! - Itineraries: ordered capture steps, loaded from JSON or built in
//! - A sequencer that runs steps in order, skipping what it cannot find
//! - Host process management and a run lifecycle with single cleanup
//! - Markdown index and JSON manifest generation
//!
//! # Example
//!
//! ```rust,no_run
//! use shotlist::itinerary::builtin;
//! use shotlist::output::OutputDir;
//! use shotlist::surface::{CdpConnector, CdpTarget};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let itinerary = builtin("userguide-complete")?;
//! let connector = CdpConnector::new(CdpTarget::local(9222));
//! let output = OutputDir::new("docs/userguide");
//! let report = shotlist::run(&itinerary, &connector, None, &output).await?;
//! println!("{} captured", report.captured());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod host;
pub mod index;
pub mod itinerary;
pub mod logging;
pub mod output;
pub mod runner;
pub mod sequencer;
pub mod surface;

// Re-export run lifecycle and report types
pub use runner::{RunError, RunReport, SkipReason, StepOutcome, StepReport, run};

// Re-export itinerary types
pub use itinerary::{CaptureStep, Itinerary, ItineraryError, builtin};

// Re-export surfaces
pub use surface::{
    CdpConnector, CdpTarget, Connector, MockConnector, MockFramebuffer, SurfaceError, UiSurface,
    ViewportSize,
};

pub use host::{HostConfig, HostError, HostProcess};
pub use output::OutputDir;
pub use sequencer::Sequencer;
