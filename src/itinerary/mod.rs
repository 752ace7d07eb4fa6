pub mod builtin;
pub mod types;

pub use builtin::{BUILTIN_NAMES, builtin};
pub use types::{
    Action, CaptureMode, CaptureSpec, CaptureStep, ConnectMode, HostSpec, IndexSection, IndexSpec,
    Itinerary, ItineraryError, ItineraryResult, ReadyMarker, Target,
};
