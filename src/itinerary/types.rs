use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Component, Path};

use crate::surface::{ClipRect, Locator, Padding, ViewportSize};

/// What a step points at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// A single locator
    Element(Locator),

    /// Try each locator in order and use the first that resolves
    FirstOf(Vec<Locator>),
}

impl Target {
    /// The locators to try, in order
    pub fn locators(&self) -> &[Locator] {
        match self {
            Target::Element(locator) => std::slice::from_ref(locator),
            Target::FirstOf(locators) => locators,
        }
    }

    /// Short description for logs
    pub fn describe(&self) -> String {
        self.locators()
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl From<Locator> for Target {
    fn from(locator: Locator) -> Self {
        Target::Element(locator)
    }
}

/// Represents the interaction performed on a step's target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Nothing; the step only checks presence and/or captures
    #[default]
    None,

    /// Click the target
    Click,

    /// Choose an option of a `<select>` by value
    Select { value: String },

    /// Send keystrokes to the target
    Type { text: String },

    /// Replace the target's value and fire an `input` event
    Fill { text: String },

    /// Press a key on the target, or on the document without one
    Press { key: String },

    /// Poll until the target exists
    WaitFor { timeout_ms: u64 },

    /// Only wait the settle delay
    Pause,
}

impl Action {
    /// Whether this action cannot run without a target element
    pub fn needs_target(&self) -> bool {
        matches!(
            self,
            Action::Click
                | Action::Select { .. }
                | Action::Type { .. }
                | Action::Fill { .. }
                | Action::WaitFor { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::None => "none",
            Action::Click => "click",
            Action::Select { .. } => "select",
            Action::Type { .. } => "type",
            Action::Fill { .. } => "fill",
            Action::Press { .. } => "press",
            Action::WaitFor { .. } => "wait_for",
            Action::Pause => "pause",
        }
    }
}

/// Which pixels a capture covers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaptureMode {
    /// The visible viewport
    Viewport,

    /// The whole scrollable page
    FullPage,

    /// A fixed rectangle
    Region { clip: ClipRect },

    /// A crop around the step's target element
    Element {
        #[serde(default)]
        padding: Padding,

        /// Cap on the crop height
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_height: Option<f64>,

        /// Cap on the crop width
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_width: Option<f64>,

        /// Stretch the crop across the full viewport width
        #[serde(default)]
        span_viewport: bool,
    },
}

impl CaptureMode {
    /// Element crop with uniform padding
    pub fn element(padding: f64) -> Self {
        CaptureMode::Element {
            padding: Padding::uniform(padding),
            max_height: None,
            max_width: None,
            span_viewport: false,
        }
    }

    /// Fixed region capture
    pub fn region(x: f64, y: f64, width: f64, height: f64) -> Self {
        CaptureMode::Region {
            clip: ClipRect::new(x, y, width, height),
        }
    }
}

/// Where and how a step's bitmap is written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureSpec {
    pub mode: CaptureMode,

    /// File name relative to the output directory
    pub file: String,

    /// One-line description used in logs and the generated index
    #[serde(default)]
    pub description: String,
}

/// One itinerary entry: locate, act, settle, capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureStep {
    /// Identifier other steps can depend on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Name shown in logs
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,

    #[serde(default)]
    pub action: Action,

    /// Pause after the action, before capturing
    #[serde(default)]
    pub settle_ms: u64,

    /// How long the target lookup may wait for the element
    #[serde(default)]
    pub wait_ms: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture: Option<CaptureSpec>,

    /// Run only if this earlier step succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,

    /// Run only if this earlier step did not succeed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unless: Option<String>,
}

impl CaptureStep {
    /// A step with only a label; use the builder methods to fill it in
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: None,
            label: label.into(),
            target: None,
            action: Action::None,
            settle_ms: 0,
            wait_ms: 0,
            capture: None,
            after: None,
            unless: None,
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn target(mut self, target: impl Into<Target>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    pub fn settle(mut self, ms: u64) -> Self {
        self.settle_ms = ms;
        self
    }

    pub fn wait(mut self, ms: u64) -> Self {
        self.wait_ms = ms;
        self
    }

    pub fn capture(
        mut self,
        mode: CaptureMode,
        file: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.capture = Some(CaptureSpec {
            mode,
            file: file.into(),
            description: description.into(),
        });
        self
    }

    pub fn after(mut self, id: impl Into<String>) -> Self {
        self.after = Some(id.into());
        self
    }

    pub fn unless(mut self, id: impl Into<String>) -> Self {
        self.unless = Some(id.into());
        self
    }
}

/// Selector whose appearance means the application has finished loading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyMarker {
    pub selector: String,

    #[serde(default = "default_ready_timeout")]
    pub timeout_ms: u64,

    /// Extra pause once the marker is present
    #[serde(default)]
    pub settle_ms: u64,
}

fn default_ready_timeout() -> u64 {
    crate::config::get().defaults.ready_timeout_ms
}

impl Default for ReadyMarker {
    fn default() -> Self {
        Self {
            selector: "body".to_string(),
            timeout_ms: default_ready_timeout(),
            settle_ms: 0,
        }
    }
}

/// How an itinerary expects to reach its UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectMode {
    /// Attach to an already running host on the debug port
    #[default]
    Attach,
    /// Spawn the host, then attach
    Spawn,
    /// Launch a browser at the web-preview URL
    Web,
}

/// Command line used to start the UI host in spawn mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSpec {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory for the host (defaults to the current one)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,

    /// `pkill -f` pattern for stale instances killed before spawning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kill_pattern: Option<String>,
}

/// Heading for one numeric-prefix group in the generated index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSection {
    /// File-name prefix such as "03"
    pub prefix: String,
    pub heading: String,
}

/// Description of the markdown index written after a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    #[serde(default = "default_index_file")]
    pub file: String,

    pub title: String,

    #[serde(default)]
    pub sections: Vec<IndexSection>,
}

fn default_index_file() -> String {
    "README.md".to_string()
}

/// A named, ordered list of capture steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Viewport to apply after connecting (`None` uses the configured default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<ViewportSize>,

    #[serde(default)]
    pub mode: ConnectMode,

    /// Host command for spawn mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<HostSpec>,

    /// Output directory used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,

    #[serde(default)]
    pub ready: ReadyMarker,

    pub steps: Vec<CaptureStep>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexSpec>,
}

impl Itinerary {
    /// Load an itinerary from a JSON file and validate it
    pub fn from_file(path: impl AsRef<Path>) -> ItineraryResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let itinerary: Itinerary =
            serde_json::from_str(&text).map_err(|e| ItineraryError::Parse {
                path: path.display().to_string(),
                source: e,
            })?;
        itinerary.validate()?;
        Ok(itinerary)
    }

    /// All capture file names, in step order
    pub fn capture_files(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter_map(|s| s.capture.as_ref().map(|c| c.file.as_str()))
            .collect()
    }

    /// Drop settle delays and element waits, for surfaces that render
    /// synchronously. The ready marker keeps its timeout.
    pub fn without_delays(mut self) -> Self {
        self.ready.settle_ms = 0;
        for step in &mut self.steps {
            step.settle_ms = 0;
            step.wait_ms = 0;
            if let Action::WaitFor { timeout_ms } = &mut step.action {
                *timeout_ms = 0;
            }
        }
        self
    }

    /// Check structural rules that would otherwise surface mid-run
    pub fn validate(&self) -> ItineraryResult<()> {
        if self.steps.is_empty() {
            return Err(self.invalid("itinerary has no steps"));
        }
        if self.ready.selector.trim().is_empty() {
            return Err(self.invalid("ready marker selector is empty"));
        }

        let mut seen_ids: HashSet<&str> = HashSet::new();
        let mut seen_files: HashSet<&str> = HashSet::new();

        for (i, step) in self.steps.iter().enumerate() {
            let at = |msg: String| self.invalid(format!("step {} ({}): {}", i, step.label, msg));

            for dep in [&step.after, &step.unless].into_iter().flatten() {
                if !seen_ids.contains(dep.as_str()) {
                    return Err(at(format!("depends on unknown or later step '{}'", dep)));
                }
            }

            if step.action.needs_target() && step.target.is_none() {
                return Err(at(format!("action '{}' needs a target", step.action.name())));
            }

            if let Some(Target::FirstOf(list)) = &step.target {
                if list.is_empty() {
                    return Err(at("first_of target has no locators".to_string()));
                }
            }

            if let Some(capture) = &step.capture {
                if matches!(capture.mode, CaptureMode::Element { .. }) && step.target.is_none() {
                    return Err(at("element capture needs a target".to_string()));
                }
                check_file_name(&capture.file).map_err(at)?;
                if !seen_files.insert(capture.file.as_str()) {
                    return Err(at(format!("capture file '{}' is used twice", capture.file)));
                }
            }

            if let Some(id) = &step.id {
                if !seen_ids.insert(id.as_str()) {
                    return Err(at(format!("duplicate step id '{}'", id)));
                }
            }
        }

        if let Some(index) = &self.index {
            check_output_name(&index.file, ".md").map_err(|msg| self.invalid(msg))?;
            if seen_files.contains(index.file.as_str()) {
                return Err(self.invalid(format!("index file '{}' is also a capture", index.file)));
            }
        }

        Ok(())
    }

    fn invalid(&self, msg: impl Into<String>) -> ItineraryError {
        ItineraryError::Invalid {
            name: self.name.clone(),
            message: msg.into(),
        }
    }
}

fn check_file_name(file: &str) -> Result<(), String> {
    check_output_name(file, ".png")
}

/// Output files must stay inside the output directory
fn check_output_name(file: &str, extension: &str) -> Result<(), String> {
    let path = Path::new(file);
    if !file.ends_with(extension) {
        return Err(format!("output file '{}' must end in {}", file, extension));
    }
    if path.components().any(|c| !matches!(c, Component::Normal(_))) {
        return Err(format!("output file '{}' must be a plain relative path", file));
    }
    Ok(())
}

/// Result type for itinerary operations
pub type ItineraryResult<T> = Result<T, ItineraryError>;

/// Error types for itinerary loading and validation
#[derive(Debug, thiserror::Error)]
pub enum ItineraryError {
    #[error("Invalid itinerary '{name}': {message}")]
    Invalid { name: String, message: String },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown built-in itinerary '{0}'")]
    UnknownBuiltin(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn itinerary(steps: Vec<CaptureStep>) -> Itinerary {
        Itinerary {
            name: "test".into(),
            description: String::new(),
            viewport: None,
            mode: ConnectMode::Attach,
            host: None,
            output_dir: None,
            ready: ReadyMarker::default(),
            steps,
            index: None,
        }
    }

    #[test]
    fn test_validate_accepts_dependency_chain() {
        let it = itinerary(vec![
            CaptureStep::new("select kiro")
                .id("kiro")
                .target(Locator::css("select"))
                .action(Action::Select { value: "kiro".into() }),
            CaptureStep::new("project scope")
                .target(Locator::css("button.btn-sm").exact("Project"))
                .action(Action::Click)
                .capture(CaptureMode::Viewport, "project.png", "Project scope")
                .after("kiro"),
        ]);
        assert!(it.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_forward_dependency() {
        let it = itinerary(vec![
            CaptureStep::new("first").after("second"),
            CaptureStep::new("second").id("second"),
        ]);
        let err = it.validate().unwrap_err().to_string();
        assert!(err.contains("unknown or later step 'second'"), "{}", err);
    }

    #[test]
    fn test_validate_rejects_duplicate_files() {
        let it = itinerary(vec![
            CaptureStep::new("a").capture(CaptureMode::Viewport, "same.png", ""),
            CaptureStep::new("b").capture(CaptureMode::FullPage, "same.png", ""),
        ]);
        assert!(it.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_escaping_paths() {
        let it = itinerary(vec![
            CaptureStep::new("a").capture(CaptureMode::Viewport, "../outside.png", ""),
        ]);
        assert!(it.validate().is_err());

        let it = itinerary(vec![
            CaptureStep::new("a").capture(CaptureMode::Viewport, "shot.jpg", ""),
        ]);
        assert!(it.validate().is_err());
    }

    #[test]
    fn test_validate_checks_index_file() {
        let mut it = itinerary(vec![
            CaptureStep::new("a").capture(CaptureMode::Viewport, "shot.png", ""),
        ]);
        let index = |file: &str| IndexSpec {
            file: file.into(),
            title: "Shots".into(),
            sections: Vec::new(),
        };

        it.index = Some(index("README.md"));
        assert!(it.validate().is_ok());

        for bad in ["../README.md", "/tmp/README.md", "README.txt", "shot.png"] {
            it.index = Some(index(bad));
            assert!(it.validate().is_err(), "{} accepted", bad);
        }
    }

    #[test]
    fn test_without_delays_clears_waits() {
        let it = itinerary(vec![
            CaptureStep::new("wait")
                .target(Locator::css("select"))
                .action(Action::WaitFor { timeout_ms: 5000 })
                .settle(1500),
            CaptureStep::new("lookup")
                .target(Locator::css("select"))
                .wait(5000)
                .action(Action::Click),
        ]);
        let it = Itinerary {
            ready: ReadyMarker {
                selector: "body".into(),
                timeout_ms: 10_000,
                settle_ms: 2000,
            },
            ..it
        }
        .without_delays();

        assert_eq!(it.steps[0].action, Action::WaitFor { timeout_ms: 0 });
        assert_eq!(it.steps[0].settle_ms, 0);
        assert_eq!(it.steps[1].wait_ms, 0);
        assert_eq!(it.ready.settle_ms, 0);
        assert_eq!(it.ready.timeout_ms, 10_000);
    }

    #[test]
    fn test_validate_requires_targets() {
        let it = itinerary(vec![CaptureStep::new("click nothing").action(Action::Click)]);
        assert!(it.validate().is_err());

        let it = itinerary(vec![
            CaptureStep::new("crop nothing").capture(CaptureMode::element(20.0), "crop.png", ""),
        ]);
        assert!(it.validate().is_err());
    }

    #[test]
    fn test_parse_json_itinerary() {
        let json = r#"{
            "name": "settings",
            "viewport": "1920x1080",
            "ready": { "selector": ".min-h-screen", "timeout_ms": 10000, "settle_ms": 2000 },
            "steps": [
                {
                    "id": "settings",
                    "label": "Open settings",
                    "target": { "element": { "selector": "button", "text": { "contains": "Settings" } } },
                    "action": { "kind": "click" },
                    "settle_ms": 2000,
                    "capture": {
                        "mode": { "kind": "region", "clip": { "x": 200, "y": 100, "width": 1520, "height": 800 } },
                        "file": "settings-client-management.png"
                    }
                },
                {
                    "label": "Close",
                    "action": { "kind": "press", "key": "Escape" },
                    "after": "settings"
                }
            ]
        }"#;

        let it: Itinerary = serde_json::from_str(json).unwrap();
        it.validate().unwrap();
        assert_eq!(it.viewport, Some(ViewportSize::FullHd));
        assert_eq!(it.mode, ConnectMode::Attach);
        assert_eq!(
            it.steps[0].target,
            Some(Target::Element(Locator::css("button").containing("Settings")))
        );
        assert_eq!(
            it.steps[0].capture.as_ref().unwrap().mode,
            CaptureMode::region(200.0, 100.0, 1520.0, 800.0)
        );
        assert_eq!(it.steps[1].action, Action::Press { key: "Escape".into() });
        assert_eq!(it.capture_files(), vec!["settings-client-management.png"]);
    }
}
