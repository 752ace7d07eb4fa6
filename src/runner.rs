//! Run lifecycle and report types.
//!
//! A run spawns the host (optionally), connects, waits for the ready marker,
//! hands the steps to the [`Sequencer`] and then cleans up exactly once.
//! Only connect and readiness problems abort a run; everything that goes
//! wrong inside a step is recorded in its [`StepReport`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::host::{HostConfig, HostError, HostProcess};
use crate::index;
use crate::itinerary::{Itinerary, ItineraryError};
use crate::output::OutputDir;
use crate::sequencer::Sequencer;
use crate::surface::{Connector, SurfaceError, UiSurface, ViewportSize, wait_for};

/// Why a step did not run to completion without being an error
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// No element matched the target before its wait ran out
    TargetMissing(String),
    /// The `<select>` has no option with this value
    OptionMissing(String),
    /// The step named in `after` did not succeed
    DependencySkipped(String),
    /// The step named in `unless` succeeded
    Superseded(String),
    /// The element has no box or the crop is empty
    EmptyCrop,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TargetMissing(t) => write!(f, "{} not found", t),
            SkipReason::OptionMissing(v) => write!(f, "no option '{}'", v),
            SkipReason::DependencySkipped(id) => write!(f, "'{}' did not succeed", id),
            SkipReason::Superseded(id) => write!(f, "'{}' already succeeded", id),
            SkipReason::EmptyCrop => write!(f, "nothing to crop"),
        }
    }
}

/// What happened to one step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Bitmap written
    Captured { path: PathBuf, bytes: u64 },
    /// Action done, nothing to capture
    Performed,
    Skipped { reason: SkipReason },
    Failed { error: String },
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Captured { .. } | StepOutcome::Performed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub outcome: StepOutcome,
    pub elapsed_ms: u64,
}

/// Result of a complete run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub itinerary: String,
    /// Connector description, e.g. `attach http://127.0.0.1:9222`
    pub source: String,
    pub output_dir: PathBuf,
    pub viewport: ViewportSize,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_pid: Option<u32>,
    pub steps: Vec<StepReport>,
}

impl RunReport {
    pub fn captured(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Captured { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Failed { .. }))
    }

    /// Paths of every bitmap written, in step order
    pub fn capture_paths(&self) -> Vec<&PathBuf> {
        self.steps
            .iter()
            .filter_map(|s| match &s.outcome {
                StepOutcome::Captured { path, .. } => Some(path),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&StepOutcome) -> bool) -> usize {
        self.steps.iter().filter(|s| pred(&s.outcome)).count()
    }
}

/// Errors that abort a run
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Itinerary(#[from] ItineraryError),

    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("Could not connect to the UI: {0}")]
    Connect(#[source] SurfaceError),

    #[error("UI not ready: '{selector}' did not appear within {timeout_ms}ms")]
    NotReady { selector: String, timeout_ms: u64 },

    #[error("Readiness probe failed: {0}")]
    Probe(#[source] SurfaceError),

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

/// Execute an itinerary end to end.
///
/// `host`, when given, is spawned before connecting and terminated during
/// cleanup. The surface is disconnected and the host stopped exactly once,
/// whichever way the run ends.
pub async fn run(
    itinerary: &Itinerary,
    connector: &dyn Connector,
    host: Option<&HostConfig>,
    output: &OutputDir,
) -> Result<RunReport, RunError> {
    itinerary.validate()?;
    output.init()?;

    let viewport = itinerary
        .viewport
        .unwrap_or(crate::config::get().defaults.viewport);
    let started = Utc::now();
    info!(
        "Running '{}' ({} steps) into {}",
        itinerary.name,
        itinerary.steps.len(),
        output.path().display()
    );

    let mut host = match host {
        Some(config) => Some(HostProcess::spawn(config).await?),
        None => None,
    };
    let host_pid = host.as_ref().and_then(HostProcess::pid);

    let mut surface = match connector.connect().await {
        Ok(surface) => surface,
        Err(e) => {
            stop_host(host.as_mut()).await;
            return Err(RunError::Connect(e));
        }
    };
    info!("Connected: {}", connector.describe());

    let result = drive(itinerary, surface.as_mut(), viewport, output).await;
    disconnect(surface.as_mut()).await;
    stop_host(host.as_mut()).await;
    let steps = result?;

    let report = RunReport {
        itinerary: itinerary.name.clone(),
        source: connector.describe(),
        output_dir: output.path().to_path_buf(),
        viewport,
        started,
        finished: Utc::now(),
        host_pid,
        steps,
    };

    if let Some(spec) = &itinerary.index {
        let entries = index::entries_for_run(itinerary, &report);
        let path = index::write_index(output, spec, &entries)?;
        info!("Index written to {}", path.display());
    }
    index::write_manifest(output, itinerary, &report)?;

    info!(
        "Done: {} captured, {} skipped, {} failed",
        report.captured(),
        report.skipped(),
        report.failed()
    );
    Ok(report)
}

/// Everything between connecting and cleanup
async fn drive(
    itinerary: &Itinerary,
    surface: &mut dyn UiSurface,
    viewport: ViewportSize,
    output: &OutputDir,
) -> Result<Vec<StepReport>, RunError> {
    if let Err(e) = surface.set_viewport(viewport).await {
        warn!("Could not set viewport to {}: {}", viewport, e);
    }

    let ready = &itinerary.ready;
    let marker = crate::surface::Locator::css(ready.selector.clone());
    let found = wait_for(surface, &marker, Duration::from_millis(ready.timeout_ms))
        .await
        .map_err(RunError::Probe)?;
    if found.is_none() {
        return Err(RunError::NotReady {
            selector: ready.selector.clone(),
            timeout_ms: ready.timeout_ms,
        });
    }
    info!("UI ready ('{}' present)", ready.selector);
    if ready.settle_ms > 0 {
        sleep(Duration::from_millis(ready.settle_ms)).await;
    }

    Ok(Sequencer::new(output)
        .viewport(viewport)
        .run(surface, &itinerary.steps)
        .await)
}

/// Cleanup failures are logged, never raised
async fn disconnect(surface: &mut dyn UiSurface) {
    match surface.disconnect().await {
        Ok(()) => debug!("disconnected from {}", surface.source_type()),
        Err(e) => warn!("Disconnect failed: {}", e),
    }
}

async fn stop_host(host: Option<&mut HostProcess>) {
    if let Some(host) = host {
        if let Err(e) = host.terminate().await {
            warn!("{}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itinerary::{Action, CaptureMode, CaptureStep, ReadyMarker};
    use crate::surface::{Locator, MockConnector, MockEvent, demo_app};
    use tempfile::TempDir;

    fn tiny(ready: &str, timeout_ms: u64) -> Itinerary {
        Itinerary {
            name: "tiny".into(),
            description: String::new(),
            viewport: Some(ViewportSize::FullHd),
            mode: Default::default(),
            host: None,
            output_dir: None,
            ready: ReadyMarker {
                selector: ready.into(),
                timeout_ms,
                settle_ms: 0,
            },
            steps: vec![
                CaptureStep::new("Landing").capture(
                    CaptureMode::Viewport,
                    "00-landing.png",
                    "Landing",
                ),
                CaptureStep::new("Get Started")
                    .target(Locator::css("button").containing("Get Started"))
                    .action(Action::Click),
            ],
            index: None,
        }
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(
            SkipReason::TargetMissing("button 'Save'".into()).to_string(),
            "button 'Save' not found"
        );
        assert_eq!(SkipReason::EmptyCrop.to_string(), "nothing to crop");
    }

    #[test]
    fn test_step_report_serializes_flat() {
        let report = StepReport {
            index: 2,
            label: "Select".into(),
            id: None,
            outcome: StepOutcome::Skipped {
                reason: SkipReason::OptionMissing("kiro".into()),
            },
            elapsed_ms: 5,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"]["kind"], "option_missing");
        assert!(json.get("id").is_none());
    }

    #[tokio::test]
    async fn test_run_writes_manifest() {
        let tmp = TempDir::new().unwrap();
        let out = OutputDir::new(tmp.path().join("out"));
        let connector = MockConnector::new(demo_app());

        let report = run(&tiny(".min-h-screen", 500), &connector, None, &out)
            .await
            .unwrap();
        assert_eq!(report.captured(), 1);
        assert_eq!(report.failed(), 0);
        assert!(out.path().join("00-landing.png").exists());
        assert!(out.path().join(index::MANIFEST_FILE).exists());
        assert_eq!(
            connector.journal().events().first(),
            Some(&MockEvent::Viewport(1920, 1080))
        );
    }

    #[tokio::test]
    async fn test_not_ready_still_disconnects() {
        let tmp = TempDir::new().unwrap();
        let out = OutputDir::new(tmp.path());
        let connector = MockConnector::new(demo_app());

        let err = run(&tiny("#never-rendered", 150), &connector, None, &out)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::NotReady { .. }));
        assert_eq!(connector.journal().count(|e| *e == MockEvent::Disconnect), 1);
        assert!(out.list_captures().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_itinerary_never_connects() {
        let tmp = TempDir::new().unwrap();
        let out = OutputDir::new(tmp.path());
        let connector = MockConnector::new(demo_app());
        let mut itinerary = tiny("body", 100);
        itinerary.steps.clear();

        let err = run(&itinerary, &connector, None, &out).await.unwrap_err();
        assert!(matches!(err, RunError::Itinerary(_)));
        assert!(connector.journal().events().is_empty());
    }
}
