//! Executes capture steps strictly in order.
//!
//! Step-level problems never stop the sequence: a missing element, a missing
//! `<select>` option or an empty crop skips the step, and any surface or
//! filesystem error fails it. Both are logged and the next step runs.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::itinerary::{Action, CaptureMode, CaptureStep, Target};
use crate::output::OutputDir;
use crate::runner::{SkipReason, StepOutcome, StepReport};
use crate::surface::{
    ClipRect, ElementId, ShotRegion, SurfaceError, SurfaceResult, UiSurface, ViewportSize,
    WAIT_POLL_INTERVAL,
};

/// Runs a list of steps against one surface, writing captures to `output`
pub struct Sequencer<'a> {
    output: &'a OutputDir,
    viewport: ViewportSize,
}

impl<'a> Sequencer<'a> {
    pub fn new(output: &'a OutputDir) -> Self {
        Self {
            output,
            viewport: ViewportSize::default(),
        }
    }

    /// Viewport the surface was set to; used for full-width crops
    pub fn viewport(mut self, size: ViewportSize) -> Self {
        self.viewport = size;
        self
    }

    /// Execute every step in order. Never fails as a whole.
    pub async fn run(&self, surface: &mut dyn UiSurface, steps: &[CaptureStep]) -> Vec<StepReport> {
        let mut succeeded: HashMap<&str, bool> = HashMap::new();
        let mut reports = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().enumerate() {
            let started = Instant::now();
            let outcome = match gate(step, &succeeded) {
                Some(reason) => StepOutcome::Skipped { reason },
                None => match self.execute(surface, step).await {
                    Ok(outcome) => outcome,
                    Err(e) => StepOutcome::Failed {
                        error: e.to_string(),
                    },
                },
            };

            log_outcome(index, step, &outcome);
            if let Some(id) = &step.id {
                succeeded.insert(id.as_str(), outcome.is_success());
            }

            reports.push(StepReport {
                index,
                label: step.label.clone(),
                id: step.id.clone(),
                outcome,
                elapsed_ms: started.elapsed().as_millis() as u64,
            });
        }

        reports
    }

    async fn execute(
        &self,
        surface: &mut dyn UiSurface,
        step: &CaptureStep,
    ) -> SurfaceResult<StepOutcome> {
        let element = match &step.target {
            None => None,
            Some(target) => {
                let timeout = match step.action {
                    Action::WaitFor { timeout_ms } => timeout_ms,
                    _ => step.wait_ms,
                };
                match locate(surface, target, Duration::from_millis(timeout)).await? {
                    Some(id) => Some(id),
                    None => {
                        return Ok(StepOutcome::Skipped {
                            reason: SkipReason::TargetMissing(target.describe()),
                        });
                    }
                }
            }
        };

        match &step.action {
            Action::None | Action::WaitFor { .. } | Action::Pause => {}
            Action::Click => surface.click(required(element, &step.action)?).await?,
            Action::Select { value } => {
                let id = required(element, &step.action)?;
                if !surface.select_option(id, value).await? {
                    return Ok(StepOutcome::Skipped {
                        reason: SkipReason::OptionMissing(value.clone()),
                    });
                }
            }
            Action::Type { text } => {
                surface
                    .type_text(required(element, &step.action)?, text)
                    .await?
            }
            Action::Fill { text } => surface.fill(required(element, &step.action)?, text).await?,
            Action::Press { key } => surface.press_key(element, key).await?,
        }

        if step.settle_ms > 0 {
            sleep(Duration::from_millis(step.settle_ms)).await;
        }

        let Some(capture) = &step.capture else {
            return Ok(StepOutcome::Performed);
        };

        let region = match &capture.mode {
            CaptureMode::Viewport => ShotRegion::Viewport,
            CaptureMode::FullPage => ShotRegion::FullPage,
            CaptureMode::Region { clip } => ShotRegion::Clip(*clip),
            CaptureMode::Element {
                padding,
                max_height,
                max_width,
                span_viewport,
            } => {
                let id = element.ok_or_else(|| {
                    SurfaceError::Capture("element capture without a target".into())
                })?;
                let Some(bbox) = surface.bounding_box(id).await? else {
                    return Ok(StepOutcome::Skipped {
                        reason: SkipReason::EmptyCrop,
                    });
                };
                let Some(mut clip) = ClipRect::around(&bbox, padding, *max_height) else {
                    return Ok(StepOutcome::Skipped {
                        reason: SkipReason::EmptyCrop,
                    });
                };
                if let Some(cap) = max_width {
                    clip.width = clip.width.min(*cap);
                }
                if *span_viewport {
                    clip.x = 0.0;
                    clip.width = self.viewport.dimensions().0 as f64;
                }
                debug!("crop {:?} from {:?}", clip, bbox);
                ShotRegion::Clip(clip)
            }
        };

        let png = surface.screenshot(region).await?;
        let path = self.output.write(&capture.file, &png)?;
        let bytes = std::fs::metadata(&path)?.len();
        debug!("Verification: {} exists ({} bytes)", path.display(), bytes);

        Ok(StepOutcome::Captured { path, bytes })
    }
}

/// Decide from earlier outcomes whether a step may run at all
fn gate(step: &CaptureStep, succeeded: &HashMap<&str, bool>) -> Option<SkipReason> {
    if let Some(dep) = &step.after {
        if succeeded.get(dep.as_str()) != Some(&true) {
            return Some(SkipReason::DependencySkipped(dep.clone()));
        }
    }
    if let Some(dep) = &step.unless {
        if succeeded.get(dep.as_str()) == Some(&true) {
            return Some(SkipReason::Superseded(dep.clone()));
        }
    }
    None
}

/// Poll every locator of a target until one resolves or `timeout` passes
async fn locate(
    surface: &mut dyn UiSurface,
    target: &Target,
    timeout: Duration,
) -> SurfaceResult<Option<ElementId>> {
    let start = Instant::now();
    loop {
        for locator in target.locators() {
            if let Some(id) = surface.query(locator).await? {
                return Ok(Some(id));
            }
        }
        if start.elapsed() >= timeout {
            return Ok(None);
        }
        sleep(WAIT_POLL_INTERVAL).await;
    }
}

fn required(element: Option<ElementId>, action: &Action) -> SurfaceResult<ElementId> {
    element.ok_or_else(|| SurfaceError::Action(format!("'{}' needs a target", action.name())))
}

fn log_outcome(index: usize, step: &CaptureStep, outcome: &StepOutcome) {
    match outcome {
        StepOutcome::Captured { path, bytes } => {
            info!("[{}] Captured {} -> {} ({} bytes)", index, step.label, path.display(), bytes)
        }
        StepOutcome::Performed => info!("[{}] {}", index, step.label),
        StepOutcome::Skipped { reason } => warn!("[{}] Skipped {}: {}", index, step.label, reason),
        StepOutcome::Failed { error } => warn!("[{}] Failed {}: {}", index, step.label, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Locator, MockEvent, MockFramebuffer, MockJournal, MockSurface, demo_app};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    async fn main_screen() -> (MockSurface, MockJournal) {
        let journal = MockJournal::new();
        let mut surface = MockSurface::new(demo_app(), journal.clone());
        let id = surface
            .query(&Locator::css("button").containing("Get Started"))
            .await
            .unwrap()
            .unwrap();
        surface.click(id).await.unwrap();
        (surface, journal)
    }

    #[tokio::test]
    async fn test_missing_target_skips_and_continues() {
        let tmp = TempDir::new().unwrap();
        let out = OutputDir::new(tmp.path());
        let (mut surface, _) = main_screen().await;

        let steps = vec![
            CaptureStep::new("Nothing here")
                .target(Locator::css("button").containing("Does Not Exist"))
                .action(Action::Click)
                .capture(CaptureMode::Viewport, "never.png", ""),
            CaptureStep::new("Main").capture(CaptureMode::Viewport, "main.png", ""),
        ];
        let reports = Sequencer::new(&out).run(&mut surface, &steps).await;

        assert!(matches!(
            reports[0].outcome,
            StepOutcome::Skipped {
                reason: SkipReason::TargetMissing(_)
            }
        ));
        assert!(matches!(reports[1].outcome, StepOutcome::Captured { .. }));
        assert!(!tmp.path().join("never.png").exists());
        assert!(tmp.path().join("main.png").exists());
    }

    #[tokio::test]
    async fn test_dependency_chain() {
        let tmp = TempDir::new().unwrap();
        let out = OutputDir::new(tmp.path());
        let app = demo_app().without_option("select", "kiro");
        let mut surface = MockSurface::new(app, MockJournal::new());

        let steps = vec![
            CaptureStep::new("Get Started")
                .target(Locator::css("button").containing("Get Started"))
                .action(Action::Click),
            CaptureStep::new("Select Kiro")
                .id("kiro")
                .target(Locator::css("select"))
                .action(Action::Select {
                    value: "kiro".into(),
                }),
            CaptureStep::new("Project scope")
                .target(Locator::css("button.btn-sm").exact("Project"))
                .action(Action::Click)
                .capture(CaptureMode::Viewport, "project.png", "")
                .after("kiro"),
            CaptureStep::new("Fallback")
                .capture(CaptureMode::Viewport, "fallback.png", "")
                .unless("kiro"),
        ];
        let reports = Sequencer::new(&out).run(&mut surface, &steps).await;

        assert_eq!(
            reports[1].outcome,
            StepOutcome::Skipped {
                reason: SkipReason::OptionMissing("kiro".into())
            }
        );
        assert_eq!(
            reports[2].outcome,
            StepOutcome::Skipped {
                reason: SkipReason::DependencySkipped("kiro".into())
            }
        );
        assert!(matches!(reports[3].outcome, StepOutcome::Captured { .. }));
    }

    #[tokio::test]
    async fn test_action_failure_is_step_level() {
        let tmp = TempDir::new().unwrap();
        let out = OutputDir::new(tmp.path());
        let app = demo_app().fail_on("button.btn-primary");
        let mut surface = MockSurface::new(app, MockJournal::new());

        let steps = vec![
            CaptureStep::new("Broken click")
                .id("broken")
                .target(Locator::css("button.btn-primary"))
                .action(Action::Click),
            CaptureStep::new("Landing").capture(CaptureMode::Viewport, "landing.png", ""),
            // a failed step counts as not succeeded
            CaptureStep::new("Fallback")
                .capture(CaptureMode::Viewport, "fallback.png", "")
                .unless("broken"),
        ];
        let reports = Sequencer::new(&out).run(&mut surface, &steps).await;

        assert!(matches!(reports[0].outcome, StepOutcome::Failed { .. }));
        assert!(reports[1].outcome.is_success());
        assert!(matches!(reports[2].outcome, StepOutcome::Captured { .. }));
    }

    #[tokio::test]
    async fn test_element_crop_dimensions() {
        let tmp = TempDir::new().unwrap();
        let out = OutputDir::new(tmp.path());
        let (mut surface, _) = main_screen().await;
        surface.set_viewport(ViewportSize::FullHd).await.unwrap();

        let steps = vec![
            CaptureStep::new("Dropdown")
                .target(Locator::css("select"))
                .capture(CaptureMode::element(20.0), "dropdown.png", ""),
            CaptureStep::new("Status bar")
                .target(Locator::css(".text-xs.text-gray-500"))
                .capture(
                    CaptureMode::Element {
                        padding: crate::surface::Padding {
                            top: 10.0,
                            right: 0.0,
                            bottom: 10.0,
                            left: 0.0,
                        },
                        max_height: None,
                        max_width: None,
                        span_viewport: true,
                    },
                    "status.png",
                    "",
                ),
        ];
        let reports = Sequencer::new(&out)
            .viewport(ViewportSize::FullHd)
            .run(&mut surface, &steps)
            .await;
        assert!(reports.iter().all(|r| r.outcome.is_success()));

        // select is 320x44 at (40, 90)
        let dropdown = std::fs::read(tmp.path().join("dropdown.png")).unwrap();
        let dropdown = MockFramebuffer::from_png_bytes(&dropdown).unwrap();
        assert_eq!((dropdown.width(), dropdown.height()), (360, 84));

        let status = std::fs::read(tmp.path().join("status.png")).unwrap();
        let status = MockFramebuffer::from_png_bytes(&status).unwrap();
        assert_eq!((status.width(), status.height()), (1920, 40));
    }

    #[tokio::test]
    async fn test_press_without_target_goes_to_document() {
        let tmp = TempDir::new().unwrap();
        let out = OutputDir::new(tmp.path());
        let (mut surface, journal) = main_screen().await;

        let steps = vec![
            CaptureStep::new("Settings")
                .target(Locator::css("button").containing("Settings"))
                .action(Action::Click),
            CaptureStep::new("Escape").action(Action::Press {
                key: "Escape".into(),
            }),
        ];
        Sequencer::new(&out).run(&mut surface, &steps).await;

        assert_eq!(surface.screen(), "main");
        assert!(journal.events().contains(&MockEvent::Press("Escape".into())));
    }
}
