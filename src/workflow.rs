//! Page automation contract
//!
//! Automation is a finite list of typed [`Step`]s handed to a
//! [`PageDriver`]. The only thing a driver gives back to the parser is an
//! [`ExtractedPage`]; tab and browser lifecycles stay on the driver's side.
//!
//! [`WorkflowRunner`] visits kits one at a time, sleeping a randomized
//! backoff between page loads, and stores every capture it makes.

use crate::config::AppConfig;
use crate::error::{PedigraphError, PedigraphResult};
use crate::model::{ExtractedPage, ProfileRecord, SegmentIndex};
use crate::session::{Capture, CaptureStatus, Session};
use crate::storage::CaptureStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Selector for the element holding the pedigree chart
pub const CHART_SELECTOR: &str = "section.response-items pre";

/// Default wait for a page-complete signal
pub const DEFAULT_READY_TIMEOUT_MS: u64 = 30_000;

/// Errors reported by a page driver
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timed out after {timeout_ms} ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("Page closed")]
    Closed,

    #[error("Action failed: {0}")]
    ActionFailed(String),
}

/// One automation step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Open a page
    Navigate { url: String },
    /// Wait for the page-complete signal, failing after the timeout
    AwaitReady { timeout_ms: u64 },
    Click { target: String },
    FillField { target: String, value: String },
    /// Snapshot the text, HTML and anchors under `target`
    Extract { target: String },
    Close,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Navigate { .. } => "navigate",
            Step::AwaitReady { .. } => "await_ready",
            Step::Click { .. } => "click",
            Step::FillField { .. } => "fill_field",
            Step::Extract { .. } => "extract",
            Step::Close => "close",
        }
    }
}

/// What a driver returns for a step
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutput {
    Done,
    Page(ExtractedPage),
}

/// External collaborator that drives a real page
pub trait PageDriver {
    fn perform(&mut self, step: &Step) -> Result<StepOutput, DriverError>;

    /// Wait between page loads
    fn pause(&mut self, delay: Duration);
}

/// A named sequence of steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Workflow {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    /// Open a kit's tree page and snapshot the chart
    pub fn tree_capture(tree_url: &str) -> Self {
        Self::new(
            "tree_capture",
            vec![
                Step::Navigate {
                    url: tree_url.to_string(),
                },
                Step::AwaitReady {
                    timeout_ms: DEFAULT_READY_TIMEOUT_MS,
                },
                Step::Extract {
                    target: CHART_SELECTOR.to_string(),
                },
                Step::Close,
            ],
        )
    }

    /// One-to-one segment comparison between two kits
    pub fn segment_report(form_url: &str, kit: &str, matched_kit: &str) -> Self {
        Self::new(
            "segment_report",
            vec![
                Step::Navigate {
                    url: form_url.to_string(),
                },
                Step::AwaitReady {
                    timeout_ms: DEFAULT_READY_TIMEOUT_MS,
                },
                Step::FillField {
                    target: "kit1".to_string(),
                    value: kit.to_string(),
                },
                Step::FillField {
                    target: "kit2".to_string(),
                    value: matched_kit.to_string(),
                },
                Step::Click {
                    target: "submit".to_string(),
                },
                Step::AwaitReady {
                    timeout_ms: DEFAULT_READY_TIMEOUT_MS,
                },
                Step::Extract {
                    target: "table".to_string(),
                },
                Step::Close,
            ],
        )
    }

    /// Kinship report for one kit
    pub fn kinship_report(form_url: &str, kit: &str) -> Self {
        Self::new(
            "kinship_report",
            vec![
                Step::Navigate {
                    url: form_url.to_string(),
                },
                Step::AwaitReady {
                    timeout_ms: DEFAULT_READY_TIMEOUT_MS,
                },
                Step::FillField {
                    target: "kit_num".to_string(),
                    value: kit.to_string(),
                },
                Step::Click {
                    target: "submit".to_string(),
                },
                Step::AwaitReady {
                    timeout_ms: DEFAULT_READY_TIMEOUT_MS,
                },
                Step::Extract {
                    target: "table".to_string(),
                },
                Step::Close,
            ],
        )
    }

    /// Number of page loads, used to space out backoff pauses
    pub fn page_loads(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, Step::Navigate { .. }))
            .count()
    }
}

/// Randomized delay between page loads, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_ms: 3_000,
            max_ms: 8_000,
        }
    }
}

impl BackoffConfig {
    /// Draw a delay in `[min_ms, max_ms]`; an inverted range yields `min_ms`
    pub fn delay<R: Rng>(&self, rng: &mut R) -> Duration {
        let ms = if self.max_ms > self.min_ms {
            rng.gen_range(self.min_ms..=self.max_ms)
        } else {
            self.min_ms
        };
        Duration::from_millis(ms)
    }
}

/// Outcome of a multi-kit run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub captured: Vec<String>,
    /// Kit and the error message that stopped it
    pub failed: Vec<(String, String)>,
}

/// Runs workflows against a driver and stores the results
pub struct WorkflowRunner<'a, D: PageDriver, S: CaptureStore> {
    driver: D,
    store: &'a S,
    config: &'a AppConfig,
    rng: StdRng,
    page_loads: usize,
}

impl<'a, D: PageDriver, S: CaptureStore> WorkflowRunner<'a, D, S> {
    pub fn new(driver: D, store: &'a S, config: &'a AppConfig) -> Self {
        Self {
            driver,
            store,
            config,
            rng: StdRng::from_entropy(),
            page_loads: 0,
        }
    }

    /// Fix the backoff sequence
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Execute every step in order and collect the extracted pages.
    ///
    /// A failing step aborts the workflow; the driver is asked to close the
    /// page before the error is returned.
    pub fn run(&mut self, workflow: &Workflow) -> PedigraphResult<Vec<ExtractedPage>> {
        debug!(workflow = %workflow.name, steps = workflow.steps.len(), "running workflow");
        let mut pages = Vec::new();
        for step in &workflow.steps {
            if matches!(step, Step::Navigate { .. }) {
                if self.page_loads > 0 {
                    let delay = self.config.backoff.delay(&mut self.rng);
                    debug!(delay_ms = delay.as_millis() as u64, "backoff before page load");
                    self.driver.pause(delay);
                }
                self.page_loads += 1;
            }

            match self.driver.perform(step) {
                Ok(StepOutput::Page(page)) => pages.push(page),
                Ok(StepOutput::Done) => {}
                Err(e) => {
                    warn!(workflow = %workflow.name, step = step.name(), error = %e, "step failed");
                    if !matches!(step, Step::Close) {
                        if let Err(close) = self.driver.perform(&Step::Close) {
                            debug!(error = %close, "close after failure also failed");
                        }
                    }
                    return Err(e.into());
                }
            }
        }
        Ok(pages)
    }

    /// Capture one kit's tree, store it and mark the kit captured
    pub fn capture_kit(
        &mut self,
        session: &mut Session,
        kit: &str,
        profiles: &[ProfileRecord],
        segments: &SegmentIndex,
    ) -> PedigraphResult<Capture> {
        let tree_url = session.focus(kit)?.tree_url.clone();
        let pages = self.run(&Workflow::tree_capture(&tree_url))?;
        let page = pages
            .into_iter()
            .last()
            .ok_or_else(|| PedigraphError::InvalidInput(format!("no page extracted for kit {kit}")))?;

        let meta = crate::gedcom::ExportMeta::for_kit(kit, profiles, segments, &self.config.export);
        let capture = crate::capture_page(kit, &page, &self.config.parse, &meta).with_source_url(tree_url);

        self.store.save_capture(&capture)?;
        session.set_status(kit, CaptureStatus::Captured)?;
        self.store.save_session(session)?;

        info!(
            kit,
            people = capture.pedigree.people.len(),
            families = capture.pedigree.families.len(),
            "captured tree"
        );
        Ok(capture)
    }

    /// Capture every pending kit in queue order.
    ///
    /// A failure on one kit is recorded and the run moves on to the next.
    pub fn capture_pending(
        &mut self,
        session: &mut Session,
        profiles: &[ProfileRecord],
        segments: &SegmentIndex,
    ) -> RunReport {
        let mut report = RunReport::default();
        for kit in session.pending_kits() {
            match self.capture_kit(session, &kit, profiles, segments) {
                Ok(_) => report.captured.push(kit),
                Err(e) => {
                    warn!(kit = %kit, error = %e, "capture failed");
                    report.failed.push((kit, e.to_string()));
                }
            }
        }
        report
    }
}
