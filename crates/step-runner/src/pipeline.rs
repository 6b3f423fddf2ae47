use crate::capture::{Artifact, ArtifactKind, Diagnostics};
use crate::poller::Poller;
use crate::session::Session;
use crate::step::{Step, StepContext, StepOutcome};
use crate::transport::Transport;
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Label of the screenshot taken when a step errors or panics.
pub const UNEXPECTED_ERROR_LABEL: &str = "unexpected_error";

/// How a failed run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// The step reported an anticipated failure.
    StepFailed,
    /// The step returned an error.
    Error,
    /// The step panicked.
    Panic,
}

/// Where a pipeline run is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineState {
    Pending,
    Running {
        step_index: usize,
    },
    Succeeded,
    Failed {
        step_index: usize,
        step: String,
        reason: String,
        cause: FailureCause,
    },
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Succeeded | PipelineState::Failed { .. })
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// Name of the pipeline that ran.
    pub pipeline: String,
    /// Terminal state: `Succeeded` or `Failed`.
    pub state: PipelineState,
    /// Screenshots taken during this run, in order.
    pub artifacts: Vec<Artifact>,
    /// Steps that were started, including a failing one.
    pub steps_executed: usize,
    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

impl RunResult {
    pub fn success(&self) -> bool {
        matches!(self.state, PipelineState::Succeeded)
    }

    /// Name of the step the run stopped at.
    pub fn failed_step(&self) -> Option<&str> {
        match &self.state {
            PipelineState::Failed { step, .. } => Some(step),
            _ => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.state {
            PipelineState::Failed { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn checkpoints(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts
            .iter()
            .filter(|a| a.kind == ArtifactKind::Checkpoint)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts
            .iter()
            .filter(|a| a.kind == ArtifactKind::Failure)
    }
}

enum Stage<T: Transport> {
    Step(Box<dyn Step<T>>),
    Checkpoint(String),
}

/// An ordered list of steps and checkpoints.
///
/// Steps run in order and the first failure ends the run. Checkpoints are
/// screenshots taken whenever the run reaches them. The closing checkpoint,
/// if set, is taken once at the end of every run, whatever the outcome.
pub struct Pipeline<T: Transport> {
    name: String,
    stages: Vec<Stage<T>>,
    closing_checkpoint: Option<String>,
}

impl<T: Transport> Pipeline<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            closing_checkpoint: None,
        }
    }

    /// Append a step.
    pub fn step(mut self, step: impl Step<T> + 'static) -> Self {
        self.stages.push(Stage::Step(Box::new(step)));
        self
    }

    /// Append a checkpoint screenshot.
    pub fn checkpoint(mut self, label: impl Into<String>) -> Self {
        self.stages.push(Stage::Checkpoint(label.into()));
        self
    }

    /// Screenshot taken after the run, on success and on failure.
    pub fn closing_checkpoint(mut self, label: impl Into<String>) -> Self {
        self.closing_checkpoint = Some(label.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Step names in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.stages
            .iter()
            .filter_map(|stage| match stage {
                Stage::Step(step) => Some(step.name()),
                Stage::Checkpoint(_) => None,
            })
            .collect()
    }

    /// Checkpoint labels in order, the closing checkpoint last.
    pub fn checkpoint_labels(&self) -> Vec<&str> {
        self.stages
            .iter()
            .filter_map(|stage| match stage {
                Stage::Checkpoint(label) => Some(label.as_str()),
                Stage::Step(_) => None,
            })
            .chain(self.closing_checkpoint.as_deref())
            .collect()
    }

    /// Run every stage against `session`, then close it.
    ///
    /// Never fails: step failures, step errors and step panics all end up as
    /// a `Failed` state in the result, and the session is closed exactly once
    /// on every path.
    pub async fn run(
        &self,
        session: Session<T>,
        diagnostics: &mut Diagnostics,
        poller: &Poller,
    ) -> RunResult {
        let start = Instant::now();
        let first_artifact = diagnostics.artifacts().len();
        let mut state = PipelineState::Pending;
        let mut step_index = 0;

        info!(
            "Running pipeline '{}' ({} steps)",
            self.name,
            self.step_names().len()
        );

        for stage in &self.stages {
            let step = match stage {
                Stage::Checkpoint(label) => {
                    diagnostics
                        .try_capture(&session, label, ArtifactKind::Checkpoint)
                        .await;
                    continue;
                }
                Stage::Step(step) => step,
            };

            state = PipelineState::Running { step_index };
            debug!("Executing step {}: {}", step_index + 1, step.name());

            let outcome = {
                let mut ctx = StepContext::new(&session, *poller, diagnostics);
                AssertUnwindSafe(step.run(&mut ctx)).catch_unwind().await
            };

            let (reason, cause, label) = match outcome {
                Ok(Ok(StepOutcome::Passed)) => {
                    info!("Step '{}' passed", step.name());
                    step_index += 1;
                    continue;
                }
                Ok(Ok(StepOutcome::Failed(cause))) => {
                    error!("Step '{}' failed: {}", step.name(), cause);
                    (cause.to_string(), FailureCause::StepFailed, step.name())
                }
                Ok(Err(e)) => {
                    error!("Unexpected error in step '{}': {}", step.name(), e);
                    (e.to_string(), FailureCause::Error, UNEXPECTED_ERROR_LABEL)
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!("Step '{}' panicked: {}", step.name(), message);
                    (
                        format!("panicked: {}", message),
                        FailureCause::Panic,
                        UNEXPECTED_ERROR_LABEL,
                    )
                }
            };

            diagnostics
                .try_capture(&session, label, ArtifactKind::Failure)
                .await;
            state = PipelineState::Failed {
                step_index,
                step: step.name().to_string(),
                reason,
                cause,
            };
            break;
        }

        if !state.is_terminal() {
            state = PipelineState::Succeeded;
        }

        if let Some(ref label) = self.closing_checkpoint {
            diagnostics
                .try_capture(&session, label, ArtifactKind::Checkpoint)
                .await;
        }

        if let Err(e) = session.close().await {
            warn!("Failed to close session: {}", e);
        }

        match &state {
            PipelineState::Failed { step, reason, .. } => {
                error!(
                    "Pipeline '{}' failed at step '{}': {}",
                    self.name, step, reason
                );
            }
            _ => info!("Pipeline '{}' succeeded", self.name),
        }

        RunResult {
            pipeline: self.name.clone(),
            steps_executed: match &state {
                PipelineState::Failed { step_index, .. } => step_index + 1,
                _ => step_index,
            },
            state,
            artifacts: diagnostics.artifacts()[first_artifact..].to_vec(),
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
