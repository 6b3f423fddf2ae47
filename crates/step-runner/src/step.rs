use crate::capture::{Artifact, ArtifactKind, Diagnostics};
use crate::poller::{Polled, Poller};
use crate::session::Session;
use crate::transport::Transport;
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Boxed cause of a step failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What a step reports back to the pipeline.
#[derive(Debug)]
pub enum StepOutcome {
    Passed,
    /// An anticipated failure; the cause's display text is what gets logged.
    Failed(BoxError),
}

impl StepOutcome {
    pub fn failed(cause: impl Into<BoxError>) -> Self {
        StepOutcome::Failed(cause.into())
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, StepOutcome::Passed)
    }

    pub fn failure(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            StepOutcome::Passed => None,
            StepOutcome::Failed(cause) => Some(cause.as_ref()),
        }
    }
}

/// A named unit of work against a session.
///
/// Steps keep no state between runs. Anything a step can anticipate going
/// wrong is reported as [`StepOutcome::Failed`]; an `Err` means something
/// unexpected happened and is handled at the pipeline boundary.
#[async_trait]
pub trait Step<T: Transport>: Send + Sync {
    /// Used in logs and as the label of the failure screenshot.
    fn name(&self) -> &str;

    async fn run(&self, ctx: &mut StepContext<'_, T>) -> Result<StepOutcome>;
}

/// What a step gets to work with while it runs.
pub struct StepContext<'a, T: Transport> {
    session: &'a Session<T>,
    poller: Poller,
    diagnostics: &'a mut Diagnostics,
}

impl<'a, T: Transport> StepContext<'a, T> {
    pub fn new(session: &'a Session<T>, poller: Poller, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            session,
            poller,
            diagnostics,
        }
    }

    pub fn session(&self) -> &Session<T> {
        self.session
    }

    pub fn transport(&self) -> &T {
        self.session.transport()
    }

    pub fn poller(&self) -> Poller {
        self.poller
    }

    /// Bounded wait for `locator` using the pipeline's poll interval.
    pub async fn wait_for(&self, locator: &str, timeout: Duration) -> Result<Polled<T::Element>> {
        self.poller.wait_for(self.session, locator, timeout).await
    }

    /// Bounded wait for `locator` to match an element that can be clicked
    /// or typed into.
    pub async fn wait_for_interactive(
        &self,
        locator: &str,
        timeout: Duration,
    ) -> Result<Polled<T::Element>> {
        self.poller
            .wait_for_interactive(self.session, locator, timeout)
            .await
    }

    /// Save a failure screenshot from inside a step.
    pub async fn capture_failure(&mut self, label: &str) -> Option<Artifact> {
        self.diagnostics
            .try_capture(self.session, label, ArtifactKind::Failure)
            .await
    }
}
