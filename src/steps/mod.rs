//! The flight search steps. Each one works against any [`Transport`].

mod city;
mod date;
mod navigation;
mod results;

pub use city::EnterCity;
pub use date::{departure_label, SelectDate};
pub use navigation::{DismissPopup, OpenSearchPage};
pub use results::{SubmitSearch, VerifyResults};

use crate::SearchError;
use std::time::Duration;
use step_runner::{Error, StepContext, StepOutcome, Transport};

/// Why a step body stopped early.
enum Abort {
    /// Anticipated failure, reported as the step's outcome.
    Failed(SearchError),
    /// Transport error, handed to the pipeline as unexpected.
    Error(Error),
}

impl From<SearchError> for Abort {
    fn from(err: SearchError) -> Self {
        Abort::Failed(err)
    }
}

impl From<Error> for Abort {
    fn from(err: Error) -> Self {
        Abort::Error(err)
    }
}

/// Turn a step body's result into the step outcome, saving a screenshot
/// under `failure_label` when the body failed in an anticipated way.
async fn conclude<T: Transport>(
    ctx: &mut StepContext<'_, T>,
    attempt: Result<(), Abort>,
    failure_label: Option<&str>,
) -> step_runner::Result<StepOutcome> {
    match attempt {
        Ok(()) => Ok(StepOutcome::Passed),
        Err(Abort::Error(e)) => Err(e),
        Err(Abort::Failed(err)) => {
            if let Some(label) = failure_label {
                ctx.capture_failure(label).await;
            }
            Ok(StepOutcome::failed(err))
        }
    }
}

/// Give animated widgets time to open.
async fn settle(pause: Duration) {
    if !pause.is_zero() {
        tokio::time::sleep(pause).await;
    }
}
