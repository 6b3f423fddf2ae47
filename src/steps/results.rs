use super::{conclude, Abort};
use crate::{locators, SearchError};
use async_trait::async_trait;
use std::time::Duration;
use step_runner::{Polled, Result, Step, StepContext, StepOutcome, Transport};
use tracing::{error, info, warn};

/// Click "Search Flights".
pub struct SubmitSearch {
    timeout: Duration,
}

impl SubmitSearch {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn submit<T: Transport>(&self, ctx: &StepContext<'_, T>) -> std::result::Result<(), Abort> {
        let button = ctx
            .wait_for_interactive(locators::SEARCH_BUTTON, self.timeout)
            .await?
            .into_result()
            .map_err(|waited| SearchError::Submit { waited })?;
        ctx.transport().click(&button).await?;
        info!("Clicked search button");
        Ok(())
    }
}

#[async_trait]
impl<T: Transport> Step<T> for SubmitSearch {
    fn name(&self) -> &str {
        "submit_search"
    }

    async fn run(&self, ctx: &mut StepContext<'_, T>) -> Result<StepOutcome> {
        let attempt = self.submit(ctx).await;
        conclude(ctx, attempt, Some("error_clicking_search")).await
    }
}

/// Wait for the results page and check that it lists at least one flight.
///
/// A page that never renders and a page that renders empty are reported
/// with different reasons.
pub struct VerifyResults {
    timeout: Duration,
}

impl VerifyResults {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl<T: Transport> Step<T> for VerifyResults {
    fn name(&self) -> &str {
        "verify_results"
    }

    async fn run(&self, ctx: &mut StepContext<'_, T>) -> Result<StepOutcome> {
        if let Polled::TimedOut(waited) = ctx.wait_for(locators::RESULT_CARD, self.timeout).await? {
            error!("Timeout waiting for search results");
            let attempt = Err(Abort::Failed(SearchError::ResultsTimeout { waited }));
            return conclude(ctx, attempt, Some("timeout_results")).await;
        }

        let flights = ctx.transport().find_all(locators::RESULT_CARD).await?;
        if flights.is_empty() {
            warn!("No flights found");
            return conclude(ctx, Err(Abort::Failed(SearchError::NoResults)), None).await;
        }

        info!("Found {} flight results", flights.len());
        Ok(StepOutcome::Passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::testing::{run_step, SHORT};
    use step_runner::fake::FakeTransport;

    #[tokio::test]
    async fn test_submit_clicks_button() {
        let fake = FakeTransport::new();
        fake.show(locators::SEARCH_BUTTON);

        let (outcome, _) = run_step(&SubmitSearch::new(SHORT), &fake).await;

        assert!(outcome.unwrap().is_passed());
        assert_eq!(fake.clicks(), vec![locators::SEARCH_BUTTON.to_string()]);
    }

    #[tokio::test]
    async fn test_submit_without_button_fails() {
        let fake = FakeTransport::new();

        let (outcome, artifacts) = run_step(&SubmitSearch::new(SHORT), &fake).await;

        assert!(!outcome.unwrap().is_passed());
        assert_eq!(artifacts[0].label, "error_clicking_search");
    }

    #[tokio::test]
    async fn test_results_found() {
        let fake = FakeTransport::new();
        fake.show_many(locators::RESULT_CARD, 12);

        let (outcome, artifacts) = run_step(&VerifyResults::new(SHORT), &fake).await;

        assert!(outcome.unwrap().is_passed());
        assert!(artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_results_timeout_and_empty_differ() {
        let timed_out = FakeTransport::new();
        let (outcome, artifacts) = run_step(&VerifyResults::new(SHORT), &timed_out).await;
        let outcome = outcome.unwrap();
        let timeout_reason = outcome.failure().unwrap().to_string();
        assert!(timeout_reason.contains("never rendered"));
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].label, "timeout_results");

        let empty = FakeTransport::new();
        empty.show_many(locators::RESULT_CARD, 0);
        let (outcome, artifacts) = run_step(&VerifyResults::new(SHORT), &empty).await;
        let outcome = outcome.unwrap();
        let empty_reason = outcome.failure().unwrap().to_string();
        assert!(empty_reason.contains("no flights"));
        assert!(artifacts.is_empty());

        assert_ne!(timeout_reason, empty_reason);
    }
}
