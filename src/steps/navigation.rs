use super::settle;
use crate::locators;
use async_trait::async_trait;
use std::time::Duration;
use step_runner::{Polled, Result, Step, StepContext, StepOutcome, Transport};
use tracing::info;

/// Load the search page.
pub struct OpenSearchPage {
    url: String,
}

impl OpenSearchPage {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl<T: Transport> Step<T> for OpenSearchPage {
    fn name(&self) -> &str {
        "open_search_page"
    }

    async fn run(&self, ctx: &mut StepContext<'_, T>) -> Result<StepOutcome> {
        ctx.transport().navigate(&self.url).await?;
        info!("Opened flight search page: {}", self.url);
        Ok(StepOutcome::Passed)
    }
}

/// Close the login popup if it shows up. Not seeing one, or seeing only a
/// hidden close icon, is the usual case and counts as success.
pub struct DismissPopup {
    timeout: Duration,
    settle: Duration,
}

impl DismissPopup {
    pub fn new(timeout: Duration, settle: Duration) -> Self {
        Self { timeout, settle }
    }
}

#[async_trait]
impl<T: Transport> Step<T> for DismissPopup {
    fn name(&self) -> &str {
        "dismiss_popup"
    }

    async fn run(&self, ctx: &mut StepContext<'_, T>) -> Result<StepOutcome> {
        let popup = ctx
            .wait_for_interactive(locators::LOGIN_POPUP_CLOSE, self.timeout)
            .await?;
        match popup {
            Polled::Ready(close) => {
                ctx.transport().click(&close).await?;
                info!("Closed login popup");
                settle(self.settle).await;
            }
            Polled::TimedOut(_) => info!("No login popup found"),
        }
        Ok(StepOutcome::Passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::testing::{run_step, SHORT};
    use step_runner::fake::FakeTransport;

    #[tokio::test]
    async fn test_open_navigates() {
        let fake = FakeTransport::new();
        let (outcome, _) = run_step(&OpenSearchPage::new(locators::SEARCH_URL), &fake).await;

        assert!(outcome.unwrap().is_passed());
        assert_eq!(fake.navigations(), vec![locators::SEARCH_URL.to_string()]);
    }

    #[tokio::test]
    async fn test_popup_is_closed_when_present() {
        let fake = FakeTransport::new();
        fake.show(locators::LOGIN_POPUP_CLOSE);

        let (outcome, _) = run_step(&DismissPopup::new(SHORT, Duration::ZERO), &fake).await;

        assert!(outcome.unwrap().is_passed());
        assert_eq!(fake.clicks(), vec![locators::LOGIN_POPUP_CLOSE.to_string()]);
    }

    #[tokio::test]
    async fn test_no_popup_is_success() {
        let fake = FakeTransport::new();

        let (outcome, artifacts) =
            run_step(&DismissPopup::new(SHORT, Duration::ZERO), &fake).await;

        assert!(outcome.unwrap().is_passed());
        assert!(fake.clicks().is_empty());
        assert!(artifacts.is_empty());
        assert!(fake.probes(locators::LOGIN_POPUP_CLOSE) >= 2);
    }

    #[tokio::test]
    async fn test_popup_click_error_is_unexpected() {
        let fake = FakeTransport::new();
        fake.show(locators::LOGIN_POPUP_CLOSE)
            .fail_click(locators::LOGIN_POPUP_CLOSE);

        let (outcome, _) = run_step(&DismissPopup::new(SHORT, Duration::ZERO), &fake).await;

        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn test_hidden_popup_is_left_alone() {
        let fake = FakeTransport::new();
        fake.show_hidden(locators::LOGIN_POPUP_CLOSE);

        let (outcome, artifacts) =
            run_step(&DismissPopup::new(SHORT, Duration::ZERO), &fake).await;

        assert!(outcome.unwrap().is_passed());
        assert!(fake.clicks().is_empty());
        assert!(artifacts.is_empty());
    }
}
