use crate::config::Config;
use crate::steps::{DismissPopup, EnterCity, OpenSearchPage, SelectDate, SubmitSearch, VerifyResults};
use step_runner::{Diagnostics, Pipeline, Poller, Result, RunResult, Session, Transport};
use tracing::info;

/// The Goibibo one-way search, assembled from [`Config`].
pub struct FlightSearch {
    config: Config,
}

impl FlightSearch {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Steps and checkpoints in run order. `04_results` is taken whether the
    /// run passed or not.
    pub fn pipeline<T: Transport>(&self) -> Pipeline<T> {
        let search = &self.config.search;
        let t = &self.config.timeouts;

        Pipeline::new(format!(
            "{} -> {}",
            search.origin_code, search.destination_code
        ))
        .step(OpenSearchPage::new(&search.url))
        .checkpoint("01_homepage")
        .step(DismissPopup::new(t.popup(), t.settle()))
        .step(
            EnterCity::origin(&search.origin_city, &search.origin_code)
                .with_timeouts(t.element(), t.settle()),
        )
        .step(
            EnterCity::destination(&search.destination_city, &search.destination_code)
                .with_timeouts(t.element(), t.settle()),
        )
        .step(SelectDate::new(search.departure_days).with_timeouts(t.element(), t.settle()))
        .checkpoint("02_before_search")
        .step(SubmitSearch::new(t.element()))
        .checkpoint("03_after_search")
        .step(VerifyResults::new(t.results()))
        .closing_checkpoint("04_results")
    }

    pub fn poller(&self) -> Poller {
        Poller::new(self.config.timeouts.poll_interval())
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics::new(&self.config.artifacts.dir)
    }

    /// Launch a browser and run the search in it.
    ///
    /// Fails only when the session cannot be opened; everything after that
    /// is reported in the [`RunResult`].
    pub async fn run<T: Transport>(&self) -> Result<RunResult> {
        let browser = &self.config.browser;
        info!(
            "Mode: {}, Headless: {}",
            if browser.use_login_session { "Login" } else { "Guest" },
            browser.headless
        );
        let session = Session::<T>::open(browser.session_config()).await?;
        Ok(self.run_with_session(session).await)
    }

    /// Run the search in an already open session. The session is closed
    /// when this returns.
    pub async fn run_with_session<T: Transport>(&self, session: Session<T>) -> RunResult {
        let mut diagnostics = self.diagnostics();
        self.pipeline()
            .run(session, &mut diagnostics, &self.poller())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use step_runner::fake::FakeTransport;

    #[test]
    fn test_pipeline_order() {
        let search = FlightSearch::new(Config::default());
        let pipeline = search.pipeline::<FakeTransport>();

        assert_eq!(pipeline.name(), "DEL -> BOM");
        assert_eq!(
            pipeline.step_names(),
            vec![
                "open_search_page",
                "dismiss_popup",
                "enter_origin",
                "enter_destination",
                "select_date",
                "submit_search",
                "verify_results",
            ]
        );
        assert_eq!(
            pipeline.checkpoint_labels(),
            vec!["01_homepage", "02_before_search", "03_after_search", "04_results"]
        );
    }

    #[test]
    fn test_poller_uses_configured_interval() {
        let mut config = Config::default();
        config.timeouts.poll_interval_ms = 40;
        let search = FlightSearch::new(config);
        assert_eq!(search.poller().interval().as_millis(), 40);
    }
}
