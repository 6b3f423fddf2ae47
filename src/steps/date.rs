use super::{conclude, settle, Abort};
use crate::{locators, SearchError};
use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use std::time::Duration;
use step_runner::{Result, Step, StepContext, StepOutcome, Transport};
use tracing::info;

/// Calendar label of the day `days` after `today`, e.g. `Thu Oct 22 2026`.
pub fn departure_label(today: NaiveDate, days: u32) -> String {
    let target = today
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX);
    target.format("%a %b %d %Y").to_string()
}

/// Open the departure calendar and click the target day.
pub struct SelectDate {
    days_from_today: u32,
    today: Option<NaiveDate>,
    timeout: Duration,
    settle: Duration,
}

impl SelectDate {
    pub fn new(days_from_today: u32) -> Self {
        Self {
            days_from_today,
            today: None,
            timeout: Duration::from_secs(10),
            settle: Duration::from_secs(1),
        }
    }

    /// Count days from `today` instead of the local date at run time.
    pub fn from_day(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn with_timeouts(mut self, timeout: Duration, settle: Duration) -> Self {
        self.timeout = timeout;
        self.settle = settle;
        self
    }

    fn label(&self) -> String {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        departure_label(today, self.days_from_today)
    }

    async fn select<T: Transport>(
        &self,
        ctx: &StepContext<'_, T>,
        date: &str,
    ) -> std::result::Result<(), Abort> {
        let missing = |what, waited| SearchError::DateSelection {
            date: date.to_string(),
            what,
            waited,
        };

        let field = ctx
            .wait_for_interactive(locators::DEPARTURE_INPUT, self.timeout)
            .await?
            .into_result()
            .map_err(|w| missing("departure field", w))?;
        ctx.transport().click(&field).await?;
        settle(self.settle).await;

        let cell = ctx
            .wait_for_interactive(&locators::day_cell(date), self.timeout)
            .await?
            .into_result()
            .map_err(|w| missing("calendar day", w))?;
        ctx.transport().click(&cell).await?;

        info!("Selected departure date: {}", date);
        Ok(())
    }
}

#[async_trait]
impl<T: Transport> Step<T> for SelectDate {
    fn name(&self) -> &str {
        "select_date"
    }

    async fn run(&self, ctx: &mut StepContext<'_, T>) -> Result<StepOutcome> {
        let date = self.label();
        let attempt = self.select(ctx, &date).await;
        conclude(ctx, attempt, Some("error_selecting_date")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::testing::{run_step, SHORT};
    use step_runner::fake::FakeTransport;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_departure_label() {
        assert_eq!(departure_label(day(2026, 10, 17), 5), "Thu Oct 22 2026");
        assert_eq!(departure_label(day(2026, 10, 17), 0), "Sat Oct 17 2026");
        assert_eq!(departure_label(day(2026, 12, 30), 3), "Sat Jan 02 2027");
        assert_eq!(departure_label(day(2028, 2, 27), 2), "Tue Feb 29 2028");
    }

    #[tokio::test]
    async fn test_clicks_the_computed_day() {
        let fake = FakeTransport::new();
        let cell = locators::day_cell("Thu Oct 22 2026");
        fake.show(locators::DEPARTURE_INPUT).show(cell.clone());

        let step = SelectDate::new(5)
            .from_day(day(2026, 10, 17))
            .with_timeouts(SHORT, Duration::ZERO);
        let (outcome, artifacts) = run_step(&step, &fake).await;

        assert!(outcome.unwrap().is_passed());
        assert!(artifacts.is_empty());
        assert_eq!(fake.clicks(), vec![locators::DEPARTURE_INPUT.to_string(), cell]);
    }

    #[tokio::test]
    async fn test_missing_day_fails() {
        let fake = FakeTransport::new();
        fake.show(locators::DEPARTURE_INPUT);

        let step = SelectDate::new(5)
            .from_day(day(2026, 10, 17))
            .with_timeouts(SHORT, Duration::ZERO);
        let (outcome, artifacts) = run_step(&step, &fake).await;

        let outcome = outcome.unwrap();
        let reason = outcome.failure().unwrap().to_string();
        assert!(reason.contains("Thu Oct 22 2026"), "{}", reason);
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].label, "error_selecting_date");
    }

    #[tokio::test]
    async fn test_missing_departure_field_fails() {
        let fake = FakeTransport::new();
        fake.show(locators::day_cell("Thu Oct 22 2026"));

        let step = SelectDate::new(5)
            .from_day(day(2026, 10, 17))
            .with_timeouts(SHORT, Duration::ZERO);
        let (outcome, artifacts) = run_step(&step, &fake).await;

        let outcome = outcome.unwrap();
        let reason = outcome.failure().unwrap().to_string();
        assert!(reason.contains("departure field"), "{}", reason);
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].label, "error_selecting_date");
        assert!(fake.clicks().is_empty());
    }
}
