use super::{conclude, settle, Abort};
use crate::{locators, SearchError};
use async_trait::async_trait;
use std::time::Duration;
use step_runner::{Result, Step, StepContext, StepOutcome, Transport};
use tracing::{debug, info};

/// Fill one of the two airport fields: open it, type the city, then pick
/// the first dropdown entry mentioning the airport code or the city.
pub struct EnterCity {
    name: &'static str,
    field: &'static str,
    city: String,
    code: String,
    timeout: Duration,
    settle: Duration,
}

impl EnterCity {
    pub fn origin(city: impl Into<String>, code: impl Into<String>) -> Self {
        Self::new("enter_origin", locators::ORIGIN_INPUT, city.into(), code.into())
    }

    pub fn destination(city: impl Into<String>, code: impl Into<String>) -> Self {
        Self::new(
            "enter_destination",
            locators::DESTINATION_INPUT,
            city.into(),
            code.into(),
        )
    }

    fn new(name: &'static str, field: &'static str, city: String, code: String) -> Self {
        Self {
            name,
            field,
            city,
            code,
            timeout: Duration::from_secs(10),
            settle: Duration::from_secs(1),
        }
    }

    pub fn with_timeouts(mut self, timeout: Duration, settle: Duration) -> Self {
        self.timeout = timeout;
        self.settle = settle;
        self
    }

    fn missing(&self, what: &'static str, waited: step_runner::TimedOut) -> SearchError {
        SearchError::CityEntry {
            city: self.city.clone(),
            code: self.code.clone(),
            what,
            waited,
        }
    }

    async fn enter<T: Transport>(&self, ctx: &StepContext<'_, T>) -> std::result::Result<(), Abort> {
        let field = ctx
            .wait_for_interactive(self.field, self.timeout)
            .await?
            .into_result()
            .map_err(|w| self.missing("city field", w))?;
        ctx.transport().click(&field).await?;
        settle(self.settle).await;

        let text_box = ctx
            .wait_for_interactive(locators::EDITABLE_TEXT_BOX, self.timeout)
            .await?
            .into_result()
            .map_err(|w| self.missing("text box", w))?;
        ctx.transport().clear(&text_box).await?;
        ctx.transport().type_text(&text_box, &self.city).await?;
        debug!("Typed '{}' into {}", self.city, self.field);
        settle(self.settle * 2).await;

        let option = locators::airport_option(&self.code, &self.city);
        let entry = ctx
            .wait_for_interactive(&option, self.timeout)
            .await?
            .into_result()
            .map_err(|w| self.missing("dropdown option", w))?;
        ctx.transport().click(&entry).await?;
        settle(self.settle).await;

        info!("Selected city: {} ({})", self.city, self.code);
        Ok(())
    }
}

#[async_trait]
impl<T: Transport> Step<T> for EnterCity {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&self, ctx: &mut StepContext<'_, T>) -> Result<StepOutcome> {
        let attempt = self.enter(ctx).await;
        let label = format!("error_city_{}", self.code);
        conclude(ctx, attempt, Some(&label)).await
    }
}
