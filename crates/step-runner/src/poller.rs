use crate::session::Session;
use crate::transport::Transport;
use crate::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default pause between two probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A bounded wait that ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("timed out after {}ms", .waited.as_millis())]
pub struct TimedOut {
    /// How long the poller actually waited.
    pub waited: Duration,
}

/// Outcome of a bounded wait. Running out of time is an ordinary outcome,
/// not an error.
#[derive(Debug)]
pub enum Polled<R> {
    Ready(R),
    TimedOut(TimedOut),
}

impl<R> Polled<R> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Polled::Ready(_))
    }

    pub fn into_result(self) -> std::result::Result<R, TimedOut> {
        match self {
            Polled::Ready(r) => Ok(r),
            Polled::TimedOut(t) => Err(t),
        }
    }
}

/// Re-evaluates a probe at a fixed interval until it yields a value or the
/// timeout elapses. Holds no state between calls.
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    interval: Duration,
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `probe` until it returns `Some`, or until `timeout` has passed.
    ///
    /// The probe runs once immediately. The last sleep is clipped to the
    /// deadline and the probe gets one final look at it, so a timeout is
    /// never reported early and overshoots by at most one probe. Errors from
    /// the probe end the wait.
    pub async fn until<R, F, Fut>(&self, timeout: Duration, mut probe: F) -> Result<Polled<R>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<R>>>,
    {
        let start = Instant::now();
        let deadline = start + timeout;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            if let Some(value) = probe().await? {
                debug!("poll ready after {} attempt(s)", attempts);
                return Ok(Polled::Ready(value));
            }

            let now = Instant::now();
            if now >= deadline {
                let waited = now - start;
                debug!(
                    "poll timed out after {} attempt(s) ({}ms)",
                    attempts,
                    waited.as_millis()
                );
                return Ok(Polled::TimedOut(TimedOut { waited }));
            }
            tokio::time::sleep(self.interval.min(deadline - now)).await;
        }
    }

    /// Wait for `locator` to match an element.
    pub async fn wait_for<T: Transport>(
        &self,
        session: &Session<T>,
        locator: &str,
        timeout: Duration,
    ) -> Result<Polled<T::Element>> {
        debug!("wait_for: '{}' ({}ms)", locator, timeout.as_millis());
        let transport = session.transport();
        self.until(timeout, move || transport.find_element(locator))
            .await
    }

    /// Wait for `locator` to match an element that is shown and enabled.
    pub async fn wait_for_interactive<T: Transport>(
        &self,
        session: &Session<T>,
        locator: &str,
        timeout: Duration,
    ) -> Result<Polled<T::Element>> {
        debug!("wait_for_interactive: '{}' ({}ms)", locator, timeout.as_millis());
        let transport = session.transport();
        self.until(timeout, move || transport.find_interactive(locator))
            .await
    }
}
