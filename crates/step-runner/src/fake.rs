//! In-memory transport for tests and dry runs.
//!
//! A [`FakeTransport`] is a page made of locators you declare up front.
//! Clones share state, so a test keeps one handle while the session owns
//! another and inspects what the steps did afterwards.

use crate::config::SessionConfig;
use crate::transport::Transport;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// Smallest valid PNG header, returned by every capture.
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Element handle returned by [`FakeTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeElement {
    pub locator: String,
    pub index: usize,
}

#[derive(Debug, Clone, Copy)]
struct Rule {
    /// Lookups of this locator that miss before it shows up.
    appear_after: usize,
    /// Elements reported by `find_all` once visible.
    count: usize,
    /// Interactivity checks that report the element as hidden or disabled.
    hidden_for: usize,
}

#[derive(Debug, Default)]
struct FakeState {
    rules: HashMap<String, Rule>,
    probes: HashMap<String, usize>,
    checks: HashMap<String, usize>,
    failing_clicks: HashSet<String>,
    panicking_clicks: HashSet<String>,
    failing_captures: bool,
    navigations: Vec<String>,
    clicks: Vec<String>,
    cleared: Vec<String>,
    typed: Vec<(String, String)>,
    captures: usize,
    closes: usize,
}

impl FakeState {
    fn visible(&self, locator: &str) -> Option<Rule> {
        let rule = self.rules.get(locator)?;
        let probes = self.probes.get(locator).copied().unwrap_or(0);
        (probes >= rule.appear_after).then_some(*rule)
    }

    fn interactive(&self, locator: &str) -> bool {
        let checks = self.checks.get(locator).copied().unwrap_or(0);
        self.rules
            .get(locator)
            .is_some_and(|rule| checks >= rule.hidden_for)
    }

    /// One interactivity check; later checks see the count go up.
    fn check(&mut self, locator: &str) -> bool {
        let interactive = self.interactive(locator);
        *self.checks.entry(locator.to_string()).or_default() += 1;
        interactive
    }

    fn look_up(&mut self, locator: &str) -> Option<FakeElement> {
        let found = self.visible(locator).map(|_| FakeElement {
            locator: locator.to_string(),
            index: 0,
        });
        *self.probes.entry(locator.to_string()).or_default() += 1;
        found
    }
}

/// Scriptable in-memory page.
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    /// Create an empty page.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        // A panicking step must not take the fake down with it.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make `locator` match one element immediately.
    pub fn show(&self, locator: impl Into<String>) -> &Self {
        self.show_many(locator, 1)
    }

    /// Make `locator` match one element after `misses` lookups have found nothing.
    pub fn show_after(&self, locator: impl Into<String>, misses: usize) -> &Self {
        self.state().rules.insert(
            locator.into(),
            Rule {
                appear_after: misses,
                count: 1,
                hidden_for: 0,
            },
        );
        self
    }

    /// Make `locator` match `count` elements. With a count of zero the
    /// locator is still found by `find_element`, but `find_all` is empty.
    pub fn show_many(&self, locator: impl Into<String>, count: usize) -> &Self {
        self.state().rules.insert(
            locator.into(),
            Rule {
                appear_after: 0,
                count,
                hidden_for: 0,
            },
        );
        self
    }

    /// Make `locator` present at once but hidden for its first `checks`
    /// interactivity checks, like a widget that is still animating in.
    pub fn show_hidden_until(&self, locator: impl Into<String>, checks: usize) -> &Self {
        self.state().rules.insert(
            locator.into(),
            Rule {
                appear_after: 0,
                count: 1,
                hidden_for: checks,
            },
        );
        self
    }

    /// Make `locator` present but never shown or enabled.
    pub fn show_hidden(&self, locator: impl Into<String>) -> &Self {
        self.show_hidden_until(locator, usize::MAX)
    }

    /// Remove `locator` from the page.
    pub fn hide(&self, locator: &str) -> &Self {
        self.state().rules.remove(locator);
        self
    }

    /// Clicking `locator` returns a transport error.
    pub fn fail_click(&self, locator: impl Into<String>) -> &Self {
        self.state().failing_clicks.insert(locator.into());
        self
    }

    /// Clicking `locator` panics.
    pub fn panic_on_click(&self, locator: impl Into<String>) -> &Self {
        self.state().panicking_clicks.insert(locator.into());
        self
    }

    /// Every visual capture returns a transport error.
    pub fn fail_captures(&self) -> &Self {
        self.state().failing_captures = true;
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state().navigations.clone()
    }

    /// Locators of clicked elements, in order.
    pub fn clicks(&self) -> Vec<String> {
        self.state().clicks.clone()
    }

    pub fn cleared(&self) -> Vec<String> {
        self.state().cleared.clone()
    }

    /// `(locator, text)` pairs, in order.
    pub fn typed(&self) -> Vec<(String, String)> {
        self.state().typed.clone()
    }

    /// Number of `find_element` and `find_interactive` lookups made for `locator`.
    pub fn probes(&self, locator: &str) -> usize {
        self.state().probes.get(locator).copied().unwrap_or(0)
    }

    pub fn capture_count(&self) -> usize {
        self.state().captures
    }

    pub fn close_count(&self) -> usize {
        self.state().closes
    }
}

#[async_trait]
impl Transport for FakeTransport {
    type Element = FakeElement;

    async fn launch(_config: &SessionConfig) -> Result<Self> {
        Ok(Self::new())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.state().navigations.push(url.to_string());
        Ok(())
    }

    async fn find_element(&self, locator: &str) -> Result<Option<FakeElement>> {
        Ok(self.state().look_up(locator))
    }

    async fn find_interactive(&self, locator: &str) -> Result<Option<FakeElement>> {
        let mut state = self.state();
        Ok(state
            .look_up(locator)
            .filter(|element| state.check(&element.locator)))
    }

    async fn is_interactive(&self, element: &FakeElement) -> Result<bool> {
        Ok(self.state().check(&element.locator))
    }

    async fn find_all(&self, locator: &str) -> Result<Vec<FakeElement>> {
        let state = self.state();
        let count = state.visible(locator).map(|r| r.count).unwrap_or(0);
        Ok((0..count)
            .map(|index| FakeElement {
                locator: locator.to_string(),
                index,
            })
            .collect())
    }

    async fn click(&self, element: &FakeElement) -> Result<()> {
        let mut state = self.state();
        if state.panicking_clicks.contains(&element.locator) {
            drop(state);
            panic!("click on '{}' blew up", element.locator);
        }
        if state.failing_clicks.contains(&element.locator) {
            return Err(Error::Transport(format!(
                "element '{}' is detached from the page",
                element.locator
            )));
        }
        if !state.interactive(&element.locator) {
            return Err(Error::Transport(format!(
                "element '{}' is not visible",
                element.locator
            )));
        }
        state.clicks.push(element.locator.clone());
        Ok(())
    }

    async fn clear(&self, element: &FakeElement) -> Result<()> {
        self.state().cleared.push(element.locator.clone());
        Ok(())
    }

    async fn type_text(&self, element: &FakeElement, text: &str) -> Result<()> {
        self.state()
            .typed
            .push((element.locator.clone(), text.to_string()));
        Ok(())
    }

    async fn capture_visual(&self) -> Result<Vec<u8>> {
        let mut state = self.state();
        if state.failing_captures {
            return Err(Error::Transport("screenshot failed: target closed".into()));
        }
        state.captures += 1;
        Ok(PNG_SIGNATURE.to_vec())
    }

    async fn close(&mut self) -> Result<()> {
        self.state().closes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_element_appears_after_misses() {
        let fake = FakeTransport::new();
        fake.show_after("#late", 2);

        assert!(fake.find_element("#late").await.unwrap().is_none());
        assert!(fake.find_element("#late").await.unwrap().is_none());
        assert!(fake.find_element("#late").await.unwrap().is_some());
        assert_eq!(fake.probes("#late"), 3);
    }

    #[tokio::test]
    async fn test_present_but_empty() {
        let fake = FakeTransport::new();
        fake.show_many(".results", 0);

        assert!(fake.is_present(".results").await.unwrap());
        assert!(fake.find_all(".results").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let fake = FakeTransport::new();
        let handle = fake.clone();
        fake.show("#btn");

        let el = handle.find_element("#btn").await.unwrap().unwrap();
        handle.click(&el).await.unwrap();
        assert_eq!(fake.clicks(), vec!["#btn".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_click() {
        let fake = FakeTransport::new();
        fake.show("#gone").fail_click("#gone");

        let el = fake.find_element("#gone").await.unwrap().unwrap();
        assert!(matches!(fake.click(&el).await, Err(Error::Transport(_))));
        assert!(fake.clicks().is_empty());
    }

    #[tokio::test]
    async fn test_hidden_element_is_present_but_not_clickable() {
        let fake = FakeTransport::new();
        fake.show_hidden("#overlay-close");

        let el = fake.find_element("#overlay-close").await.unwrap().unwrap();
        assert!(!fake.is_interactive(&el).await.unwrap());
        assert!(fake.find_interactive("#overlay-close").await.unwrap().is_none());
        assert!(matches!(fake.click(&el).await, Err(Error::Transport(_))));
    }
}
