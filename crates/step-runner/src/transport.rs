use crate::config::SessionConfig;
use crate::Result;
use async_trait::async_trait;

/// The browser capabilities a step may use.
///
/// Locators are opaque: they are handed to the transport unchanged and only
/// the transport knows how to interpret them.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Handle to an element found on the page.
    type Element: Send + Sync;

    /// Start a new browser for `config`.
    async fn launch(config: &SessionConfig) -> Result<Self>
    where
        Self: Sized;

    /// Load `url` in the current page.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// First element matching `locator`, or `None` if nothing matches yet.
    async fn find_element(&self, locator: &str) -> Result<Option<Self::Element>>;

    /// Every element currently matching `locator`.
    async fn find_all(&self, locator: &str) -> Result<Vec<Self::Element>>;

    async fn click(&self, element: &Self::Element) -> Result<()>;

    async fn clear(&self, element: &Self::Element) -> Result<()>;

    async fn type_text(&self, element: &Self::Element, text: &str) -> Result<()>;

    /// PNG snapshot of what the page currently shows.
    async fn capture_visual(&self) -> Result<Vec<u8>>;

    /// Shut the browser down.
    async fn close(&mut self) -> Result<()>;

    /// Whether `element` is shown and enabled, so it can take a click or input.
    async fn is_interactive(&self, element: &Self::Element) -> Result<bool>;

    /// Whether `locator` matches anything right now.
    async fn is_present(&self, locator: &str) -> Result<bool> {
        Ok(self.find_element(locator).await?.is_some())
    }

    /// First element matching `locator` that is interactive right now.
    async fn find_interactive(&self, locator: &str) -> Result<Option<Self::Element>> {
        for element in self.find_all(locator).await? {
            if self.is_interactive(&element).await? {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }
}
