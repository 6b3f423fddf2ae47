//! Chrome over the DevTools protocol.

use crate::locators;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use step_runner::{Error, Result, SessionConfig, Transport};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Attribute used to hand XPath matches over to CSS lookups.
const REF_ATTR: &str = "data-flight-search-ref";

/// Tags every node matching an XPath with a ref attribute and returns the
/// number of matches.
const TAG_XPATH_JS: &str = r#"(() => {
    const xpath = arguments[0];
    const token = arguments[1];
    const attr = arguments[2];
    const found = document.evaluate(xpath, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
    let tagged = 0;
    for (let i = 0; i < found.snapshotLength; i++) {
        const node = found.snapshotItem(i);
        if (node.nodeType === Node.ELEMENT_NODE) {
            node.setAttribute(attr, token);
            tagged++;
        }
    }
    return tagged;
})()"#;

const INTERACTIVE_JS: &str = r#"function() {
    return this.getClientRects().length > 0 && !this.disabled;
}"#;

const CLEAR_JS: &str = r#"function() {
    this.focus();
    this.value = '';
    this.dispatchEvent(new Event('input', { bubbles: true }));
}"#;

/// A page element, remembered with the locator that found it.
pub struct ChromeElement {
    element: Element,
    locator: String,
}

impl ChromeElement {
    pub fn locator(&self) -> &str {
        &self.locator
    }
}

/// One Chrome window with a single page.
pub struct ChromeTransport {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    next_ref: AtomicU64,
}

fn cdp(e: CdpError) -> Error {
    Error::Transport(e.to_string())
}

/// chromiumoxide's default switches, minus `--enable-automation`.
const BASE_ARGS: &[&str] = &[
    "--disable-background-networking",
    "--enable-features=NetworkService,NetworkServiceInProcess",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-breakpad",
    "--disable-client-side-phishing-detection",
    "--disable-component-extensions-with-background-pages",
    "--disable-default-apps",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-features=TranslateUI",
    "--disable-hang-monitor",
    "--disable-ipc-flooding-protection",
    "--disable-popup-blocking",
    "--disable-prompt-on-repost",
    "--disable-renderer-backgrounding",
    "--disable-sync",
    "--force-color-profile=srgb",
    "--metrics-recording-only",
    "--no-first-run",
    "--password-store=basic",
    "--use-mock-keychain",
    "--lang=en_US",
];

/// Switches that keep the page from flagging the browser as automated.
const STEALTH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--no-sandbox",
];

/// Every switch Chrome is launched with, apart from headless and profile.
fn launch_args() -> Vec<&'static str> {
    BASE_ARGS.iter().chain(STEALTH_ARGS).copied().collect()
}

/// Chrome launch options for `config`.
fn browser_config(config: &SessionConfig) -> std::result::Result<BrowserConfig, String> {
    let viewport = config.viewport.unwrap_or_default();
    let mut builder = BrowserConfig::builder()
        .disable_default_args()
        .args(launch_args())
        .window_size(viewport.width, viewport.height)
        .viewport(None);

    if !config.headless {
        builder = builder.with_head();
    }
    if let Some(ref dir) = config.profile_dir {
        builder = builder.user_data_dir(dir);
    }
    builder.build()
}

impl ChromeTransport {
    /// Resolve `locator` to a CSS selector. XPath locators are evaluated in
    /// the page and their matches tagged so CSS can find them.
    async fn css_for(&self, locator: &str) -> Result<Option<String>> {
        if !locators::is_xpath(locator) {
            return Ok(Some(locator.to_string()));
        }

        let token = format!("r{}", self.next_ref.fetch_add(1, Ordering::Relaxed));
        let js = tag_xpath_script(locator, &token)?;
        let tagged: u64 = self
            .page
            .evaluate(js)
            .await
            .map_err(cdp)?
            .into_value()
            .map_err(|e| Error::Transport(format!("bad xpath result: {}", e)))?;

        if tagged == 0 {
            return Ok(None);
        }
        Ok(Some(format!("[{}=\"{}\"]", REF_ATTR, token)))
    }

    async fn elements(&self, locator: &str) -> Result<Vec<ChromeElement>> {
        let Some(css) = self.css_for(locator).await? else {
            return Ok(Vec::new());
        };
        let found = self.page.find_elements(css).await.map_err(cdp)?;
        Ok(found
            .into_iter()
            .map(|element| ChromeElement {
                element,
                locator: locator.to_string(),
            })
            .collect())
    }
}

fn tag_xpath_script(xpath: &str, token: &str) -> Result<String> {
    let json = |v: &str| {
        serde_json::to_string(v).map_err(|e| Error::Transport(format!("bad locator: {}", e)))
    };
    Ok(TAG_XPATH_JS
        .replace("arguments[0]", &json(xpath)?)
        .replace("arguments[1]", &json(token)?)
        .replace("arguments[2]", &json(REF_ATTR)?))
}

#[async_trait]
impl Transport for ChromeTransport {
    type Element = ChromeElement;

    async fn launch(config: &SessionConfig) -> Result<Self> {
        let browser_config = browser_config(config).map_err(Error::SessionInit)?;
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| Error::SessionInit(format!("failed to launch Chrome: {}", e)))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler event error (continuing): {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(Error::SessionInit(format!("failed to open page: {}", e)));
            }
        };

        info!(
            "Chrome launched (headless: {}, profile: {})",
            config.headless,
            config
                .profile_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "fresh".into())
        );

        Ok(Self {
            browser,
            page,
            handler,
            next_ref: AtomicU64::new(0),
        })
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.page.goto(url).await.map_err(cdp)?;
        Ok(())
    }

    async fn find_element(&self, locator: &str) -> Result<Option<ChromeElement>> {
        Ok(self.elements(locator).await?.into_iter().next())
    }

    async fn find_all(&self, locator: &str) -> Result<Vec<ChromeElement>> {
        self.elements(locator).await
    }

    async fn click(&self, element: &ChromeElement) -> Result<()> {
        debug!("click: {}", element.locator());
        element.element.click().await.map_err(cdp)?;
        Ok(())
    }

    async fn clear(&self, element: &ChromeElement) -> Result<()> {
        element
            .element
            .call_js_fn(CLEAR_JS, false)
            .await
            .map_err(cdp)?;
        Ok(())
    }

    async fn type_text(&self, element: &ChromeElement, text: &str) -> Result<()> {
        element.element.type_str(text).await.map_err(cdp)?;
        Ok(())
    }

    async fn is_interactive(&self, element: &ChromeElement) -> Result<bool> {
        let returned = element
            .element
            .call_js_fn(INTERACTIVE_JS, false)
            .await
            .map_err(cdp)?;
        Ok(returned
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    async fn capture_visual(&self) -> Result<Vec<u8>> {
        self.page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(false)
                    .build(),
            )
            .await
            .map_err(cdp)
    }

    async fn close(&mut self) -> Result<()> {
        let closed = self.browser.close().await.map_err(cdp);
        if closed.is_ok() {
            let _ = self.browser.wait().await;
        }
        self.handler.abort();
        info!("Browser closed");
        closed.map(|_| ())
    }
}

impl Drop for ChromeTransport {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_script_embeds_quoted_arguments() {
        let js = tag_xpath_script(locators::SEARCH_BUTTON, "r7").unwrap();

        assert!(!js.contains("arguments["));
        assert!(js.contains(r#"const xpath = "//span[text()='Search Flights']/ancestor::button";"#));
        assert!(js.contains(r#"const token = "r7";"#));
        assert!(js.contains(r#"const attr = "data-flight-search-ref";"#));
    }

    #[test]
    fn test_tag_script_escapes_double_quotes() {
        let js = tag_xpath_script(r#"//div[@aria-label="x"]"#, "r0").unwrap();
        assert!(js.contains(r#"const xpath = "//div[@aria-label=\"x\"]";"#));
    }

    #[test]
    fn test_launch_args_drop_automation_switch() {
        let args = launch_args();

        assert!(!args.contains(&"--enable-automation"));
        assert!(args.contains(&"--disable-blink-features=AutomationControlled"));
        assert!(args.contains(&"--no-first-run"));
        assert_eq!(
            args.iter().filter(|a| **a == "--disable-dev-shm-usage").count(),
            1
        );
    }
}
