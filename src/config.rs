use crate::locators;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use step_runner::{Error, Result, SessionConfig, Viewport};

/// Top-level config structure. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Browser launch options.
    #[serde(default)]
    pub browser: BrowserConfig,

    /// What to search for.
    #[serde(default)]
    pub search: SearchParams,

    /// Per-call-site wait limits.
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Where screenshots go.
    #[serde(default)]
    pub artifacts: ArtifactConfig,
}

impl Config {
    /// Load config from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse config from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the config.
    pub fn validate(&self) -> Result<()> {
        let search = &self.search;
        if search.url.is_empty() {
            return Err(Error::Config("search.url is required".into()));
        }
        for (field, value) in [
            ("origin_city", &search.origin_city),
            ("origin_code", &search.origin_code),
            ("destination_city", &search.destination_city),
            ("destination_code", &search.destination_code),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("search.{} is required", field)));
            }
        }

        let t = &self.timeouts;
        for (field, value) in [
            ("popup_ms", t.popup_ms),
            ("element_ms", t.element_ms),
            ("results_ms", t.results_ms),
            ("poll_interval_ms", t.poll_interval_ms),
        ] {
            if value == 0 {
                return Err(Error::Config(format!(
                    "timeouts.{} must be at least 1",
                    field
                )));
            }
        }

        let shortest = t.popup_ms.min(t.element_ms).min(t.results_ms);
        if t.poll_interval_ms >= shortest {
            return Err(Error::Config(format!(
                "timeouts.poll_interval_ms ({}) must be smaller than every timeout ({}ms)",
                t.poll_interval_ms, shortest
            )));
        }

        if self.browser.use_login_session && self.browser.profile_dir.is_none() {
            return Err(Error::Config(
                "browser.use_login_session requires browser.profile_dir".into(),
            ));
        }
        Ok(())
    }
}

/// Browser launch configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BrowserConfig {
    /// Run in headless mode.
    #[serde(default)]
    pub headless: bool,

    /// Reuse the logged-in profile in `profile_dir`.
    #[serde(default)]
    pub use_login_session: bool,

    /// Chrome user data directory.
    pub profile_dir: Option<PathBuf>,
}

impl BrowserConfig {
    /// Session options for the transport. The profile is only used in login mode.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            headless: self.headless,
            profile_dir: if self.use_login_session {
                self.profile_dir.clone()
            } else {
                None
            },
            viewport: Some(Viewport::default()),
        }
    }
}

/// Route and date of the search.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchParams {
    pub url: String,
    pub origin_city: String,
    pub origin_code: String,
    pub destination_city: String,
    pub destination_code: String,
    /// Departure date as an offset from today.
    pub departure_days: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            url: locators::SEARCH_URL.to_string(),
            origin_city: "Delhi".to_string(),
            origin_code: "DEL".to_string(),
            destination_city: "Mumbai".to_string(),
            destination_code: "BOM".to_string(),
            departure_days: 5,
        }
    }
}

/// Wait limits in milliseconds, one per kind of call site.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Timeouts {
    /// Optional overlays such as the login popup.
    pub popup_ms: u64,
    /// Inputs, dropdown options, the calendar and the search button.
    pub element_ms: u64,
    /// The results page.
    pub results_ms: u64,
    /// Pause between two probes of a bounded wait.
    pub poll_interval_ms: u64,
    /// Pause after clicks that open animated widgets. Zero disables it.
    pub settle_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            popup_ms: 5_000,
            element_ms: 10_000,
            results_ms: 30_000,
            poll_interval_ms: 250,
            settle_ms: 1000,
        }
    }
}

impl Timeouts {
    pub fn popup(&self) -> Duration {
        Duration::from_millis(self.popup_ms)
    }

    pub fn element(&self) -> Duration {
        Duration::from_millis(self.element_ms)
    }

    pub fn results(&self) -> Duration {
        Duration::from_millis(self.results_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Screenshot output.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub dir: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("screenshots"),
        }
    }
}
