use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Launch configuration for one automation session.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Run without a visible window.
    #[serde(default)]
    pub headless: bool,

    /// Reuse a saved browser profile (cookies, logins) from this directory.
    pub profile_dir: Option<PathBuf>,

    /// Window size.
    pub viewport: Option<Viewport>,
}

impl SessionConfig {
    /// Parse a session config from YAML.
    pub fn parse(yaml: &str) -> Result<Self> {
        let config: SessionConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the config.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref viewport) = self.viewport {
            if viewport.width == 0 || viewport.height == 0 {
                return Err(Error::Config(
                    "viewport width and height must be non-zero".into(),
                ));
            }
        }
        if let Some(ref dir) = self.profile_dir {
            if dir.as_os_str().is_empty() {
                return Err(Error::Config("profile_dir must not be empty".into()));
            }
        }
        Ok(())
    }
}

/// Viewport dimensions.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}
