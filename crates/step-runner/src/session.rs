use crate::config::SessionConfig;
use crate::transport::Transport;
use crate::{Error, Result};
use std::path::Path;
use tracing::{debug, info, warn};

/// One open browser session.
///
/// A session is closed by consuming it with [`Session::close`], so it cannot
/// be closed twice or used after closing.
pub struct Session<T: Transport> {
    transport: T,
    config: SessionConfig,
    open: bool,
}

impl<T: Transport> Session<T> {
    /// Launch a transport for `config`.
    pub async fn open(config: SessionConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::SessionInit(e.to_string()))?;
        if let Some(ref dir) = config.profile_dir {
            prepare_profile_dir(dir)?;
            info!("Using browser profile from: {}", dir.display());
        }

        debug!(
            "Launching browser (headless: {}, profile: {:?})",
            config.headless, config.profile_dir
        );
        let transport = T::launch(&config).await.map_err(|e| match e {
            Error::SessionInit(msg) => Error::SessionInit(msg),
            other => Error::SessionInit(other.to_string()),
        })?;

        Ok(Self::with_transport(config, transport))
    }

    /// Wrap a transport that is already running.
    pub fn with_transport(config: SessionConfig, transport: T) -> Self {
        Self {
            transport,
            config,
            open: true,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Close the underlying transport.
    pub async fn close(mut self) -> Result<()> {
        if !self.open {
            return Err(Error::SessionClosed);
        }
        self.open = false;
        debug!("Closing browser session");
        self.transport.close().await
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        if self.open {
            warn!("browser session dropped without close; the browser process may leak");
        }
    }
}

/// Create the profile directory if needed; reject paths that are not directories.
fn prepare_profile_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        if !dir.is_dir() {
            return Err(Error::SessionInit(format!(
                "profile path '{}' is not a directory",
                dir.display()
            )));
        }
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|e| {
        Error::SessionInit(format!(
            "cannot create profile directory '{}': {}",
            dir.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeTransport;

    #[tokio::test]
    async fn test_open_and_close() {
        let session: Session<FakeTransport> = Session::open(SessionConfig::default())
            .await
            .unwrap();
        let fake = session.transport().clone();
        assert!(session.is_open());

        session.close().await.unwrap();
        assert_eq!(fake.close_count(), 1);
    }

    #[tokio::test]
    async fn test_open_creates_profile_dir() {
        let temp = tempfile::tempdir().unwrap();
        let profile = temp.path().join("profile");
        let config = SessionConfig {
            profile_dir: Some(profile.clone()),
            ..Default::default()
        };

        let session: Session<FakeTransport> = Session::open(config).await.unwrap();
        assert!(profile.is_dir());
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_rejects_file_as_profile() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();
        let config = SessionConfig {
            profile_dir: Some(file),
            ..Default::default()
        };

        let result: Result<Session<FakeTransport>> = Session::open(config).await;
        assert!(matches!(result, Err(Error::SessionInit(_))));
    }

    /// Transport whose browser binary is never found.
    struct Unlaunchable;

    #[async_trait::async_trait]
    impl Transport for Unlaunchable {
        type Element = ();

        async fn launch(_config: &SessionConfig) -> Result<Self> {
            Err(Error::Transport("failed to launch: browser binary missing".into()))
        }
        async fn navigate(&self, _url: &str) -> Result<()> {
            unreachable!()
        }
        async fn find_element(&self, _locator: &str) -> Result<Option<()>> {
            unreachable!()
        }
        async fn find_all(&self, _locator: &str) -> Result<Vec<()>> {
            unreachable!()
        }
        async fn click(&self, _element: &()) -> Result<()> {
            unreachable!()
        }
        async fn clear(&self, _element: &()) -> Result<()> {
            unreachable!()
        }
        async fn type_text(&self, _element: &(), _text: &str) -> Result<()> {
            unreachable!()
        }
        async fn is_interactive(&self, _element: &()) -> Result<bool> {
            unreachable!()
        }
        async fn capture_visual(&self) -> Result<Vec<u8>> {
            unreachable!()
        }
        async fn close(&mut self) -> Result<()> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn test_launch_failure_is_session_init() {
        let result: Result<Session<Unlaunchable>> = Session::open(SessionConfig::default()).await;
        let err = result.err().unwrap();
        assert!(matches!(err, Error::SessionInit(_)));
        assert!(err.to_string().contains("browser binary missing"));
    }
}
