//! # step-runner
//!
//! Drive a remote, asynchronously rendering UI through an ordered list of
//! steps. Every wait is bounded, the first failing step stops the run, and a
//! screenshot is saved for the step that failed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use step_runner::fake::FakeTransport;
//! use step_runner::{Diagnostics, Pipeline, Poller, Session, SessionConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> step_runner::Result<()> {
//! let session: Session<FakeTransport> = Session::open(SessionConfig::default()).await?;
//! let pipeline = Pipeline::new("demo").checkpoint("01_start");
//! let mut diagnostics = Diagnostics::new("screenshots");
//! let result = pipeline.run(session, &mut diagnostics, &Poller::default()).await;
//! println!("Success: {}", result.success());
//! # Ok(())
//! # }
//! ```

mod capture;
mod config;
pub mod fake;
mod pipeline;
mod poller;
mod session;
mod step;
mod transport;

pub use capture::{Artifact, ArtifactKind, Diagnostics};
pub use config::{SessionConfig, Viewport};
pub use pipeline::{FailureCause, Pipeline, PipelineState, RunResult, UNEXPECTED_ERROR_LABEL};
pub use poller::{Polled, Poller, TimedOut, DEFAULT_POLL_INTERVAL};
pub use session::Session;
pub use step::{BoxError, Step, StepContext, StepOutcome};
pub use transport::Transport;

/// Result type for step-runner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the transport, the session or configuration loading.
///
/// Anticipated step failures (an element that never shows up) are not errors;
/// steps report those through [`StepOutcome::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session init error: {0}")]
    SessionInit(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("session already closed")]
    SessionClosed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_minimal_session_config() {
        let config = SessionConfig::parse("{}").unwrap();
        assert!(!config.headless);
        assert!(config.profile_dir.is_none());
        assert!(config.viewport.is_none());
    }

    #[test]
    fn test_parse_session_config() {
        let yaml = r#"
headless: true
profile_dir: "/tmp/chrome-profile"
viewport:
  width: 1920
  height: 1080
"#;
        let config = SessionConfig::parse(yaml).unwrap();
        assert!(config.headless);
        assert_eq!(config.profile_dir, Some(PathBuf::from("/tmp/chrome-profile")));
        let viewport = config.viewport.unwrap();
        assert_eq!(viewport.width, 1920);
        assert_eq!(viewport.height, 1080);
    }

    #[test]
    fn test_validation_zero_viewport() {
        let yaml = r#"
viewport:
  width: 0
  height: 720
"#;
        let result = SessionConfig::parse(yaml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("viewport"));
    }

    #[test]
    fn test_error_display() {
        let err = Error::SessionInit("chrome not found".into());
        assert_eq!(err.to_string(), "session init error: chrome not found");
        assert_eq!(Error::SessionClosed.to_string(), "session already closed");
    }
}
