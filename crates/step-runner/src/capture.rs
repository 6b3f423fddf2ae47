use crate::session::Session;
use crate::transport::Transport;
use crate::Result;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Why a screenshot was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Fixed milestone, taken whatever the outcome.
    Checkpoint,
    /// Taken because something failed.
    Failure,
}

/// A saved screenshot.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    pub label: String,
    pub kind: ArtifactKind,
    pub timestamp: DateTime<Local>,
    pub path: PathBuf,
}

/// Writes screenshots to a directory and remembers them in order.
///
/// Files are never removed; retention is left to whoever owns the directory.
#[derive(Debug)]
pub struct Diagnostics {
    dir: PathBuf,
    artifacts: Vec<Artifact>,
}

impl Diagnostics {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            artifacts: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every artifact captured so far.
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Save a screenshot named `{label}_{YYYYMMDD_HHMMSS}.png`.
    pub async fn capture<T: Transport>(
        &mut self,
        session: &Session<T>,
        label: &str,
        kind: ArtifactKind,
    ) -> Result<Artifact> {
        let data = session.transport().capture_visual().await?;

        let timestamp = Local::now();
        let label = sanitize_label(label);
        let path = self
            .dir
            .join(format!("{}_{}.png", label, timestamp.format("%Y%m%d_%H%M%S")));

        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(&path, data)?;
        info!("Screenshot saved: {}", path.display());

        let artifact = Artifact {
            label,
            kind,
            timestamp,
            path,
        };
        self.artifacts.push(artifact.clone());
        Ok(artifact)
    }

    /// Like [`capture`](Self::capture), but a failed screenshot is only logged.
    pub async fn try_capture<T: Transport>(
        &mut self,
        session: &Session<T>,
        label: &str,
        kind: ArtifactKind,
    ) -> Option<Artifact> {
        match self.capture(session, label, kind).await {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                warn!("Failed to save screenshot '{}': {}", label, e);
                None
            }
        }
    }
}

/// Keep labels usable as file name components.
fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "capture".to_string()
    } else {
        cleaned
    }
}
