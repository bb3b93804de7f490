use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

pub mod models;
use models::FixtureId;

/// Single-slot, file-backed store for the fixture being tracked.
///
/// A fixture id on disk means the next run polls that match; an empty or
/// missing file means the next run looks for today's fixture. There is no
/// locking: only one run is expected at a time.
#[derive(Debug, Clone)]
pub struct FixtureStore {
    path: PathBuf,
}

impl FixtureStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FixtureStore { path: path.into() }
    }

    /// Read the stored fixture id, if any
    pub async fn load(&self) -> Result<Option<FixtureId>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No state file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read state file {}", self.path.display()))
            }
        };
        Ok(raw
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(FixtureId::new))
    }

    pub async fn save(&self, id: &FixtureId) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&self.path, id.as_str())
            .await
            .with_context(|| format!("Failed to write state file {}", self.path.display()))
    }

    /// Truncate the state file so the next run goes back to discovery
    pub async fn clear(&self) -> Result<()> {
        tokio::fs::write(&self.path, "")
            .await
            .with_context(|| format!("Failed to clear state file {}", self.path.display()))
    }
}

#[cfg(test)]
pub(crate) fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("goal-light-{}-{}", std::process::id(), name))
}
