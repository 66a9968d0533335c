//! Persistence for the active-host record.
//!
//! `StateFile` provides async load/save using `tokio::task::spawn_blocking`
//! with atomic write (temp file + rename) to prevent state corruption. The
//! file is a single mutable slot — concurrent runs overwrite each other,
//! last write wins.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::HostStateStore;
use crate::domain::host::{ActiveHostsFile, HostRecord, STATE_DIR};

/// State file manager for `~/.dockhost/hosts.json`.
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// Create a state manager using the default path.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(Self::with_path(home.join(STATE_DIR).join("hosts.json")))
    }

    /// Create a state manager with an explicit path (used in tests).
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    fn load_sync(&self) -> Result<Option<HostRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading state file {}", self.path.display()))?;
        let file: ActiveHostsFile = serde_json::from_str(&content)
            .with_context(|| format!("parsing state file {}", self.path.display()))?;
        Ok(file.active_hosts.into_iter().next())
    }

    fn save_sync(&self, record: &HostRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(&ActiveHostsFile::single(record.clone()))
            .context("serializing state")?;

        // Atomic write via temp file then rename.
        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }

        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("finalizing state file {}", self.path.display()))?;
        Ok(())
    }
}

impl HostStateStore for StateFile {
    async fn load(&self) -> Result<Option<HostRecord>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || StateFile::with_path(path).load_sync())
            .await
            .context("state load task panicked")?
    }

    async fn save(&self, record: &HostRecord) -> Result<()> {
        let path = self.path.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || StateFile::with_path(path).save_sync(&record))
            .await
            .context("state save task panicked")?
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
