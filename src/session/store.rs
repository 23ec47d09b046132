//! Session persistence
//!
//! The CLI drives one workflow across many invocations, so the session is
//! kept as `session.json` in the workspace between runs.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::SESSION_FILE;
use crate::error::Result;
use crate::session::workflow::Session;

/// Reads and writes a [`Session`] as JSON inside a workspace
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store for the session file in `workspace`
    pub fn new(workspace: &Path) -> Self {
        Self {
            path: workspace.join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session, or a fresh `Empty` one if none was saved
    pub fn load(&self) -> Result<Session> {
        if !self.path.exists() {
            debug!("No session at {}, starting fresh", self.path.display());
            return Ok(Session::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let session = serde_json::from_str(&content)?;
        Ok(session)
    }

    /// Write `session` to disk
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write-then-rename: readers never see a partial file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(session)?)?;
        fs::rename(&tmp, &self.path)?;

        debug!("Saved session {} to {}", session.id, self.path.display());
        Ok(())
    }
}
