use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::ident;
use crate::synthesis::AgentConfig;

/// Filename of the declarative daemon configuration inside a workspace.
pub const CONFIG_FILE: &str = "openclaw.json";

/// Filename of the optional persona document.
pub const SOUL_FILE: &str = "SOUL.md";

/// Filename of the daemon-written session/token counters.
pub const SESSIONS_FILE: &str = "sessions.json";

/// One directory per tenant under a configured root.
///
/// The store owns the deterministic id → directory mapping and all
/// writes into it; the `memory/` subdirectory belongs to the running
/// daemon and is only ever read back for usage estimation.
pub struct WorkspaceStore {
    root: PathBuf,
}

impl WorkspaceStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Workspace directory for a tenant (not created by this call).
    pub fn dir(&self, user_id: &str) -> PathBuf {
        self.root.join(ident::sanitize(user_id))
    }

    pub fn config_path(&self, user_id: &str) -> PathBuf {
        self.dir(user_id).join(CONFIG_FILE)
    }

    pub fn soul_path(&self, user_id: &str) -> PathBuf {
        self.dir(user_id).join(SOUL_FILE)
    }

    pub fn sessions_path(&self, user_id: &str) -> PathBuf {
        self.dir(user_id).join(SESSIONS_FILE)
    }

    pub fn memory_dir(&self, user_id: &str) -> PathBuf {
        self.dir(user_id).join("memory")
    }

    pub fn config_exists(&self, user_id: &str) -> bool {
        self.config_path(user_id).exists()
    }

    pub fn soul_exists(&self, user_id: &str) -> bool {
        self.soul_path(user_id).exists()
    }

    /// Create the workspace (and its `memory/` subdirectory) if absent.
    ///
    /// Succeeds silently when the directories already exist.
    pub fn ensure(&self, user_id: &str) -> Result<PathBuf> {
        let dir = self.dir(user_id);
        std::fs::create_dir_all(dir.join("memory"))?;
        Ok(dir)
    }

    /// Serialize the configuration document, overwriting any previous one.
    ///
    /// A running daemon keeps its old config until the next restart.
    pub fn write_config(&self, user_id: &str, config: &AgentConfig) -> Result<()> {
        let json = serde_json::to_vec_pretty(config)?;
        std::fs::write(self.config_path(user_id), json)?;
        Ok(())
    }

    /// Write persona text, skipping empty input so a previously set
    /// persona survives a reconfigure that omits it.
    ///
    /// Returns `true` when something was written, `false` on skip.
    pub fn write_soul(&self, user_id: &str, text: &str) -> Result<bool> {
        if text.trim().is_empty() {
            return Ok(false);
        }
        std::fs::write(self.soul_path(user_id), text)?;
        Ok(true)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
