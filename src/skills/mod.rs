//! Best-effort skill installation into tenant workspaces.
//!
//! Skills are installable capability modules referenced by name. The
//! lifecycle API treats install failures as advisory: each result is
//! logged and dropped at the call site, never surfaced to the caller.

pub mod installer;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

pub use installer::ClawHubInstaller;

/// Narrow seam over the external skill-install mechanism.
#[async_trait]
pub trait SkillInstaller: Send + Sync {
    async fn install(&self, workspace_dir: &Path, skill: &str) -> Result<()>;
}
