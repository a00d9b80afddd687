use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::SkillsConfig;
use crate::error::{Error, Result};

use super::SkillInstaller;

/// Shells out to the skill registry CLI: `clawhub install <name>`,
/// run inside the tenant workspace so the skill lands next to the
/// daemon's config.
pub struct ClawHubInstaller {
    binary: String,
    timeout: Duration,
}

impl ClawHubInstaller {
    pub fn new(config: &SkillsConfig) -> Self {
        Self {
            binary: config.installer_binary.clone(),
            timeout: Duration::from_secs(config.install_timeout_secs),
        }
    }
}

#[async_trait]
impl SkillInstaller for ClawHubInstaller {
    async fn install(&self, workspace_dir: &Path, skill: &str) -> Result<()> {
        let fut = Command::new(&self.binary)
            .arg("install")
            .arg(skill)
            .current_dir(workspace_dir)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, fut).await {
            Err(_) => {
                return Err(Error::SkillInstall(format!(
                    "{skill}: install timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
            Ok(Err(e)) => {
                return Err(Error::SkillInstall(format!(
                    "{skill}: {} failed to spawn: {e}",
                    self.binary
                )))
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            return Err(Error::SkillInstall(format!(
                "{skill}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }
}
