//! Process supervision over an external process manager.
//!
//! The gateway never babysits daemons itself; crash restarts and log
//! capture belong to the process manager. This module reconciles the
//! declared desire "this tenant's daemon runs with current config"
//! against live process state, re-querying the manager on every call
//! so no cached view can drift.

pub mod pm2;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::FleetConfig;
use crate::error::Result;
use crate::ident;
use crate::trace::TraceEvent;
use crate::workspace::store::CONFIG_FILE;

// ── Process manager seam ───────────────────────────────────────────

/// One process as reported by the manager.
#[derive(Debug, Clone)]
pub struct ProcessInfo {
    pub name: String,
    pub status: String,
    pub pid: Option<u32>,
    pub uptime_secs: Option<u64>,
    pub restarts: Option<u32>,
}

/// A long-running registration handed to the manager.
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    pub name: String,
    pub binary: String,
    pub args: Vec<String>,
    pub cwd: std::path::PathBuf,
}

/// Narrow interface over the external process manager so the CLI
/// implementation can be swapped without touching the lifecycle API.
#[async_trait]
pub trait ProcessManager: Send + Sync {
    async fn list(&self) -> Result<Vec<ProcessInfo>>;

    async fn start(&self, spec: &ProcessSpec) -> Result<()>;

    /// Remove a registration. Deleting an unknown name is success.
    async fn delete(&self, name: &str) -> Result<()>;
}

// ── Supervisor ─────────────────────────────────────────────────────

/// Live status of one tenant's daemon as observed through the manager.
#[derive(Debug, Clone)]
pub struct AgentProcessStatus {
    pub running: bool,
    pub status: String,
    pub pid: Option<u32>,
    pub uptime_secs: Option<u64>,
    pub restarts: Option<u32>,
}

impl AgentProcessStatus {
    fn not_running(status: &str) -> Self {
        Self {
            running: false,
            status: status.to_string(),
            pid: None,
            uptime_secs: None,
            restarts: None,
        }
    }
}

pub struct Supervisor {
    manager: Arc<dyn ProcessManager>,
    fleet: FleetConfig,
}

impl Supervisor {
    pub fn new(manager: Arc<dyn ProcessManager>, fleet: FleetConfig) -> Self {
        Self { manager, fleet }
    }

    /// Derived process name: `<prefix>-<sanitized-user-id>`.
    pub fn process_name(&self, user_id: &str) -> String {
        format!("{}-{}", self.fleet.process_prefix, ident::sanitize(user_id))
    }

    /// Find this tenant's daemon in the manager's process list.
    ///
    /// Absent processes and an unreachable manager both answer
    /// not-running: the status surface stays available even when the
    /// manager is down, at the cost of strict accuracy.
    pub async fn status(&self, user_id: &str) -> AgentProcessStatus {
        let name = self.process_name(user_id);

        let processes = match self.manager.list().await {
            Ok(processes) => processes,
            Err(e) => {
                TraceEvent::SupervisorDegraded {
                    error: e.to_string(),
                }
                .emit();
                return AgentProcessStatus::not_running("unknown");
            }
        };

        match processes.into_iter().find(|p| p.name == name) {
            Some(p) => AgentProcessStatus {
                running: p.status == "online",
                status: p.status,
                pid: p.pid,
                uptime_secs: p.uptime_secs,
                restarts: p.restarts,
            },
            None => AgentProcessStatus::not_running("not_running"),
        }
    }

    /// Stop-then-start reconciliation.
    ///
    /// Removing the old registration first guarantees the daemon comes
    /// back with freshly written configuration; the brief downtime
    /// window per reconfigure is accepted.
    pub async fn start(&self, user_id: &str, workspace_dir: &Path) -> Result<()> {
        let name = self.process_name(user_id);

        self.manager.delete(&name).await?;

        let mut args = self.fleet.daemon_args.clone();
        args.push("--config".into());
        args.push(workspace_dir.join(CONFIG_FILE).display().to_string());

        let spec = ProcessSpec {
            name: name.clone(),
            binary: self.fleet.daemon_binary.clone(),
            args,
            cwd: workspace_dir.to_path_buf(),
        };

        self.manager.start(&spec).await?;
        tracing::info!(process = %name, dir = %workspace_dir.display(), "agent process started");
        Ok(())
    }

    /// Remove the registration; a non-running agent is not an error.
    pub async fn stop(&self, user_id: &str) -> Result<()> {
        let name = self.process_name(user_id);
        self.manager.delete(&name).await?;

        TraceEvent::AgentStopped {
            user_id: user_id.to_string(),
            process_name: name,
        }
        .emit();
        Ok(())
    }
}
