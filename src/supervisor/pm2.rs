//! pm2-backed [`ProcessManager`].
//!
//! Shells out to the pm2 CLI: `jlist` for the process table, `start`
//! with `--name`/`--cwd` for registration, `delete` for removal. pm2
//! itself owns crash restarts and log files.

use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::config::ProcessManagerConfig;
use crate::error::{Error, Result};

use super::{ProcessInfo, ProcessManager, ProcessSpec};

/// Cap on diagnostic text surfaced to API callers.
const DIAG_CAP: usize = 400;

pub struct Pm2Manager {
    binary: String,
    timeout: Duration,
}

impl Pm2Manager {
    pub fn new(config: &ProcessManagerConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            timeout: Duration::from_secs(config.command_timeout_secs),
        }
    }

    /// Run one pm2 invocation, bounded by the configured timeout.
    ///
    /// A hung pm2 daemon fails this call only, never the gateway.
    async fn run(&self, args: &[&str]) -> Result<Output> {
        let invocation = format!("{} {}", self.binary, args.join(" "));

        let fut = Command::new(&self.binary)
            .args(args)
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.timeout, fut).await {
            Err(_) => Err(Error::Supervisor(format!(
                "`{invocation}` timed out after {}s",
                self.timeout.as_secs()
            ))),
            Ok(Err(e)) => Err(Error::Supervisor(format!("`{invocation}` failed to spawn: {e}"))),
            Ok(Ok(output)) => Ok(output),
        }
    }
}

#[async_trait]
impl ProcessManager for Pm2Manager {
    async fn list(&self) -> Result<Vec<ProcessInfo>> {
        let output = self.run(&["jlist"]).await?;

        if !output.status.success() {
            return Err(Error::Supervisor(format!(
                "pm2 jlist failed: {}",
                truncate_diag(&String::from_utf8_lossy(&output.stderr))
            )));
        }

        parse_jlist(&String::from_utf8_lossy(&output.stdout))
    }

    async fn start(&self, spec: &ProcessSpec) -> Result<()> {
        let cwd = spec.cwd.display().to_string();
        let mut args = vec![
            "start",
            spec.binary.as_str(),
            "--name",
            spec.name.as_str(),
            "--cwd",
            cwd.as_str(),
            "--",
        ];
        args.extend(spec.args.iter().map(String::as_str));

        let output = self.run(&args).await?;

        if !output.status.success() {
            let mut diag = String::from_utf8_lossy(&output.stderr).into_owned();
            if diag.trim().is_empty() {
                diag = String::from_utf8_lossy(&output.stdout).into_owned();
            }
            return Err(Error::Supervisor(format!(
                "pm2 start {} failed: {}",
                spec.name,
                truncate_diag(&diag)
            )));
        }

        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let output = self.run(&["delete", name]).await?;

        if output.status.success() {
            return Ok(());
        }

        // pm2 exits non-zero for an unknown name; that is our success
        // case for stop/reconcile.
        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stderr),
            String::from_utf8_lossy(&output.stdout)
        );
        if combined.to_lowercase().contains("not found") {
            return Ok(());
        }

        Err(Error::Supervisor(format!(
            "pm2 delete {name} failed: {}",
            truncate_diag(&combined)
        )))
    }
}

// ── jlist parsing ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Pm2Process {
    name: String,
    #[serde(default)]
    pid: Option<u32>,
    #[serde(default)]
    pm2_env: Pm2Env,
}

#[derive(Debug, Default, Deserialize)]
struct Pm2Env {
    #[serde(default)]
    status: Option<String>,
    /// Start timestamp in epoch milliseconds.
    #[serde(default)]
    pm_uptime: Option<i64>,
    #[serde(default)]
    restart_time: Option<u32>,
}

fn parse_jlist(raw: &str) -> Result<Vec<ProcessInfo>> {
    let processes: Vec<Pm2Process> = serde_json::from_str(raw.trim())
        .map_err(|e| Error::Supervisor(format!("unparseable pm2 jlist output: {e}")))?;

    let now_ms = chrono::Utc::now().timestamp_millis();

    Ok(processes
        .into_iter()
        .map(|p| {
            let status = p.pm2_env.status.unwrap_or_else(|| "unknown".into());

            let uptime_secs = match (status.as_str(), p.pm2_env.pm_uptime) {
                ("online", Some(started_ms)) => {
                    Some(((now_ms - started_ms).max(0) / 1000) as u64)
                }
                _ => None,
            };

            ProcessInfo {
                name: p.name,
                // pm2 reports pid 0 for stopped processes
                pid: p.pid.filter(|&pid| pid != 0),
                status,
                uptime_secs,
                restarts: p.pm2_env.restart_time,
            }
        })
        .collect())
}

fn truncate_diag(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(DIAG_CAP) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
