use serde::Serialize;

/// Structured trace events emitted during agent lifecycle operations.
/// These integrate with the `tracing` crate and are machine-parseable.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    /// Emitted after a create/update request finished writing the workspace
    /// and handed the daemon to the process manager.
    AgentDeployed {
        user_id: String,
        process_name: String,
        providers: usize,
        telegram: bool,
    },

    /// Emitted when a daemon registration is removed.
    AgentStopped { user_id: String, process_name: String },

    /// Emitted when a persona write was skipped because the request
    /// carried no persona text (the previous one is retained).
    SoulWriteSkipped { user_id: String },

    /// Emitted when a best-effort skill install fails.
    SkillInstallFailed {
        user_id: String,
        skill: String,
        error: String,
    },

    /// Emitted when the process manager could not be queried and the
    /// status endpoint degraded to a not-running answer.
    SupervisorDegraded { error: String },

    /// Emitted after usage artifacts were aggregated for a tenant.
    UsageRead {
        user_id: String,
        tokens_used: u64,
        active_days: usize,
    },
}

impl TraceEvent {
    /// Emit this event as a tracing span event.
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "clawhost_event");
    }
}
