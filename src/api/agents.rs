use axum::extract::{Path, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::synthesis::{synthesize, SynthesisInput};
use crate::trace::TraceEvent;
use crate::workspace::usage;
use crate::AppState;

// ── Request / response shapes ──────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub telegram_bot_token: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub minimax_api_key: Option<String>,
    #[serde(default)]
    pub minimax_base_url: Option<String>,
    #[serde(default)]
    pub soul_md: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub using_platform_key: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub user_id: String,
    pub configured: bool,
    pub has_soul: bool,
    pub running: bool,
    pub status: String,
    pub process_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restarts: Option<u32>,
}

// ── Handlers ───────────────────────────────────────────────────────

/// POST /api/agents
///
/// Create or update a tenant's agent: write the workspace, install
/// requested skills (best-effort), then hand the daemon to the process
/// manager. Only a failed process start fails the request.
pub async fn deploy(
    State(state): State<AppState>,
    Json(req): Json<DeployRequest>,
) -> Result<Json<Value>> {
    let user_id = match req.user_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return Err(Error::Validation("userId is required".into())),
    };

    let workspace_dir = state.workspace.ensure(&user_id)?;

    let input = SynthesisInput {
        user_id: user_id.clone(),
        telegram_bot_token: req.telegram_bot_token,
        minimax_api_key: req.minimax_api_key,
        minimax_base_url: req.minimax_base_url,
        anthropic_api_key: req.anthropic_api_key,
        openai_api_key: req.openai_api_key,
        using_platform_key: req.using_platform_key,
    };
    let config = synthesize(&input, &state.config.heartbeat, &workspace_dir);

    if config.models.default.is_none() {
        // Signaled precondition failure: the daemon will fail fast or run
        // degraded without a provider credential. Deployment proceeds.
        tracing::warn!(%user_id, "deploying agent without any model credential");
    }

    state.workspace.write_config(&user_id, &config)?;

    match state
        .workspace
        .write_soul(&user_id, req.soul_md.as_deref().unwrap_or(""))
    {
        Ok(true) => {}
        Ok(false) => TraceEvent::SoulWriteSkipped {
            user_id: user_id.clone(),
        }
        .emit(),
        Err(e) => tracing::warn!(%user_id, error = %e, "persona write failed, continuing"),
    }

    for skill in &req.skills {
        if let Err(e) = state.installer.install(&workspace_dir, skill).await {
            TraceEvent::SkillInstallFailed {
                user_id: user_id.clone(),
                skill: skill.clone(),
                error: e.to_string(),
            }
            .emit();
        }
    }

    state.supervisor.start(&user_id, &workspace_dir).await?;

    TraceEvent::AgentDeployed {
        user_id: user_id.clone(),
        process_name: state.supervisor.process_name(&user_id),
        providers: config.models.providers.len(),
        telegram: config.channels.is_some(),
    }
    .emit();

    Ok(Json(json!({
        "ok": true,
        "message": format!("agent deployed for {user_id}"),
    })))
}

/// DELETE /api/agents/:userId
///
/// Stop the daemon; the workspace is retained. Always succeeds:
/// "no longer running" is the only contract that matters here, so a
/// manager hiccup is logged rather than surfaced.
pub async fn remove(State(state): State<AppState>, Path(user_id): Path<String>) -> Json<Value> {
    if let Err(e) = state.supervisor.stop(&user_id).await {
        tracing::warn!(%user_id, error = %e, "stop failed during delete, reporting success anyway");
    }

    Json(json!({ "ok": true }))
}

/// GET /api/agents/:userId
///
/// Workspace and live process state. Unknown tenants answer with an
/// all-false result rather than an error.
pub async fn status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<StatusResponse> {
    let process = state.supervisor.status(&user_id).await;

    Json(StatusResponse {
        configured: state.workspace.config_exists(&user_id),
        has_soul: state.workspace.soul_exists(&user_id),
        running: process.running,
        status: process.status,
        process_name: state.supervisor.process_name(&user_id),
        pid: process.pid,
        uptime: process.uptime_secs,
        restarts: process.restarts,
        user_id,
    })
}

/// POST /api/agents/:userId/restart
///
/// Restart with the already-written configuration; a tenant that was
/// never configured is a 404, not an implicit reconfigure.
pub async fn restart(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>> {
    if !state.workspace.config_exists(&user_id) {
        return Err(Error::NotConfigured(user_id));
    }

    let workspace_dir = state.workspace.dir(&user_id);
    state.supervisor.start(&user_id, &workspace_dir).await?;

    Ok(Json(json!({
        "ok": true,
        "message": format!("agent restarted for {user_id}"),
    })))
}

/// GET /api/agents/:userId/usage
///
/// Best-effort token totals and activity estimate from workspace
/// artifacts; never queries the running process.
pub async fn usage(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>> {
    if !state.workspace.config_exists(&user_id) {
        return Err(Error::NotConfigured(user_id));
    }

    let summary = usage::read(&state.workspace, &user_id);

    TraceEvent::UsageRead {
        user_id: user_id.clone(),
        tokens_used: summary.tokens_used,
        active_days: summary.active_days,
    }
    .emit();

    Ok(Json(json!({
        "userId": user_id,
        "tokensUsed": summary.tokens_used,
        "activeDays": summary.active_days,
    })))
}
