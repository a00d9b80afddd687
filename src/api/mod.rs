pub mod agents;
pub mod auth;

use axum::extract::State;
use axum::middleware;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};

use crate::AppState;

/// Build the full API router.
///
/// Everything except `/api/health` sits behind the operator bearer
/// token.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/agents", post(agents::deploy))
        .route(
            "/api/agents/:user_id",
            get(agents::status).delete(agents::remove),
        )
        .route("/api/agents/:user_id/restart", post(agents::restart))
        .route("/api/agents/:user_id/usage", get(agents::usage))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_operator,
        ));

    Router::new()
        .route("/api/health", get(health))
        .merge(protected)
        .with_state(state)
}

/// GET /api/health
///
/// Unauthenticated liveness probe for external monitoring.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "uptime": state.started_at.elapsed().as_secs(),
        "agentsDir": state.config.fleet.agents_dir.display().to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::skills::testing::FakeInstaller;
    use crate::supervisor::testing::FakeManager;
    use crate::supervisor::Supervisor;
    use crate::workspace::store::WorkspaceStore;

    const TOKEN: &str = "op-secret";

    struct Harness {
        _tmp: tempfile::TempDir,
        manager: Arc<FakeManager>,
        installer: Arc<FakeInstaller>,
        state: AppState,
    }

    fn harness() -> Harness {
        let tmp = tempfile::tempdir().unwrap();

        let mut config = Config::default();
        config.auth.token = TOKEN.into();
        config.fleet.agents_dir = tmp.path().to_path_buf();
        let config = Arc::new(config);

        let manager = Arc::new(FakeManager::default());
        let installer = Arc::new(FakeInstaller::default());

        let state = AppState {
            workspace: Arc::new(WorkspaceStore::new(config.fleet.agents_dir.clone())),
            supervisor: Arc::new(Supervisor::new(manager.clone(), config.fleet.clone())),
            installer: installer.clone(),
            started_at: Instant::now(),
            config,
        };

        Harness {
            _tmp: tmp,
            manager,
            installer,
            state,
        }
    }

    async fn send(
        state: &AppState,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn deploy_body(user_id: &str) -> serde_json::Value {
        json!({
            "userId": user_id,
            "minimaxApiKey": "k1",
            "telegramBotToken": "t1",
        })
    }

    // ── Auth ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn health_needs_no_auth() {
        let h = harness();
        let (status, body) = send(&h.state, Method::GET, "/api/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert!(body["agentsDir"].is_string());
    }

    #[tokio::test]
    async fn missing_or_wrong_token_rejected_uniformly() {
        let h = harness();

        let (status, _) = send(&h.state, Method::GET, "/api/agents/u1", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&h.state, Method::GET, "/api/agents/u1", Some("nope"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejected_deploy_has_no_side_effects() {
        let h = harness();

        let (status, _) = send(
            &h.state,
            Method::POST,
            "/api/agents",
            Some("wrong"),
            Some(deploy_body("u1")),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(std::fs::read_dir(h.state.workspace.root())
            .unwrap()
            .next()
            .is_none());
        assert!(h.manager.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn unconfigured_operator_token_fails_closed() {
        let h = harness();
        let mut config = (*h.state.config).clone();
        config.auth.token = String::new();
        let mut state = h.state.clone();
        state.config = Arc::new(config);

        let (status, _) = send(&state, Method::GET, "/api/agents/u1", Some(""), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // ── Deploy ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn deploy_requires_user_id() {
        let h = harness();

        let (status, body) = send(
            &h.state,
            Method::POST,
            "/api/agents",
            Some(TOKEN),
            Some(json!({ "minimaxApiKey": "k1" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "userId is required");
    }

    #[tokio::test]
    async fn deploy_end_to_end() {
        let h = harness();

        let (status, body) = send(
            &h.state,
            Method::POST,
            "/api/agents",
            Some(TOKEN),
            Some(json!({
                "userId": "user-42",
                "minimaxApiKey": "k1",
                "telegramBotToken": "t1",
                "soulMd": "Be helpful.",
                "skills": ["weather"],
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);

        // Workspace written at the sanitized path.
        let dir = h.state.workspace.dir("user-42");
        assert!(dir.join("memory").is_dir());
        assert_eq!(std::fs::read_to_string(dir.join("SOUL.md")).unwrap(), "Be helpful.");

        let config: serde_json::Value =
            serde_json::from_slice(&std::fs::read(dir.join("openclaw.json")).unwrap()).unwrap();
        assert_eq!(config["models"]["default"]["provider"], "minimax");
        assert_eq!(config["channels"]["telegram"]["enabled"], true);

        // Skill installed, process registered under the derived name.
        assert_eq!(*h.installer.installed.lock(), vec!["weather".to_string()]);
        assert_eq!(
            h.manager.running_names(),
            vec!["openclaw-user-42".to_string()]
        );

        // And the follow-up status call sees all of it.
        let (status, body) =
            send(&h.state, Method::GET, "/api/agents/user-42", Some(TOKEN), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["configured"], true);
        assert_eq!(body["hasSoul"], true);
        assert_eq!(body["running"], true);
        assert_eq!(body["processName"], "openclaw-user-42");
        assert!(body["pid"].is_u64());
    }

    #[tokio::test]
    async fn deploy_twice_is_idempotent() {
        let h = harness();

        let (status, _) = send(
            &h.state,
            Method::POST,
            "/api/agents",
            Some(TOKEN),
            Some(deploy_body("u1")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let first = std::fs::read(h.state.workspace.config_path("u1")).unwrap();

        let (status, _) = send(
            &h.state,
            Method::POST,
            "/api/agents",
            Some(TOKEN),
            Some(deploy_body("u1")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let second = std::fs::read(h.state.workspace.config_path("u1")).unwrap();

        assert_eq!(first, second);
        assert_eq!(h.manager.running_names(), vec!["openclaw-u1".to_string()]);
    }

    #[tokio::test]
    async fn omitted_soul_preserves_previous_one() {
        let h = harness();

        let mut body = deploy_body("u1");
        body["soulMd"] = json!("X");
        send(&h.state, Method::POST, "/api/agents", Some(TOKEN), Some(body)).await;

        send(
            &h.state,
            Method::POST,
            "/api/agents",
            Some(TOKEN),
            Some(deploy_body("u1")),
        )
        .await;

        let soul = std::fs::read_to_string(h.state.workspace.soul_path("u1")).unwrap();
        assert_eq!(soul, "X");
    }

    #[tokio::test]
    async fn skill_install_failure_is_swallowed() {
        let h = harness();
        *h.installer.fail.lock() = true;

        let mut body = deploy_body("u1");
        body["skills"] = json!(["weather", "news"]);

        let (status, body) =
            send(&h.state, Method::POST, "/api/agents", Some(TOKEN), Some(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn process_start_failure_is_500() {
        let h = harness();
        *h.manager.fail_start.lock() = true;

        let (status, body) = send(
            &h.state,
            Method::POST,
            "/api/agents",
            Some(TOKEN),
            Some(deploy_body("u1")),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("spawn failed"));

        // The config write preceding the failed start stands; a retry of
        // the same call converges.
        assert!(h.state.workspace.config_exists("u1"));
    }

    // ── Delete ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn delete_is_always_ok_and_creates_nothing() {
        let h = harness();

        let (status, body) =
            send(&h.state, Method::DELETE, "/api/agents/ghost", Some(TOKEN), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert!(!h.state.workspace.dir("ghost").exists());
    }

    #[tokio::test]
    async fn delete_stops_the_process_but_keeps_the_workspace() {
        let h = harness();
        send(
            &h.state,
            Method::POST,
            "/api/agents",
            Some(TOKEN),
            Some(deploy_body("u1")),
        )
        .await;

        let (status, _) =
            send(&h.state, Method::DELETE, "/api/agents/u1", Some(TOKEN), None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(h.manager.running_names().is_empty());
        assert!(h.state.workspace.config_exists("u1"));
    }

    // ── Status ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn status_of_unknown_tenant_is_all_false() {
        let h = harness();

        let (status, body) =
            send(&h.state, Method::GET, "/api/agents/nobody", Some(TOKEN), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["configured"], false);
        assert_eq!(body["hasSoul"], false);
        assert_eq!(body["running"], false);
        assert!(body.get("pid").is_none());
    }

    #[tokio::test]
    async fn configured_but_stopped_reads_as_not_running() {
        let h = harness();
        send(
            &h.state,
            Method::POST,
            "/api/agents",
            Some(TOKEN),
            Some(deploy_body("u1")),
        )
        .await;
        send(&h.state, Method::DELETE, "/api/agents/u1", Some(TOKEN), None).await;

        let (_, body) = send(&h.state, Method::GET, "/api/agents/u1", Some(TOKEN), None).await;
        assert_eq!(body["configured"], true);
        assert_eq!(body["running"], false);
    }

    // ── Restart ────────────────────────────────────────────────────

    #[tokio::test]
    async fn restart_unconfigured_is_404_and_touches_nothing() {
        let h = harness();

        let (status, _) = send(
            &h.state,
            Method::POST,
            "/api/agents/ghost/restart",
            Some(TOKEN),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(h.manager.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn restart_configured_brings_the_process_back() {
        let h = harness();
        send(
            &h.state,
            Method::POST,
            "/api/agents",
            Some(TOKEN),
            Some(deploy_body("u1")),
        )
        .await;
        send(&h.state, Method::DELETE, "/api/agents/u1", Some(TOKEN), None).await;

        let (status, body) = send(
            &h.state,
            Method::POST,
            "/api/agents/u1/restart",
            Some(TOKEN),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(h.manager.running_names(), vec!["openclaw-u1".to_string()]);
    }

    // ── Usage ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn usage_unconfigured_is_404() {
        let h = harness();

        let (status, _) = send(
            &h.state,
            Method::GET,
            "/api/agents/ghost/usage",
            Some(TOKEN),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn usage_reports_tokens_and_active_days() {
        let h = harness();
        send(
            &h.state,
            Method::POST,
            "/api/agents",
            Some(TOKEN),
            Some(deploy_body("u1")),
        )
        .await;

        std::fs::write(
            h.state.workspace.sessions_path("u1"),
            r#"[{"tokensIn":10,"tokensOut":5},{"tokensIn":3,"tokensOut":0}]"#,
        )
        .unwrap();
        std::fs::write(
            h.state.workspace.memory_dir("u1").join("2026-08-06.md"),
            "notes",
        )
        .unwrap();

        let (status, body) = send(
            &h.state,
            Method::GET,
            "/api/agents/u1/usage",
            Some(TOKEN),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userId"], "u1");
        assert_eq!(body["tokensUsed"], 18);
        assert_eq!(body["activeDays"], 1);
    }
}
