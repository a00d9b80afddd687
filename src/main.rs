use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use clawhost::api;
use clawhost::config::Config;
use clawhost::skills::ClawHubInstaller;
use clawhost::supervisor::pm2::Pm2Manager;
use clawhost::supervisor::Supervisor;
use clawhost::workspace::store::WorkspaceStore;
use clawhost::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Tracing ────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("clawhost=info,tower_http=info")),
        )
        .json()
        .init();

    tracing::info!("clawhost starting");

    // ── Config ─────────────────────────────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".into());

    let config = Config::load_or_default(&config_path).apply_env();

    if config.auth.token.is_empty() {
        tracing::warn!(
            "no operator token configured (CLAWHOST_API_TOKEN); all lifecycle requests will be rejected"
        );
    }

    tracing::info!(
        agents_dir = %config.fleet.agents_dir.display(),
        process_prefix = %config.fleet.process_prefix,
        process_manager = %config.process_manager.binary,
        port = config.server.port,
        "configuration loaded"
    );

    let config = Arc::new(config);

    // ── Workspace store ────────────────────────────────────────────
    let workspace = Arc::new(WorkspaceStore::new(config.fleet.agents_dir.clone()));
    std::fs::create_dir_all(workspace.root())?;

    // ── Process supervisor ─────────────────────────────────────────
    let manager = Arc::new(Pm2Manager::new(&config.process_manager));
    let supervisor = Arc::new(Supervisor::new(manager, config.fleet.clone()));

    // ── Skill installer ────────────────────────────────────────────
    let installer = Arc::new(ClawHubInstaller::new(&config.skills));

    // ── App state ──────────────────────────────────────────────────
    let state = AppState {
        config: config.clone(),
        workspace,
        supervisor,
        installer,
        started_at: Instant::now(),
    };

    // ── Router ─────────────────────────────────────────────────────
    let app = api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // ── Server ─────────────────────────────────────────────────────
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
