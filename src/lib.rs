pub mod api;
pub mod config;
pub mod error;
pub mod ident;
pub mod skills;
pub mod supervisor;
pub mod synthesis;
pub mod trace;
pub mod workspace;

use std::sync::Arc;
use std::time::Instant;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub workspace: Arc<workspace::store::WorkspaceStore>,
    pub supervisor: Arc<supervisor::Supervisor>,
    pub installer: Arc<dyn skills::SkillInstaller>,
    pub started_at: Instant,
}
