use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fleet: FleetConfig,
    #[serde(default)]
    pub process_manager: ProcessManagerConfig,
    #[serde(default)]
    pub skills: SkillsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
}

// ── Server ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

// ── Fleet ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Root directory holding one workspace per agent.
    #[serde(default = "default_agents_dir")]
    pub agents_dir: PathBuf,

    /// Prefix for derived process names (`<prefix>-<sanitized-user-id>`).
    #[serde(default = "default_process_prefix")]
    pub process_prefix: String,

    /// The agent daemon binary registered with the process manager.
    #[serde(default = "default_daemon_binary")]
    pub daemon_binary: String,

    /// Arguments passed to the daemon binary ahead of `--config <path>`.
    #[serde(default = "default_daemon_args")]
    pub daemon_args: Vec<String>,
}

// ── Process manager ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessManagerConfig {
    /// Process manager CLI (pm2-compatible list/start/delete semantics).
    #[serde(default = "default_pm_binary")]
    pub binary: String,

    /// Upper bound on any single process-manager invocation.
    #[serde(default = "default_pm_timeout_secs")]
    pub command_timeout_secs: u64,
}

// ── Skills ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillsConfig {
    /// Skill installer CLI, invoked as `<binary> install <name>` in the
    /// tenant workspace.
    #[serde(default = "default_installer_binary")]
    pub installer_binary: String,

    #[serde(default = "default_install_timeout_secs")]
    pub install_timeout_secs: u64,
}

// ── Auth ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared operator secret. Empty means fail closed: every
    /// authenticated route rejects until a token is configured.
    #[serde(default)]
    pub token: String,
}

// ── Heartbeat policy ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    /// Interval for agents running on the shared platform credential.
    #[serde(default = "default_platform_interval_minutes")]
    pub platform_interval_minutes: u64,

    /// Interval for agents that brought their own provider key.
    #[serde(default = "default_byok_interval_minutes")]
    pub byok_interval_minutes: u64,
}

// ── Defaults ───────────────────────────────────────────────────────

fn default_port() -> u16 {
    3100
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_agents_dir() -> PathBuf {
    PathBuf::from("./agents")
}
fn default_process_prefix() -> String {
    "openclaw".into()
}
fn default_daemon_binary() -> String {
    "openclaw".into()
}
fn default_daemon_args() -> Vec<String> {
    vec!["gateway".into()]
}
fn default_pm_binary() -> String {
    "pm2".into()
}
fn default_pm_timeout_secs() -> u64 {
    15
}
fn default_installer_binary() -> String {
    "clawhub".into()
}
fn default_install_timeout_secs() -> u64 {
    60
}
fn default_platform_interval_minutes() -> u64 {
    240
}
fn default_byok_interval_minutes() -> u64 {
    30
}

// ── Default impls ──────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            fleet: FleetConfig::default(),
            process_manager: ProcessManagerConfig::default(),
            skills: SkillsConfig::default(),
            auth: AuthConfig::default(),
            heartbeat: HeartbeatConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            agents_dir: default_agents_dir(),
            process_prefix: default_process_prefix(),
            daemon_binary: default_daemon_binary(),
            daemon_args: default_daemon_args(),
        }
    }
}

impl Default for ProcessManagerConfig {
    fn default() -> Self {
        Self {
            binary: default_pm_binary(),
            command_timeout_secs: default_pm_timeout_secs(),
        }
    }
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            installer_binary: default_installer_binary(),
            install_timeout_secs: default_install_timeout_secs(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
        }
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            platform_interval_minutes: default_platform_interval_minutes(),
            byok_interval_minutes: default_byok_interval_minutes(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults for missing keys.
    pub fn load(path: &str) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from file if it exists, otherwise return defaults.
    pub fn load_or_default(path: &str) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Apply environment overrides for deployment-supplied values.
    ///
    /// `CLAWHOST_API_TOKEN`, `CLAWHOST_AGENTS_DIR` and `CLAWHOST_PORT`
    /// win over whatever the config file says.
    pub fn apply_env(mut self) -> Self {
        if let Ok(token) = std::env::var("CLAWHOST_API_TOKEN") {
            if !token.is_empty() {
                self.auth.token = token;
            }
        }
        if let Ok(dir) = std::env::var("CLAWHOST_AGENTS_DIR") {
            if !dir.is_empty() {
                self.fleet.agents_dir = PathBuf::from(dir);
            }
        }
        if let Ok(port) = std::env::var("CLAWHOST_PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!(%port, "ignoring unparseable CLAWHOST_PORT"),
            }
        }
        self
    }
}
