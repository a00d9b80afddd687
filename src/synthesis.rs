//! Agent configuration synthesis.
//!
//! Pure mapping from a tenant's credentials and preferences to the
//! `openclaw.json` document the daemon reads at startup. No I/O here;
//! the workspace store persists the result.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::HeartbeatConfig;

/// Provider preference order: the first entry with a supplied credential
/// becomes the default. MiniMax is the managed platform provider.
const PROVIDER_PREFERENCE: &[(&str, &str)] = &[
    ("minimax", "MiniMax-M2"),
    ("anthropic", "claude-sonnet-4"),
    ("openai", "gpt-4o"),
];

const TOOLS_PROFILE: &str = "standard";

// ── Document shape ─────────────────────────────────────────────────

/// The declarative configuration document consumed by the agent daemon.
///
/// Serialized to `openclaw.json` in the tenant workspace. `BTreeMap`
/// keeps provider ordering stable so identical inputs serialize to
/// byte-identical documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    pub agent: AgentIdentity,
    pub models: ModelsSection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<ChannelsSection>,
    pub tools: ToolsSection,
    pub heartbeat: HeartbeatSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentIdentity {
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModelsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<ModelRef>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub providers: BTreeMap<String, ProviderEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRef {
    pub provider: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderEntry {
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsSection {
    pub telegram: TelegramChannel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramChannel {
    pub enabled: bool,
    pub bot_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsSection {
    pub profile: String,
    pub workspace_dir: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatSection {
    pub enabled: bool,
    pub interval_minutes: u64,
}

// ── Inputs ─────────────────────────────────────────────────────────

/// Everything the synthesizer needs about one tenant.
///
/// Credentials arrive already decrypted; this layer only places them
/// into the document.
#[derive(Debug, Clone, Default)]
pub struct SynthesisInput {
    pub user_id: String,
    pub telegram_bot_token: Option<String>,
    pub minimax_api_key: Option<String>,
    pub minimax_base_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub using_platform_key: bool,
}

impl SynthesisInput {
    fn credential_for(&self, provider: &str) -> Option<&str> {
        match provider {
            "minimax" => self.minimax_api_key.as_deref(),
            "anthropic" => self.anthropic_api_key.as_deref(),
            "openai" => self.openai_api_key.as_deref(),
            _ => None,
        }
    }
}

// ── Synthesis ──────────────────────────────────────────────────────

/// Build the configuration document for one tenant.
///
/// Every credentialed provider gets a `providers` entry; the first in
/// preference order becomes the default. With no credentials at all the
/// model section stays empty; the daemon (or its caller) enforces that
/// precondition, not this layer.
pub fn synthesize(
    input: &SynthesisInput,
    heartbeat: &HeartbeatConfig,
    workspace_dir: &Path,
) -> AgentConfig {
    let mut models = ModelsSection::default();

    for (provider, model) in PROVIDER_PREFERENCE {
        let Some(key) = input.credential_for(provider) else {
            continue;
        };

        let base_url = match *provider {
            "minimax" => input.minimax_base_url.clone(),
            _ => None,
        };

        models.providers.insert(
            provider.to_string(),
            ProviderEntry {
                api_key: key.to_string(),
                base_url,
                model: model.to_string(),
            },
        );

        if models.default.is_none() {
            models.default = Some(ModelRef {
                provider: provider.to_string(),
                model: model.to_string(),
            });
        }
    }

    // A missing bot token omits the channel section entirely rather than
    // leaving a disabled stub behind.
    let channels = input
        .telegram_bot_token
        .as_ref()
        .map(|token| ChannelsSection {
            telegram: TelegramChannel {
                enabled: true,
                bot_token: token.clone(),
            },
        });

    // Shared platform credentials heartbeat on the slow schedule to bound
    // shared-resource cost; private keys run at full autonomy.
    let interval_minutes = if input.using_platform_key {
        heartbeat.platform_interval_minutes
    } else {
        heartbeat.byok_interval_minutes
    };

    AgentConfig {
        agent: AgentIdentity {
            name: input.user_id.clone(),
            display_name: format!("Agent {}", input.user_id),
        },
        models,
        channels,
        tools: ToolsSection {
            profile: TOOLS_PROFILE.to_string(),
            workspace_dir: workspace_dir.display().to_string(),
        },
        heartbeat: HeartbeatSection {
            enabled: true,
            interval_minutes,
        },
    }
}
