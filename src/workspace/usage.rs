//! Best-effort usage introspection from on-disk workspace artifacts.
//!
//! The daemon writes `sessions.json` (token counters) and drops daily
//! notes under `memory/`. Both are read without any coordination with
//! the possibly-running daemon; the numbers are approximations and
//! every read failure degrades to zero.

use std::collections::HashMap;

use serde::Deserialize;

use crate::workspace::store::WorkspaceStore;

/// Coarse per-tenant usage numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSummary {
    pub tokens_used: u64,
    pub active_days: usize,
}

/// One session entry as the daemon writes it. Unknown fields ignored,
/// missing counters default to zero.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SessionEntry {
    tokens_in: u64,
    tokens_out: u64,
}

/// The daemon has written `sessions.json` both as an ordered list and as
/// a map keyed by session id. Accept either shape and normalize to a
/// list before aggregation; the ambiguity stops here.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SessionsFile {
    List(Vec<SessionEntry>),
    Map(HashMap<String, SessionEntry>),
}

impl SessionsFile {
    fn into_entries(self) -> Vec<SessionEntry> {
        match self {
            SessionsFile::List(entries) => entries,
            SessionsFile::Map(map) => map.into_values().collect(),
        }
    }
}

/// Aggregate usage for one tenant.
pub fn read(store: &WorkspaceStore, user_id: &str) -> UsageSummary {
    UsageSummary {
        tokens_used: tokens_used(store, user_id),
        active_days: active_days(store, user_id),
    }
}

fn tokens_used(store: &WorkspaceStore, user_id: &str) -> u64 {
    let raw = match std::fs::read_to_string(store.sessions_path(user_id)) {
        Ok(raw) => raw,
        Err(_) => return 0,
    };

    let parsed: SessionsFile = match serde_json::from_str(&raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(%user_id, error = %e, "malformed sessions.json, reporting zero usage");
            return 0;
        }
    };

    parsed
        .into_entries()
        .iter()
        .map(|s| s.tokens_in + s.tokens_out)
        .sum()
}

/// Count of `*.md` files in `memory/` as a proxy for days active.
fn active_days(store: &WorkspaceStore, user_id: &str) -> usize {
    let entries = match std::fs::read_dir(store.memory_dir(user_id)) {
        Ok(entries) => entries,
        Err(_) => return 0,
    };

    entries
        .flatten()
        .filter(|e| {
            e.path().extension().and_then(|ext| ext.to_str()) == Some("md")
                && e.path().is_file()
        })
        .count()
}
