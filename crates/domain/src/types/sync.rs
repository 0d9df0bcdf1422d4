//! Sync settings and run summary types

use serde::{Deserialize, Serialize};

/// Persisted sync toggles, read once per run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    pub enabled: bool,
    #[serde(default)]
    pub bidirectional: bool,
    #[serde(default)]
    pub auto_create_meeting_link: bool,
}

/// Outcome of one reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub pushed: usize,
    pub imported: usize,
    pub updated: usize,
    /// External events that could not be synced (cancelled, no start).
    pub skipped: usize,
    /// Items whose push or pull write failed.
    pub failed: usize,
    pub message: String,
}
