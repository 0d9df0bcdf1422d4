//! SQLite-backed sync settings store (one JSON document per key).

use std::sync::Arc;

use async_trait::async_trait;
use cadence_core::SyncSettingsStore;
use cadence_domain::{CadenceError, Result as DomainResult, SyncSettings};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tokio::task;
use tracing::instrument;

use super::manager::{map_join_error, map_sql_error, DbManager};
use crate::errors::InfraError;

pub struct SqliteSyncSettingsStore {
    db: Arc<DbManager>,
}

impl SqliteSyncSettingsStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Insert or replace the settings stored under `key`.
    #[instrument(skip(self))]
    pub async fn save(&self, key: &str, settings: SyncSettings) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let key = key.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let value = serde_json::to_string(&settings).map_err(InfraError::from)?;
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO sync_settings (key, value_json, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value_json = excluded.value_json,
                     updated_at = excluded.updated_at",
                params![key, value, Utc::now().timestamp()],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl SyncSettingsStore for SqliteSyncSettingsStore {
    #[instrument(skip(self))]
    async fn load(&self, key: &str) -> DomainResult<Option<SyncSettings>> {
        let db = Arc::clone(&self.db);
        let key = key.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<SyncSettings>> {
            let conn = db.get_connection()?;
            let raw: Option<String> = conn
                .query_row(
                    "SELECT value_json FROM sync_settings WHERE key = ?1",
                    [&key],
                    |row| row.get(0),
                )
                .optional()
                .map_err(map_sql_error)?;

            raw.map(|json| {
                serde_json::from_str::<SyncSettings>(&json).map_err(|err| {
                    CadenceError::Config(format!("invalid sync settings under '{key}': {err}"))
                })
            })
            .transpose()
        })
        .await
        .map_err(map_join_error)?
    }
}
