//! SQLite-backed owner directory.

use std::sync::Arc;

use async_trait::async_trait;
use cadence_core::OwnerDirectory;
use cadence_domain::Result as DomainResult;
use rusqlite::{params, OptionalExtension};
use tokio::task;
use tracing::instrument;

use super::manager::{map_join_error, map_sql_error, DbManager};

/// Resolves owner display names from the `owners` table
pub struct SqliteOwnerDirectory {
    db: Arc<DbManager>,
}

impl SqliteOwnerDirectory {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Insert or rename an owner.
    pub async fn upsert_owner(&self, owner_id: &str, display_name: &str) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let owner_id = owner_id.to_string();
        let display_name = display_name.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO owners (id, display_name) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET display_name = excluded.display_name",
                params![owner_id, display_name],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl OwnerDirectory for SqliteOwnerDirectory {
    #[instrument(skip(self))]
    async fn display_name(&self, owner_id: &str) -> DomainResult<Option<String>> {
        let db = Arc::clone(&self.db);
        let owner_id = owner_id.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<String>> {
            let conn = db.get_connection()?;
            let name: Option<String> = conn
                .query_row("SELECT display_name FROM owners WHERE id = ?1", [&owner_id], |row| {
                    row.get(0)
                })
                .optional()
                .map_err(map_sql_error)?;
            Ok(name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()))
        })
        .await
        .map_err(map_join_error)?
    }
}
