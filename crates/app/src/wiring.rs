//! Builds the adapter graph behind the reconciliation service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use cadence_core::{ReconcileOptions, ReconcileService};
use cadence_domain::Config;
use cadence_infra::http::HttpClient;
use cadence_infra::{
    token_provider_from_config, DbManager, GoogleCalendarGateway, SqliteAppointmentRepository,
    SqliteOwnerDirectory, SqliteSyncSettingsStore,
};
use tracing::debug;

/// Database-backed stores, schema applied.
pub struct Stores {
    pub db: Arc<DbManager>,
    pub settings: Arc<SqliteSyncSettingsStore>,
    pub owners: Arc<SqliteOwnerDirectory>,
}

impl Stores {
    pub fn open(config: &Config) -> anyhow::Result<Self> {
        let db = DbManager::new(&config.database.path, config.database.pool_size)
            .with_context(|| format!("failed to open database at {}", config.database.path))?;
        db.run_migrations().context("failed to apply database schema")?;
        let db = Arc::new(db);

        Ok(Self {
            settings: Arc::new(SqliteSyncSettingsStore::new(db.clone())),
            owners: Arc::new(SqliteOwnerDirectory::new(db.clone())),
            db,
        })
    }
}

/// Everything a sync run needs.
pub struct Stack {
    pub service: Arc<ReconcileService>,
}

impl Stack {
    pub fn build(config: &Config) -> anyhow::Result<Self> {
        let stores = Stores::open(config)?;
        let appointments = Arc::new(SqliteAppointmentRepository::new(stores.db.clone()));

        let gateway = GoogleCalendarGateway::from_config(&config.calendar)
            .context("failed to build calendar gateway")?;
        let token_http = HttpClient::builder()
            .timeout(Duration::from_secs(config.calendar.request_timeout_secs))
            .build()
            .context("failed to build token HTTP client")?;
        let tokens = token_provider_from_config(&config.calendar, token_http)
            .context("calendar credentials are not configured")?;

        let service = ReconcileService::new(
            tokens,
            appointments,
            stores.settings,
            stores.owners,
            Arc::new(gateway),
        )
        .with_options(ReconcileOptions::from_config(config));

        debug!(
            calendar_id = %config.calendar.calendar_id,
            provider = %config.calendar.provider,
            "Reconcile service wired"
        );
        Ok(Self { service: Arc::new(service) })
    }
}
