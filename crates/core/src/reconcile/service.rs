//! Calendar reconciliation service - orchestrates one sync run

use std::sync::Arc;

use cadence_domain::constants::{DEFAULT_CALENDAR_PROVIDER, SYNC_SETTINGS_KEY};
use cadence_domain::{Config, RunSummary, SyncSettings, SyncWindowConfig};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::error::ReconcileError;
use super::gate;
use super::ports::{AppointmentRepository, OwnerDirectory, SyncSettingsStore};
use super::pull::PullPhase;
use super::push::PushPhase;
use super::summary::RunTally;
use crate::calendar_ports::{CalendarGateway, TokenProvider};

/// Tunables for a reconciliation run
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Provider name handed to the token provider
    pub provider: String,
    /// Zone attached to pushed events whose appointment has none
    pub default_time_zone: String,
    pub windows: SyncWindowConfig,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            provider: DEFAULT_CALENDAR_PROVIDER.to_string(),
            default_time_zone: "UTC".to_string(),
            windows: SyncWindowConfig::default(),
        }
    }
}

impl ReconcileOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            provider: config.calendar.provider.clone(),
            default_time_zone: config.calendar.time_zone.clone(),
            windows: config.windows,
        }
    }
}

/// Calendar reconciliation service
///
/// Pushes unlinked internal appointments to the calendar, then (when
/// bidirectional sync is on) pulls calendar events back. All calls are
/// awaited one at a time; each push commits its linkage before the next item
/// starts.
pub struct ReconcileService {
    tokens: Arc<dyn TokenProvider>,
    appointments: Arc<dyn AppointmentRepository>,
    settings: Arc<dyn SyncSettingsStore>,
    owners: Arc<dyn OwnerDirectory>,
    calendar: Arc<dyn CalendarGateway>,
    options: ReconcileOptions,
    /// Held for a whole run; two runs never overlap within one service.
    run_lock: Mutex<()>,
}

impl ReconcileService {
    /// Create a new reconciliation service with default options
    pub fn new(
        tokens: Arc<dyn TokenProvider>,
        appointments: Arc<dyn AppointmentRepository>,
        settings: Arc<dyn SyncSettingsStore>,
        owners: Arc<dyn OwnerDirectory>,
        calendar: Arc<dyn CalendarGateway>,
    ) -> Self {
        Self {
            tokens,
            appointments,
            settings,
            owners,
            calendar,
            options: ReconcileOptions::default(),
            run_lock: Mutex::new(()),
        }
    }

    /// Override run options
    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Run one sync pass against the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::SyncDisabled`] when sync is off and `force`
    /// is false, and [`ReconcileError::AuthenticationFailed`] when no access
    /// token can be obtained. Every other failure is folded into the summary.
    pub async fn run_sync(&self, force: bool) -> Result<RunSummary, ReconcileError> {
        self.run_sync_at(force, Utc::now()).await
    }

    /// Run one sync pass with windows anchored at `now`
    #[instrument(skip(self), fields(provider = %self.options.provider))]
    pub async fn run_sync_at(
        &self,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<RunSummary, ReconcileError> {
        let _run_guard = match self.run_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("Another calendar sync is in flight; waiting for it to finish");
                self.run_lock.lock().await
            }
        };

        let effective = gate::evaluate(force, self.load_settings().await)?;
        if effective.forced {
            info!("Calendar sync disabled; running because it was forced");
        }

        let token = self
            .tokens
            .access_token(&self.options.provider)
            .await
            .map_err(ReconcileError::AuthenticationFailed)?;

        let mut tally = RunTally::new(effective.forced);

        let push = PushPhase {
            appointments: self.appointments.as_ref(),
            owners: self.owners.as_ref(),
            calendar: self.calendar.as_ref(),
            token: &token,
            settings: effective,
            lookback_days: self.options.windows.push_lookback_days,
            default_time_zone: &self.options.default_time_zone,
        };
        tally.record_push(push.run(now).await);

        if effective.bidirectional {
            let pull = PullPhase {
                appointments: self.appointments.as_ref(),
                calendar: self.calendar.as_ref(),
                token: &token,
                windows: self.options.windows,
            };
            let outcome = pull.run(now).await;
            if let Err(err) = &outcome {
                warn!(error = %err, "Calendar pull phase failed");
            }
            tally.record_pull(outcome);
        }

        let summary = tally.into_summary();
        info!(
            pushed = summary.pushed,
            imported = summary.imported,
            updated = summary.updated,
            skipped = summary.skipped,
            failed = summary.failed,
            "Calendar sync finished"
        );
        Ok(summary)
    }

    async fn load_settings(&self) -> Option<SyncSettings> {
        match self.settings.load(SYNC_SETTINGS_KEY).await {
            Ok(settings) => settings,
            Err(err) => {
                warn!(error = %err, "Failed to read sync settings; treating as absent");
                None
            }
        }
    }
}
