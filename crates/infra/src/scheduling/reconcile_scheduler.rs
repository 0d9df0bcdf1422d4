//! Cron-driven reconciliation runs.
//!
//! Join handles are tracked, cancellation is explicit, and every asynchronous
//! operation is wrapped in a timeout. Scheduled runs are never forced: when
//! sync is disabled the job logs and returns.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cadence_core::ReconcileService;
//! use cadence_infra::scheduling::{ReconcileScheduler, ReconcileSchedulerConfig, SchedulerResult};
//!
//! # async fn example(service: Arc<ReconcileService>) -> SchedulerResult<()> {
//! let mut scheduler = ReconcileScheduler::with_config(
//!     ReconcileSchedulerConfig {
//!         cron_expression: "0 */15 * * * *".into(), // every 15 minutes
//!         ..Default::default()
//!     },
//!     service,
//! );
//!
//! scheduler.start().await?;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use cadence_core::{ReconcileError, ReconcileService};
use cadence_domain::{RunSummary, ScheduleConfig};
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Configuration for the reconciliation scheduler.
#[derive(Debug, Clone)]
pub struct ReconcileSchedulerConfig {
    /// Cron expression describing the execution schedule.
    pub cron_expression: String,
    /// Timeout applied to a single run.
    pub job_timeout: Duration,
    /// Timeout for starting the underlying scheduler.
    pub start_timeout: Duration,
    /// Timeout for stopping the scheduler.
    pub stop_timeout: Duration,
    /// Timeout for awaiting the monitor task join handle.
    pub join_timeout: Duration,
}

impl Default for ReconcileSchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: "0 */15 * * * *".into(),
            job_timeout: Duration::from_secs(300),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&ScheduleConfig> for ReconcileSchedulerConfig {
    fn from(config: &ScheduleConfig) -> Self {
        Self {
            cron_expression: config.cron_expression.clone(),
            job_timeout: Duration::from_secs(config.job_timeout_secs),
            ..Self::default()
        }
    }
}

/// How a scheduled run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed(RunSummary),
    /// Sync is switched off in the stored settings.
    Disabled,
    Failed(String),
    TimedOut,
}

/// Reconciliation scheduler with explicit lifecycle management.
pub struct ReconcileScheduler {
    scheduler: Option<JobScheduler>,
    config: ReconcileSchedulerConfig,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    service: Arc<ReconcileService>,
}

impl ReconcileScheduler {
    /// Create a scheduler running on `cron_expression` with default timeouts.
    pub fn new(cron_expression: String, service: Arc<ReconcileService>) -> Self {
        let config = ReconcileSchedulerConfig { cron_expression, ..Default::default() };
        Self::with_config(config, service)
    }

    /// Create a scheduler with a custom configuration.
    pub fn with_config(config: ReconcileSchedulerConfig, service: Arc<ReconcileService>) -> Self {
        Self {
            scheduler: None,
            config,
            monitor_handle: None,
            cancellation: CancellationToken::new(),
            service,
        }
    }

    /// Start the scheduler, spawning the monitoring task.
    #[instrument(skip(self), fields(cron = %self.config.cron_expression))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler_instance = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        let start_result = tokio::time::timeout(start_timeout, scheduler_instance.start())
            .await
            .map_err(|source| SchedulerError::Timeout { duration: start_timeout, source })?;

        start_result.map_err(|source| SchedulerError::StartFailed { source })?;

        self.scheduler = Some(scheduler_instance);

        let cancel = self.cancellation.clone();
        let handle = tokio::spawn(async move {
            Self::monitor_task(cancel).await;
        });

        self.monitor_handle = Some(handle);
        info!("Reconcile scheduler started");
        Ok(())
    }

    /// Stop the scheduler and wait for the monitor task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation.cancel();

        let mut scheduler = match self.scheduler.take() {
            Some(scheduler) => scheduler,
            None => return Err(SchedulerError::NotRunning),
        };

        let stop_timeout = self.config.stop_timeout;
        let stop_result =
            tokio::time::timeout(stop_timeout, async move { scheduler.shutdown().await })
                .await
                .map_err(|source| SchedulerError::Timeout { duration: stop_timeout, source })?;

        stop_result.map_err(|source| SchedulerError::StopFailed { source })?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??
        }

        info!("Reconcile scheduler stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true when a scheduler instance is active.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Execute one unforced run under the configured job timeout.
    pub async fn run_now(&self) -> JobOutcome {
        run_job(&self.service, self.config.job_timeout).await
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|source| SchedulerError::CreationFailed { source })?;
        let service = self.service.clone();
        let job_timeout = self.config.job_timeout;

        let job_definition = Job::new_async(self.config.cron_expression.as_str(), move |_id, _lock| {
            let service = service.clone();
            Box::pin(async move {
                run_job(&service, job_timeout).await;
            })
        })
        .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        let job_id = job_definition.guid();
        scheduler
            .add(job_definition)
            .await
            .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        debug!(cron = %self.config.cron_expression, job_id = %job_id, "Registered reconcile job");
        Ok(scheduler)
    }

    async fn monitor_task(cancel: CancellationToken) {
        cancel.cancelled().await;
        debug!("Reconcile scheduler monitor cancelled");
    }
}

/// One scheduled run: never forced, bounded by `job_timeout`.
pub(crate) async fn run_job(service: &ReconcileService, job_timeout: Duration) -> JobOutcome {
    let started = Instant::now();

    match tokio::time::timeout(job_timeout, service.run_sync(false)).await {
        Ok(Ok(summary)) => {
            info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                message = %summary.message,
                "Scheduled calendar sync finished"
            );
            JobOutcome::Completed(summary)
        }
        Ok(Err(ReconcileError::SyncDisabled)) => {
            debug!("Calendar sync disabled; scheduled run skipped");
            JobOutcome::Disabled
        }
        Ok(Err(err)) => {
            error!(error = %err, "Scheduled calendar sync failed");
            JobOutcome::Failed(err.to_string())
        }
        Err(_elapsed) => {
            warn!(timeout_secs = job_timeout.as_secs(), "Scheduled calendar sync timed out");
            JobOutcome::TimedOut
        }
    }
}

impl Drop for ReconcileScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("ReconcileScheduler dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}
