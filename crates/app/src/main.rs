//! `cadence` command-line entry point.

mod wiring;

use std::path::PathBuf;

use anyhow::Context;
use cadence_core::SyncSettingsStore;
use cadence_domain::constants::SYNC_SETTINGS_KEY;
use cadence_domain::SyncSettings;
use cadence_infra::config;
use cadence_infra::scheduling::{ReconcileScheduler, ReconcileSchedulerConfig};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "cadence", about = "Cadence: appointment and calendar reconciliation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (JSON or TOML). Defaults to CADENCE_* variables, then probed files.
    #[arg(long, global = true, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reconciliation pass and print the summary as JSON.
    Sync {
        /// Run even when sync is disabled in the stored settings.
        #[arg(long)]
        force: bool,
    },
    /// Run reconciliation on the configured cron schedule until Ctrl-C.
    Schedule,
    /// Show or change the stored sync settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Register or rename an appointment owner.
    Owner {
        id: String,
        display_name: String,
    },
    /// Apply the database schema.
    Migrate,
}

#[derive(Subcommand)]
enum SettingsAction {
    Show,
    Set {
        #[arg(long)]
        enabled: Option<bool>,
        #[arg(long)]
        bidirectional: Option<bool>,
        #[arg(long)]
        meeting_link: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli);

    let config = config::load_with(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Commands::Sync { force } => {
            let stack = wiring::Stack::build(&config)?;
            let summary = stack.service.run_sync(force).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Schedule => {
            let stack = wiring::Stack::build(&config)?;
            let mut scheduler = ReconcileScheduler::with_config(
                ReconcileSchedulerConfig::from(&config.schedule),
                stack.service.clone(),
            );
            scheduler.start().await?;
            info!(cron = %config.schedule.cron_expression, "Waiting for scheduled runs; press Ctrl-C to stop");

            tokio::signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;
            scheduler.stop().await?;
        }
        Commands::Settings { action } => {
            let stores = wiring::Stores::open(&config)?;
            let mut settings =
                stores.settings.load(SYNC_SETTINGS_KEY).await?.unwrap_or_default();
            if let SettingsAction::Set { enabled, bidirectional, meeting_link } = action {
                apply_settings(&mut settings, enabled, bidirectional, meeting_link);
                stores.settings.save(SYNC_SETTINGS_KEY, settings).await?;
                info!(key = SYNC_SETTINGS_KEY, "Sync settings saved");
            }
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Commands::Owner { id, display_name } => {
            let stores = wiring::Stores::open(&config)?;
            stores.owners.upsert_owner(&id, &display_name).await?;
            info!(owner_id = %id, "Owner saved");
        }
        Commands::Migrate => {
            wiring::Stores::open(&config)?;
            info!(path = %config.database.path, "Database schema is up to date");
        }
    }

    Ok(())
}

fn apply_settings(
    settings: &mut SyncSettings,
    enabled: Option<bool>,
    bidirectional: Option<bool>,
    meeting_link: Option<bool>,
) {
    if let Some(value) = enabled {
        settings.enabled = value;
    }
    if let Some(value) = bidirectional {
        settings.bidirectional = value;
    }
    if let Some(value) = meeting_link {
        settings.auto_create_meeting_link = value;
    }
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry.with(fmt::layer().json().with_target(true).with_thread_ids(false)).init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_thread_ids(false).with_ansi(true))
            .init();
    }
}
