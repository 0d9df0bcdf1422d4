//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `CADENCE_DB_PATH` is missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Every loaded configuration is validated before it is returned.
//!
//! ## Environment Variables
//! - `CADENCE_DB_PATH`: Database file path (required)
//! - `CADENCE_DB_POOL_SIZE`: Connection pool size
//! - `CADENCE_CALENDAR_PROVIDER`: Provider name handed to the token provider
//! - `CADENCE_CALENDAR_API_BASE_URL`: Calendar API base URL
//! - `CADENCE_CALENDAR_ID`: Calendar identifier (default `primary`)
//! - `CADENCE_CALENDAR_TIME_ZONE`: IANA zone for created events
//! - `CADENCE_CALENDAR_TIMEOUT_SECS`: HTTP request timeout
//! - `CADENCE_CALENDAR_ACCESS_TOKEN`: Pre-issued bearer token
//! - `CADENCE_OAUTH_CLIENT_ID`, `CADENCE_OAUTH_CLIENT_SECRET`,
//!   `CADENCE_OAUTH_REFRESH_TOKEN`, `CADENCE_OAUTH_TOKEN_ENDPOINT`: refresh
//!   token exchange (client id and refresh token must both be set)
//! - `CADENCE_PUSH_LOOKBACK_DAYS`, `CADENCE_PULL_LOOKBACK_DAYS`,
//!   `CADENCE_PULL_LOOKAHEAD_DAYS`, `CADENCE_PULL_MAX_RESULTS`: sync windows
//! - `CADENCE_SYNC_CRON`: Six-field cron expression for scheduled runs
//! - `CADENCE_SYNC_TIMEOUT_SECS`: Per-run timeout for scheduled runs
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./cadence.json` or `./cadence.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use cadence_domain::{CadenceError, CalendarConfig, Config, DatabaseConfig, OAuthClientConfig, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the database path
/// is not set there, falls back to loading from a config file.
///
/// # Errors
/// Returns `CadenceError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Validation fails
pub fn load() -> Result<Config> {
    if std::env::var_os("CADENCE_DB_PATH").is_some() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        return Ok(config);
    }

    tracing::debug!("CADENCE_DB_PATH not set, trying config file");
    load_from_file(None)
}

/// Load from an explicit file when given, otherwise use [`load`].
pub fn load_with(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => load_from_file(Some(path)),
        None => load(),
    }
}

/// Load configuration from environment variables
///
/// Only `CADENCE_DB_PATH` is required; every other value falls back to its
/// default.
///
/// # Errors
/// Returns `CadenceError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let mut database = DatabaseConfig { path: env_var("CADENCE_DB_PATH")?, pool_size: 4 };
    if let Some(pool_size) = env_parse("CADENCE_DB_POOL_SIZE")? {
        database.pool_size = pool_size;
    }

    let mut calendar = CalendarConfig::default();
    if let Some(provider) = env_opt("CADENCE_CALENDAR_PROVIDER") {
        calendar.provider = provider;
    }
    if let Some(url) = env_opt("CADENCE_CALENDAR_API_BASE_URL") {
        calendar.api_base_url = url;
    }
    if let Some(id) = env_opt("CADENCE_CALENDAR_ID") {
        calendar.calendar_id = id;
    }
    if let Some(zone) = env_opt("CADENCE_CALENDAR_TIME_ZONE") {
        calendar.time_zone = zone;
    }
    if let Some(timeout) = env_parse("CADENCE_CALENDAR_TIMEOUT_SECS")? {
        calendar.request_timeout_secs = timeout;
    }
    calendar.access_token = env_opt("CADENCE_CALENDAR_ACCESS_TOKEN");
    calendar.oauth = oauth_from_env()?;

    let mut config = Config {
        database,
        calendar,
        windows: Default::default(),
        schedule: Default::default(),
    };

    if let Some(days) = env_parse("CADENCE_PUSH_LOOKBACK_DAYS")? {
        config.windows.push_lookback_days = days;
    }
    if let Some(days) = env_parse("CADENCE_PULL_LOOKBACK_DAYS")? {
        config.windows.pull_lookback_days = days;
    }
    if let Some(days) = env_parse("CADENCE_PULL_LOOKAHEAD_DAYS")? {
        config.windows.pull_lookahead_days = days;
    }
    if let Some(max) = env_parse("CADENCE_PULL_MAX_RESULTS")? {
        config.windows.max_results = max;
    }
    if let Some(cron) = env_opt("CADENCE_SYNC_CRON") {
        config.schedule.cron_expression = cron;
    }
    if let Some(timeout) = env_parse("CADENCE_SYNC_TIMEOUT_SECS")? {
        config.schedule.job_timeout_secs = timeout;
    }

    config.validate()?;
    Ok(config)
}

fn oauth_from_env() -> Result<Option<OAuthClientConfig>> {
    let client_id = env_opt("CADENCE_OAUTH_CLIENT_ID");
    let refresh_token = env_opt("CADENCE_OAUTH_REFRESH_TOKEN");

    match (client_id, refresh_token) {
        (None, None) => Ok(None),
        (Some(client_id), Some(refresh_token)) => Ok(Some(OAuthClientConfig {
            client_id,
            client_secret: env_opt("CADENCE_OAUTH_CLIENT_SECRET"),
            refresh_token,
            token_endpoint: env_opt("CADENCE_OAUTH_TOKEN_ENDPOINT")
                .unwrap_or_else(|| "https://oauth2.googleapis.com/token".to_string()),
        })),
        _ => Err(CadenceError::Config(
            "CADENCE_OAUTH_CLIENT_ID and CADENCE_OAUTH_REFRESH_TOKEN must be set together"
                .to_string(),
        )),
    }
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `CadenceError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid or validation fails
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CadenceError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CadenceError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CadenceError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CadenceError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CadenceError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(CadenceError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
        candidates.push(cwd.join("../config.json"));
        candidates.push(cwd.join("../config.toml"));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> [PathBuf; 4] {
    [
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("cadence.json"),
        dir.join("cadence.toml"),
    ]
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        CadenceError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Optional variable; blank counts as unset.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|value| value.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| CadenceError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}
