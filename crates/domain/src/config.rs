//! Configuration structures
//!
//! Deserialized by the infra config loader from environment variables or a
//! JSON/TOML file. Every section except `database` has defaults.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CALENDAR_PROVIDER, DEFAULT_PULL_LOOKAHEAD_DAYS, DEFAULT_PULL_LOOKBACK_DAYS,
    DEFAULT_PULL_MAX_RESULTS, DEFAULT_PUSH_LOOKBACK_DAYS,
};
use crate::errors::{CadenceError, Result};

/// Upper bound the Google Calendar API accepts for `maxResults`.
const PROVIDER_MAX_RESULTS_CAP: u32 = 2500;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub windows: SyncWindowConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Reject values that would only fail later, mid-run.
    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(CadenceError::Config("database.path must not be empty".into()));
        }
        if self.database.pool_size == 0 {
            return Err(CadenceError::Config("database.pool_size must be at least 1".into()));
        }
        self.calendar.time_zone()?;
        if self.windows.max_results == 0 || self.windows.max_results > PROVIDER_MAX_RESULTS_CAP {
            return Err(CadenceError::Config(format!(
                "windows.max_results must be between 1 and {PROVIDER_MAX_RESULTS_CAP}"
            )));
        }
        if self.schedule.cron_expression.trim().is_empty() {
            return Err(CadenceError::Config("schedule.cron_expression must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// Calendar provider connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub provider: String,
    pub api_base_url: String,
    pub calendar_id: String,
    /// IANA zone name passed through on created events.
    pub time_zone: String,
    pub request_timeout_secs: u64,
    /// Pre-issued bearer token; takes precedence over `oauth`.
    pub access_token: Option<String>,
    pub oauth: Option<OAuthClientConfig>,
}

impl CalendarConfig {
    /// Parse the configured zone name.
    pub fn time_zone(&self) -> Result<Tz> {
        self.time_zone.parse::<Tz>().map_err(|_| {
            CadenceError::Config(format!("unknown time zone '{}'", self.time_zone))
        })
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_CALENDAR_PROVIDER.to_string(),
            api_base_url: "https://www.googleapis.com/calendar/v3".to_string(),
            calendar_id: "primary".to_string(),
            time_zone: "UTC".to_string(),
            request_timeout_secs: 30,
            access_token: None,
            oauth: None,
        }
    }
}

/// OAuth client used to exchange a refresh token for access tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub refresh_token: String,
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,
}

/// Time windows for the push and pull phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncWindowConfig {
    /// Push candidates may be scheduled at most this many days in the past.
    pub push_lookback_days: u32,
    pub pull_lookback_days: u32,
    pub pull_lookahead_days: u32,
    pub max_results: u32,
}

impl Default for SyncWindowConfig {
    fn default() -> Self {
        Self {
            push_lookback_days: DEFAULT_PUSH_LOOKBACK_DAYS,
            pull_lookback_days: DEFAULT_PULL_LOOKBACK_DAYS,
            pull_lookahead_days: DEFAULT_PULL_LOOKAHEAD_DAYS,
            max_results: DEFAULT_PULL_MAX_RESULTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Six-field cron expression (seconds first).
    pub cron_expression: String,
    pub job_timeout_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { cron_expression: "0 */15 * * * *".to_string(), job_timeout_secs: 300 }
    }
}

fn default_pool_size() -> u32 {
    4
}

fn default_token_endpoint() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}
