//! # Cadence Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - Database implementations (SQLite, pooled with r2d2)
//! - HTTP client with timeout and retry handling
//! - Google Calendar gateway and access token providers
//! - Configuration loading and the cron-driven reconcile scheduler
//!
//! ## Architecture
//! - Implements traits defined in `cadence-core`
//! - Depends on `cadence-domain` and `cadence-core`
//! - Contains all "impure" code (I/O, network, filesystem)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod scheduling;

// Re-export commonly used items
pub use database::*;
pub use errors::{status_error, InfraError};
pub use http::*;
pub use integrations::calendar::{
    token_provider_from_config, GoogleCalendarGateway, OAuthRefreshTokenProvider,
    StaticTokenProvider,
};
pub use scheduling::{ReconcileScheduler, ReconcileSchedulerConfig};
