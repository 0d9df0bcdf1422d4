//! # Cadence Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for persistence, tokens and the
//!   calendar provider
//! - The calendar reconciliation service
//!
//! ## Architecture Principles
//! - Only depends on `cadence-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod calendar_ports;
pub mod reconcile;

pub use calendar_ports::{AccessToken, CalendarGateway, TokenProvider};
pub use reconcile::{
    AppointmentRepository, OwnerDirectory, ReconcileError, ReconcileOptions, ReconcileService,
    SyncSettingsStore,
};
