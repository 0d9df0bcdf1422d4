//! Calendar reconciliation engine
//!
//! One run is: gate on the stored settings, fetch a token, push unlinked
//! internal appointments, then optionally pull calendar events back.

pub mod error;
pub mod gate;
pub mod ports;
pub mod pull;
pub mod push;
pub mod service;
pub mod summary;

pub use error::{ReconcileError, UnsyncableReason};
pub use gate::EffectiveSettings;
pub use ports::{AppointmentRepository, OwnerDirectory, SyncSettingsStore};
pub use service::{ReconcileOptions, ReconcileService};
