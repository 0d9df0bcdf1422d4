//! Application constants
//!
//! Centralized location for domain-level constants shared by the engine and
//! its adapters.

/// Duration applied when an appointment carries no explicit duration.
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

/// Appointment type assigned to records created from calendar events.
pub const IMPORTED_EVENT_TYPE: &str = "calendar_event";

/// Label used when an appointment type is blank.
pub const GENERIC_TYPE_LABEL: &str = "Appointment";

/// Owner label used when the owning context cannot be resolved.
pub const GENERIC_OWNER_LABEL: &str = "Client";

/// Key under which the sync settings record is stored.
pub const SYNC_SETTINGS_KEY: &str = "calendar_sync";

/// Provider name passed to the token provider.
pub const DEFAULT_CALENDAR_PROVIDER: &str = "google";

/// Prefix for notes written on imported appointments without a description.
pub const IMPORTED_NOTE_PREFIX: &str = "Imported from calendar: ";

// Sync window defaults (days)
pub const DEFAULT_PUSH_LOOKBACK_DAYS: u32 = 90;
pub const DEFAULT_PULL_LOOKBACK_DAYS: u32 = 7;
pub const DEFAULT_PULL_LOOKAHEAD_DAYS: u32 = 90;
pub const DEFAULT_PULL_MAX_RESULTS: u32 = 500;
