//! Reconciliation error taxonomy

use std::fmt;

use cadence_domain::{AppointmentId, CadenceError};
use thiserror::Error;

/// Why an external event cannot be mirrored internally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsyncableReason {
    Cancelled,
    /// Date-only (all-day) events and events with no start at all.
    MissingStart,
}

impl fmt::Display for UnsyncableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("event is cancelled"),
            Self::MissingStart => f.write_str("event has no start timestamp"),
        }
    }
}

/// Errors raised while reconciling appointments with the calendar.
///
/// Only [`ReconcileError::SyncDisabled`] and
/// [`ReconcileError::AuthenticationFailed`] abort a run; the remaining
/// variants are scoped to a single item or phase and end up in the run
/// summary.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("calendar sync is disabled")]
    SyncDisabled,

    #[error("calendar authentication failed: {0}")]
    AuthenticationFailed(#[source] CadenceError),

    #[error("failed to push appointment {appointment_id}: {source}")]
    ItemPushFailed {
        appointment_id: AppointmentId,
        #[source]
        source: CadenceError,
    },

    /// The record gained another event id while ours was being created.
    #[error(
        "appointment {appointment_id} is already linked to {linked_event_id}; \
         event {orphaned_event_id} was left unattached"
    )]
    LinkConflict {
        appointment_id: AppointmentId,
        linked_event_id: String,
        orphaned_event_id: String,
    },

    #[error("calendar import failed: {0}")]
    PullPhaseFailed(#[source] CadenceError),

    #[error("external event {event_id} skipped: {reason}")]
    ExternalEventUnsyncable { event_id: String, reason: UnsyncableReason },
}

impl ReconcileError {
    /// Whether the error aborts the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SyncDisabled | Self::AuthenticationFailed(_))
    }
}

impl From<ReconcileError> for CadenceError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::SyncDisabled => CadenceError::Config(err.to_string()),
            ReconcileError::AuthenticationFailed(_) => CadenceError::Auth(err.to_string()),
            ReconcileError::ItemPushFailed { .. } | ReconcileError::PullPhaseFailed(_) => {
                CadenceError::Network(err.to_string())
            }
            ReconcileError::LinkConflict { .. }
            | ReconcileError::ExternalEventUnsyncable { .. } => {
                CadenceError::InvalidInput(err.to_string())
            }
        }
    }
}
