//! Persistence ports used by the reconciliation engine

use async_trait::async_trait;
use cadence_domain::{
    Appointment, AppointmentFilter, AppointmentId, AppointmentUpdate, NewAppointment, Result,
    SyncSettings,
};

/// Trait for appointment persistence
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// List appointments matching the filter, ordered by scheduled time
    async fn list_appointments(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>>;

    /// Insert a new appointment and return the stored record
    async fn create_appointment(&self, appointment: NewAppointment) -> Result<Appointment>;

    /// Apply a partial update to a single appointment
    ///
    /// Implementations must never replace an external event id that is
    /// already set.
    async fn update_appointment(
        &self,
        id: AppointmentId,
        update: &AppointmentUpdate,
    ) -> Result<Appointment>;

    /// Fetch a single appointment by id
    async fn get_appointment(&self, id: AppointmentId) -> Result<Option<Appointment>>;
}

/// Trait for reading persisted sync settings
#[async_trait]
pub trait SyncSettingsStore: Send + Sync {
    /// Load the settings stored under `key`, if any
    async fn load(&self, key: &str) -> Result<Option<SyncSettings>>;
}

/// Trait for resolving owner display names
#[async_trait]
pub trait OwnerDirectory: Send + Sync {
    /// Get the display name for an owner, if known
    async fn display_name(&self, owner_id: &str) -> Result<Option<String>>;
}
