//! In-memory persistence mocks

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use cadence_core::{AppointmentRepository, OwnerDirectory, SyncSettingsStore};
use cadence_domain::{
    Appointment, AppointmentFilter, AppointmentId, AppointmentUpdate, CadenceError,
    NewAppointment, Result as DomainResult, SyncSettings,
};
use uuid::Uuid;

/// In-memory appointment store with store semantics matching SQLite.
#[derive(Default)]
pub struct MockAppointmentRepository {
    appointments: Mutex<Vec<Appointment>>,
    updates: Mutex<Vec<(AppointmentId, AppointmentUpdate)>>,
    created: Mutex<Vec<NewAppointment>>,
    fail_update_for: Mutex<HashSet<AppointmentId>>,
    fail_list: Mutex<bool>,
    fail_create: Mutex<bool>,
    /// Removed from the store right after the next listing.
    vanish_after_list: Mutex<HashSet<AppointmentId>>,
    /// Linked by another writer just before the next update lands.
    link_before_update: Mutex<HashMap<AppointmentId, String>>,
}

impl MockAppointmentRepository {
    pub fn new(appointments: Vec<Appointment>) -> Self {
        let mock = Self::default();
        *mock.appointments.lock().unwrap() = appointments;
        mock
    }

    pub fn fail_update_for(&self, id: AppointmentId) {
        self.fail_update_for.lock().unwrap().insert(id);
    }

    pub fn fail_listing(&self) {
        *self.fail_list.lock().unwrap() = true;
    }

    pub fn fail_creates(&self) {
        *self.fail_create.lock().unwrap() = true;
    }

    pub fn vanish_after_list(&self, id: AppointmentId) {
        self.vanish_after_list.lock().unwrap().insert(id);
    }

    pub fn link_before_update(&self, id: AppointmentId, event_id: &str) {
        self.link_before_update.lock().unwrap().insert(id, event_id.to_string());
    }

    pub fn all(&self) -> Vec<Appointment> {
        self.appointments.lock().unwrap().clone()
    }

    pub fn get(&self, id: AppointmentId) -> Option<Appointment> {
        self.all().into_iter().find(|appointment| appointment.id == id)
    }

    pub fn updates(&self) -> Vec<(AppointmentId, AppointmentUpdate)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<NewAppointment> {
        self.created.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.updates().len() + self.created().len()
    }
}

#[async_trait]
impl AppointmentRepository for MockAppointmentRepository {
    async fn list_appointments(&self, filter: &AppointmentFilter) -> DomainResult<Vec<Appointment>> {
        if *self.fail_list.lock().unwrap() {
            return Err(CadenceError::Database("database is locked".into()));
        }

        let mut matching: Vec<Appointment> =
            self.all().into_iter().filter(|appointment| filter.matches(appointment)).collect();
        matching.sort_by_key(|appointment| appointment.scheduled_at);

        let vanished: HashSet<AppointmentId> =
            self.vanish_after_list.lock().unwrap().drain().collect();
        if !vanished.is_empty() {
            self.appointments
                .lock()
                .unwrap()
                .retain(|appointment| !vanished.contains(&appointment.id));
        }

        Ok(matching)
    }

    async fn create_appointment(&self, appointment: NewAppointment) -> DomainResult<Appointment> {
        if *self.fail_create.lock().unwrap() {
            return Err(CadenceError::Database("disk I/O error".into()));
        }
        self.created.lock().unwrap().push(appointment.clone());
        let stored = appointment.into_appointment(Uuid::new_v4());
        self.appointments.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn update_appointment(
        &self,
        id: AppointmentId,
        update: &AppointmentUpdate,
    ) -> DomainResult<Appointment> {
        if self.fail_update_for.lock().unwrap().contains(&id) {
            return Err(CadenceError::Database("constraint failed".into()));
        }

        let mut appointments = self.appointments.lock().unwrap();
        let appointment = appointments
            .iter_mut()
            .find(|appointment| appointment.id == id)
            .ok_or_else(|| CadenceError::NotFound(format!("appointment {id}")))?;
        if let Some(event_id) = self.link_before_update.lock().unwrap().remove(&id) {
            AppointmentUpdate::link(event_id, None, None).apply_to(appointment);
        }
        update.apply_to(appointment);
        self.updates.lock().unwrap().push((id, update.clone()));
        Ok(appointment.clone())
    }

    async fn get_appointment(&self, id: AppointmentId) -> DomainResult<Option<Appointment>> {
        Ok(self.get(id))
    }
}

/// Settings store returning a fixed value, or failing.
pub struct MockSyncSettingsStore {
    settings: Option<SyncSettings>,
    fail: bool,
    keys: Mutex<Vec<String>>,
}

impl MockSyncSettingsStore {
    pub fn new(settings: Option<SyncSettings>) -> Self {
        Self { settings, fail: false, keys: Mutex::new(Vec::new()) }
    }

    pub fn enabled(bidirectional: bool, auto_create_meeting_link: bool) -> Self {
        Self::new(Some(SyncSettings { enabled: true, bidirectional, auto_create_meeting_link }))
    }

    pub fn failing() -> Self {
        Self { settings: None, fail: true, keys: Mutex::new(Vec::new()) }
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncSettingsStore for MockSyncSettingsStore {
    async fn load(&self, key: &str) -> DomainResult<Option<SyncSettings>> {
        self.keys.lock().unwrap().push(key.to_string());
        if self.fail {
            return Err(CadenceError::Database("no such table: settings".into()));
        }
        Ok(self.settings)
    }
}

/// Owner directory backed by a map; unknown owners with id `"broken"` fail.
#[derive(Default)]
pub struct MockOwnerDirectory {
    names: HashMap<String, String>,
}

impl MockOwnerDirectory {
    pub fn with_owner(mut self, owner_id: &str, name: &str) -> Self {
        self.names.insert(owner_id.to_string(), name.to_string());
        self
    }
}

#[async_trait]
impl OwnerDirectory for MockOwnerDirectory {
    async fn display_name(&self, owner_id: &str) -> DomainResult<Option<String>> {
        if owner_id == "broken" {
            return Err(CadenceError::Database("owner table unavailable".into()));
        }
        Ok(self.names.get(owner_id).cloned())
    }
}
