#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use cadence_domain::{Appointment, Attendee, NewAppointment, Origin};
use cadence_infra::database::DbManager;
use cadence_infra::http::HttpClient;
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a migrated database in a fresh temp directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("cadence.db");

        let manager = DbManager::new(&db_path, 2).expect("db manager should be created");
        manager.run_migrations().expect("schema should apply");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP client with fast retries so tests do not sleep.
pub fn fast_http_client() -> HttpClient {
    HttpClient::builder()
        .timeout(Duration::from_secs(5))
        .max_attempts(3)
        .base_backoff(Duration::from_millis(1))
        .build()
        .expect("http client should build")
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap()
}

pub fn new_internal(owner_id: &str, at: DateTime<Utc>) -> NewAppointment {
    NewAppointment {
        origin: Origin::Internal { owner_id: owner_id.into() },
        appointment_type: "coaching_session".into(),
        scheduled_at: at,
        duration_minutes: Some(45),
        status: Default::default(),
        attendees: vec![
            Attendee::new("Ada Lovelace", "ada@example.com"),
            Attendee::new("Typo", "not-an-email"),
        ],
        objectives: Some("Review goals".into()),
        notes: None,
        time_zone: Some("Europe/Berlin".into()),
        meeting_link: None,
        external: None,
    }
}

pub fn find_by_event<'a>(all: &'a [Appointment], event_id: &str) -> Option<&'a Appointment> {
    all.iter().find(|appt| appt.external_event_id() == Some(event_id))
}
