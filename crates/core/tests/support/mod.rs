//! Shared test helpers for `cadence-core` integration tests.
//!
//! In-memory mocks for every port the reconciliation service talks to, with
//! call recording and per-item failure injection.

#![allow(dead_code)]

pub mod calendar;
pub mod repositories;

use cadence_domain::{Appointment, AppointmentStatus, Attendee, ExternalLinkage, Origin};
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

/// Fixed "now" used by every test run.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap()
}

/// Internal, unlinked appointment scheduled `hours` after [`now`].
pub fn internal_appointment(owner_id: &str, hours: i64) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        origin: Origin::Internal { owner_id: owner_id.to_string() },
        appointment_type: "coaching_session".to_string(),
        scheduled_at: now() + chrono::Duration::hours(hours),
        duration_minutes: Some(30),
        status: AppointmentStatus::Scheduled,
        attendees: vec![Attendee::new("Ada Lovelace", "ada@example.com")],
        objectives: Some("Plan next quarter".to_string()),
        notes: None,
        time_zone: Some("Europe/London".to_string()),
        meeting_link: None,
        external: None,
    }
}

/// Same as [`internal_appointment`] but already linked to `event_id`.
pub fn linked_appointment(owner_id: &str, hours: i64, event_id: &str) -> Appointment {
    let mut appointment = internal_appointment(owner_id, hours);
    appointment.external =
        Some(ExternalLinkage { event_id: event_id.to_string(), html_link: None });
    appointment
}
