//! Provider-neutral calendar event types
//!
//! The engine only ever creates and lists events; these types carry exactly
//! what those two operations need.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point in time plus the zone name it was expressed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub at: DateTime<Utc>,
    pub time_zone: Option<String>,
}

impl EventTime {
    pub fn new(at: DateTime<Utc>, time_zone: Option<String>) -> Self {
        Self { at, time_zone }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAttendee {
    pub email: String,
    pub display_name: Option<String>,
}

/// Calendar event as listed by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalEvent {
    pub id: String,
    pub cancelled: bool,
    /// `None` for all-day events and events without a usable start.
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub attendees: Vec<EventAttendee>,
    pub meeting_link: Option<String>,
    pub html_link: Option<String>,
}

impl ExternalEvent {
    /// Whole minutes between start and end; a missing end counts as the
    /// start, negative spans clamp to zero. `None` without a start.
    pub fn duration_minutes(&self) -> Option<u32> {
        let start = self.start.as_ref()?.at;
        let end = self.end.as_ref().map_or(start, |end| end.at);
        let minutes = (end - start).num_minutes().max(0);
        Some(u32::try_from(minutes).unwrap_or(u32::MAX))
    }
}

/// Event creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCalendarEvent {
    pub summary: String,
    pub description: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    pub attendees: Vec<EventAttendee>,
    /// Ask the provider to attach a conferencing link.
    pub request_meeting_link: bool,
    /// Idempotency token for the conferencing create request.
    pub request_id: String,
}

/// Identifiers returned after creating an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedCalendarEvent {
    pub id: String,
    pub html_link: Option<String>,
    pub meeting_link: Option<String>,
}

/// Bounded listing request (single occurrences, ordered by start time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventQuery {
    pub time_min: DateTime<Utc>,
    pub time_max: DateTime<Utc>,
    pub max_results: u32,
}
