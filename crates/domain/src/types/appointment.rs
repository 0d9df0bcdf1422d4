//! Appointment records and the request types used to create, update and
//! query them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{DEFAULT_DURATION_MINUTES, IMPORTED_EVENT_TYPE};
use crate::impl_domain_status_conversions;

/// Appointment identifier.
pub type AppointmentId = Uuid;

/// Where an appointment came from.
///
/// Records pulled from the external calendar are tagged
/// [`Origin::ImportedFromCalendar`] and are never pushed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Origin {
    /// Created by a business flow on behalf of an owning context.
    Internal { owner_id: String },
    /// Created by the pull phase from an external calendar event.
    ImportedFromCalendar,
}

impl Origin {
    /// Owning context reference, if any.
    pub fn owner_id(&self) -> Option<&str> {
        match self {
            Self::Internal { owner_id } => Some(owner_id.as_str()),
            Self::ImportedFromCalendar => None,
        }
    }

    pub fn is_imported(&self) -> bool {
        matches!(self, Self::ImportedFromCalendar)
    }
}

/// Appointment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Late,
    Cancelled,
    NoShow,
}

impl_domain_status_conversions!(AppointmentStatus {
    Scheduled => "scheduled",
    Confirmed => "confirmed",
    InProgress => "in_progress",
    Completed => "completed",
    Late => "late",
    Cancelled => "cancelled",
    NoShow => "no_show",
});

/// Appointment participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub name: String,
    pub email: String,
}

impl Attendee {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self { name: name.into(), email: email.into() }
    }
}

/// Link between an appointment and its external calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalLinkage {
    pub event_id: String,
    pub html_link: Option<String>,
}

/// Internal scheduling record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub origin: Origin,
    pub appointment_type: String,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: Option<u32>,
    pub status: AppointmentStatus,
    pub attendees: Vec<Attendee>,
    pub objectives: Option<String>,
    pub notes: Option<String>,
    pub time_zone: Option<String>,
    pub meeting_link: Option<String>,
    pub external: Option<ExternalLinkage>,
}

impl Appointment {
    /// True when the record originated from the external calendar, either by
    /// origin tag or by carrying the imported-event type.
    pub fn is_imported(&self) -> bool {
        self.origin.is_imported() || self.appointment_type == IMPORTED_EVENT_TYPE
    }

    /// Push candidacy: no external linkage and not an imported record.
    pub fn is_push_candidate(&self) -> bool {
        self.external.is_none() && !self.is_imported()
    }

    pub fn external_event_id(&self) -> Option<&str> {
        self.external.as_ref().map(|link| link.event_id.as_str())
    }

    /// Duration used for scheduling; unset or zero falls back to
    /// [`DEFAULT_DURATION_MINUTES`].
    pub fn effective_duration_minutes(&self) -> u32 {
        self.duration_minutes.filter(|minutes| *minutes > 0).unwrap_or(DEFAULT_DURATION_MINUTES)
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.scheduled_at + Duration::minutes(i64::from(self.effective_duration_minutes()))
    }
}

/// Fields for creating an appointment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub origin: Origin,
    pub appointment_type: String,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: Option<u32>,
    pub status: AppointmentStatus,
    pub attendees: Vec<Attendee>,
    pub objectives: Option<String>,
    pub notes: Option<String>,
    pub time_zone: Option<String>,
    pub meeting_link: Option<String>,
    pub external: Option<ExternalLinkage>,
}

impl NewAppointment {
    /// Materialize the record under the given identifier.
    pub fn into_appointment(self, id: AppointmentId) -> Appointment {
        Appointment {
            id,
            origin: self.origin,
            appointment_type: self.appointment_type,
            scheduled_at: self.scheduled_at,
            duration_minutes: self.duration_minutes,
            status: self.status,
            attendees: self.attendees,
            objectives: self.objectives,
            notes: self.notes,
            time_zone: self.time_zone,
            meeting_link: self.meeting_link,
            external: self.external,
        }
    }
}

/// Partial update; `None` fields are left untouched.
///
/// `external_event_id` only takes effect on records without an external
/// identifier; stores must never replace an existing one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentUpdate {
    pub scheduled_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<u32>,
    pub external_event_id: Option<String>,
    pub html_link: Option<String>,
    pub meeting_link: Option<String>,
}

impl AppointmentUpdate {
    /// Attach external linkage after a successful push.
    pub fn link(
        event_id: impl Into<String>,
        html_link: Option<String>,
        meeting_link: Option<String>,
    ) -> Self {
        Self { external_event_id: Some(event_id.into()), html_link, meeting_link, ..Self::default() }
    }

    /// Reconcile time and links from a changed external event.
    pub fn reschedule(
        scheduled_at: DateTime<Utc>,
        duration_minutes: u32,
        html_link: Option<String>,
        meeting_link: Option<String>,
    ) -> Self {
        Self {
            scheduled_at: Some(scheduled_at),
            duration_minutes: Some(duration_minutes),
            external_event_id: None,
            html_link,
            meeting_link,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scheduled_at.is_none()
            && self.duration_minutes.is_none()
            && self.external_event_id.is_none()
            && self.html_link.is_none()
            && self.meeting_link.is_none()
    }

    /// Apply the update to an in-memory record with store semantics.
    pub fn apply_to(&self, appointment: &mut Appointment) {
        if let Some(at) = self.scheduled_at {
            appointment.scheduled_at = at;
        }
        if let Some(minutes) = self.duration_minutes {
            appointment.duration_minutes = Some(minutes);
        }
        if let Some(link) = &self.meeting_link {
            appointment.meeting_link = Some(link.clone());
        }
        if let Some(existing) = appointment.external.as_mut() {
            if let Some(html) = &self.html_link {
                existing.html_link = Some(html.clone());
            }
        } else if let Some(event_id) = &self.external_event_id {
            appointment.external = Some(ExternalLinkage {
                event_id: event_id.clone(),
                html_link: self.html_link.clone(),
            });
        }
    }
}

/// Which appointments a listing should return, by external linkage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkageFilter {
    #[default]
    Any,
    Linked,
    Unlinked,
}

/// Appointment listing filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentFilter {
    pub scheduled_from: Option<DateTime<Utc>>,
    pub scheduled_until: Option<DateTime<Utc>>,
    pub linkage: LinkageFilter,
    pub exclude_imported: bool,
}

impl AppointmentFilter {
    /// Unlinked, internally created appointments scheduled at or after `from`.
    pub fn push_candidates(from: DateTime<Utc>) -> Self {
        Self {
            scheduled_from: Some(from),
            scheduled_until: None,
            linkage: LinkageFilter::Unlinked,
            exclude_imported: true,
        }
    }

    /// Every appointment carrying an external event identifier.
    pub fn linked() -> Self {
        Self { linkage: LinkageFilter::Linked, ..Self::default() }
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        if self.scheduled_from.is_some_and(|from| appointment.scheduled_at < from) {
            return false;
        }
        if self.scheduled_until.is_some_and(|until| appointment.scheduled_at > until) {
            return false;
        }
        if self.exclude_imported && appointment.is_imported() {
            return false;
        }
        match self.linkage {
            LinkageFilter::Any => true,
            LinkageFilter::Linked => appointment.external.is_some(),
            LinkageFilter::Unlinked => appointment.external.is_none(),
        }
    }
}
