//! Push phase: mirror unlinked internal appointments onto the calendar

use cadence_domain::utils::email::is_valid_email;
use cadence_domain::utils::title::{compose_event_title, normalize_type_label};
use cadence_domain::{
    Appointment, AppointmentFilter, AppointmentUpdate, EventAttendee, EventTime,
    NewCalendarEvent,
};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};

use super::error::ReconcileError;
use super::gate::EffectiveSettings;
use super::ports::{AppointmentRepository, OwnerDirectory};
use super::summary::PushOutcome;
use crate::calendar_ports::{AccessToken, CalendarGateway};

/// Borrowed collaborators for one push pass
pub struct PushPhase<'a> {
    pub appointments: &'a dyn AppointmentRepository,
    pub owners: &'a dyn OwnerDirectory,
    pub calendar: &'a dyn CalendarGateway,
    pub token: &'a AccessToken,
    pub settings: EffectiveSettings,
    pub lookback_days: u32,
    pub default_time_zone: &'a str,
}

enum ItemResult {
    Pushed,
    Skipped,
}

impl PushPhase<'_> {
    pub async fn run(&self, now: DateTime<Utc>) -> PushOutcome {
        let from = now - Duration::days(i64::from(self.lookback_days));
        let filter = AppointmentFilter::push_candidates(from);

        let candidates = match self.appointments.list_appointments(&filter).await {
            Ok(list) => list,
            Err(err) => {
                warn!(error = %err, "Failed to list push candidates");
                return PushOutcome {
                    listing_error: Some(err.to_string()),
                    ..PushOutcome::default()
                };
            }
        };

        let mut outcome = PushOutcome::default();
        for appointment in candidates.into_iter().filter(Appointment::is_push_candidate) {
            let appointment_id = appointment.id;
            match self.push_one(appointment).await {
                Ok(ItemResult::Pushed) => outcome.pushed += 1,
                Ok(ItemResult::Skipped) => {}
                Err(err) => {
                    outcome.failed += 1;
                    warn!(%appointment_id, error = %err, "Appointment push failed");
                }
            }
        }

        info!(pushed = outcome.pushed, failed = outcome.failed, "Push phase complete");
        outcome
    }

    async fn push_one(&self, candidate: Appointment) -> Result<ItemResult, ReconcileError> {
        let appointment_id = candidate.id;
        let item_error = |source| ReconcileError::ItemPushFailed { appointment_id, source };

        // Another writer may have linked or removed the record since listing.
        let appointment = match self.appointments.get_appointment(appointment_id).await {
            Ok(Some(fresh)) if fresh.is_push_candidate() => fresh,
            Ok(_) => {
                debug!(%appointment_id, "Appointment no longer a push candidate; skipping");
                return Ok(ItemResult::Skipped);
            }
            Err(err) => return Err(item_error(err)),
        };

        let payload = self.build_event(&appointment).await;
        let created =
            self.calendar.create_event(self.token, &payload).await.map_err(item_error)?;

        let meeting_link = created.meeting_link.or_else(|| appointment.meeting_link.clone());
        let update = AppointmentUpdate::link(created.id.clone(), created.html_link, meeting_link);

        let linked = match self.appointments.update_appointment(appointment_id, &update).await {
            Ok(linked) => linked,
            Err(err) => {
                error!(
                    %appointment_id,
                    event_id = %created.id,
                    error = %err,
                    "Calendar event created but linkage could not be saved"
                );
                return Err(item_error(err));
            }
        };

        // The store keeps an existing event id, so a concurrent link wins.
        if let Some(linked_event_id) =
            linked.external_event_id().filter(|event_id| *event_id != created.id)
        {
            error!(
                %appointment_id,
                linked_event_id,
                orphaned_event_id = %created.id,
                "Appointment was linked elsewhere; created calendar event is orphaned"
            );
            return Err(ReconcileError::LinkConflict {
                appointment_id,
                linked_event_id: linked_event_id.to_string(),
                orphaned_event_id: created.id,
            });
        }

        debug!(%appointment_id, event_id = %created.id, "Appointment pushed");
        Ok(ItemResult::Pushed)
    }

    async fn build_event(&self, appointment: &Appointment) -> NewCalendarEvent {
        let time_zone =
            appointment.time_zone.clone().unwrap_or_else(|| self.default_time_zone.to_string());
        let owner_name = self.owner_name(appointment).await;
        let label = normalize_type_label(&appointment.appointment_type);

        NewCalendarEvent {
            summary: compose_event_title(&label, owner_name.as_deref()),
            description: describe(appointment),
            start: EventTime::new(appointment.scheduled_at, Some(time_zone.clone())),
            end: EventTime::new(appointment.ends_at(), Some(time_zone)),
            attendees: valid_attendees(appointment),
            request_meeting_link: self.settings.auto_create_meeting_link,
            request_id: format!("cadence-{}", appointment.id),
        }
    }

    async fn owner_name(&self, appointment: &Appointment) -> Option<String> {
        let owner_id = appointment.origin.owner_id()?;
        match self.owners.display_name(owner_id).await {
            Ok(name) => name.filter(|name| !name.trim().is_empty()),
            Err(err) => {
                debug!(owner_id, error = %err, "Owner lookup failed; using generic title");
                None
            }
        }
    }
}

fn valid_attendees(appointment: &Appointment) -> Vec<EventAttendee> {
    let attendees: Vec<EventAttendee> = appointment
        .attendees
        .iter()
        .filter(|attendee| is_valid_email(&attendee.email))
        .map(|attendee| EventAttendee {
            email: attendee.email.trim().to_string(),
            display_name: Some(attendee.name.trim().to_string()).filter(|name| !name.is_empty()),
        })
        .collect();

    let dropped = appointment.attendees.len() - attendees.len();
    if dropped > 0 {
        debug!(appointment_id = %appointment.id, dropped, "Dropped attendees with invalid email");
    }
    attendees
}

fn describe(appointment: &Appointment) -> Option<String> {
    let sections: Vec<String> =
        [("Objectives", &appointment.objectives), ("Notes", &appointment.notes)]
            .into_iter()
            .filter_map(|(heading, text)| {
                let text = text.as_deref()?.trim();
                (!text.is_empty()).then(|| format!("{heading}:\n{text}"))
            })
            .collect();

    (!sections.is_empty()).then(|| sections.join("\n\n"))
}
