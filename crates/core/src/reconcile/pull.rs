//! Pull phase: reconcile calendar events back into appointments

use std::collections::HashMap;

use cadence_domain::constants::{IMPORTED_EVENT_TYPE, IMPORTED_NOTE_PREFIX};
use cadence_domain::utils::email::local_part;
use cadence_domain::{
    Appointment, AppointmentFilter, AppointmentStatus, AppointmentUpdate, Attendee, EventQuery,
    EventTime, ExternalEvent, ExternalLinkage, NewAppointment, Origin, Result, SyncWindowConfig,
};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use super::error::{ReconcileError, UnsyncableReason};
use super::ports::AppointmentRepository;
use super::summary::PullOutcome;
use crate::calendar_ports::{AccessToken, CalendarGateway};

/// Borrowed collaborators for one pull pass
pub struct PullPhase<'a> {
    pub appointments: &'a dyn AppointmentRepository,
    pub calendar: &'a dyn CalendarGateway,
    pub token: &'a AccessToken,
    pub windows: SyncWindowConfig,
}

enum EventAction {
    Imported(Appointment),
    Updated(Appointment),
    Unchanged,
}

impl PullPhase<'_> {
    /// Run the phase. A listing or preparation failure is returned as
    /// [`ReconcileError::PullPhaseFailed`]; per-event failures are counted.
    pub async fn run(&self, now: DateTime<Utc>) -> std::result::Result<PullOutcome, ReconcileError> {
        let query = self.query(now);
        let events = self
            .calendar
            .list_events(self.token, &query)
            .await
            .map_err(ReconcileError::PullPhaseFailed)?;

        let linked = self
            .appointments
            .list_appointments(&AppointmentFilter::linked())
            .await
            .map_err(ReconcileError::PullPhaseFailed)?;
        let mut known: HashMap<String, Appointment> = linked
            .into_iter()
            .filter_map(|appointment| {
                let event_id = appointment.external_event_id()?.to_string();
                Some((event_id, appointment))
            })
            .collect();

        debug!(events = events.len(), linked = known.len(), "Reconciling calendar events");

        let mut outcome = PullOutcome::default();
        for event in &events {
            if let Some(reason) = unsyncable_reason(event) {
                outcome.skipped += 1;
                let skipped =
                    ReconcileError::ExternalEventUnsyncable { event_id: event.id.clone(), reason };
                debug!(error = %skipped, "Skipping calendar event");
                continue;
            }

            match self.reconcile_event(event, known.get(&event.id)).await {
                Ok(EventAction::Imported(appointment)) => {
                    outcome.imported += 1;
                    known.insert(event.id.clone(), appointment);
                }
                Ok(EventAction::Updated(appointment)) => {
                    outcome.updated += 1;
                    known.insert(event.id.clone(), appointment);
                }
                Ok(EventAction::Unchanged) => {}
                Err(err) => {
                    outcome.failed += 1;
                    warn!(event_id = %event.id, error = %err, "Failed to reconcile calendar event");
                }
            }
        }

        info!(
            imported = outcome.imported,
            updated = outcome.updated,
            skipped = outcome.skipped,
            failed = outcome.failed,
            "Pull phase complete"
        );
        Ok(outcome)
    }

    fn query(&self, now: DateTime<Utc>) -> EventQuery {
        EventQuery {
            time_min: now - Duration::days(i64::from(self.windows.pull_lookback_days)),
            time_max: now + Duration::days(i64::from(self.windows.pull_lookahead_days)),
            max_results: self.windows.max_results,
        }
    }

    async fn reconcile_event(
        &self,
        event: &ExternalEvent,
        existing: Option<&Appointment>,
    ) -> Result<EventAction> {
        // Callers filter out events without a start.
        let (Some(start), Some(duration)) = (event.start.as_ref(), event.duration_minutes()) else {
            return Ok(EventAction::Unchanged);
        };

        let Some(existing) = existing else {
            let new = imported_appointment(event, start, duration);
            let created = self.appointments.create_appointment(new).await?;
            debug!(event_id = %event.id, appointment_id = %created.id, "Imported calendar event");
            return Ok(EventAction::Imported(created));
        };

        if existing.scheduled_at == start.at && existing.duration_minutes == Some(duration) {
            return Ok(EventAction::Unchanged);
        }

        let update = AppointmentUpdate::reschedule(
            start.at,
            duration,
            event.html_link.clone(),
            event.meeting_link.clone().or_else(|| existing.meeting_link.clone()),
        );
        let updated = self.appointments.update_appointment(existing.id, &update).await?;
        debug!(
            event_id = %event.id,
            appointment_id = %updated.id,
            "Rescheduled appointment from calendar"
        );
        Ok(EventAction::Updated(updated))
    }
}

fn unsyncable_reason(event: &ExternalEvent) -> Option<UnsyncableReason> {
    if event.cancelled {
        Some(UnsyncableReason::Cancelled)
    } else if event.start.is_none() {
        Some(UnsyncableReason::MissingStart)
    } else {
        None
    }
}

fn imported_appointment(event: &ExternalEvent, start: &EventTime, duration: u32) -> NewAppointment {
    let title = event.summary.as_deref().map(str::trim).unwrap_or_default();
    let notes = event
        .description
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map_or_else(|| format!("{IMPORTED_NOTE_PREFIX}{title}"), str::to_string);

    let attendees = event
        .attendees
        .iter()
        .map(|attendee| {
            let name = attendee
                .display_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| local_part(&attendee.email));
            Attendee::new(name, attendee.email.trim())
        })
        .collect();

    NewAppointment {
        origin: Origin::ImportedFromCalendar,
        appointment_type: IMPORTED_EVENT_TYPE.to_string(),
        scheduled_at: start.at,
        duration_minutes: Some(duration),
        status: AppointmentStatus::Scheduled,
        attendees,
        objectives: None,
        notes: Some(notes),
        time_zone: start.time_zone.clone(),
        meeting_link: event.meeting_link.clone(),
        external: Some(ExternalLinkage {
            event_id: event.id.clone(),
            html_link: event.html_link.clone(),
        }),
    }
}
