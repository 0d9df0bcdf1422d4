//! Integration tests for `ReconcileService` against in-memory ports.

mod support;

use std::sync::Arc;

use cadence_core::{ReconcileError, ReconcileOptions, ReconcileService};
use cadence_domain::{Attendee, Origin, SyncSettings};
use chrono::Duration;
use support::calendar::{external_event, MockCalendarGateway, MockTokenProvider};
use support::repositories::{MockAppointmentRepository, MockOwnerDirectory, MockSyncSettingsStore};
use support::{internal_appointment, linked_appointment, now};

struct Harness {
    tokens: Arc<MockTokenProvider>,
    appointments: Arc<MockAppointmentRepository>,
    settings: Arc<MockSyncSettingsStore>,
    owners: Arc<MockOwnerDirectory>,
    calendar: Arc<MockCalendarGateway>,
}

impl Harness {
    fn new(appointments: MockAppointmentRepository, settings: MockSyncSettingsStore) -> Self {
        Self {
            tokens: Arc::new(MockTokenProvider::ok()),
            appointments: Arc::new(appointments),
            settings: Arc::new(settings),
            owners: Arc::new(
                MockOwnerDirectory::default()
                    .with_owner("owner-1", "Acme Corp")
                    .with_owner("owner-2", "Globex")
                    .with_owner("owner-3", "Initech"),
            ),
            calendar: Arc::new(MockCalendarGateway::new()),
        }
    }

    fn with_calendar(mut self, calendar: MockCalendarGateway) -> Self {
        self.calendar = Arc::new(calendar);
        self
    }

    fn with_tokens(mut self, tokens: MockTokenProvider) -> Self {
        self.tokens = Arc::new(tokens);
        self
    }

    fn service(&self) -> ReconcileService {
        ReconcileService::new(
            self.tokens.clone(),
            self.appointments.clone(),
            self.settings.clone(),
            self.owners.clone(),
            self.calendar.clone(),
        )
        .with_options(ReconcileOptions::default())
    }
}

// ---------------------------------------------------------------------------
// Gate and authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn disabled_sync_is_rejected_without_side_effects() {
    let harness = Harness::new(
        MockAppointmentRepository::new(vec![internal_appointment("owner-1", 1)]),
        MockSyncSettingsStore::new(Some(SyncSettings::default())),
    );

    let err = harness.service().run_sync_at(false, now()).await.unwrap_err();

    assert!(matches!(err, ReconcileError::SyncDisabled));
    assert!(harness.tokens.requests().is_empty());
    assert!(harness.calendar.created().is_empty());
}

#[tokio::test]
async fn missing_settings_record_is_treated_as_disabled() {
    let harness =
        Harness::new(MockAppointmentRepository::default(), MockSyncSettingsStore::new(None));

    let err = harness.service().run_sync_at(false, now()).await.unwrap_err();
    assert!(matches!(err, ReconcileError::SyncDisabled));
}

#[tokio::test]
async fn forced_run_with_sync_disabled_and_no_candidates_changes_nothing() {
    let harness = Harness::new(
        MockAppointmentRepository::default(),
        MockSyncSettingsStore::new(Some(SyncSettings::default())),
    );

    let summary = harness.service().run_sync_at(true, now()).await.unwrap();

    assert_eq!(
        (summary.pushed, summary.imported, summary.updated, summary.skipped, summary.failed),
        (0, 0, 0, 0, 0)
    );
    assert_eq!(summary.message, "Forced sync: pushed 0 appointment(s) to calendar");
    assert_eq!(harness.appointments.write_count(), 0);
    assert!(harness.calendar.created().is_empty());
    assert!(harness.calendar.queries().is_empty());
}

#[tokio::test]
async fn settings_read_failure_is_treated_as_absent() {
    let harness =
        Harness::new(MockAppointmentRepository::default(), MockSyncSettingsStore::failing());

    let err = harness.service().run_sync_at(false, now()).await.unwrap_err();
    assert!(matches!(err, ReconcileError::SyncDisabled));

    let summary = harness.service().run_sync_at(true, now()).await.unwrap();
    assert_eq!(summary.pushed, 0);
    assert_eq!(harness.settings.keys(), vec!["calendar_sync", "calendar_sync"]);
}

#[tokio::test]
async fn token_failure_aborts_before_any_external_call() {
    let harness = Harness::new(
        MockAppointmentRepository::new(vec![internal_appointment("owner-1", 1)]),
        MockSyncSettingsStore::enabled(true, false),
    )
    .with_tokens(MockTokenProvider::failing());

    let err = harness.service().run_sync_at(false, now()).await.unwrap_err();

    assert!(matches!(err, ReconcileError::AuthenticationFailed(_)));
    assert!(err.is_fatal());
    assert!(harness.calendar.created().is_empty());
    assert!(harness.calendar.queries().is_empty());
    assert_eq!(harness.appointments.write_count(), 0);
}

// ---------------------------------------------------------------------------
// Push phase
// ---------------------------------------------------------------------------

#[tokio::test]
async fn push_creates_event_and_links_appointment() {
    let appointment = internal_appointment("owner-1", 3);
    let id = appointment.id;
    let harness = Harness::new(
        MockAppointmentRepository::new(vec![appointment.clone()]),
        MockSyncSettingsStore::enabled(false, true),
    );

    let summary = harness.service().run_sync_at(false, now()).await.unwrap();

    assert_eq!(summary.pushed, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.message, "pushed 1 appointment(s) to calendar");
    assert_eq!(harness.tokens.requests(), vec!["google"]);

    let created = harness.calendar.created();
    assert_eq!(created.len(), 1);
    let event = &created[0];
    assert_eq!(event.summary, "Coaching Session - Acme Corp");
    assert_eq!(event.description.as_deref(), Some("Objectives:\nPlan next quarter"));
    assert_eq!(event.start.at, appointment.scheduled_at);
    assert_eq!(event.end.at, appointment.scheduled_at + Duration::minutes(30));
    assert_eq!(event.start.time_zone.as_deref(), Some("Europe/London"));
    assert!(event.request_meeting_link);

    let stored = harness.appointments.get(id).unwrap();
    let linkage = stored.external.unwrap();
    assert_eq!(linkage.event_id, "created-1");
    assert_eq!(linkage.html_link.as_deref(), Some("https://calendar.example/created-1"));
    assert_eq!(stored.meeting_link.as_deref(), Some("https://meet.example/created-1"));
}

#[tokio::test]
async fn push_defaults_duration_and_keeps_stored_meeting_link() {
    let mut appointment = internal_appointment("owner-1", 3);
    appointment.duration_minutes = None;
    appointment.time_zone = None;
    appointment.meeting_link = Some("https://zoom.example/room".into());
    let id = appointment.id;
    let harness = Harness::new(
        MockAppointmentRepository::new(vec![appointment.clone()]),
        MockSyncSettingsStore::enabled(false, false),
    );

    harness.service().run_sync_at(false, now()).await.unwrap();

    let event = &harness.calendar.created()[0];
    assert_eq!(event.end.at - event.start.at, Duration::minutes(60));
    assert_eq!(event.start.time_zone.as_deref(), Some("UTC"));
    assert!(!event.request_meeting_link);
    let stored = harness.appointments.get(id).unwrap();
    assert_eq!(stored.meeting_link.as_deref(), Some("https://zoom.example/room"));
}

#[tokio::test]
async fn imported_appointments_are_never_pushed() {
    let mut by_origin = internal_appointment("owner-1", 1);
    by_origin.origin = Origin::ImportedFromCalendar;
    let mut by_type = internal_appointment("owner-1", 2);
    by_type.appointment_type = "calendar_event".into();
    let harness = Harness::new(
        MockAppointmentRepository::new(vec![by_origin, by_type]),
        MockSyncSettingsStore::enabled(false, false),
    );

    let summary = harness.service().run_sync_at(false, now()).await.unwrap();

    assert_eq!(summary.pushed, 0);
    assert!(harness.calendar.created().is_empty());
}

#[tokio::test]
async fn linked_appointments_are_never_pushed() {
    let harness = Harness::new(
        MockAppointmentRepository::new(vec![linked_appointment("owner-1", 1, "evt-1")]),
        MockSyncSettingsStore::enabled(false, false),
    );

    let summary = harness.service().run_sync_at(false, now()).await.unwrap();

    assert_eq!(summary.pushed, 0);
    assert!(harness.calendar.created().is_empty());
    assert_eq!(harness.appointments.write_count(), 0);
}

#[tokio::test]
async fn appointments_outside_push_window_are_ignored() {
    let harness = Harness::new(
        MockAppointmentRepository::new(vec![
            internal_appointment("owner-1", -24 * 91),
            internal_appointment("owner-2", -24 * 89),
        ]),
        MockSyncSettingsStore::enabled(false, false),
    );

    let summary = harness.service().run_sync_at(false, now()).await.unwrap();

    assert_eq!(summary.pushed, 1);
    assert_eq!(harness.calendar.created()[0].summary, "Coaching Session - Globex");
}

#[tokio::test]
async fn failed_item_does_not_block_the_rest() {
    let first = internal_appointment("owner-1", 1);
    let second = internal_appointment("owner-2", 2);
    let third = internal_appointment("owner-3", 3);
    let second_id = second.id;
    let harness = Harness::new(
        MockAppointmentRepository::new(vec![first, second, third]),
        MockSyncSettingsStore::enabled(false, false),
    );
    harness.calendar.fail_create_for_summary("Coaching Session - Globex");

    let summary = harness.service().run_sync_at(false, now()).await.unwrap();

    assert_eq!(summary.pushed, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.message, "pushed 2 appointment(s) to calendar; 1 item(s) failed");
    let titles: Vec<String> =
        harness.calendar.created().into_iter().map(|event| event.summary).collect();
    assert_eq!(titles, vec!["Coaching Session - Acme Corp", "Coaching Session - Initech"]);
    assert!(harness.appointments.get(second_id).unwrap().external.is_none());
}

#[tokio::test]
async fn linkage_write_failure_counts_as_failed() {
    let appointment = internal_appointment("owner-1", 1);
    let harness = Harness::new(
        MockAppointmentRepository::new(vec![appointment.clone()]),
        MockSyncSettingsStore::enabled(false, false),
    );
    harness.appointments.fail_update_for(appointment.id);

    let summary = harness.service().run_sync_at(false, now()).await.unwrap();

    assert_eq!(summary.pushed, 0);
    assert_eq!(summary.failed, 1);
    assert_eq!(harness.calendar.created().len(), 1);
}

#[tokio::test]
async fn link_made_elsewhere_during_push_is_not_counted_as_pushed() {
    let appointment = internal_appointment("owner-1", 1);
    let harness = Harness::new(
        MockAppointmentRepository::new(vec![appointment.clone()]),
        MockSyncSettingsStore::enabled(false, false),
    );
    harness.appointments.link_before_update(appointment.id, "evt-elsewhere");

    let summary = harness.service().run_sync_at(false, now()).await.unwrap();

    assert_eq!(summary.pushed, 0);
    assert_eq!(summary.failed, 1);
    assert_eq!(harness.calendar.created().len(), 1);
    let stored = harness.appointments.get(appointment.id).unwrap();
    assert_eq!(stored.external_event_id(), Some("evt-elsewhere"));
}

#[tokio::test]
async fn overlapping_runs_create_one_event_per_appointment() {
    let appointment = internal_appointment("owner-1", 1);
    let harness = Harness::new(
        MockAppointmentRepository::new(vec![appointment.clone()]),
        MockSyncSettingsStore::enabled(false, false),
    )
    .with_calendar(MockCalendarGateway::new().yield_on_create());
    let service = harness.service();

    let (first, second) =
        tokio::join!(service.run_sync_at(false, now()), service.run_sync_at(false, now()));
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.pushed + second.pushed, 1);
    assert_eq!(first.failed + second.failed, 0);
    assert_eq!(harness.calendar.created().len(), 1);
    assert_eq!(
        harness.appointments.get(appointment.id).unwrap().external_event_id(),
        Some("created-1")
    );
}

#[tokio::test]
async fn invalid_attendee_email_is_dropped_but_event_created() {
    let first = internal_appointment("owner-1", 1);
    let mut second = internal_appointment("owner-2", 2);
    second.attendees.push(Attendee::new("Typo", "grace(at)example.com"));
    let third = internal_appointment("owner-3", 3);
    let harness = Harness::new(
        MockAppointmentRepository::new(vec![first, second, third]),
        MockSyncSettingsStore::enabled(false, false),
    );

    let summary = harness.service().run_sync_at(false, now()).await.unwrap();

    assert_eq!(summary.pushed, 3);
    let created = harness.calendar.created();
    assert_eq!(created.len(), 3);
    assert_eq!(created[1].attendees.len(), 1);
    assert_eq!(created[1].attendees[0].email, "ada@example.com");
}

#[tokio::test]
async fn unknown_or_failing_owner_lookup_uses_generic_title() {
    let harness = Harness::new(
        MockAppointmentRepository::new(vec![
            internal_appointment("nobody", 1),
            internal_appointment("broken", 2),
        ]),
        MockSyncSettingsStore::enabled(false, false),
    );

    let summary = harness.service().run_sync_at(false, now()).await.unwrap();

    assert_eq!(summary.pushed, 2);
    assert!(harness
        .calendar
        .created()
        .iter()
        .all(|event| event.summary == "Coaching Session - Client"));
}

#[tokio::test]
async fn appointment_removed_after_listing_is_skipped() {
    let appointment = internal_appointment("owner-1", 1);
    let harness = Harness::new(
        MockAppointmentRepository::new(vec![appointment.clone()]),
        MockSyncSettingsStore::enabled(false, false),
    );
    harness.appointments.vanish_after_list(appointment.id);

    let summary = harness.service().run_sync_at(false, now()).await.unwrap();

    assert_eq!(summary.pushed, 0);
    assert_eq!(summary.failed, 0);
    assert!(harness.calendar.created().is_empty());
}

#[tokio::test]
async fn candidate_listing_failure_degrades_to_zero_pushes() {
    let harness = Harness::new(
        MockAppointmentRepository::new(vec![internal_appointment("owner-1", 1)]),
        MockSyncSettingsStore::enabled(false, false),
    );
    harness.appointments.fail_listing();

    let summary = harness.service().run_sync_at(false, now()).await.unwrap();

    assert_eq!(summary.pushed, 0);
    assert!(summary.message.contains("push candidates unavailable"));
}

// ---------------------------------------------------------------------------
// Pull phase
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unidirectional_run_never_lists_calendar() {
    let harness = Harness::new(
        MockAppointmentRepository::default(),
        MockSyncSettingsStore::enabled(false, false),
    )
    .with_calendar(MockCalendarGateway::with_events(vec![external_event(
        "evt-1",
        now(),
        30,
    )]));

    let summary = harness.service().run_sync_at(false, now()).await.unwrap();

    assert_eq!(summary.imported, 0);
    assert!(harness.calendar.queries().is_empty());
}

#[tokio::test]
async fn pull_queries_the_configured_window() {
    let harness = Harness::new(
        MockAppointmentRepository::default(),
        MockSyncSettingsStore::enabled(true, false),
    );

    harness.service().run_sync_at(false, now()).await.unwrap();

    let queries = harness.calendar.queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].time_min, now() - Duration::days(7));
    assert_eq!(queries[0].time_max, now() + Duration::days(90));
    assert_eq!(queries[0].max_results, 500);
}

#[tokio::test]
async fn cancelled_and_all_day_events_are_skipped() {
    let mut cancelled = external_event("evt-cancelled", now() + Duration::hours(5), 30);
    cancelled.cancelled = true;
    let mut all_day = external_event("evt-all-day", now() + Duration::days(1), 0);
    all_day.start = None;
    all_day.end = None;
    let harness = Harness::new(
        MockAppointmentRepository::default(),
        MockSyncSettingsStore::enabled(true, false),
    )
    .with_calendar(MockCalendarGateway::with_events(vec![cancelled, all_day]));

    let summary = harness.service().run_sync_at(false, now()).await.unwrap();

    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.imported, 0);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(harness.appointments.write_count(), 0);
}

#[tokio::test]
async fn unmatched_event_is_imported_and_never_pushed_back() {
    let harness = Harness::new(
        MockAppointmentRepository::default(),
        MockSyncSettingsStore::enabled(true, true),
    )
    .with_calendar(MockCalendarGateway::with_events(vec![external_event(
        "evt-1",
        now() + Duration::days(1),
        45,
    )]));

    let first = harness.service().run_sync_at(false, now()).await.unwrap();
    assert_eq!(first.imported, 1);
    assert_eq!(first.pushed, 0);

    let stored = harness.appointments.all();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].origin, Origin::ImportedFromCalendar);
    assert_eq!(stored[0].duration_minutes, Some(45));
    assert_eq!(stored[0].notes.as_deref(), Some("Imported from calendar: Event evt-1"));
    assert_eq!(stored[0].external_event_id(), Some("evt-1"));

    let second = harness.service().run_sync_at(false, now()).await.unwrap();
    assert_eq!((second.pushed, second.imported, second.updated), (0, 0, 0));
    assert!(harness.calendar.created().is_empty());
    assert_eq!(harness.appointments.write_count(), 1);
}

#[tokio::test]
async fn unchanged_events_issue_no_updates() {
    let appointment = linked_appointment("owner-1", 2, "evt-9");
    let event = external_event("evt-9", appointment.scheduled_at, 30);
    let harness = Harness::new(
        MockAppointmentRepository::new(vec![appointment]),
        MockSyncSettingsStore::enabled(true, false),
    )
    .with_calendar(MockCalendarGateway::with_events(vec![event]));

    for _ in 0..2 {
        let summary = harness.service().run_sync_at(false, now()).await.unwrap();
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.imported, 0);
    }
    assert!(harness.appointments.updates().is_empty());
}

#[tokio::test]
async fn changed_duration_issues_exactly_one_update_with_both_fields() {
    let appointment = linked_appointment("owner-1", 2, "evt-9");
    let id = appointment.id;
    let event = external_event("evt-9", appointment.scheduled_at, 50);
    let harness = Harness::new(
        MockAppointmentRepository::new(vec![appointment.clone()]),
        MockSyncSettingsStore::enabled(true, false),
    )
    .with_calendar(MockCalendarGateway::with_events(vec![event]));

    let summary = harness.service().run_sync_at(false, now()).await.unwrap();
    assert_eq!(summary.updated, 1);

    let updates = harness.appointments.updates();
    assert_eq!(updates.len(), 1);
    let (updated_id, update) = &updates[0];
    assert_eq!(*updated_id, id);
    assert_eq!(update.scheduled_at, Some(appointment.scheduled_at));
    assert_eq!(update.duration_minutes, Some(50));
    assert_eq!(update.external_event_id, None);
    assert_eq!(update.html_link.as_deref(), Some("https://calendar.example/evt-9"));

    let stored = harness.appointments.get(id).unwrap();
    assert_eq!(stored.external_event_id(), Some("evt-9"));

    let again = harness.service().run_sync_at(false, now()).await.unwrap();
    assert_eq!(again.updated, 0);
    assert_eq!(harness.appointments.updates().len(), 1);
}

#[tokio::test]
async fn moved_event_reschedules_appointment() {
    let mut appointment = linked_appointment("owner-1", 2, "evt-9");
    appointment.meeting_link = Some("https://meet.example/kept".into());
    let id = appointment.id;
    let moved = appointment.scheduled_at + Duration::hours(1);
    let harness = Harness::new(
        MockAppointmentRepository::new(vec![appointment]),
        MockSyncSettingsStore::enabled(true, false),
    )
    .with_calendar(MockCalendarGateway::with_events(vec![external_event("evt-9", moved, 30)]));

    let summary = harness.service().run_sync_at(false, now()).await.unwrap();

    assert_eq!(summary.updated, 1);
    let stored = harness.appointments.get(id).unwrap();
    assert_eq!(stored.scheduled_at, moved);
    assert_eq!(stored.meeting_link.as_deref(), Some("https://meet.example/kept"));
}

#[tokio::test]
async fn events_pushed_in_the_same_run_are_not_reimported() {
    let harness = Harness::new(
        MockAppointmentRepository::new(vec![internal_appointment("owner-1", 4)]),
        MockSyncSettingsStore::enabled(true, false),
    );

    let summary = harness.service().run_sync_at(false, now()).await.unwrap();

    assert_eq!(summary.pushed, 1);
    assert_eq!(summary.imported, 0);
    assert_eq!(summary.updated, 0);
    assert_eq!(harness.appointments.all().len(), 1);
}

#[tokio::test]
async fn pull_listing_failure_keeps_push_results() {
    let harness = Harness::new(
        MockAppointmentRepository::new(vec![internal_appointment("owner-1", 1)]),
        MockSyncSettingsStore::enabled(true, false),
    );
    harness.calendar.fail_listing();

    let summary = harness.service().run_sync_at(false, now()).await.unwrap();

    assert_eq!(summary.pushed, 1);
    assert_eq!(summary.imported, 0);
    assert!(summary.message.contains("calendar import failed"));
}

#[tokio::test]
async fn per_event_write_failure_is_counted() {
    let harness = Harness::new(
        MockAppointmentRepository::default(),
        MockSyncSettingsStore::enabled(true, false),
    )
    .with_calendar(MockCalendarGateway::with_events(vec![
        external_event("evt-1", now() + Duration::hours(1), 30),
        external_event("evt-2", now() + Duration::hours(2), 30),
    ]));
    harness.appointments.fail_creates();

    let summary = harness.service().run_sync_at(false, now()).await.unwrap();

    assert_eq!(summary.imported, 0);
    assert_eq!(summary.failed, 2);
}
