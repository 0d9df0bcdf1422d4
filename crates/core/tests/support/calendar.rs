use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use cadence_core::{AccessToken, CalendarGateway, TokenProvider};
use cadence_domain::{
    CadenceError, CreatedCalendarEvent, EventQuery, EventTime, ExternalEvent, NewCalendarEvent,
    Result as DomainResult,
};
use chrono::{DateTime, Duration, Utc};

/// In-memory calendar.
///
/// Created events are appended to the listing so a later pull sees them, the
/// way the real provider would.
#[derive(Default)]
pub struct MockCalendarGateway {
    events: Mutex<Vec<ExternalEvent>>,
    created: Mutex<Vec<NewCalendarEvent>>,
    queries: Mutex<Vec<EventQuery>>,
    fail_create_for: Mutex<HashSet<String>>,
    fail_list: Mutex<bool>,
    next_id: AtomicUsize,
    /// Yield to the runtime before creating, as a network round trip would.
    yield_on_create: AtomicBool,
}

impl MockCalendarGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<ExternalEvent>) -> Self {
        let mock = Self::default();
        *mock.events.lock().unwrap() = events;
        mock
    }

    /// Fail creation for events whose summary equals `summary`.
    pub fn fail_create_for_summary(&self, summary: &str) {
        self.fail_create_for.lock().unwrap().insert(summary.to_string());
    }

    pub fn fail_listing(&self) {
        *self.fail_list.lock().unwrap() = true;
    }

    pub fn yield_on_create(self) -> Self {
        self.yield_on_create.store(true, Ordering::SeqCst);
        self
    }

    /// Replace an event in the listing (matched by id).
    pub fn replace_event(&self, event: ExternalEvent) {
        let mut events = self.events.lock().unwrap();
        if let Some(slot) = events.iter_mut().find(|existing| existing.id == event.id) {
            *slot = event;
        }
    }

    pub fn created(&self) -> Vec<NewCalendarEvent> {
        self.created.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<EventQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarGateway for MockCalendarGateway {
    async fn create_event(
        &self,
        _token: &AccessToken,
        event: &NewCalendarEvent,
    ) -> DomainResult<CreatedCalendarEvent> {
        if self.yield_on_create.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        if self.fail_create_for.lock().unwrap().contains(&event.summary) {
            return Err(CadenceError::Network("calendar returned HTTP 500".into()));
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("created-{n}");
        let meeting_link = event.request_meeting_link.then(|| format!("https://meet.example/{id}"));

        self.created.lock().unwrap().push(event.clone());
        self.events.lock().unwrap().push(ExternalEvent {
            id: id.clone(),
            cancelled: false,
            start: Some(event.start.clone()),
            end: Some(event.end.clone()),
            summary: Some(event.summary.clone()),
            description: event.description.clone(),
            attendees: event.attendees.clone(),
            meeting_link: meeting_link.clone(),
            html_link: Some(format!("https://calendar.example/{id}")),
        });

        Ok(CreatedCalendarEvent {
            html_link: Some(format!("https://calendar.example/{id}")),
            meeting_link,
            id,
        })
    }

    async fn list_events(
        &self,
        _token: &AccessToken,
        query: &EventQuery,
    ) -> DomainResult<Vec<ExternalEvent>> {
        self.queries.lock().unwrap().push(query.clone());
        if *self.fail_list.lock().unwrap() {
            return Err(CadenceError::Network("calendar returned HTTP 503".into()));
        }
        Ok(self.events.lock().unwrap().clone())
    }
}

/// Build a timed external event.
pub fn external_event(id: &str, start: DateTime<Utc>, minutes: i64) -> ExternalEvent {
    ExternalEvent {
        id: id.to_string(),
        cancelled: false,
        start: Some(EventTime::new(start, Some("UTC".into()))),
        end: Some(EventTime::new(start + Duration::minutes(minutes), Some("UTC".into()))),
        summary: Some(format!("Event {id}")),
        description: None,
        attendees: Vec::new(),
        meeting_link: None,
        html_link: Some(format!("https://calendar.example/{id}")),
    }
}

/// Token provider that either always succeeds or always fails.
pub struct MockTokenProvider {
    fail: bool,
    requests: Mutex<Vec<String>>,
}

impl MockTokenProvider {
    pub fn ok() -> Self {
        Self { fail: false, requests: Mutex::new(Vec::new()) }
    }

    pub fn failing() -> Self {
        Self { fail: true, requests: Mutex::new(Vec::new()) }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenProvider for MockTokenProvider {
    async fn access_token(&self, provider: &str) -> DomainResult<AccessToken> {
        self.requests.lock().unwrap().push(provider.to_string());
        if self.fail {
            return Err(CadenceError::Auth("refresh token revoked".into()));
        }
        Ok(AccessToken::new("test-token"))
    }
}
