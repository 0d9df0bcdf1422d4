//! Google Calendar gateway (events insert + list)

use std::time::Duration;

use async_trait::async_trait;
use cadence_core::{AccessToken, CalendarGateway};
use cadence_domain::{
    CadenceError, CalendarConfig, CreatedCalendarEvent, EventAttendee, EventQuery, EventTime,
    ExternalEvent, NewCalendarEvent, Result,
};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Method, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::errors::{status_error, InfraError};
use crate::http::HttpClient;

const MEET_SOLUTION: &str = "hangoutsMeet";
const VIDEO_ENTRY_POINT: &str = "video";
const CANCELLED_STATUS: &str = "cancelled";

/// Google Calendar v3 implementation of [`CalendarGateway`]
pub struct GoogleCalendarGateway {
    http: HttpClient,
    base_url: String,
    calendar_id: String,
}

impl GoogleCalendarGateway {
    pub fn new(
        http: HttpClient,
        base_url: impl Into<String>,
        calendar_id: impl Into<String>,
    ) -> Self {
        Self { http, base_url: base_url.into(), calendar_id: calendar_id.into() }
    }

    /// Build a gateway with its own HTTP client from configuration.
    pub fn from_config(config: &CalendarConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("cadence/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::new(http, config.api_base_url.clone(), config.calendar_id.clone()))
    }

    /// `{base}/calendars/{calendar_id}/events` with the id percent-encoded.
    fn events_url(&self) -> Result<Url> {
        let invalid = |reason: String| {
            CadenceError::Config(format!("invalid calendar API base URL '{}': {reason}", self.base_url))
        };
        let mut url =
            Url::parse(self.base_url.trim_end_matches('/')).map_err(|err| invalid(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["calendars", self.calendar_id.as_str(), "events"]);
        Ok(url)
    }
}

#[async_trait]
impl CalendarGateway for GoogleCalendarGateway {
    #[instrument(skip(self, token, event), fields(calendar_id = %self.calendar_id))]
    async fn create_event(
        &self,
        token: &AccessToken,
        event: &NewCalendarEvent,
    ) -> Result<CreatedCalendarEvent> {
        let mut url = self.events_url()?;
        if event.request_meeting_link {
            url.query_pairs_mut().append_pair("conferenceDataVersion", "1");
        }

        let body = GoogleEventRequest::from(event);
        let request =
            self.http.request(Method::POST, url).bearer_auth(token.secret()).json(&body);
        // Never retried: a lost response must not produce a second event.
        let response = self.http.send_once(request).await?;
        let created: GoogleEvent = parse_json(response).await?;

        let meeting_link = created.meeting_link();
        debug!(
            event_id = %created.id,
            has_meeting_link = meeting_link.is_some(),
            "Created calendar event"
        );
        Ok(CreatedCalendarEvent { html_link: created.html_link, meeting_link, id: created.id })
    }

    #[instrument(skip(self, token), fields(calendar_id = %self.calendar_id))]
    async fn list_events(
        &self,
        token: &AccessToken,
        query: &EventQuery,
    ) -> Result<Vec<ExternalEvent>> {
        let url = self.events_url()?;
        let params = [
            ("timeMin", rfc3339(query.time_min)),
            ("timeMax", rfc3339(query.time_max)),
            ("maxResults", query.max_results.to_string()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];

        let request =
            self.http.request(Method::GET, url).bearer_auth(token.secret()).query(&params);
        let response = self.http.send(request).await?;
        let listing: GoogleEventsResponse = parse_json(response).await?;

        if listing.next_page_token.is_some() {
            warn!(
                max_results = query.max_results,
                "Calendar listing truncated; remaining events are picked up on a later run"
            );
        }

        Ok(listing.items.into_iter().map(GoogleEvent::into_external).collect())
    }
}

async fn parse_json<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(status, Some(&body)));
    }
    response.json::<T>().await.map_err(|err| InfraError::from(err).into())
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/* -------------------------------------------------------------------------- */
/* Wire types */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventRequest {
    summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    start: GoogleDateTime,
    end: GoogleDateTime,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attendees: Vec<GoogleAttendee>,
    #[serde(skip_serializing_if = "Option::is_none")]
    conference_data: Option<GoogleConferenceData>,
}

impl From<&NewCalendarEvent> for GoogleEventRequest {
    fn from(event: &NewCalendarEvent) -> Self {
        Self {
            summary: event.summary.clone(),
            description: event.description.clone(),
            start: GoogleDateTime::from(&event.start),
            end: GoogleDateTime::from(&event.end),
            attendees: event
                .attendees
                .iter()
                .map(|attendee| GoogleAttendee {
                    email: attendee.email.clone(),
                    display_name: attendee.display_name.clone(),
                })
                .collect(),
            conference_data: event.request_meeting_link.then(|| GoogleConferenceData {
                create_request: Some(GoogleCreateConferenceRequest {
                    request_id: event.request_id.clone(),
                    conference_solution_key: GoogleSolutionKey { kind: MEET_SOLUTION.to_string() },
                }),
                entry_points: Vec::new(),
            }),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleDateTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    date_time: Option<String>,
    /// All-day events carry only a date.
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_zone: Option<String>,
}

impl From<&EventTime> for GoogleDateTime {
    fn from(time: &EventTime) -> Self {
        Self { date_time: Some(rfc3339(time.at)), date: None, time_zone: time.time_zone.clone() }
    }
}

impl GoogleDateTime {
    fn into_event_time(self, event_id: &str) -> Option<EventTime> {
        let raw = self.date_time?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(at) => Some(EventTime::new(at.with_timezone(&Utc), self.time_zone)),
            Err(err) => {
                warn!(event_id, value = %raw, error = %err, "Unparseable event timestamp");
                None
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleAttendee {
    #[serde(default)]
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleConferenceData {
    #[serde(skip_serializing_if = "Option::is_none")]
    create_request: Option<GoogleCreateConferenceRequest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    entry_points: Vec<GoogleEntryPoint>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleCreateConferenceRequest {
    request_id: String,
    conference_solution_key: GoogleSolutionKey,
}

#[derive(Debug, Serialize, Deserialize)]
struct GoogleSolutionKey {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEntryPoint {
    entry_point_type: String,
    uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventsResponse {
    #[serde(default)]
    items: Vec<GoogleEvent>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEvent {
    id: String,
    status: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    start: Option<GoogleDateTime>,
    end: Option<GoogleDateTime>,
    #[serde(default)]
    attendees: Vec<GoogleAttendee>,
    hangout_link: Option<String>,
    conference_data: Option<GoogleConferenceData>,
    html_link: Option<String>,
}

impl GoogleEvent {
    /// `hangoutLink`, else the first video entry point.
    fn meeting_link(&self) -> Option<String> {
        self.hangout_link.clone().or_else(|| {
            self.conference_data.as_ref().and_then(|data| {
                data.entry_points
                    .iter()
                    .find(|entry| entry.entry_point_type == VIDEO_ENTRY_POINT)
                    .map(|entry| entry.uri.clone())
            })
        })
    }

    fn into_external(self) -> ExternalEvent {
        let meeting_link = self.meeting_link();
        let id = self.id;
        let start = self.start.and_then(|start| start.into_event_time(&id));
        let end = self.end.and_then(|end| end.into_event_time(&id));
        let attendees = self
            .attendees
            .into_iter()
            .filter(|attendee| !attendee.email.trim().is_empty())
            .map(|attendee| EventAttendee {
                email: attendee.email.trim().to_string(),
                display_name: attendee.display_name,
            })
            .collect();

        ExternalEvent {
            cancelled: self.status.as_deref() == Some(CANCELLED_STATUS),
            start,
            end,
            summary: self.summary,
            description: self.description,
            attendees,
            meeting_link,
            html_link: self.html_link,
            id,
        }
    }
}
