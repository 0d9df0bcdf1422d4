//! Calendar integration port interfaces
//!
//! The engine talks to the external calendar and the token vending service
//! only through these traits.

use std::fmt;

use async_trait::async_trait;
use cadence_domain::{CreatedCalendarEvent, EventQuery, ExternalEvent, NewCalendarEvent, Result};

/// Bearer credential for the calendar API.
///
/// `Debug` is redacted so tokens never reach logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Supplies access tokens for a calendar provider
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Get an access token for the named provider (e.g. `"google"`)
    async fn access_token(&self, provider: &str) -> Result<AccessToken>;
}

/// Trait for calendar provider operations
#[async_trait]
pub trait CalendarGateway: Send + Sync {
    /// Create a single event; non-success responses surface as errors
    async fn create_event(
        &self,
        token: &AccessToken,
        event: &NewCalendarEvent,
    ) -> Result<CreatedCalendarEvent>;

    /// List single-occurrence events in a window, ordered by start time
    async fn list_events(&self, token: &AccessToken, query: &EventQuery)
        -> Result<Vec<ExternalEvent>>;
}
