//! Calendar integration
//!
//! Google Calendar gateway plus the token providers it is used with.

pub mod google;
pub mod token;

pub use google::GoogleCalendarGateway;
pub use token::{token_provider_from_config, OAuthRefreshTokenProvider, StaticTokenProvider};
