//! Macro for implementing Display and FromStr for status enums
//!
//! Status enums are persisted as lowercase strings; this macro keeps the
//! string mapping for both directions in a single place.
//!
//! # Example
//!
//! ```rust
//! use cadence_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum ReminderState {
//!     Queued,
//!     Sent,
//! }
//!
//! impl_domain_status_conversions!(ReminderState {
//!     Queued => "queued",
//!     Sent => "sent",
//! });
//!
//! assert_eq!(ReminderState::Sent.to_string(), "sent");
//! assert_eq!("QUEUED".parse::<ReminderState>().unwrap(), ReminderState::Queued);
//! ```

/// Implements Display and FromStr traits for status enums
///
/// Parsing is case-insensitive; display always yields the mapped string.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
