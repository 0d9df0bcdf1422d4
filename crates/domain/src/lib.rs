//! # Cadence Domain
//!
//! Business domain types and models for Cadence.
//!
//! This crate contains:
//! - Appointment and calendar event types
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants and pure helpers
//!
//! ## Architecture
//! - No dependencies on other Cadence crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
