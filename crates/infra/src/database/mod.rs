//! Database implementations

pub mod appointment_repository;
pub mod manager;
pub mod owner_directory;
pub mod sync_settings_repository;

pub use appointment_repository::SqliteAppointmentRepository;
pub use manager::{DbManager, SqliteConnection, SqlitePool};
pub use owner_directory::SqliteOwnerDirectory;
pub use sync_settings_repository::SqliteSyncSettingsStore;
