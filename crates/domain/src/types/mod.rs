//! Domain types and models

pub mod appointment;
pub mod calendar;
pub mod sync;

pub use appointment::{
    Appointment, AppointmentFilter, AppointmentId, AppointmentStatus, AppointmentUpdate, Attendee,
    ExternalLinkage, LinkageFilter, NewAppointment, Origin,
};
pub use calendar::{
    CreatedCalendarEvent, EventAttendee, EventQuery, EventTime, ExternalEvent, NewCalendarEvent,
};
pub use sync::{RunSummary, SyncSettings};
