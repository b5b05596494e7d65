//! Calendar aggregate and related types.

mod aggregate;
mod appointment;
mod events;

pub use aggregate::Calendar;
pub use appointment::Appointment;
pub use events::{
    AppointmentAcceptedData, AppointmentRequestedData, AppointmentSupersededData, CalendarEvent,
    CalendarOpenedData,
};

use chrono::NaiveDateTime;
use common::AppointmentId;
use thiserror::Error;

/// Errors that can occur when operating on a calendar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("Invalid interval: {since} is not before {until}")]
    InvalidInterval {
        since: NaiveDateTime,
        until: NaiveDateTime,
    },

    #[error("Slot unavailable: collides with accepted appointments {colliding:?}")]
    SlotUnavailable { colliding: Vec<AppointmentId> },

    #[error("Appointment not found: {0}")]
    AppointmentNotFound(AppointmentId),
}
