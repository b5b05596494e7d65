//! Calendar domain events.

use chrono::{DateTime, Utc};
use common::{AccountName, AppointmentId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::Appointment;

/// Events that can occur on a calendar aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CalendarEvent {
    /// A calendar was opened for a service account.
    CalendarOpened(CalendarOpenedData),

    /// A client asked for an appointment.
    AppointmentRequested(AppointmentRequestedData),

    /// The calendar owner accepted an appointment.
    AppointmentAccepted(AppointmentAcceptedData),

    /// A pending appointment was dropped because a colliding one was accepted.
    AppointmentSuperseded(AppointmentSupersededData),
}

impl DomainEvent for CalendarEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CalendarEvent::CalendarOpened(_) => "CalendarOpened",
            CalendarEvent::AppointmentRequested(_) => "AppointmentRequested",
            CalendarEvent::AppointmentAccepted(_) => "AppointmentAccepted",
            CalendarEvent::AppointmentSuperseded(_) => "AppointmentSuperseded",
        }
    }
}

/// Data for CalendarOpened event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarOpenedData {
    /// The service account owning the calendar.
    pub owner: AccountName,

    /// When the calendar was opened.
    pub opened_at: DateTime<Utc>,
}

/// Data for AppointmentRequested event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRequestedData {
    /// The new, pending appointment.
    pub appointment: Appointment,

    /// When the request was recorded.
    pub requested_at: DateTime<Utc>,
}

/// Data for AppointmentAccepted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentAcceptedData {
    /// The accepted appointment.
    pub appointment_id: AppointmentId,

    /// When the appointment was accepted.
    pub accepted_at: DateTime<Utc>,
}

/// Data for AppointmentSuperseded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentSupersededData {
    /// The pending appointment that was dropped.
    pub appointment_id: AppointmentId,

    /// Who had asked for the dropped appointment.
    pub requester: AccountName,

    /// The accepted appointment that took its slot.
    pub superseded_by: AppointmentId,
}

// Factory methods for creating events
impl CalendarEvent {
    /// Creates a CalendarOpened event.
    pub fn calendar_opened(owner: AccountName) -> Self {
        CalendarEvent::CalendarOpened(CalendarOpenedData {
            owner,
            opened_at: Utc::now(),
        })
    }

    /// Creates an AppointmentRequested event.
    pub fn appointment_requested(appointment: Appointment) -> Self {
        CalendarEvent::AppointmentRequested(AppointmentRequestedData {
            appointment,
            requested_at: Utc::now(),
        })
    }

    /// Creates an AppointmentAccepted event.
    pub fn appointment_accepted(appointment_id: AppointmentId) -> Self {
        CalendarEvent::AppointmentAccepted(AppointmentAcceptedData {
            appointment_id,
            accepted_at: Utc::now(),
        })
    }

    /// Creates an AppointmentSuperseded event.
    pub fn appointment_superseded(dropped: &Appointment, superseded_by: AppointmentId) -> Self {
        CalendarEvent::AppointmentSuperseded(AppointmentSupersededData {
            appointment_id: dropped.id(),
            requester: dropped.requester().clone(),
            superseded_by,
        })
    }

    /// Returns the appointment this event is about, if any.
    pub fn appointment_id(&self) -> Option<AppointmentId> {
        match self {
            CalendarEvent::CalendarOpened(_) => None,
            CalendarEvent::AppointmentRequested(data) => Some(data.appointment.id()),
            CalendarEvent::AppointmentAccepted(data) => Some(data.appointment_id),
            CalendarEvent::AppointmentSuperseded(data) => Some(data.appointment_id),
        }
    }
}
