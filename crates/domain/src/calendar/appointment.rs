//! A single time-bounded appointment request.

use chrono::NaiveDateTime;
use common::{AccountName, AppointmentId};
use serde::{Deserialize, Serialize};

use super::CalendarError;

/// A request for the half-open time span `[since, until)` in some calendar.
///
/// Appointments are created pending and only the owning [`Calendar`] can
/// mark them accepted.
///
/// [`Calendar`]: super::Calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    id: AppointmentId,
    requester: AccountName,
    since: NaiveDateTime,
    until: NaiveDateTime,
    description: String,
    accepted: bool,
}

impl Appointment {
    /// Creates a pending appointment.
    ///
    /// Fails with [`CalendarError::InvalidInterval`] unless `since < until`.
    pub fn new(
        id: AppointmentId,
        requester: AccountName,
        since: NaiveDateTime,
        until: NaiveDateTime,
        description: impl Into<String>,
    ) -> Result<Self, CalendarError> {
        if until <= since {
            return Err(CalendarError::InvalidInterval { since, until });
        }

        Ok(Self {
            id,
            requester,
            since,
            until,
            description: description.into(),
            accepted: false,
        })
    }

    pub fn id(&self) -> AppointmentId {
        self.id
    }

    pub fn requester(&self) -> &AccountName {
        &self.requester
    }

    pub fn since(&self) -> NaiveDateTime {
        self.since
    }

    pub fn until(&self) -> NaiveDateTime {
        self.until
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Returns true if the two appointments overlap in time.
    ///
    /// Intervals are half-open, so touching endpoints do not collide, and an
    /// appointment never collides with itself. Acceptance is ignored.
    pub fn collides(&self, other: &Appointment) -> bool {
        self.id != other.id && self.since < other.until && other.since < self.until
    }

    pub(crate) fn accept(&mut self) {
        self.accepted = true;
    }
}

impl std::fmt::Display for Appointment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Appointment#{}({}, {})", self.id, self.since, self.until)
    }
}
