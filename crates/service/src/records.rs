//! Serializable results returned by command handlers.
//!
//! Records are snapshots taken after a handler finished; they never hand out
//! aggregates.

use chrono::NaiveDateTime;
use common::{AccountName, AppointmentId};
use domain::{Appointment, Role, User};
use serde::{Deserialize, Serialize};

/// Full view of an appointment, for the calendar owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub id: AppointmentId,
    #[serde(rename = "from_user")]
    pub requester: AccountName,
    pub since: NaiveDateTime,
    pub until: NaiveDateTime,
    pub description: String,
    pub accepted: bool,
}

impl From<&Appointment> for AppointmentRecord {
    fn from(appointment: &Appointment) -> Self {
        Self {
            id: appointment.id(),
            requester: appointment.requester().clone(),
            since: appointment.since(),
            until: appointment.until(),
            description: appointment.description().to_string(),
            accepted: appointment.is_accepted(),
        }
    }
}

/// An accepted appointment as other accounts see it: only the time span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusySlot {
    pub since: NaiveDateTime,
    pub until: NaiveDateTime,
}

impl From<&Appointment> for BusySlot {
    fn from(appointment: &Appointment) -> Self {
        Self {
            since: appointment.since(),
            until: appointment.until(),
        }
    }
}

/// A registered account.
///
/// Carries the stored password so the authentication layer can check it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub account_name: AccountName,
    pub email: String,
    pub password: String,

    /// Present for service accounts only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        Self {
            account_name: user.account_name().clone(),
            email: user.email().to_string(),
            password: user.password().to_string(),
            tags: match user.role() {
                Role::Client => None,
                Role::Service { tags } => Some(tags.clone()),
            },
        }
    }
}

/// A service as shown in search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSummary {
    pub account_name: AccountName,
    pub tags: Vec<String>,
}

impl From<&User> for ServiceSummary {
    fn from(user: &User) -> Self {
        Self {
            account_name: user.account_name().clone(),
            tags: user.role().tags().to_vec(),
        }
    }
}

/// Output of one command, in the shape its handler produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CommandOutput {
    User(UserRecord),
    Services(Vec<ServiceSummary>),
    Appointment(AppointmentRecord),
    Appointments(Vec<AppointmentRecord>),
    BusySlots(Vec<BusySlot>),
}

impl CommandOutput {
    pub fn as_user(&self) -> Option<&UserRecord> {
        match self {
            CommandOutput::User(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_appointment(&self) -> Option<&AppointmentRecord> {
        match self {
            CommandOutput::Appointment(record) => Some(record),
            _ => None,
        }
    }
}
