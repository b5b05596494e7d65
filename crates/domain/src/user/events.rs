//! User domain events.

use chrono::{DateTime, Utc};
use common::AccountName;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::Role;

/// Events that can occur on a user aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum UserEvent {
    /// A client or service account was registered.
    UserRegistered(UserRegisteredData),
}

impl DomainEvent for UserEvent {
    fn event_type(&self) -> &'static str {
        match self {
            UserEvent::UserRegistered(_) => "UserRegistered",
        }
    }
}

/// Data for UserRegistered event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRegisteredData {
    pub account_name: AccountName,
    pub email: String,
    pub role: Role,
    pub registered_at: DateTime<Utc>,
}

impl UserEvent {
    /// Creates a UserRegistered event.
    pub fn user_registered(account_name: AccountName, email: String, role: Role) -> Self {
        UserEvent::UserRegistered(UserRegisteredData {
            account_name,
            email,
            role,
            registered_at: Utc::now(),
        })
    }
}
