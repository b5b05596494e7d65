//! User aggregate for client and service accounts.

mod events;

pub use events::{UserEvent, UserRegisteredData};

use std::convert::Infallible;

use common::{AccountName, Version};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

/// What an account does in the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Role {
    /// Books appointments in service calendars.
    Client,

    /// Owns a calendar and is found by its tags.
    Service { tags: Vec<String> },
}

impl Role {
    /// Returns the search tags of a service, or an empty slice for a client.
    pub fn tags(&self) -> &[String] {
        match self {
            Role::Client => &[],
            Role::Service { tags } => tags,
        }
    }

    pub fn is_service(&self) -> bool {
        matches!(self, Role::Service { .. })
    }
}

/// User aggregate root.
///
/// Users are registered once and never changed by the scheduling core, so
/// the aggregate exposes no command methods besides [`User::register`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    account_name: AccountName,

    #[serde(default)]
    version: Version,

    email: String,
    password: String,
    role: Role,
}

impl Aggregate for User {
    type Id = AccountName;
    type Event = UserEvent;
    type Error = Infallible;

    fn aggregate_type() -> &'static str {
        "User"
    }

    fn id(&self) -> &AccountName {
        &self.account_name
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            UserEvent::UserRegistered(data) => {
                self.account_name = data.account_name;
                self.email = data.email;
                self.role = data.role;
            }
        }
    }
}

impl User {
    /// Registers a new account.
    ///
    /// The password is kept on the aggregate but never copied into the
    /// registration event.
    pub fn register(
        account_name: AccountName,
        email: impl Into<String>,
        password: impl Into<String>,
        role: Role,
    ) -> (Self, Vec<UserEvent>) {
        let email = email.into();
        let event = UserEvent::user_registered(account_name.clone(), email.clone(), role.clone());
        let user = Self {
            account_name,
            version: Version::initial(),
            email,
            password: password.into(),
            role,
        };
        (user, vec![event])
    }

    pub fn account_name(&self) -> &AccountName {
        &self.account_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Returns true if this is a service carrying every one of `tags`.
    pub fn offers_all<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        self.role.is_service()
            && tags
                .iter()
                .all(|wanted| self.role.tags().iter().any(|t| t == wanted.as_ref()))
    }
}
