//! Commands accepted by the timetable.
//!
//! Each command carries everything its handler needs. Commands are grouped in
//! the closed [`Command`] enum so that dispatch is an exhaustive `match`.

use chrono::NaiveDateTime;
use common::{AccountName, AppointmentId};
use serde::{Deserialize, Serialize};

/// Command to request an appointment in a service's calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAppointment {
    /// Owner of the calendar.
    pub to_user: AccountName,

    /// Account asking for the appointment.
    pub from_user: AccountName,

    pub since: NaiveDateTime,
    pub until: NaiveDateTime,
    pub description: String,
}

impl CreateAppointment {
    /// Creates a new CreateAppointment command.
    pub fn new(
        to_user: impl Into<AccountName>,
        from_user: impl Into<AccountName>,
        since: NaiveDateTime,
        until: NaiveDateTime,
        description: impl Into<String>,
    ) -> Self {
        Self {
            to_user: to_user.into(),
            from_user: from_user.into(),
            since,
            until,
            description: description.into(),
        }
    }
}

/// Command to accept a pending appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptAppointment {
    /// Owner of the calendar holding the appointment.
    pub account_name: AccountName,
    pub id: AppointmentId,
}

impl AcceptAppointment {
    /// Creates a new AcceptAppointment command.
    pub fn new(account_name: impl Into<AccountName>, id: impl Into<AppointmentId>) -> Self {
        Self {
            account_name: account_name.into(),
            id: id.into(),
        }
    }
}

/// Query for a single appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAppointment {
    pub account_name: AccountName,
    pub id: AppointmentId,
}

impl GetAppointment {
    pub fn new(account_name: impl Into<AccountName>, id: impl Into<AppointmentId>) -> Self {
        Self {
            account_name: account_name.into(),
            id: id.into(),
        }
    }
}

/// Query for the appointments of a calendar as seen by some account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAppointments {
    /// Owner of the calendar.
    pub of_user: AccountName,

    /// Account looking at the calendar.
    pub for_user: AccountName,
}

impl ListAppointments {
    pub fn new(of_user: impl Into<AccountName>, for_user: impl Into<AccountName>) -> Self {
        Self {
            of_user: of_user.into(),
            for_user: for_user.into(),
        }
    }
}

/// Command to register a client account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateClient {
    pub account_name: AccountName,
    pub email: String,
    pub password: String,
}

impl CreateClient {
    /// Creates a new CreateClient command.
    pub fn new(
        account_name: impl Into<AccountName>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Command to register a service account and open its calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateService {
    pub account_name: AccountName,
    pub email: String,
    pub password: String,
    pub tags: Vec<String>,
}

impl CreateService {
    /// Creates a new CreateService command.
    pub fn new(
        account_name: impl Into<AccountName>,
        email: impl Into<String>,
        password: impl Into<String>,
        tags: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            email: email.into(),
            password: password.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }
}

/// Query for a registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetUser {
    pub account_name: AccountName,
}

impl GetUser {
    pub fn new(account_name: impl Into<AccountName>) -> Self {
        Self {
            account_name: account_name.into(),
        }
    }
}

/// Query for services carrying every one of the given tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchServices {
    pub tags: Vec<String>,
}

impl SearchServices {
    pub fn new(tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }
}

/// Any command the message bus can dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Command {
    CreateAppointment(CreateAppointment),
    AcceptAppointment(AcceptAppointment),
    GetAppointment(GetAppointment),
    ListAppointments(ListAppointments),
    CreateClient(CreateClient),
    CreateService(CreateService),
    GetUser(GetUser),
    SearchServices(SearchServices),
}

impl Command {
    /// Returns the kind used to look up the command's handler.
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::CreateAppointment(_) => CommandKind::CreateAppointment,
            Command::AcceptAppointment(_) => CommandKind::AcceptAppointment,
            Command::GetAppointment(_) => CommandKind::GetAppointment,
            Command::ListAppointments(_) => CommandKind::ListAppointments,
            Command::CreateClient(_) => CommandKind::CreateClient,
            Command::CreateService(_) => CommandKind::CreateService,
            Command::GetUser(_) => CommandKind::GetUser,
            Command::SearchServices(_) => CommandKind::SearchServices,
        }
    }
}

/// Discriminant of [`Command`], used as the handler registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    CreateAppointment,
    AcceptAppointment,
    GetAppointment,
    ListAppointments,
    CreateClient,
    CreateService,
    GetUser,
    SearchServices,
}

impl CommandKind {
    /// Every command kind, in declaration order.
    pub const ALL: [CommandKind; 8] = [
        CommandKind::CreateAppointment,
        CommandKind::AcceptAppointment,
        CommandKind::GetAppointment,
        CommandKind::ListAppointments,
        CommandKind::CreateClient,
        CommandKind::CreateService,
        CommandKind::GetUser,
        CommandKind::SearchServices,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::CreateAppointment => "CreateAppointment",
            CommandKind::AcceptAppointment => "AcceptAppointment",
            CommandKind::GetAppointment => "GetAppointment",
            CommandKind::ListAppointments => "ListAppointments",
            CommandKind::CreateClient => "CreateClient",
            CommandKind::CreateService => "CreateService",
            CommandKind::GetUser => "GetUser",
            CommandKind::SearchServices => "SearchServices",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CreateAppointment> for Command {
    fn from(cmd: CreateAppointment) -> Self {
        Command::CreateAppointment(cmd)
    }
}

impl From<AcceptAppointment> for Command {
    fn from(cmd: AcceptAppointment) -> Self {
        Command::AcceptAppointment(cmd)
    }
}

impl From<GetAppointment> for Command {
    fn from(cmd: GetAppointment) -> Self {
        Command::GetAppointment(cmd)
    }
}

impl From<ListAppointments> for Command {
    fn from(cmd: ListAppointments) -> Self {
        Command::ListAppointments(cmd)
    }
}

impl From<CreateClient> for Command {
    fn from(cmd: CreateClient) -> Self {
        Command::CreateClient(cmd)
    }
}

impl From<CreateService> for Command {
    fn from(cmd: CreateService) -> Self {
        Command::CreateService(cmd)
    }
}

impl From<GetUser> for Command {
    fn from(cmd: GetUser) -> Self {
        Command::GetUser(cmd)
    }
}

impl From<SearchServices> for Command {
    fn from(cmd: SearchServices) -> Self {
        Command::SearchServices(cmd)
    }
}
