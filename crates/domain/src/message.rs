//! Events and messages routed by the message bus.

use common::AccountName;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::calendar::CalendarEvent;
use crate::command::Command;
use crate::user::UserEvent;

/// A domain event paired with the identity of the aggregate that raised it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "aggregate", rename_all = "snake_case")]
pub enum Event {
    Calendar {
        owner: AccountName,
        event: CalendarEvent,
    },
    User {
        account_name: AccountName,
        event: UserEvent,
    },
}

impl Event {
    pub fn calendar(owner: AccountName, event: CalendarEvent) -> Self {
        Event::Calendar { owner, event }
    }

    pub fn user(account_name: AccountName, event: UserEvent) -> Self {
        Event::User {
            account_name,
            event,
        }
    }

    /// Returns the identity of the aggregate that raised the event.
    pub fn aggregate_id(&self) -> &AccountName {
        match self {
            Event::Calendar { owner, .. } => owner,
            Event::User { account_name, .. } => account_name,
        }
    }

    /// Returns the kind used to look up the event's subscribers.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Calendar { event, .. } => match event {
                CalendarEvent::CalendarOpened(_) => EventKind::CalendarOpened,
                CalendarEvent::AppointmentRequested(_) => EventKind::AppointmentRequested,
                CalendarEvent::AppointmentAccepted(_) => EventKind::AppointmentAccepted,
                CalendarEvent::AppointmentSuperseded(_) => EventKind::AppointmentSuperseded,
            },
            Event::User { event, .. } => match event {
                UserEvent::UserRegistered(_) => EventKind::UserRegistered,
            },
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Calendar { event, .. } => event.event_type(),
            Event::User { event, .. } => event.event_type(),
        }
    }
}

/// Discriminant of [`Event`], used as the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    CalendarOpened,
    AppointmentRequested,
    AppointmentAccepted,
    AppointmentSuperseded,
    UserRegistered,
}

impl EventKind {
    /// Every event kind, in declaration order.
    pub const ALL: [EventKind; 5] = [
        EventKind::CalendarOpened,
        EventKind::AppointmentRequested,
        EventKind::AppointmentAccepted,
        EventKind::AppointmentSuperseded,
        EventKind::UserRegistered,
    ];
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Unit of work for the message bus: a command or an event.
#[derive(Debug, Clone)]
pub enum Message {
    Command(Command),
    Event(Event),
}

impl From<Command> for Message {
    fn from(command: Command) -> Self {
        Message::Command(command)
    }
}

impl From<Event> for Message {
    fn from(event: Event) -> Self {
        Message::Event(event)
    }
}
