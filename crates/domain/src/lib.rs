//! Domain layer for the timetable.
//!
//! This crate provides the core domain abstractions including:
//! - Aggregate trait for entities whose state changes through events
//! - DomainEvent trait for domain events
//! - Calendar aggregate enforcing non-overlapping accepted appointments
//! - User aggregate for client and service accounts
//! - Command, Event and Message types routed by the message bus

pub mod aggregate;
pub mod calendar;
pub mod command;
pub mod message;
pub mod user;

pub use aggregate::{Aggregate, DomainEvent};
pub use calendar::{Appointment, Calendar, CalendarError, CalendarEvent};
pub use command::{
    AcceptAppointment, Command, CommandKind, CreateAppointment, CreateClient, CreateService,
    GetAppointment, GetUser, ListAppointments, SearchServices,
};
pub use message::{Event, EventKind, Message};
pub use user::{Role, User, UserEvent};
