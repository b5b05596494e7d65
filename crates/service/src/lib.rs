//! Application service layer for the timetable.
//!
//! Command handlers run each command inside its own unit-of-work scope. The
//! message bus dispatches commands and the events they raise, one message at
//! a time.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handlers;
pub mod message_bus;
pub mod records;
pub mod telemetry;

pub use bootstrap::{bootstrap, bootstrap_in_memory};
pub use config::{Config, LogFormat};
pub use error::{ErrorKind, ServiceError};
pub use message_bus::{CommandHandler, EventHandler, MessageBus};
pub use records::{AppointmentRecord, BusySlot, CommandOutput, ServiceSummary, UserRecord};
pub use telemetry::TelemetryError;
