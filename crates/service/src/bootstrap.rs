//! Wires a message bus with the default subscribers.

use domain::EventKind;
use futures_util::FutureExt;
use store::{InMemoryStore, InMemoryUnitOfWork, UnitOfWork};

use crate::handlers;
use crate::message_bus::MessageBus;

/// Builds a bus over `uow` with the default command handlers, an event
/// recorder for every event kind and a supersession reporter.
pub fn bootstrap<U: UnitOfWork + 'static>(uow: U) -> MessageBus<U> {
    let mut bus = MessageBus::new(uow);

    for kind in EventKind::ALL {
        bus.subscribe(kind, |event, uow| handlers::record_event(event, uow).boxed());
    }
    bus.subscribe(EventKind::AppointmentSuperseded, |event, uow| {
        handlers::report_supersession(event, uow).boxed()
    });

    tracing::debug!("message bus ready");
    bus
}

/// Builds a bus over a fresh in-memory store.
pub fn bootstrap_in_memory() -> MessageBus<InMemoryUnitOfWork> {
    bootstrap(InMemoryUnitOfWork::new(InMemoryStore::new()))
}
