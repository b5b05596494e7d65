//! Core aggregate and domain event traits.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use common::Version;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Debug + Send + Sync + Clone {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregate roots.
///
/// An aggregate is a consistency boundary: its command methods inspect the
/// current state and either reject the request or return the events that
/// describe the change. Only [`Aggregate::apply`] mutates state, so a
/// rejected command never leaves the aggregate half-modified.
pub trait Aggregate: Clone + Debug + Send + Sync + Sized {
    /// Identity under which the aggregate is stored.
    type Id: Clone + Eq + Hash + Display + Debug + Send + Sync;

    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// The type of errors its command methods can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the aggregate type name.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's identity.
    fn id(&self) -> &Self::Id;

    /// Returns the version the aggregate was loaded at.
    fn version(&self) -> Version;

    /// Sets the aggregate version.
    ///
    /// Called by the store after a successful commit.
    fn set_version(&mut self, version: Version);

    /// Applies an event to the aggregate, updating its state.
    ///
    /// This method must be pure and deterministic, and it must not fail:
    /// events describe facts that were already decided.
    fn apply(&mut self, event: Self::Event);

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }
}
