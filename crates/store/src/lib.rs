//! Persistence layer for the timetable.
//!
//! Repositories load and stage aggregates inside one session; the unit of
//! work commits a session atomically and hands back the events raised on the
//! aggregates it touched.

pub mod error;
pub mod memory;
pub mod repository;
pub mod unit_of_work;

pub use error::{Result, StoreError};
pub use memory::{InMemoryRepository, InMemoryStore, InMemoryUnitOfWork, Stored};
pub use repository::{CommandResult, Repository, TrackingRepository};
pub use unit_of_work::{NewEvents, UnitOfWork, UnitOfWorkExt, UnitOfWorkScope};
