//! Unit of work contract and its scope guard.

use std::ops::{Deref, DerefMut};

use async_trait::async_trait;
use domain::{Calendar, Event, User};

use crate::{Repository, Result, TrackingRepository};

/// Transactional scope over calendars and users.
///
/// A unit of work owns one persistence session at a time. Both repositories
/// it exposes are bound to that session, so [`UnitOfWork::commit`] persists
/// everything staged through either of them at once.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Session-bound calendar repository.
    type Calendars: Repository<Calendar>;

    /// Session-bound user repository.
    type Users: Repository<User>;

    /// Opens a new session and binds fresh repositories to it.
    ///
    /// Anything staged or queued by a previous session is dropped.
    async fn open(&mut self) -> Result<()>;

    fn calendars(&mut self) -> &mut TrackingRepository<Calendar, Self::Calendars>;

    fn users(&mut self) -> &mut TrackingRepository<User, Self::Users>;

    /// Persists every staged aggregate of both repositories atomically.
    async fn commit(&mut self) -> Result<()>;

    /// Discards staged changes and events not yet collected.
    fn rollback(&mut self);

    /// Drains the events raised on seen aggregates.
    ///
    /// Calendars are drained before users; within one aggregate events come
    /// out in the order they were raised. Each event is removed as it is
    /// yielded, so a second call only sees events raised in between.
    fn collect_new_events(&mut self) -> NewEvents<'_, Self>
    where
        Self: Sized,
    {
        NewEvents { uow: self }
    }
}

/// Iterator returned by [`UnitOfWork::collect_new_events`].
pub struct NewEvents<'a, U: UnitOfWork> {
    uow: &'a mut U,
}

impl<U: UnitOfWork> Iterator for NewEvents<'_, U> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        if let Some((owner, event)) = self.uow.calendars().pop_event() {
            return Some(Event::calendar(owner, event));
        }
        self.uow
            .users()
            .pop_event()
            .map(|(account_name, event)| Event::user(account_name, event))
    }
}

/// Extension trait providing scoped sessions for units of work.
#[async_trait]
pub trait UnitOfWorkExt: UnitOfWork + Sized {
    /// Opens a session and returns a guard that rolls it back on drop unless
    /// [`UnitOfWorkScope::commit`] succeeded.
    async fn begin<'a>(&'a mut self) -> Result<UnitOfWorkScope<'a, Self>> {
        self.open().await?;
        Ok(UnitOfWorkScope {
            uow: self,
            committed: false,
        })
    }
}

// Blanket implementation for all UnitOfWork implementations
impl<T: UnitOfWork + Sized> UnitOfWorkExt for T {}

/// An open session that is rolled back unless committed.
///
/// Dereferences to the unit of work, so repositories are reached through the
/// scope while it is alive.
pub struct UnitOfWorkScope<'a, U: UnitOfWork> {
    uow: &'a mut U,
    committed: bool,
}

impl<U: UnitOfWork> UnitOfWorkScope<'_, U> {
    /// Commits the session and closes the scope.
    ///
    /// If the commit fails the scope is dropped uncommitted and rolls back.
    pub async fn commit(mut self) -> Result<()> {
        self.uow.commit().await?;
        self.committed = true;
        Ok(())
    }
}

impl<U: UnitOfWork> Deref for UnitOfWorkScope<'_, U> {
    type Target = U;

    fn deref(&self) -> &U {
        self.uow
    }
}

impl<U: UnitOfWork> DerefMut for UnitOfWorkScope<'_, U> {
    fn deref_mut(&mut self) -> &mut U {
        self.uow
    }
}

impl<U: UnitOfWork> Drop for UnitOfWorkScope<'_, U> {
    fn drop(&mut self) {
        if !self.committed {
            tracing::debug!("rolling back uncommitted unit of work");
            self.uow.rollback();
        }
    }
}
