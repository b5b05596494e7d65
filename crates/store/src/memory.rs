//! In-memory store, repositories and unit of work.

use std::sync::Arc;

use async_trait::async_trait;
use common::{AccountName, Version};
use domain::{Aggregate, Calendar, User};
use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::{Repository, Result, StoreError, TrackingRepository, UnitOfWork};

/// Committed aggregates, one insertion-ordered table per aggregate kind.
#[derive(Debug, Default)]
pub struct Tables {
    calendars: IndexMap<AccountName, Calendar>,
    users: IndexMap<AccountName, User>,
}

/// Aggregates that have a table in the in-memory store.
pub trait Stored: Aggregate + 'static {
    fn table(tables: &Tables) -> &IndexMap<Self::Id, Self>;

    fn table_mut(tables: &mut Tables) -> &mut IndexMap<Self::Id, Self>;
}

impl Stored for Calendar {
    fn table(tables: &Tables) -> &IndexMap<AccountName, Self> {
        &tables.calendars
    }

    fn table_mut(tables: &mut Tables) -> &mut IndexMap<AccountName, Self> {
        &mut tables.calendars
    }
}

impl Stored for User {
    fn table(tables: &Tables) -> &IndexMap<AccountName, Self> {
        &tables.users
    }

    fn table_mut(tables: &mut Tables) -> &mut IndexMap<AccountName, Self> {
        &mut tables.users
    }
}

/// In-memory aggregate store for tests and local runs.
///
/// Cloning the store clones the handle; all clones share the same tables.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a committed aggregate, bypassing any session.
    pub async fn get<A: Stored>(&self, id: &A::Id) -> Option<A> {
        A::table(&*self.tables.read().await).get(id).cloned()
    }

    /// Returns the number of committed aggregates of one kind.
    pub async fn count<A: Stored>(&self) -> usize {
        A::table(&*self.tables.read().await).len()
    }

    /// Clears all tables.
    pub async fn clear(&self) {
        let mut tables = self.tables.write().await;
        tables.calendars.clear();
        tables.users.clear();
    }
}

/// Session-local view of one table.
///
/// Reads see the session's own staged writes first, then committed state.
/// Staged writes reach the store only through [`InMemoryUnitOfWork::commit`].
pub struct InMemoryRepository<A: Stored> {
    store: InMemoryStore,
    staged: IndexMap<A::Id, A>,
}

impl<A: Stored> InMemoryRepository<A> {
    pub fn new(store: InMemoryStore) -> Self {
        Self {
            store,
            staged: IndexMap::new(),
        }
    }

    /// Returns the number of aggregates waiting for commit.
    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    /// Fails if any staged aggregate was read at an outdated version.
    fn check(&self, tables: &Tables) -> Result<()> {
        let table = A::table(tables);
        for (id, aggregate) in &self.staged {
            let actual = table
                .get(id)
                .map(|stored| stored.version())
                .unwrap_or_else(Version::initial);

            if aggregate.version() != actual {
                return Err(StoreError::ConcurrencyConflict {
                    aggregate_type: A::aggregate_type(),
                    id: id.to_string(),
                    expected: aggregate.version(),
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Moves staged aggregates into the table, bumping their versions.
    fn write(&mut self, tables: &mut Tables) -> usize {
        let table = A::table_mut(tables);
        let written = self.staged.len();
        for (id, mut aggregate) in self.staged.drain(..) {
            aggregate.set_version(aggregate.version().next());
            table.insert(id, aggregate);
        }
        written
    }

    fn discard(&mut self) {
        self.staged.clear();
    }
}

#[async_trait]
impl<A: Stored> Repository<A> for InMemoryRepository<A> {
    async fn get(&mut self, id: &A::Id) -> Result<A> {
        if let Some(staged) = self.staged.get(id) {
            return Ok(staged.clone());
        }
        let tables = self.store.tables.read().await;
        A::table(&tables)
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found::<A>(id))
    }

    async fn list(&mut self) -> Result<Vec<A>> {
        let tables = self.store.tables.read().await;
        let table = A::table(&tables);

        let mut aggregates: Vec<A> = table
            .iter()
            .map(|(id, stored)| self.staged.get(id).unwrap_or(stored).clone())
            .collect();
        aggregates.extend(
            self.staged
                .iter()
                .filter(|(id, _)| !table.contains_key(*id))
                .map(|(_, staged)| staged.clone()),
        );

        Ok(aggregates)
    }

    async fn add(&mut self, aggregate: A) -> Result<()> {
        self.staged.insert(aggregate.id().clone(), aggregate);
        Ok(())
    }
}

/// Unit of work over an [`InMemoryStore`].
///
/// Commit takes the store's write lock once, checks the read version of every
/// staged aggregate of both tables, and only then writes any of them.
pub struct InMemoryUnitOfWork {
    store: InMemoryStore,
    calendars: TrackingRepository<Calendar, InMemoryRepository<Calendar>>,
    users: TrackingRepository<User, InMemoryRepository<User>>,
}

impl InMemoryUnitOfWork {
    pub fn new(store: InMemoryStore) -> Self {
        Self {
            calendars: TrackingRepository::new(InMemoryRepository::new(store.clone())),
            users: TrackingRepository::new(InMemoryRepository::new(store.clone())),
            store,
        }
    }

    /// Returns the store this unit of work commits to.
    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    type Calendars = InMemoryRepository<Calendar>;
    type Users = InMemoryRepository<User>;

    async fn open(&mut self) -> Result<()> {
        self.calendars = TrackingRepository::new(InMemoryRepository::new(self.store.clone()));
        self.users = TrackingRepository::new(InMemoryRepository::new(self.store.clone()));
        Ok(())
    }

    fn calendars(&mut self) -> &mut TrackingRepository<Calendar, Self::Calendars> {
        &mut self.calendars
    }

    fn users(&mut self) -> &mut TrackingRepository<User, Self::Users> {
        &mut self.users
    }

    #[tracing::instrument(skip(self))]
    async fn commit(&mut self) -> Result<()> {
        let mut tables = self.store.tables.write().await;

        let checked = self
            .calendars
            .inner()
            .check(&tables)
            .and_then(|()| self.users.inner().check(&tables));
        if let Err(e) = checked {
            metrics::counter!("store_conflicts_total").increment(1);
            tracing::warn!(error = %e, "commit rejected");
            return Err(e);
        }

        let written = self.calendars.inner_mut().write(&mut tables)
            + self.users.inner_mut().write(&mut tables);

        metrics::counter!("store_commits_total").increment(1);
        tracing::debug!(written, "unit of work committed");

        Ok(())
    }

    fn rollback(&mut self) {
        self.calendars.inner_mut().discard();
        self.users.inner_mut().discard();
        self.calendars.discard_events();
        self.users.discard_events();
    }
}
