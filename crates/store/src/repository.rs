//! Repository contract and the identity-tracking decorator.

use std::collections::VecDeque;
use std::marker::PhantomData;

use async_trait::async_trait;
use domain::Aggregate;
use indexmap::IndexMap;

use crate::{Result, StoreError};

/// Capability for fetching and staging aggregates by identity.
///
/// Implementations are bound to one persistence session: `add` stages an
/// insert-or-replace that becomes visible to other sessions only when the
/// owning unit of work commits.
#[async_trait]
pub trait Repository<A: Aggregate>: Send {
    /// Loads an aggregate, failing with [`StoreError::NotFound`] if absent.
    async fn get(&mut self, id: &A::Id) -> Result<A>;

    /// Loads every aggregate of this kind.
    async fn list(&mut self) -> Result<Vec<A>>;

    /// Stages an aggregate for the next commit.
    async fn add(&mut self, aggregate: A) -> Result<()>;
}

/// Result of running a command method through a repository.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were generated and queued.
    pub events: Vec<A::Event>,
}

/// Repository decorator that remembers every aggregate it hands out.
///
/// Each seen identity owns a FIFO of events raised on that aggregate during
/// the current unit of work. The unit of work drains them after commit.
pub struct TrackingRepository<A: Aggregate, R> {
    inner: R,
    seen: IndexMap<A::Id, VecDeque<A::Event>>,
    _phantom: PhantomData<fn() -> A>,
}

impl<A, R> TrackingRepository<A, R>
where
    A: Aggregate + 'static,
    R: Repository<A>,
{
    /// Wraps a session-bound repository with an empty seen set.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            seen: IndexMap::new(),
            _phantom: PhantomData,
        }
    }

    /// Returns the wrapped repository.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Identities of every aggregate returned or added, in first-seen order.
    pub fn seen(&self) -> impl Iterator<Item = &A::Id> {
        self.seen.keys()
    }

    /// Returns true if any seen aggregate still has queued events.
    pub fn has_pending_events(&self) -> bool {
        self.seen.values().any(|queue| !queue.is_empty())
    }

    /// Loads an aggregate, runs one of its command methods and records the
    /// outcome.
    ///
    /// On success the events are applied, the updated aggregate is staged and
    /// the events are queued under its identity. A rejected command stages
    /// nothing and queues nothing.
    pub async fn execute<F, E>(
        &mut self,
        id: &A::Id,
        decide: F,
    ) -> std::result::Result<CommandResult<A>, E>
    where
        F: FnOnce(&A) -> std::result::Result<Vec<A::Event>, A::Error> + Send,
        E: From<StoreError> + From<A::Error>,
    {
        let mut aggregate = self.get(id).await?;
        let events = decide(&aggregate)?;

        if !events.is_empty() {
            aggregate.apply_events(events.iter().cloned());
            self.inner.add(aggregate.clone()).await?;
            self.queue(id, events.iter().cloned());
        }

        Ok(CommandResult { aggregate, events })
    }

    /// Stages a new aggregate together with the events describing its
    /// creation.
    pub async fn add_with_events(&mut self, aggregate: A, events: Vec<A::Event>) -> Result<()> {
        let id = aggregate.id().clone();
        self.add(aggregate).await?;
        self.queue(&id, events);
        Ok(())
    }

    /// Removes and returns the oldest queued event of the first seen
    /// aggregate that has one.
    pub fn pop_event(&mut self) -> Option<(A::Id, A::Event)> {
        self.seen
            .iter_mut()
            .find_map(|(id, queue)| queue.pop_front().map(|event| (id.clone(), event)))
    }

    /// Drops every queued event, keeping the seen set.
    pub fn discard_events(&mut self) {
        for queue in self.seen.values_mut() {
            queue.clear();
        }
    }

    fn track(&mut self, id: &A::Id) -> &mut VecDeque<A::Event> {
        self.seen.entry(id.clone()).or_default()
    }

    fn queue(&mut self, id: &A::Id, events: impl IntoIterator<Item = A::Event>) {
        self.track(id).extend(events);
    }
}

#[async_trait]
impl<A, R> Repository<A> for TrackingRepository<A, R>
where
    A: Aggregate + 'static,
    R: Repository<A>,
{
    async fn get(&mut self, id: &A::Id) -> Result<A> {
        let aggregate = self.inner.get(id).await?;
        self.track(id);
        Ok(aggregate)
    }

    async fn list(&mut self) -> Result<Vec<A>> {
        let aggregates = self.inner.list().await?;
        for aggregate in &aggregates {
            self.track(aggregate.id());
        }
        Ok(aggregates)
    }

    async fn add(&mut self, aggregate: A) -> Result<()> {
        self.track(aggregate.id());
        self.inner.add(aggregate).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{AccountName, Version};
    use domain::{DomainEvent, Role, User, UserEvent};
    use serde::{Deserialize, Serialize};

    /// Repository over a plain map, without sessions or versions.
    #[derive(Default)]
    struct MapRepository {
        users: IndexMap<AccountName, User>,
    }

    #[async_trait]
    impl Repository<User> for MapRepository {
        async fn get(&mut self, id: &AccountName) -> Result<User> {
            self.users
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::not_found::<User>(id))
        }

        async fn list(&mut self) -> Result<Vec<User>> {
            Ok(self.users.values().cloned().collect())
        }

        async fn add(&mut self, user: User) -> Result<()> {
            self.users.insert(user.account_name().clone(), user);
            Ok(())
        }
    }

    fn tracked(inner: MapRepository) -> TrackingRepository<User, MapRepository> {
        TrackingRepository::new(inner)
    }

    fn client(name: &str) -> (User, Vec<UserEvent>) {
        User::register(name.into(), format!("{name}@example.com"), "pw", Role::Client)
    }

    #[tokio::test]
    async fn test_get_records_seen_once() {
        let mut repo = tracked(MapRepository::default());
        repo.add(client("john").0).await.unwrap();

        repo.get(&"john".into()).await.unwrap();
        repo.get(&"john".into()).await.unwrap();

        let seen: Vec<_> = repo.seen().map(AccountName::as_str).collect();
        assert_eq!(seen, vec!["john"]);
    }

    #[tokio::test]
    async fn test_failed_get_is_not_seen() {
        let mut repo = tracked(MapRepository::default());

        let result = repo.get(&"ghost".into()).await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert_eq!(repo.seen().count(), 0);
    }

    #[tokio::test]
    async fn test_list_records_in_order() {
        let mut inner = MapRepository::default();
        for name in ["bob", "alice", "carol"] {
            inner.add(client(name).0).await.unwrap();
        }
        let mut repo = tracked(inner);

        let listed = repo.list().await.unwrap();

        assert_eq!(listed.len(), 3);
        let seen: Vec<_> = repo.seen().map(AccountName::as_str).collect();
        assert_eq!(seen, vec!["bob", "alice", "carol"]);
    }

    #[tokio::test]
    async fn test_events_pop_in_seen_then_fifo_order() {
        let mut repo = tracked(MapRepository::default());
        let (bob, bob_events) = client("bob");
        let (ann, ann_events) = client("ann");

        repo.add_with_events(bob, bob_events).await.unwrap();
        repo.add_with_events(ann, ann_events).await.unwrap();
        assert!(repo.has_pending_events());

        let (first, event) = repo.pop_event().unwrap();
        assert_eq!(first.as_str(), "bob");
        assert_eq!(event.event_type(), "UserRegistered");
        let (second, _) = repo.pop_event().unwrap();
        assert_eq!(second.as_str(), "ann");
        assert!(repo.pop_event().is_none());
        assert!(!repo.has_pending_events());
    }

    #[tokio::test]
    async fn test_discard_events_keeps_seen() {
        let mut repo = tracked(MapRepository::default());
        let (bob, events) = client("bob");
        repo.add_with_events(bob, events).await.unwrap();

        repo.discard_events();

        assert!(repo.pop_event().is_none());
        assert_eq!(repo.seen().count(), 1);
    }

    // A counter aggregate, to exercise `execute` without the calendar rules.
    #[derive(Debug, Clone)]
    struct Counter {
        id: String,
        value: u32,
        version: Version,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Incremented;

    impl DomainEvent for Incremented {
        fn event_type(&self) -> &'static str {
            "Incremented"
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("counter is full")]
    struct Full;

    #[derive(Debug)]
    enum CounterFailure {
        Store(StoreError),
        Full,
    }

    impl From<StoreError> for CounterFailure {
        fn from(e: StoreError) -> Self {
            CounterFailure::Store(e)
        }
    }

    impl From<Full> for CounterFailure {
        fn from(_: Full) -> Self {
            CounterFailure::Full
        }
    }

    impl Aggregate for Counter {
        type Id = String;
        type Event = Incremented;
        type Error = Full;

        fn aggregate_type() -> &'static str {
            "Counter"
        }

        fn id(&self) -> &String {
            &self.id
        }

        fn version(&self) -> Version {
            self.version
        }

        fn set_version(&mut self, version: Version) {
            self.version = version;
        }

        fn apply(&mut self, _: Incremented) {
            self.value += 1;
        }
    }

    impl Counter {
        fn increment(&self) -> std::result::Result<Vec<Incremented>, Full> {
            if self.value >= 2 {
                return Err(Full);
            }
            Ok(vec![Incremented])
        }
    }

    #[derive(Default)]
    struct Counters(IndexMap<String, Counter>);

    #[async_trait]
    impl Repository<Counter> for Counters {
        async fn get(&mut self, id: &String) -> Result<Counter> {
            self.0
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::not_found::<Counter>(id))
        }

        async fn list(&mut self) -> Result<Vec<Counter>> {
            Ok(self.0.values().cloned().collect())
        }

        async fn add(&mut self, counter: Counter) -> Result<()> {
            self.0.insert(counter.id.clone(), counter);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_execute_applies_stages_and_queues() {
        let mut inner = Counters::default();
        let counter = Counter {
            id: "c".to_string(),
            value: 0,
            version: Version::initial(),
        };
        inner.add(counter).await.unwrap();
        let mut repo: TrackingRepository<Counter, _> = TrackingRepository::new(inner);
        let id = "c".to_string();

        let result: CommandResult<Counter> = repo
            .execute::<_, CounterFailure>(&id, Counter::increment)
            .await
            .unwrap();

        assert_eq!(result.aggregate.value, 1);
        assert_eq!(result.events.len(), 1);
        assert_eq!(repo.inner().0["c"].value, 1);
        assert!(repo.pop_event().is_some());
    }

    #[tokio::test]
    async fn test_rejected_execute_changes_nothing() {
        let mut inner = Counters::default();
        let counter = Counter {
            id: "c".to_string(),
            value: 2,
            version: Version::initial(),
        };
        inner.add(counter).await.unwrap();
        let mut repo: TrackingRepository<Counter, _> = TrackingRepository::new(inner);
        let id = "c".to_string();

        let result = repo
            .execute::<_, CounterFailure>(&id, Counter::increment)
            .await;

        assert!(matches!(result, Err(CounterFailure::Full)));
        assert_eq!(repo.inner().0["c"].value, 2);
        assert!(repo.pop_event().is_none());
    }
}
