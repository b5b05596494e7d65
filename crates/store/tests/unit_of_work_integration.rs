//! Integration tests for the in-memory unit of work.
//!
//! These tests exercise scoped sessions, event collection and optimistic
//! concurrency across sessions sharing one store.

use chrono::{NaiveDate, NaiveDateTime};
use common::{AccountName, Version};
use domain::{Aggregate, Calendar, CalendarError, Event, EventKind, Role, User};
use store::{
    InMemoryStore, InMemoryUnitOfWork, Repository, StoreError, UnitOfWork, UnitOfWorkExt,
};

fn at(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

/// Error type for running calendar commands in tests.
#[derive(Debug)]
enum Failure {
    Store(StoreError),
    Calendar(CalendarError),
}

impl From<StoreError> for Failure {
    fn from(e: StoreError) -> Self {
        Failure::Store(e)
    }
}

impl From<CalendarError> for Failure {
    fn from(e: CalendarError) -> Self {
        Failure::Calendar(e)
    }
}

/// Registers a service with an open calendar.
async fn seed(store: &InMemoryStore, name: &str) {
    let mut uow = InMemoryUnitOfWork::new(store.clone());
    let mut scope = uow.begin().await.unwrap();
    let role = Role::Service { tags: vec![] };
    let (user, user_events) = User::register(name.into(), "s@example.com", "pw", role);
    let (calendar, calendar_events) = Calendar::open(name.into());
    scope.users().add_with_events(user, user_events).await.unwrap();
    scope
        .calendars()
        .add_with_events(calendar, calendar_events)
        .await
        .unwrap();
    scope.commit().await.unwrap();
}

mod scopes {
    use super::*;

    #[tokio::test]
    async fn dropped_scope_rolls_back() {
        let store = InMemoryStore::new();
        seed(&store, "katie").await;
        let mut uow = InMemoryUnitOfWork::new(store.clone());
        let katie = AccountName::from("katie");

        {
            let mut scope = uow.begin().await.unwrap();
            scope
                .calendars()
                .execute::<_, Failure>(&katie, |c| {
                    c.create_appointment("john".into(), at(9), at(10), "")
                })
                .await
                .unwrap();
            // no commit
        }

        assert_eq!(uow.collect_new_events().count(), 0);
        let calendar: Calendar = store.get(&katie).await.unwrap();
        assert_eq!(calendar.appointment_count(), 0);

        let mut scope = uow.begin().await.unwrap();
        let fresh = scope.calendars().get(&katie).await.unwrap();
        assert_eq!(fresh.appointment_count(), 0);
    }

    #[tokio::test]
    async fn early_return_rolls_back() {
        async fn request_then_fail(uow: &mut InMemoryUnitOfWork) -> Result<(), Failure> {
            let mut scope = uow.begin().await?;
            let katie = AccountName::from("katie");
            scope
                .calendars()
                .execute::<_, Failure>(&katie, |c| {
                    c.create_appointment("john".into(), at(9), at(10), "")
                })
                .await?;
            // Inverted interval: rejected before commit
            scope
                .calendars()
                .execute::<_, Failure>(&katie, |c| {
                    c.create_appointment("john".into(), at(12), at(11), "")
                })
                .await?;
            scope.commit().await?;
            Ok(())
        }

        let store = InMemoryStore::new();
        seed(&store, "katie").await;
        let mut uow = InMemoryUnitOfWork::new(store.clone());

        let result = request_then_fail(&mut uow).await;

        assert!(matches!(
            result,
            Err(Failure::Calendar(CalendarError::InvalidInterval { .. }))
        ));
        let calendar: Calendar = store.get(&"katie".into()).await.unwrap();
        assert_eq!(calendar.appointment_count(), 0);
        assert_eq!(uow.collect_new_events().count(), 0);
    }

    #[tokio::test]
    async fn committed_scope_keeps_events_for_collection() {
        let store = InMemoryStore::new();
        seed(&store, "katie").await;
        let mut uow = InMemoryUnitOfWork::new(store.clone());
        let katie = AccountName::from("katie");

        let mut scope = uow.begin().await.unwrap();
        let result = scope
            .calendars()
            .execute::<_, Failure>(&katie, |c| {
                c.create_appointment("john".into(), at(9), at(10), "")
            })
            .await
            .unwrap();
        scope.commit().await.unwrap();

        assert_eq!(result.aggregate.appointment_count(), 1);
        let events: Vec<Event> = uow.collect_new_events().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), EventKind::AppointmentRequested);
        assert_eq!(events[0].aggregate_id(), &katie);

        let stored: Calendar = store.get(&katie).await.unwrap();
        assert_eq!(stored.version(), Version::new(2));
    }
}

mod collection {
    use super::*;

    #[tokio::test]
    async fn calendars_drain_before_users() {
        let store = InMemoryStore::new();
        let mut uow = InMemoryUnitOfWork::new(store);
        let mut scope = uow.begin().await.unwrap();

        let (user, user_events) =
            User::register("katie".into(), "k@example.com", "pw", Role::Client);
        scope.users().add_with_events(user, user_events).await.unwrap();
        let (calendar, calendar_events) = Calendar::open("katie".into());
        scope
            .calendars()
            .add_with_events(calendar, calendar_events)
            .await
            .unwrap();
        scope.commit().await.unwrap();

        let kinds: Vec<_> = uow.collect_new_events().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![EventKind::CalendarOpened, EventKind::UserRegistered]);
    }

    #[tokio::test]
    async fn events_are_yielded_once() {
        let store = InMemoryStore::new();
        seed(&store, "katie").await;
        let mut uow = InMemoryUnitOfWork::new(store);
        let katie = AccountName::from("katie");

        let mut scope = uow.begin().await.unwrap();
        let id = scope
            .calendars()
            .execute::<_, Failure>(&katie, |c| {
                c.create_appointment("john".into(), at(9), at(10), "")
            })
            .await
            .unwrap()
            .aggregate
            .appointments()[0]
            .id();
        scope
            .calendars()
            .execute::<_, Failure>(&katie, |c| {
                c.create_appointment("bob".into(), at(9), at(11), "")
            })
            .await
            .unwrap();
        scope
            .calendars()
            .execute::<_, Failure>(&katie, |c| c.accept_appointment(id))
            .await
            .unwrap();
        scope.commit().await.unwrap();

        let mut events = uow.collect_new_events();
        let first = events.next().unwrap();
        assert_eq!(first.kind(), EventKind::AppointmentRequested);
        drop(events);

        let rest: Vec<_> = uow.collect_new_events().map(|e| e.kind()).collect();
        assert_eq!(
            rest,
            vec![
                EventKind::AppointmentRequested,
                EventKind::AppointmentAccepted,
                EventKind::AppointmentSuperseded,
            ]
        );
        assert_eq!(uow.collect_new_events().count(), 0);
    }
}

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn second_session_on_same_version_fails() {
        let store = InMemoryStore::new();
        seed(&store, "katie").await;
        let katie = AccountName::from("katie");

        let mut first = InMemoryUnitOfWork::new(store.clone());
        let mut second = InMemoryUnitOfWork::new(store.clone());
        first.open().await.unwrap();
        second.open().await.unwrap();

        first
            .calendars()
            .execute::<_, Failure>(&katie, |c| {
                c.create_appointment("john".into(), at(9), at(10), "")
            })
            .await
            .unwrap();
        second
            .calendars()
            .execute::<_, Failure>(&katie, |c| {
                c.create_appointment("bob".into(), at(9), at(10), "")
            })
            .await
            .unwrap();

        first.commit().await.unwrap();
        let result = second.commit().await;

        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict { .. })
        ));
        let calendar: Calendar = store.get(&katie).await.unwrap();
        assert_eq!(calendar.appointment_count(), 1);
        assert_eq!(calendar.appointments()[0].requester().as_str(), "john");
    }
}
