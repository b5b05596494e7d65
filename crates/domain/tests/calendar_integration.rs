//! Integration tests for the Calendar aggregate.
//!
//! These tests drive calendars only through their public command methods and
//! `apply`, the way the unit of work does.

use chrono::{NaiveDate, NaiveDateTime};
use common::AppointmentId;
use domain::{Aggregate, Appointment, Calendar, CalendarError, CalendarEvent, DomainEvent};

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// Runs a command method result through `apply`, returning the events.
fn commit(
    calendar: &mut Calendar,
    result: Result<Vec<CalendarEvent>, CalendarError>,
) -> Vec<CalendarEvent> {
    let events = result.unwrap();
    calendar.apply_events(events.clone());
    events
}

fn request(
    calendar: &mut Calendar,
    requester: &str,
    since: NaiveDateTime,
    until: NaiveDateTime,
) -> AppointmentId {
    let result = calendar.create_appointment(requester.into(), since, until, "visit");
    commit(calendar, result)[0].appointment_id().unwrap()
}

mod scenarios {
    use super::*;

    #[test]
    fn accepting_one_request_drops_the_colliding_one() {
        let (mut calendar, _) = Calendar::open("bob".into());
        let a1 = request(&mut calendar, "john", at(1, 0), at(2, 0));
        let a2 = request(&mut calendar, "katie", at(1, 30), at(2, 30));

        assert_eq!(calendar.appointment_count(), 2);

        let result = calendar.accept_appointment(a1);
        let events = commit(&mut calendar, result);
        assert_eq!(events.len(), 2);

        let ids: Vec<_> = calendar.appointments().iter().map(Appointment::id).collect();
        assert_eq!(ids, vec![a1]);

        let result = calendar.accept_appointment(a2);
        assert_eq!(result.unwrap_err(), CalendarError::AppointmentNotFound(a2));
    }

    #[test]
    fn supersession_names_the_dropped_requester() {
        let (mut calendar, _) = Calendar::open("bob".into());
        let a1 = request(&mut calendar, "john", at(1, 0), at(2, 0));
        let a2 = request(&mut calendar, "katie", at(1, 30), at(2, 30));

        let events = calendar.accept_appointment(a1).unwrap();
        match &events[1] {
            CalendarEvent::AppointmentSuperseded(data) => {
                assert_eq!(data.appointment_id, a2);
                assert_eq!(data.requester.as_str(), "katie");
                assert_eq!(data.superseded_by, a1);
            }
            other => panic!("expected AppointmentSuperseded, got {}", other.event_type()),
        }
    }

    #[test]
    fn adjacent_appointments_can_both_be_accepted() {
        let mut calendar = Calendar::new("bob".into());
        let morning = request(&mut calendar, "john", at(9, 0), at(10, 0));
        let later = request(&mut calendar, "katie", at(10, 0), at(11, 0));

        let result = calendar.accept_appointment(morning);
        commit(&mut calendar, result);
        let result = calendar.accept_appointment(later);
        commit(&mut calendar, result);

        assert_eq!(calendar.accepted_appointments().count(), 2);
    }
}

mod invariants {
    use super::*;

    fn assert_no_accepted_overlap(calendar: &Calendar) {
        let accepted: Vec<_> = calendar.accepted_appointments().collect();
        for a in &accepted {
            for b in &accepted {
                assert!(!a.collides(b), "{a} overlaps {b}");
            }
        }
    }

    #[test]
    fn accepted_appointments_never_overlap() {
        let mut calendar = Calendar::new("bob".into());
        // A staircase of half-overlapping requests
        let ids: Vec<_> = (0..8)
            .map(|i| request(&mut calendar, "john", at(8 + i, 0), at(9 + i, 30)))
            .collect();

        for id in ids {
            if let Ok(events) = calendar.accept_appointment(id) {
                calendar.apply_events(events);
            }
            assert_no_accepted_overlap(&calendar);
        }

        assert!(calendar.accepted_appointments().count() >= 4);
    }

    #[test]
    fn zero_length_request_leaves_calendar_untouched() {
        let mut calendar = Calendar::new("bob".into());
        request(&mut calendar, "john", at(9, 0), at(10, 0));
        let before = calendar.appointments().to_vec();
        let next = calendar.next_appointment_id();

        let result = calendar.create_appointment("katie".into(), at(11, 0), at(11, 0), "");

        assert!(matches!(result, Err(CalendarError::InvalidInterval { .. })));
        assert_eq!(calendar.appointments(), before.as_slice());
        assert_eq!(calendar.next_appointment_id(), next);
    }

    #[test]
    fn rejected_request_does_not_consume_an_id() {
        let mut calendar = Calendar::new("bob".into());
        let first = request(&mut calendar, "john", at(9, 0), at(10, 0));
        let result = calendar.accept_appointment(first);
        commit(&mut calendar, result);

        assert!(
            calendar
                .create_appointment("katie".into(), at(9, 30), at(10, 30), "")
                .is_err()
        );
        let second = request(&mut calendar, "katie", at(10, 0), at(11, 0));

        assert_eq!(second, first.next());
    }

    #[test]
    fn replaying_events_rebuilds_the_same_calendar() {
        let (mut calendar, mut history) = Calendar::open("bob".into());
        let a1 = request(&mut calendar, "john", at(1, 0), at(2, 0));
        request(&mut calendar, "katie", at(1, 30), at(2, 30));
        let result = calendar.accept_appointment(a1);
        commit(&mut calendar, result);

        // Rebuild from the recorded facts
        history.extend(
            calendar
                .appointments()
                .iter()
                .cloned()
                .map(CalendarEvent::appointment_requested),
        );
        history.push(CalendarEvent::appointment_accepted(a1));
        let mut replayed = Calendar::new("bob".into());
        replayed.apply_events(history);

        assert_eq!(replayed.appointments().len(), 1);
        assert!(replayed.get_appointment(a1).unwrap().is_accepted());
        assert_eq!(replayed.next_appointment_id(), a1.next());
    }
}
