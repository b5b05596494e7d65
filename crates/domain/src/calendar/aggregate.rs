//! Calendar aggregate implementation.

use chrono::NaiveDateTime;
use common::{AccountName, AppointmentId, Version};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::{
    Appointment, CalendarError, CalendarEvent,
    events::{AppointmentAcceptedData, AppointmentSupersededData},
};

/// Calendar aggregate root.
///
/// Owns every appointment requested from one service account and enforces
/// that accepted appointments never overlap. Pending appointments may
/// overlap each other freely until one of them is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    /// The service account owning this calendar.
    owner: AccountName,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// Identifier handed to the next requested appointment.
    next_id: AppointmentId,

    /// Appointments in the order they were requested.
    appointments: Vec<Appointment>,
}

impl Aggregate for Calendar {
    type Id = AccountName;
    type Event = CalendarEvent;
    type Error = CalendarError;

    fn aggregate_type() -> &'static str {
        "Calendar"
    }

    fn id(&self) -> &AccountName {
        &self.owner
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            CalendarEvent::CalendarOpened(_) => {}
            CalendarEvent::AppointmentRequested(data) => {
                self.apply_appointment_requested(data.appointment)
            }
            CalendarEvent::AppointmentAccepted(data) => self.apply_appointment_accepted(data),
            CalendarEvent::AppointmentSuperseded(data) => self.apply_appointment_superseded(data),
        }
    }
}

// Query methods
impl Calendar {
    /// Creates an empty calendar for a service account.
    pub fn new(owner: AccountName) -> Self {
        Self {
            owner,
            version: Version::initial(),
            next_id: AppointmentId::default(),
            appointments: Vec::new(),
        }
    }

    /// Opens a calendar for a newly registered service account.
    ///
    /// Returns the calendar together with the event recording its opening.
    pub fn open(owner: AccountName) -> (Self, Vec<CalendarEvent>) {
        let event = CalendarEvent::calendar_opened(owner.clone());
        let mut calendar = Self::new(owner);
        calendar.apply(event.clone());
        (calendar, vec![event])
    }

    /// Returns the owner of the calendar.
    pub fn owner(&self) -> &AccountName {
        &self.owner
    }

    /// Returns the identifier the next requested appointment will get.
    pub fn next_appointment_id(&self) -> AppointmentId {
        self.next_id
    }

    /// Returns all appointments in request order.
    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    /// Returns the accepted appointments in request order.
    pub fn accepted_appointments(&self) -> impl Iterator<Item = &Appointment> {
        self.appointments.iter().filter(|a| a.is_accepted())
    }

    /// Returns an appointment by ID.
    pub fn get_appointment(&self, id: AppointmentId) -> Result<&Appointment, CalendarError> {
        self.appointments
            .iter()
            .find(|a| a.id() == id)
            .ok_or(CalendarError::AppointmentNotFound(id))
    }

    /// Returns the number of appointments.
    pub fn appointment_count(&self) -> usize {
        self.appointments.len()
    }
}

// Command methods (return events)
impl Calendar {
    /// Requests a new, pending appointment.
    ///
    /// Fails if the interval is invalid or collides with an accepted
    /// appointment. Pending appointments never block a request.
    pub fn create_appointment(
        &self,
        requester: AccountName,
        since: NaiveDateTime,
        until: NaiveDateTime,
        description: impl Into<String>,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        let candidate = Appointment::new(self.next_id, requester, since, until, description)?;

        let colliding: Vec<AppointmentId> = self
            .accepted_appointments()
            .filter(|a| a.collides(&candidate))
            .map(Appointment::id)
            .collect();

        if !colliding.is_empty() {
            return Err(CalendarError::SlotUnavailable { colliding });
        }

        Ok(vec![CalendarEvent::appointment_requested(candidate)])
    }

    /// Accepts an appointment, superseding every pending one it collides with.
    ///
    /// The whole calendar is partitioned before anything is decided: a single
    /// accepted collision rejects the request and no pending appointment is
    /// dropped.
    pub fn accept_appointment(
        &self,
        id: AppointmentId,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        let target = self.get_appointment(id)?;

        if target.is_accepted() {
            return Ok(vec![]);
        }

        let (accepted, pending): (Vec<&Appointment>, Vec<&Appointment>) = self
            .appointments
            .iter()
            .filter(|a| a.collides(target))
            .partition(|a| a.is_accepted());

        if !accepted.is_empty() {
            return Err(CalendarError::SlotUnavailable {
                colliding: accepted.into_iter().map(Appointment::id).collect(),
            });
        }

        let mut events = Vec::with_capacity(pending.len() + 1);
        events.push(CalendarEvent::appointment_accepted(id));
        events.extend(
            pending
                .into_iter()
                .map(|dropped| CalendarEvent::appointment_superseded(dropped, id)),
        );

        Ok(events)
    }
}

// Apply event helpers
impl Calendar {
    fn apply_appointment_requested(&mut self, appointment: Appointment) {
        if appointment.id() >= self.next_id {
            self.next_id = appointment.id().next();
        }
        self.appointments.push(appointment);
    }

    fn apply_appointment_accepted(&mut self, data: AppointmentAcceptedData) {
        if let Some(appointment) = self
            .appointments
            .iter_mut()
            .find(|a| a.id() == data.appointment_id)
        {
            appointment.accept();
        }
    }

    fn apply_appointment_superseded(&mut self, data: AppointmentSupersededData) {
        self.appointments.retain(|a| a.id() != data.appointment_id);
    }
}
