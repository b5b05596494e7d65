//! Command and event handlers.
//!
//! Every command handler opens its own unit-of-work scope. Handlers that
//! change state commit before returning; read-only handlers let the scope
//! roll back on drop.

use common::AccountName;
use domain::{
    AcceptAppointment, Calendar, CalendarError, CalendarEvent, Command, CommandKind,
    CreateAppointment, CreateClient, CreateService, Event, GetAppointment, GetUser,
    ListAppointments, Role, SearchServices, User,
};
use store::{Repository, StoreError, UnitOfWork, UnitOfWorkExt};

use crate::error::ServiceError;
use crate::records::{AppointmentRecord, BusySlot, CommandOutput, ServiceSummary, UserRecord};

/// Routes a command to its handler.
pub async fn dispatch<U: UnitOfWork>(
    command: Command,
    uow: &mut U,
) -> Result<CommandOutput, ServiceError> {
    match command {
        Command::CreateAppointment(cmd) => create_appointment(cmd, uow).await,
        Command::AcceptAppointment(cmd) => accept_appointment(cmd, uow).await,
        Command::GetAppointment(cmd) => get_appointment(cmd, uow).await,
        Command::ListAppointments(cmd) => list_appointments(cmd, uow).await,
        Command::CreateClient(cmd) => create_client(cmd, uow).await,
        Command::CreateService(cmd) => create_service(cmd, uow).await,
        Command::GetUser(cmd) => get_user(cmd, uow).await,
        Command::SearchServices(cmd) => search_services(cmd, uow).await,
    }
}

/// Requests a pending appointment in a service's calendar.
#[tracing::instrument(skip(uow), fields(to_user = %cmd.to_user, from_user = %cmd.from_user))]
pub async fn create_appointment<U: UnitOfWork>(
    cmd: CreateAppointment,
    uow: &mut U,
) -> Result<CommandOutput, ServiceError> {
    let CreateAppointment {
        to_user,
        from_user,
        since,
        until,
        description,
    } = cmd;

    let mut scope = uow.begin().await?;
    let result = scope
        .calendars()
        .execute::<_, ServiceError>(&to_user, |calendar| {
            calendar.create_appointment(from_user, since, until, description)
        })
        .await?;
    scope.commit().await?;

    let id = result
        .events
        .iter()
        .find_map(CalendarEvent::appointment_id)
        .ok_or(CalendarError::AppointmentNotFound(
            result.aggregate.next_appointment_id(),
        ))?;
    let appointment = result.aggregate.get_appointment(id)?;

    tracing::info!(appointment_id = %id, "appointment requested");
    Ok(CommandOutput::Appointment(appointment.into()))
}

/// Accepts a pending appointment, superseding the ones colliding with it.
#[tracing::instrument(skip(uow), fields(account_name = %cmd.account_name, id = %cmd.id))]
pub async fn accept_appointment<U: UnitOfWork>(
    cmd: AcceptAppointment,
    uow: &mut U,
) -> Result<CommandOutput, ServiceError> {
    let id = cmd.id;

    let mut scope = uow.begin().await?;
    let result = scope
        .calendars()
        .execute::<_, ServiceError>(&cmd.account_name, |calendar| {
            calendar.accept_appointment(id)
        })
        .await?;
    scope.commit().await?;

    let appointment = result.aggregate.get_appointment(id)?;
    tracing::info!(superseded = result.events.len().saturating_sub(1), "appointment accepted");
    Ok(CommandOutput::Appointment(appointment.into()))
}

pub async fn get_appointment<U: UnitOfWork>(
    cmd: GetAppointment,
    uow: &mut U,
) -> Result<CommandOutput, ServiceError> {
    let mut scope = uow.begin().await?;
    let calendar = scope.calendars().get(&cmd.account_name).await?;
    let appointment = calendar.get_appointment(cmd.id)?;
    Ok(CommandOutput::Appointment(appointment.into()))
}

/// Lists a calendar's appointments.
///
/// The owner sees every appointment in full. Anyone else sees only the time
/// spans of accepted appointments.
pub async fn list_appointments<U: UnitOfWork>(
    cmd: ListAppointments,
    uow: &mut U,
) -> Result<CommandOutput, ServiceError> {
    let mut scope = uow.begin().await?;
    let calendar = scope.calendars().get(&cmd.of_user).await?;

    if cmd.for_user == cmd.of_user {
        let records = calendar
            .appointments()
            .iter()
            .map(AppointmentRecord::from)
            .collect();
        Ok(CommandOutput::Appointments(records))
    } else {
        let slots = calendar
            .accepted_appointments()
            .map(BusySlot::from)
            .collect();
        Ok(CommandOutput::BusySlots(slots))
    }
}

/// Registers a client account.
#[tracing::instrument(skip(uow, cmd), fields(account_name = %cmd.account_name))]
pub async fn create_client<U: UnitOfWork>(
    cmd: CreateClient,
    uow: &mut U,
) -> Result<CommandOutput, ServiceError> {
    let mut scope = uow.begin().await?;
    ensure_available(scope.users(), &cmd.account_name).await?;

    let (user, events) = User::register(cmd.account_name, cmd.email, cmd.password, Role::Client);
    let record = UserRecord::from(&user);
    scope.users().add_with_events(user, events).await?;
    scope.commit().await?;

    tracing::info!("client registered");
    Ok(CommandOutput::User(record))
}

/// Registers a service account and opens its calendar in the same commit.
#[tracing::instrument(skip(uow, cmd), fields(account_name = %cmd.account_name))]
pub async fn create_service<U: UnitOfWork>(
    cmd: CreateService,
    uow: &mut U,
) -> Result<CommandOutput, ServiceError> {
    let mut scope = uow.begin().await?;
    ensure_available(scope.users(), &cmd.account_name).await?;

    let role = Role::Service { tags: cmd.tags };
    let (calendar, calendar_events) = Calendar::open(cmd.account_name.clone());
    let (user, user_events) = User::register(cmd.account_name, cmd.email, cmd.password, role);
    let record = UserRecord::from(&user);

    scope.users().add_with_events(user, user_events).await?;
    scope
        .calendars()
        .add_with_events(calendar, calendar_events)
        .await?;
    scope.commit().await?;

    tracing::info!("service registered");
    Ok(CommandOutput::User(record))
}

pub async fn get_user<U: UnitOfWork>(
    cmd: GetUser,
    uow: &mut U,
) -> Result<CommandOutput, ServiceError> {
    let mut scope = uow.begin().await?;
    let user = scope.users().get(&cmd.account_name).await?;
    Ok(CommandOutput::User(UserRecord::from(&user)))
}

/// Finds the services carrying every requested tag.
pub async fn search_services<U: UnitOfWork>(
    cmd: SearchServices,
    uow: &mut U,
) -> Result<CommandOutput, ServiceError> {
    let mut scope = uow.begin().await?;
    let services = scope
        .users()
        .list()
        .await?
        .iter()
        .filter(|user| user.offers_all(cmd.tags.as_slice()))
        .map(ServiceSummary::from)
        .collect();
    Ok(CommandOutput::Services(services))
}

/// Fails with [`ServiceError::DuplicateIdentity`] if the account exists.
async fn ensure_available<R>(users: &mut R, account_name: &AccountName) -> Result<(), ServiceError>
where
    R: Repository<User>,
{
    match users.get(account_name).await {
        Ok(_) => Err(ServiceError::DuplicateIdentity(account_name.clone())),
        Err(StoreError::NotFound { .. }) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Fails unless `command` is of the expected kind.
///
/// Used by custom handlers registered for a single kind.
pub fn expect_kind(command: &Command, expected: CommandKind) -> Result<(), ServiceError> {
    let actual = command.kind();
    if actual != expected {
        return Err(ServiceError::UnexpectedCommand { expected, actual });
    }
    Ok(())
}

/// Logs and counts every event.
pub async fn record_event<U: UnitOfWork>(
    event: &Event,
    _uow: &mut U,
) -> Result<(), ServiceError> {
    tracing::info!(
        event_type = event.event_type(),
        aggregate_id = %event.aggregate_id(),
        "event recorded"
    );
    metrics::counter!("events_handled_total", "event_type" => event.event_type()).increment(1);
    Ok(())
}

/// Reports a pending appointment dropped by an acceptance.
///
/// The requester is not notified; the fact is only logged.
pub async fn report_supersession<U: UnitOfWork>(
    event: &Event,
    _uow: &mut U,
) -> Result<(), ServiceError> {
    if let Event::Calendar {
        owner,
        event: CalendarEvent::AppointmentSuperseded(data),
    } = event
    {
        tracing::warn!(
            calendar = %owner,
            appointment_id = %data.appointment_id,
            requester = %data.requester,
            superseded_by = %data.superseded_by,
            "pending appointment superseded"
        );
    }
    Ok(())
}
