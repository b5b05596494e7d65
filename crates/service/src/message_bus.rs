//! Dispatch loop for commands and the events they cascade into.

use std::collections::{HashMap, VecDeque};

use domain::{Command, CommandKind, Event, EventKind, Message};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use store::UnitOfWork;

use crate::error::ServiceError;
use crate::handlers;
use crate::records::CommandOutput;

/// Handler for one command kind. Its error aborts the dispatch loop.
pub type CommandHandler<U> = Box<
    dyn for<'a> Fn(Command, &'a mut U) -> BoxFuture<'a, Result<CommandOutput, ServiceError>>
        + Send
        + Sync,
>;

/// Subscriber for one event kind. Its error is logged and dropped.
pub type EventHandler<U> = Box<
    dyn for<'a> Fn(&'a Event, &'a mut U) -> BoxFuture<'a, Result<(), ServiceError>> + Send + Sync,
>;

/// Routes messages to handlers, one at a time, in FIFO order.
///
/// Events raised while handling a message are queued behind every message
/// already waiting, so a cascade is processed breadth-first.
pub struct MessageBus<U: UnitOfWork + 'static> {
    uow: U,
    command_handlers: HashMap<CommandKind, CommandHandler<U>>,
    event_handlers: HashMap<EventKind, Vec<EventHandler<U>>>,
}

impl<U: UnitOfWork + 'static> MessageBus<U> {
    /// Creates a bus with the default handler for every command kind and no
    /// event subscribers.
    pub fn new(uow: U) -> Self {
        let mut bus = Self {
            uow,
            command_handlers: HashMap::new(),
            event_handlers: HashMap::new(),
        };
        for kind in CommandKind::ALL {
            bus.register_command(kind, |command, uow| handlers::dispatch(command, uow).boxed());
        }
        bus
    }

    pub fn uow(&self) -> &U {
        &self.uow
    }

    pub fn uow_mut(&mut self) -> &mut U {
        &mut self.uow
    }

    /// Replaces the handler for a command kind.
    pub fn register_command<F>(&mut self, kind: CommandKind, handler: F)
    where
        F: for<'a> Fn(Command, &'a mut U) -> BoxFuture<'a, Result<CommandOutput, ServiceError>>
            + Send
            + Sync
            + 'static,
    {
        self.command_handlers.insert(kind, Box::new(handler));
    }

    /// Adds a subscriber for an event kind.
    ///
    /// Subscribers of one kind run in subscription order.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F)
    where
        F: for<'a> Fn(&'a Event, &'a mut U) -> BoxFuture<'a, Result<(), ServiceError>>
            + Send
            + Sync
            + 'static,
    {
        self.event_handlers
            .entry(kind)
            .or_default()
            .push(Box::new(handler));
    }

    /// Returns the number of subscribers for an event kind.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.event_handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Handles one message and everything it cascades into.
    pub async fn handle(
        &mut self,
        message: impl Into<Message>,
    ) -> Result<Vec<CommandOutput>, ServiceError> {
        self.handle_all([message.into()]).await
    }

    /// Handles several messages in order, plus everything they cascade into.
    ///
    /// Returns one output per command, in dispatch order. The first failing
    /// command stops the loop; commands that completed before it stay
    /// committed.
    pub async fn handle_all(
        &mut self,
        messages: impl IntoIterator<Item = Message>,
    ) -> Result<Vec<CommandOutput>, ServiceError> {
        let mut queue: VecDeque<Message> = messages.into_iter().collect();
        let mut results = Vec::new();

        while let Some(message) = queue.pop_front() {
            match message {
                Message::Command(command) => {
                    let output = self.handle_command(command).await?;
                    results.push(output);
                    queue.extend(self.uow.collect_new_events().map(Message::Event));
                }
                Message::Event(event) => self.handle_event(&event, &mut queue).await,
            }
        }

        Ok(results)
    }

    #[tracing::instrument(skip(self, command), fields(command = %command.kind()))]
    async fn handle_command(&mut self, command: Command) -> Result<CommandOutput, ServiceError> {
        let kind = command.kind();

        let result = match self.command_handlers.get(&kind) {
            Some(handler) => handler(command, &mut self.uow).await,
            None => Err(ServiceError::NoHandler(kind)),
        };

        match result {
            Ok(output) => {
                metrics::counter!("commands_handled_total", "command" => kind.as_str())
                    .increment(1);
                Ok(output)
            }
            Err(e) => {
                metrics::counter!("commands_failed_total", "command" => kind.as_str())
                    .increment(1);
                tracing::error!(error = %e, "command failed");
                Err(e)
            }
        }
    }

    #[tracing::instrument(skip(self, event, queue), fields(event = %event.kind()))]
    async fn handle_event(&mut self, event: &Event, queue: &mut VecDeque<Message>) {
        let Some(subscribers) = self.event_handlers.get(&event.kind()) else {
            return;
        };

        for handler in subscribers {
            match handler(event, &mut self.uow).await {
                Ok(()) => queue.extend(self.uow.collect_new_events().map(Message::Event)),
                Err(e) => {
                    metrics::counter!("event_handlers_failed_total").increment(1);
                    tracing::error!(error = %e, "event handler failed");
                }
            }
        }
    }
}
