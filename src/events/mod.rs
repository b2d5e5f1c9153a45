//! Typed dispatch events.
//!
//! Every pipeline transition is published on the [`EventBus`] as one
//! variant of [`Event`]. Each variant has a fixed payload; listeners
//! subscribe per [`EventKind`].

mod bus;

pub use bus::{EventBus, Listener, SubscriptionId};

use crate::commands::{Command, CommandOutput, MatchedPrefix, RunContext};
use crate::error::{CommandError, TransportError, UserError};
use crate::message::Message;
use jinsoul_args::ParsedArguments;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Fields shared by every event that concerns a resolved command.
#[derive(Debug, Clone)]
pub struct CommandPayload {
    pub message: Arc<Message>,
    pub command: Arc<Command>,
    /// Text after the command name, untrimmed of inner whitespace.
    pub parameters: String,
    pub context: Arc<RunContext>,
}

#[derive(Debug, Clone)]
pub enum Event {
    /// A dispatchable message arrived.
    PreMessageParsed { message: Arc<Message> },
    /// No prefix matched.
    NonPrefixedMessage { message: Arc<Message> },
    /// A prefix matched.
    PrefixedMessage {
        message: Arc<Message>,
        prefix: MatchedPrefix,
    },
    /// A prefix matched but no command name followed it.
    UnknownCommandName {
        message: Arc<Message>,
        prefix: MatchedPrefix,
        command_prefix: String,
    },
    /// The command name did not resolve.
    UnknownCommand {
        message: Arc<Message>,
        context: Arc<RunContext>,
    },
    PreCommandRun(CommandPayload),
    CommandDenied {
        error: UserError,
        payload: CommandPayload,
    },
    CommandAccepted(CommandPayload),
    CommandRun {
        payload: CommandPayload,
        args: Arc<ParsedArguments>,
    },
    CommandSuccess {
        payload: CommandPayload,
        args: Arc<ParsedArguments>,
        result: CommandOutput,
    },
    CommandError {
        error: Arc<CommandError>,
        payload: CommandPayload,
        args: Arc<ParsedArguments>,
    },
    /// Always emitted after a run, successful or not.
    CommandFinish {
        payload: CommandPayload,
        args: Arc<ParsedArguments>,
        duration: Duration,
    },
    /// The typing indicator could not be set.
    CommandTypingError {
        error: TransportError,
        payload: CommandPayload,
    },
    /// A listener failed or panicked while handling `event`.
    ListenerError {
        error: Arc<anyhow::Error>,
        listener: String,
        event: EventKind,
    },
}

/// Discriminant of [`Event`], used as the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PreMessageParsed,
    NonPrefixedMessage,
    PrefixedMessage,
    UnknownCommandName,
    UnknownCommand,
    PreCommandRun,
    CommandDenied,
    CommandAccepted,
    CommandRun,
    CommandSuccess,
    CommandError,
    CommandFinish,
    CommandTypingError,
    ListenerError,
}

impl EventKind {
    /// Every kind, in pipeline order.
    pub const ALL: [EventKind; 14] = [
        Self::PreMessageParsed,
        Self::NonPrefixedMessage,
        Self::PrefixedMessage,
        Self::UnknownCommandName,
        Self::UnknownCommand,
        Self::PreCommandRun,
        Self::CommandDenied,
        Self::CommandAccepted,
        Self::CommandRun,
        Self::CommandSuccess,
        Self::CommandError,
        Self::CommandFinish,
        Self::CommandTypingError,
        Self::ListenerError,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreMessageParsed => "preMessageParsed",
            Self::NonPrefixedMessage => "nonPrefixedMessage",
            Self::PrefixedMessage => "prefixedMessage",
            Self::UnknownCommandName => "unknownCommandName",
            Self::UnknownCommand => "unknownCommand",
            Self::PreCommandRun => "preCommandRun",
            Self::CommandDenied => "commandDenied",
            Self::CommandAccepted => "commandAccepted",
            Self::CommandRun => "commandRun",
            Self::CommandSuccess => "commandSuccess",
            Self::CommandError => "commandError",
            Self::CommandFinish => "commandFinish",
            Self::CommandTypingError => "commandTypingError",
            Self::ListenerError => "listenerError",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PreMessageParsed { .. } => EventKind::PreMessageParsed,
            Self::NonPrefixedMessage { .. } => EventKind::NonPrefixedMessage,
            Self::PrefixedMessage { .. } => EventKind::PrefixedMessage,
            Self::UnknownCommandName { .. } => EventKind::UnknownCommandName,
            Self::UnknownCommand { .. } => EventKind::UnknownCommand,
            Self::PreCommandRun(_) => EventKind::PreCommandRun,
            Self::CommandDenied { .. } => EventKind::CommandDenied,
            Self::CommandAccepted(_) => EventKind::CommandAccepted,
            Self::CommandRun { .. } => EventKind::CommandRun,
            Self::CommandSuccess { .. } => EventKind::CommandSuccess,
            Self::CommandError { .. } => EventKind::CommandError,
            Self::CommandFinish { .. } => EventKind::CommandFinish,
            Self::CommandTypingError { .. } => EventKind::CommandTypingError,
            Self::ListenerError { .. } => EventKind::ListenerError,
        }
    }

    /// The inbound message, for every event that has one.
    pub fn message(&self) -> Option<&Arc<Message>> {
        match self {
            Self::PreMessageParsed { message }
            | Self::NonPrefixedMessage { message }
            | Self::PrefixedMessage { message, .. }
            | Self::UnknownCommandName { message, .. }
            | Self::UnknownCommand { message, .. } => Some(message),
            Self::ListenerError { .. } => None,
            other => other.payload().map(|p| &p.message),
        }
    }

    /// The command payload, for every command-level event.
    pub fn payload(&self) -> Option<&CommandPayload> {
        match self {
            Self::PreCommandRun(payload) | Self::CommandAccepted(payload) => Some(payload),
            Self::CommandDenied { payload, .. }
            | Self::CommandRun { payload, .. }
            | Self::CommandSuccess { payload, .. }
            | Self::CommandError { payload, .. }
            | Self::CommandFinish { payload, .. }
            | Self::CommandTypingError { payload, .. } => Some(payload),
            _ => None,
        }
    }
}
