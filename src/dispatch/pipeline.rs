//! The dispatch state machine.
//!
//! One inbound message runs through these stages in order. Each may end
//! the dispatch early, always after emitting its terminal event:
//!
//! 1. Receive: drop non-text messages, the bot's own messages and messages
//!    from read-only chats
//! 2. ResolvePrefix: regex prefix anchored at the start, then the prefix hook
//! 3. ResolveCommand: first word after the prefix, by name or alias
//! 4. RunPreconditions: the global list, then the command's container
//! 5. Accept
//! 6. PreParse: lex and classify the parameters, bind a reader
//! 7. Run: the command body, with errors and panics caught
//! 8. Success/Finish
//!
//! Panics in preconditions, the prefix hook and the command body are caught.
//! A precondition panic denies the command; a hook panic leaves the message
//! unprefixed.
//!
//! Dispatches share nothing mutable beyond the registries and never wait on
//! one another.

use super::prefix::{PrefixHook, match_prefix, split_command};
use crate::args::ArgumentStore;
use crate::commands::{CommandOutput, CommandStore, Context, MatchedPrefix, RunContext};
use crate::error::{CommandError, Identifier, UserError, panic_message};
use crate::events::{CommandPayload, Event, EventBus};
use crate::message::Message;
use crate::metrics;
use crate::preconditions::{PreconditionContext, PreconditionStore};
use crate::telemetry::{CommandTimer, spans};
use crate::transport::Transport;
use futures_util::FutureExt;
use regex::Regex;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{Instrument, debug, error, warn};

/// Options that shape prefix and command-name matching.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Checked before the prefix hook. Only a match at the very start of the
    /// body counts.
    pub regex_prefix: Option<Regex>,
    pub case_insensitive_commands: bool,
    pub case_insensitive_prefixes: bool,
}

/// Where a dispatch ended.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Not text, or sent by the bot itself.
    Ignored,
    NonPrefixed,
    /// A prefix with nothing after it.
    UnknownCommandName,
    UnknownCommand,
    Denied(UserError),
    Succeeded(CommandOutput),
    Failed(Arc<CommandError>),
}

impl Outcome {
    /// Label for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::NonPrefixed => "non_prefixed",
            Self::UnknownCommandName => "unknown_command_name",
            Self::UnknownCommand => "unknown_command",
            Self::Denied(_) => "denied",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
        }
    }
}

/// Everything a dispatch reads.
pub struct Pipeline {
    pub(crate) options: PipelineOptions,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) prefix_hook: Arc<dyn PrefixHook>,
    pub(crate) commands: CommandStore,
    pub(crate) preconditions: PreconditionStore,
    pub(crate) arguments: Arc<ArgumentStore>,
    pub(crate) bus: EventBus,
}

struct PrefixMatch<'m> {
    prefix: MatchedPrefix,
    matched: &'m str,
    rest: &'m str,
}

impl Pipeline {
    pub fn new(
        options: PipelineOptions,
        transport: Arc<dyn Transport>,
        prefix_hook: Arc<dyn PrefixHook>,
        bus: EventBus,
    ) -> Self {
        Self {
            options,
            transport,
            prefix_hook,
            commands: CommandStore::default(),
            preconditions: PreconditionStore::with_builtins(),
            arguments: Arc::new(ArgumentStore::with_builtins()),
            bus,
        }
    }

    /// Run one message through every stage.
    pub async fn dispatch(
        &self,
        message: Arc<Message>,
        extras: serde_json::Map<String, serde_json::Value>,
    ) -> Outcome {
        let span = spans::dispatch(&message);
        let outcome = self.run_stages(message, extras).instrument(span).await;
        metrics::record_outcome(outcome.as_str());
        outcome
    }

    async fn run_stages(
        &self,
        message: Arc<Message>,
        extras: serde_json::Map<String, serde_json::Value>,
    ) -> Outcome {
        // Receive
        if !message.is_dispatchable() {
            debug!(kind = ?message.kind, from_me = message.from_me, "Message ignored");
            return Outcome::Ignored;
        }
        self.bus
            .emit(Event::PreMessageParsed {
                message: Arc::clone(&message),
            })
            .await;
        match self.transport.is_read_only(&message).await {
            Ok(true) => {
                debug!(chat = %message.chat_id, "Read-only chat, message skipped");
                return Outcome::Ignored;
            }
            Ok(false) => {}
            Err(e) => warn!(chat = %message.chat_id, error = %e, "Could not tell whether chat is read-only"),
        }

        // ResolvePrefix
        let Some(found) = self.resolve_prefix(&message).await else {
            debug!("No prefix matched");
            self.bus
                .emit(Event::NonPrefixedMessage {
                    message: Arc::clone(&message),
                })
                .await;
            return Outcome::NonPrefixed;
        };
        self.bus
            .emit(Event::PrefixedMessage {
                message: Arc::clone(&message),
                prefix: found.prefix.clone(),
            })
            .await;

        // ResolveCommand
        let Some((typed, parameters)) = split_command(found.rest) else {
            debug!(prefix = %found.prefix, "Prefix without command name");
            self.bus
                .emit(Event::UnknownCommandName {
                    message: Arc::clone(&message),
                    prefix: found.prefix,
                    command_prefix: found.matched.to_string(),
                })
                .await;
            return Outcome::UnknownCommandName;
        };
        let command_name = if self.options.case_insensitive_commands {
            typed.to_lowercase()
        } else {
            typed.to_string()
        };
        let context = Arc::new(RunContext {
            prefix: found.prefix,
            command_prefix: found.matched.to_string(),
            command_name,
            extras,
        });
        let parameters = parameters.to_string();

        let Some(command) = self.commands.get(&context.command_name) else {
            debug!(command = %context.command_name, "Unknown command");
            self.bus
                .emit(Event::UnknownCommand {
                    message: Arc::clone(&message),
                    context,
                })
                .await;
            return Outcome::UnknownCommand;
        };
        let payload = CommandPayload {
            message,
            command: Arc::clone(&command),
            parameters,
            context,
        };
        self.bus.emit(Event::PreCommandRun(payload.clone())).await;

        // RunPreconditions
        let checked = AssertUnwindSafe(self.run_preconditions(&payload))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let reason = panic_message(panic.as_ref());
                error!(command = %command.name(), panic = %reason, "Precondition panicked");
                Err(UserError::new(
                    Identifier::PreconditionPanicked,
                    format!("a precondition failed unexpectedly: {reason}"),
                ))
            });
        if let Err(error) = checked {
            debug!(command = %command.name(), identifier = %error.identifier, "Command denied");
            metrics::record_denial(command.name(), error.identifier.as_str());
            self.bus
                .emit(Event::CommandDenied {
                    error: error.clone(),
                    payload,
                })
                .await;
            return Outcome::Denied(error);
        }

        // Accept
        self.bus.emit(Event::CommandAccepted(payload.clone())).await;

        // PreParse
        let mut args = command.pre_parse(
            Arc::clone(&payload.message),
            &payload.parameters,
            Arc::clone(&self.arguments),
        );
        let parsed = Arc::clone(args.parsed());

        // Run
        self.bus
            .emit(Event::CommandRun {
                payload: payload.clone(),
                args: Arc::clone(&parsed),
            })
            .await;

        let timer = CommandTimer::new(command.name());
        let ctx = Context {
            message: &payload.message,
            transport: self.transport.as_ref(),
            run: &payload.context,
        };
        let span = spans::command(command.name(), &payload.context.command_name, &payload.message.chat_id);
        let result = AssertUnwindSafe(command.run(&ctx, &mut args))
            .catch_unwind()
            .instrument(span)
            .await
            .unwrap_or_else(|panic| Err(CommandError::Panicked(panic_message(panic.as_ref()))));
        let duration = timer.elapsed();
        drop(timer);

        // Success/Finish
        let outcome = match result {
            Ok(value) => {
                debug!(command = %command.name(), ?duration, "Command succeeded");
                self.bus
                    .emit(Event::CommandSuccess {
                        payload: payload.clone(),
                        args: Arc::clone(&parsed),
                        result: value.clone(),
                    })
                    .await;
                Outcome::Succeeded(value)
            }
            Err(error) => {
                let code = error.error_code();
                metrics::record_command_error(command.name(), code);
                match &error {
                    CommandError::User(e) => {
                        debug!(command = %command.name(), identifier = %e.identifier, error = %e, "Command rejected input")
                    }
                    e => warn!(command = %command.name(), error = %e, "Command failed"),
                }
                let error = Arc::new(error);
                self.bus
                    .emit(Event::CommandError {
                        error: Arc::clone(&error),
                        payload: payload.clone(),
                        args: Arc::clone(&parsed),
                    })
                    .await;
                Outcome::Failed(error)
            }
        };

        self.bus
            .emit(Event::CommandFinish {
                payload,
                args: parsed,
                duration,
            })
            .await;
        outcome
    }

    async fn resolve_prefix<'m>(&self, message: &'m Message) -> Option<PrefixMatch<'m>> {
        // Leftmost match, so a match at 0 is found whenever one exists.
        if let Some(regex) = &self.options.regex_prefix
            && let Some(m) = regex.find(&message.body).filter(|m| m.start() == 0)
        {
            return Some(PrefixMatch {
                prefix: MatchedPrefix::Pattern(regex.clone()),
                matched: m.as_str(),
                rest: &message.body[m.end()..],
            });
        }

        let prefix = match AssertUnwindSafe(self.prefix_hook.fetch_prefix(message))
            .catch_unwind()
            .await
        {
            Ok(prefix) => prefix,
            Err(panic) => {
                error!(panic = %panic_message(panic.as_ref()), "Prefix hook panicked");
                return None;
            }
        };
        let (candidate, matched, rest) = match_prefix(
            &message.body,
            prefix.candidates(),
            self.options.case_insensitive_prefixes,
        )?;
        Some(PrefixMatch {
            prefix: MatchedPrefix::Literal(candidate.to_string()),
            matched,
            rest,
        })
    }

    /// Global list first, then the command's own container.
    async fn run_preconditions(&self, payload: &CommandPayload) -> Result<(), UserError> {
        let ctx = PreconditionContext {
            transport: self.transport.as_ref(),
            run: &payload.context,
            entry: None,
        };
        self.preconditions
            .run_globals(&payload.message, &payload.command, &ctx)
            .await?;

        let container = payload.command.preconditions();
        container
            .run(&self.preconditions, &payload.message, &payload.command, &ctx)
            .await
    }
}
