//! The bot client.
//!
//! Owns the registries, the event bus, the transport and the prefix hook,
//! and feeds inbound messages into the dispatch pipeline. Each message is
//! dispatched independently; [`Client::handle_message`] spawns one task per
//! message.

use crate::args::{ArgumentResolver, ArgumentStore};
use crate::commands::{Command, CommandHandler, CommandOptions, CommandStore};
use crate::config::{Config, ConfigError};
use crate::dispatch::{Outcome, Pipeline, PrefixHook, StaticPrefix, TypingListener};
use crate::error::RegistryError;
use crate::events::{EventBus, EventKind};
use crate::message::Message;
use crate::preconditions::{Precondition, PreconditionStore};
use crate::transport::Transport;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

pub struct Client {
    pipeline: Arc<Pipeline>,
    config: Config,
}

impl Client {
    /// Client answering to `config.client.default_prefix`.
    pub fn new(config: Config, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        let hook = Arc::new(StaticPrefix(config.client.default_prefix.clone()));
        Self::with_prefix_hook(config, transport, hook)
    }

    /// Client resolving prefixes through `hook` instead of the configured default.
    pub fn with_prefix_hook(
        config: Config,
        transport: Arc<dyn Transport>,
        hook: Arc<dyn PrefixHook>,
    ) -> Result<Self, ConfigError> {
        let options = config.client.pipeline_options()?;
        let bus = EventBus::new();
        bus.on(
            EventKind::CommandRun,
            Arc::new(TypingListener::new(Arc::clone(&transport), config.client.typing)),
        );

        let pipeline = Arc::new(Pipeline::new(options, transport, hook, bus));
        Ok(Self { pipeline, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.pipeline.bus
    }

    pub fn commands(&self) -> &CommandStore {
        &self.pipeline.commands
    }

    pub fn preconditions(&self) -> &PreconditionStore {
        &self.pipeline.preconditions
    }

    pub fn arguments(&self) -> &ArgumentStore {
        &self.pipeline.arguments
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Build and register a command, applying any `[commands.<name>]` overrides.
    pub fn register(
        &self,
        options: CommandOptions,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<Arc<Command>, RegistryError> {
        let options = match self.config.overrides_for(options.name.trim()) {
            Some(overrides) => overrides.apply(options),
            None => options,
        };
        self.register_command(Command::with_handler(options, handler)?)
    }

    /// Register an already built command as is.
    pub fn register_command(&self, command: Command) -> Result<Arc<Command>, RegistryError> {
        self.pipeline.commands.register(command)
    }

    pub fn unregister_command(&self, name: &str) -> Option<Arc<Command>> {
        self.pipeline.commands.remove(name)
    }

    /// Register a precondition. Those with a position join the global list.
    pub fn register_precondition(&self, precondition: Arc<dyn Precondition>) {
        self.pipeline.preconditions.register(precondition);
    }

    pub fn unregister_precondition(&self, name: &str) -> Option<Arc<dyn Precondition>> {
        self.pipeline.preconditions.remove(name)
    }

    pub fn register_resolver<R: ArgumentResolver + 'static>(&self, resolver: R) {
        self.pipeline.arguments.register(resolver);
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Dispatch `message` on its own task.
    pub fn handle_message(&self, message: Message) -> JoinHandle<Outcome> {
        let pipeline = Arc::clone(&self.pipeline);
        tokio::spawn(async move { pipeline.dispatch(Arc::new(message), serde_json::Map::new()).await })
    }

    /// Dispatch `message` and wait for it to finish.
    pub async fn dispatch(&self, message: Message) -> Outcome {
        self.dispatch_with(message, serde_json::Map::new()).await
    }

    /// Dispatch with caller-supplied data exposed as `RunContext::extras`.
    pub async fn dispatch_with(
        &self,
        message: Message,
        extras: serde_json::Map<String, serde_json::Value>,
    ) -> Outcome {
        self.pipeline.dispatch(Arc::new(message), extras).await
    }

    /// Log what is loaded.
    pub fn log_summary(&self) {
        info!(
            commands = self.pipeline.commands.len(),
            global_preconditions = ?self.pipeline.preconditions.global_names(),
            "Client ready"
        );
    }
}
