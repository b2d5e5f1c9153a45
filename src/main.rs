//! Console bot.
//!
//! Reads lines from stdin and dispatches each as an inbound message.
//! Prefix a line with `g:` to send it from a group chat. Replies, denials
//! and command errors are printed to stdout.

use anyhow::Context as _;
use async_trait::async_trait;
use jinsoul::commands::misc;
use jinsoul::config::{self, Config, DEFAULT_CONFIG_PATH};
use jinsoul::events::{Event, EventBus, EventKind, Listener};
use jinsoul::{ChatKind, Client, Message, Transport, TransportError};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const GROUP_CHAT: &str = "console-group";
const PRIVATE_CHAT: &str = "console";

/// Transport backed by the terminal.
struct ConsoleTransport;

#[async_trait]
impl Transport for ConsoleTransport {
    async fn chat_kind(&self, message: &Message) -> Result<ChatKind, TransportError> {
        match message.chat_id.as_str() {
            GROUP_CHAT => Ok(ChatKind::Group),
            PRIVATE_CHAT => Ok(ChatKind::Private),
            other => Err(TransportError::ChatNotFound(other.to_string())),
        }
    }

    async fn reply(&self, message: &Message, text: &str) -> Result<(), TransportError> {
        println!("[{}] bot: {text}", message.chat_id);
        Ok(())
    }

    async fn set_typing(&self, message: &Message) -> Result<(), TransportError> {
        println!("[{}] bot is typing...", message.chat_id);
        Ok(())
    }
}

/// Tells the user why a command did not run.
struct Reporter(Arc<ConsoleTransport>);

#[async_trait]
impl Listener for Reporter {
    fn name(&self) -> &str {
        "console-reporter"
    }

    async fn run(&self, event: &Event, _bus: &EventBus) -> anyhow::Result<()> {
        let (message, text) = match event {
            Event::CommandDenied { error, payload } => (&payload.message, error.message.clone()),
            Event::CommandError { error, payload, .. } => (&payload.message, error.to_string()),
            Event::UnknownCommand { message, context } => {
                (message, format!("Unknown command `{}`.", context.command_name))
            }
            _ => return Ok(()),
        };
        self.0.reply(message, &text).await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if std::env::var("JINSOUL_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }

    jinsoul::metrics::init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(config::ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %config_path, "Config file not found, using defaults with prefix `!`");
            let mut config = Config::default();
            config.client.default_prefix = "!".into();
            config
        }
        Err(e) => {
            error!(path = %config_path, error = %e, "Failed to load config");
            return Err(e.into());
        }
    };

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {config_path}", errors.len());
    }

    let transport = Arc::new(ConsoleTransport);
    let client = Client::new(config, transport.clone()).context("failed to build client")?;

    for (options, handler) in misc::all() {
        client.register(options, handler)?;
    }
    let reporter = Arc::new(Reporter(transport));
    for kind in [EventKind::CommandDenied, EventKind::CommandError, EventKind::UnknownCommand] {
        client.bus().on_detached(kind, reporter.clone());
    }
    client.log_summary();
    info!("Reading messages from stdin (prefix a line with `g:` for a group chat)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let (chat, body) = match line.strip_prefix("g:") {
            Some(body) => (GROUP_CHAT, body.trim_start()),
            None => (PRIVATE_CHAT, line.as_str()),
        };
        let outcome = client.dispatch(Message::chat(chat, "console-user", body)).await;
        tracing::debug!(outcome = outcome.as_str(), "Dispatch finished");
    }

    info!(metrics = %jinsoul::metrics::gather_metrics(), "Shutting down");
    Ok(())
}
