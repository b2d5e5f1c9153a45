//! Typing indicator side channel.
//!
//! Subscribes to `CommandRun` and asks the transport to show a typing
//! indicator. Runs detached from the dispatch; a failure is reported as
//! `CommandTypingError` and never affects the command.

use crate::events::{Event, EventBus, Listener};
use crate::transport::Transport;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub struct TypingListener {
    transport: Arc<dyn Transport>,
    /// Global switch; commands can still opt out individually.
    enabled: bool,
}

impl TypingListener {
    pub fn new(transport: Arc<dyn Transport>, enabled: bool) -> Self {
        Self { transport, enabled }
    }
}

#[async_trait]
impl Listener for TypingListener {
    fn name(&self) -> &str {
        "typing"
    }

    async fn run(&self, event: &Event, bus: &EventBus) -> anyhow::Result<()> {
        let Event::CommandRun { payload, .. } = event else {
            return Ok(());
        };
        if !self.enabled || !payload.command.typing() {
            return Ok(());
        }

        let transport = Arc::clone(&self.transport);
        let bus = bus.clone();
        let payload = payload.clone();
        tokio::spawn(async move {
            if let Err(error) = transport.set_typing(&payload.message).await {
                debug!(command = %payload.command.name(), error = %error, "Typing indicator failed");
                bus.emit(Event::CommandTypingError { error, payload }).await;
            }
        });
        Ok(())
    }
}
