//! Telemetry utilities for command timing and dispatch spans.

use std::time::{Duration, Instant};

/// Guard for timing command execution and recording metrics.
///
/// Records command latency when dropped.
pub struct CommandTimer {
    command: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            start: Instant::now(),
        }
    }

    /// Time elapsed so far.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_command(&self.command, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use crate::message::Message;
    use tracing::{Span, debug_span, info_span};

    /// Span covering one dispatch.
    pub fn dispatch(message: &Message) -> Span {
        debug_span!(
            "jinsoul.dispatch",
            message_id = %message.id,
            chat_id = %message.chat_id,
            author = %message.author,
        )
    }

    /// Span covering one command body.
    pub fn command(name: &str, alias: &str, chat_id: &str) -> Span {
        if name == alias {
            info_span!("command", name = %name, chat = %chat_id)
        } else {
            info_span!("command", name = %name, alias = %alias, chat = %chat_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_measures_and_records_on_drop() {
        crate::metrics::init();
        let timer = CommandTimer::new("timer-test");
        std::thread::sleep(Duration::from_millis(2));
        assert!(timer.elapsed() >= Duration::from_millis(2));
        drop(timer);
        assert!(crate::metrics::gather_metrics().contains("timer-test"));
    }
}
