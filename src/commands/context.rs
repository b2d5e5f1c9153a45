//! Per-dispatch context handed to commands and carried by events.

use crate::error::TransportError;
use crate::message::Message;
use crate::transport::Transport;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// The prefix that matched a message.
#[derive(Debug, Clone)]
pub enum MatchedPrefix {
    /// A literal prefix returned by the prefix hook.
    Literal(String),
    /// The configured regex prefix.
    Pattern(Regex),
}

impl MatchedPrefix {
    /// Whether this is the regex prefix.
    pub fn is_pattern(&self) -> bool {
        matches!(self, Self::Pattern(_))
    }
}

impl fmt::Display for MatchedPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => f.write_str(s),
            Self::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// Ambient data for one dispatch.
///
/// Passed unchanged through every stage and every event payload.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// The prefix configuration that matched.
    pub prefix: MatchedPrefix,
    /// The literal text that was matched as prefix.
    pub command_prefix: String,
    /// The name or alias the user typed, after case folding.
    pub command_name: String,
    /// Open-ended data supplied by the caller of the dispatch.
    pub extras: serde_json::Map<String, serde_json::Value>,
}

impl RunContext {
    /// Read an extra value.
    pub fn extra(&self, key: &str) -> Option<&serde_json::Value> {
        self.extras.get(key)
    }
}

/// Handler context passed to each command body.
pub struct Context<'a> {
    /// The message that invoked the command.
    pub message: &'a Arc<Message>,
    /// Chat transport, for replies and chat metadata.
    pub transport: &'a dyn Transport,
    pub run: &'a RunContext,
}

impl Context<'_> {
    /// Reply to the invoking message.
    pub async fn reply(&self, text: impl AsRef<str> + Send) -> Result<(), TransportError> {
        self.transport.reply(self.message, text.as_ref()).await
    }
}
