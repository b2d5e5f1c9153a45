//! Inbound chat messages.

use chrono::{DateTime, Utc};

/// What kind of payload a message carries. Only [`MessageKind::Chat`] is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Plain text.
    Chat,
    /// Image, audio, video, document or sticker.
    Media,
    /// Notifications generated by the chat service itself.
    System,
}

/// Whether a chat is one-to-one or shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
}

/// An inbound message as delivered by the transport.
#[derive(Debug, Clone)]
pub struct Message {
    /// Transport-assigned identifier.
    pub id: String,
    /// Chat the message was posted in.
    pub chat_id: String,
    /// Sender identifier.
    pub author: String,
    /// Text body.
    pub body: String,
    pub kind: MessageKind,
    /// Sent by the bot's own account.
    pub from_me: bool,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// A plain text message with a generated id and the current time.
    pub fn chat(chat_id: impl Into<String>, author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat_id.into(),
            author: author.into(),
            body: body.into(),
            kind: MessageKind::Chat,
            from_me: false,
            timestamp: Utc::now(),
        }
    }

    /// Change the message kind.
    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    /// Mark the message as sent by the bot itself.
    pub fn from_self(mut self) -> Self {
        self.from_me = true;
        self
    }

    /// Whether the message should enter the dispatch pipeline at all.
    pub fn is_dispatchable(&self) -> bool {
        self.kind == MessageKind::Chat && !self.from_me
    }
}
