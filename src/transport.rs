//! The chat transport collaborator.
//!
//! The dispatch core never talks to a chat service directly. It asks the
//! transport for chat metadata, and commands reply through it.

use crate::error::TransportError;
use crate::message::{ChatKind, Message};
use async_trait::async_trait;

/// Operations the core needs from the chat client.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Whether the message was posted in a private or a group chat.
    async fn chat_kind(&self, message: &Message) -> Result<ChatKind, TransportError>;

    /// Whether the bot may not post in the message's chat. Such chats are
    /// never dispatched.
    async fn is_read_only(&self, _message: &Message) -> Result<bool, TransportError> {
        Ok(false)
    }

    /// Reply to a message.
    async fn reply(&self, message: &Message, text: &str) -> Result<(), TransportError>;

    /// Show the "typing" indicator in the message's chat. Best effort.
    async fn set_typing(&self, message: &Message) -> Result<(), TransportError>;
}
