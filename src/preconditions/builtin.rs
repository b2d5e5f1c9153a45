//! Built-in preconditions.

use super::{Precondition, PreconditionContext, PreconditionResult};
use crate::commands::Command;
use crate::error::{Identifier, UserError};
use crate::message::{ChatKind, Message};
use async_trait::async_trait;
use std::sync::Arc;

pub const GROUP_ONLY: &str = "GroupOnly";
pub const PRIVATE_ONLY: &str = "PrivateOnly";
pub const ENABLED: &str = "Enabled";

/// Global position of [`Enabled`].
pub const ENABLED_POSITION: i32 = 10;

pub(crate) fn all() -> Vec<Arc<dyn Precondition>> {
    vec![Arc::new(GroupOnly), Arc::new(PrivateOnly), Arc::new(Enabled)]
}

async fn require_chat_kind(
    message: &Message,
    ctx: &PreconditionContext<'_>,
    wanted: ChatKind,
    identifier: Identifier,
    denial: &str,
) -> PreconditionResult {
    let kind = ctx.transport.chat_kind(message).await.map_err(|e| {
        UserError::new(
            Identifier::PreconditionChatKindUnavailable,
            format!("Could not determine the chat kind: {e}"),
        )
    })?;
    if kind == wanted {
        Ok(())
    } else {
        Err(UserError::new(identifier, denial))
    }
}

/// Passes only in group chats.
pub struct GroupOnly;

#[async_trait]
impl Precondition for GroupOnly {
    fn name(&self) -> &str {
        GROUP_ONLY
    }

    async fn run(&self, message: &Message, _command: &Command, ctx: &PreconditionContext<'_>) -> PreconditionResult {
        require_chat_kind(
            message,
            ctx,
            ChatKind::Group,
            Identifier::PreconditionGroupOnly,
            "You can only run this command in group chats.",
        )
        .await
    }
}

/// Passes only in private chats.
pub struct PrivateOnly;

#[async_trait]
impl Precondition for PrivateOnly {
    fn name(&self) -> &str {
        PRIVATE_ONLY
    }

    async fn run(&self, message: &Message, _command: &Command, ctx: &PreconditionContext<'_>) -> PreconditionResult {
        require_chat_kind(
            message,
            ctx,
            ChatKind::Private,
            Identifier::PreconditionPrivateOnly,
            "You can only run this command in private chats.",
        )
        .await
    }
}

/// Global: denies disabled commands.
pub struct Enabled;

#[async_trait]
impl Precondition for Enabled {
    fn name(&self) -> &str {
        ENABLED
    }

    fn position(&self) -> Option<i32> {
        Some(ENABLED_POSITION)
    }

    async fn run(&self, _message: &Message, command: &Command, _ctx: &PreconditionContext<'_>) -> PreconditionResult {
        if command.is_enabled() {
            Ok(())
        } else {
            Err(UserError::new(Identifier::PreconditionDisabled, "This command is disabled.")
                .with_context(serde_json::json!({ "command": command.name() })))
        }
    }
}
