//! Stock commands: PING, ADD, GROUP-ONLY, PRIVATE-ONLY
//!
//! Loaded by the console bot and used as fixtures by the integration tests.

use super::{CommandHandler, CommandOptions, CommandOutput, CommandResult, Context};
use crate::args::Args;
use crate::message::ChatKind;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

/// Every stock command, as options and handler so configuration overrides
/// can be applied before construction.
pub fn all() -> Vec<(CommandOptions, Arc<dyn CommandHandler>)> {
    vec![
        stock(
            CommandOptions::new("ping")
                .aliases(["pong"])
                .description("Replies with Pong!")
                .category(["General"]),
            PingCommand,
        ),
        stock(
            CommandOptions::new("add")
                .aliases(["sum"])
                .description("Adds two numbers")
                .detailed_description("Usage: add <number> <number>")
                .category(["General", "Math"]),
            AddCommand,
        ),
        stock(
            CommandOptions::new("group-only")
                .description("Only works in group chats")
                .category(["General", "Chat"])
                .run_in([ChatKind::Group])
                .dash_less_aliases(),
            ChatKindCommand("group"),
        ),
        stock(
            CommandOptions::new("private-only")
                .description("Only works in private chats")
                .category(["General", "Chat"])
                .run_in([ChatKind::Private])
                .dash_less_aliases(),
            ChatKindCommand("private"),
        ),
    ]
}

fn stock<H: CommandHandler + 'static>(options: CommandOptions, handler: H) -> (CommandOptions, Arc<dyn CommandHandler>) {
    (options, Arc::new(handler))
}

/// `ping`
pub struct PingCommand;

#[async_trait]
impl CommandHandler for PingCommand {
    async fn message_run(&self, ctx: &Context<'_>, _args: &mut Args) -> CommandResult {
        ctx.reply("Pong!").await?;
        Ok(json!("Pong!"))
    }
}

/// `add <number> <number>`
///
/// Replies with the sum; returns it as the command result.
pub struct AddCommand;

#[async_trait]
impl CommandHandler for AddCommand {
    async fn message_run(&self, ctx: &Context<'_>, args: &mut Args) -> CommandResult {
        let lhs: f64 = args.pick("number").await?;
        let rhs: f64 = args.pick("number").await?;
        let sum = lhs + rhs;

        ctx.reply(format!("{lhs} + {rhs} = {sum}")).await?;
        Ok(json!(sum))
    }
}

/// Confirms the chat kind it is restricted to.
pub struct ChatKindCommand(&'static str);

#[async_trait]
impl CommandHandler for ChatKindCommand {
    async fn message_run(&self, ctx: &Context<'_>, _args: &mut Args) -> CommandResult {
        ctx.reply(format!("This is a {} chat.", self.0)).await?;
        Ok(CommandOutput::Null)
    }
}
