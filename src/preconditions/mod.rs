//! Preconditions: named predicates that gate command execution.
//!
//! - [`container`]: the AND/OR container tree and its runner
//! - [`store`]: named registry plus the ordered global list
//! - [`builtin`]: `GroupOnly`, `PrivateOnly` and `Enabled`

pub mod builtin;
pub mod container;
pub mod store;

pub use container::{Mode, PreconditionContainer, PreconditionEntry, RunStrategy};
pub use store::PreconditionStore;

use crate::commands::{Command, RunContext};
use crate::error::UserError;
use crate::message::Message;
use crate::transport::Transport;
use async_trait::async_trait;

/// Result of a precondition check.
pub type PreconditionResult = Result<(), UserError>;

/// What a precondition can see besides the message and command.
#[derive(Clone, Copy)]
pub struct PreconditionContext<'a> {
    /// Chat transport, for metadata lookups.
    pub transport: &'a dyn Transport,
    pub run: &'a RunContext,
    /// Context attached to the container leaf that referenced this precondition.
    pub entry: Option<&'a serde_json::Value>,
}

/// A named check run before a command.
#[async_trait]
pub trait Precondition: Send + Sync {
    /// Registry key referenced by container leaves.
    fn name(&self) -> &str;

    /// Position in the global list. `None` keeps the precondition out of it.
    fn position(&self) -> Option<i32> {
        None
    }

    async fn run(&self, message: &Message, command: &Command, ctx: &PreconditionContext<'_>) -> PreconditionResult;
}
