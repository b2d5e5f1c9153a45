//! jinsoul - command dispatch core for chat bots.
//!
//! Inbound messages run through a fixed pipeline: prefix resolution,
//! command lookup, preconditions, argument parsing and the command body.
//! Every transition is published on a typed [`events::EventBus`]; the core
//! itself never replies, listeners decide what the user sees.
//!
//! ```ignore
//! let client = Client::new(Config::load("jinsoul.toml")?, transport)?;
//! for (options, handler) in commands::misc::all() {
//!     client.register(options, handler)?;
//! }
//! client.handle_message(message);
//! ```

pub mod args;
pub mod client;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod message;
pub mod metrics;
pub mod preconditions;
pub mod telemetry;
pub mod transport;

pub use client::Client;
pub use error::{CommandError, Identifier, RegistryError, TransportError, UserError};
pub use message::{ChatKind, Message, MessageKind};
pub use transport::Transport;
