//! Typed argument reading.
//!
//! - [`resolvers`]: the [`ArgumentResolver`] trait and built-in resolvers
//! - [`store`]: the open, name-keyed resolver registry
//! - [`reader`]: [`Args`], a cursor over parsed positional tokens

pub mod reader;
pub mod resolvers;
pub mod store;

pub use reader::{Args, ArgsState, RepeatOptions};
pub use resolvers::{ArgumentContext, ArgumentResolver, ArgumentValue};
pub use store::ArgumentStore;
