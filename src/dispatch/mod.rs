//! Message dispatch: prefix resolution, the stage pipeline, and the typing
//! side channel.

pub mod pipeline;
pub mod prefix;
pub mod typing;

pub use pipeline::{Outcome, Pipeline, PipelineOptions};
pub use prefix::{Prefix, PrefixHook, StaticPrefix};
pub use typing::TypingListener;
