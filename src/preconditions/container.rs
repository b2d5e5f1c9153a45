//! Precondition container tree.
//!
//! A container is either a leaf naming a registered precondition, or a
//! composite combining children with AND/OR semantics under a sequential or
//! parallel strategy. Nesting a plain group flips the mode of its parent, so
//! `["A", ["B", "C"]]` means `A AND (B OR C)`.
//!
//! The parallel strategy is a latency optimization only: results are
//! selected by declared order, exactly as the sequential strategy would.

use super::store::PreconditionStore;
use super::{PreconditionContext, PreconditionResult};
use crate::commands::Command;
use crate::error::{Identifier, UserError};
use crate::message::Message;
use futures_util::future::{BoxFuture, FutureExt, join_all};

/// How a composite combines its children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// All children must pass.
    #[default]
    And,
    /// One passing child is enough.
    Or,
}

impl Mode {
    fn flipped(self) -> Self {
        match self {
            Self::And => Self::Or,
            Self::Or => Self::And,
        }
    }
}

/// How a composite schedules its children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunStrategy {
    /// One at a time, in declared order, short-circuiting.
    #[default]
    Sequential,
    /// All at once; results still picked by declared order.
    Parallel,
}

/// Declarative input for building a container.
#[derive(Debug, Clone, PartialEq)]
pub enum PreconditionEntry {
    /// Reference to a registered precondition.
    Name(String),
    /// Reference with context handed to the precondition.
    WithContext { name: String, context: serde_json::Value },
    /// Nested group; its mode is the opposite of its parent's.
    Group(Vec<PreconditionEntry>),
    /// Nested group with explicit settings. `mode: None` flips like [`PreconditionEntry::Group`].
    Detailed {
        mode: Option<Mode>,
        strategy: RunStrategy,
        entries: Vec<PreconditionEntry>,
    },
}

impl From<&str> for PreconditionEntry {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for PreconditionEntry {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Vec<PreconditionEntry>> for PreconditionEntry {
    fn from(entries: Vec<PreconditionEntry>) -> Self {
        Self::Group(entries)
    }
}

/// Resolved container tree.
#[derive(Debug, Clone, PartialEq)]
pub enum PreconditionContainer {
    Leaf {
        name: String,
        context: Option<serde_json::Value>,
    },
    Composite {
        mode: Mode,
        strategy: RunStrategy,
        children: Vec<PreconditionContainer>,
    },
}

impl Default for PreconditionContainer {
    fn default() -> Self {
        Self::Composite {
            mode: Mode::And,
            strategy: RunStrategy::Sequential,
            children: Vec::new(),
        }
    }
}

impl PreconditionContainer {
    /// Empty top-level container (AND, sequential).
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level container (AND, sequential) holding `entries`.
    pub fn from_entries(entries: Vec<PreconditionEntry>) -> Self {
        Self::composite(Mode::And, RunStrategy::Sequential, entries)
    }

    /// Composite with explicit settings; nested groups flip relative to `mode`.
    pub fn composite(mode: Mode, strategy: RunStrategy, entries: Vec<PreconditionEntry>) -> Self {
        Self::Composite {
            mode,
            strategy,
            children: entries.into_iter().map(|e| Self::resolve(e, mode)).collect(),
        }
    }

    fn resolve(entry: PreconditionEntry, parent: Mode) -> Self {
        match entry {
            PreconditionEntry::Name(name) => Self::Leaf { name, context: None },
            PreconditionEntry::WithContext { name, context } => Self::Leaf {
                name,
                context: Some(context),
            },
            PreconditionEntry::Group(entries) => {
                Self::composite(parent.flipped(), RunStrategy::Sequential, entries)
            }
            PreconditionEntry::Detailed {
                mode,
                strategy,
                entries,
            } => Self::composite(mode.unwrap_or(parent.flipped()), strategy, entries),
        }
    }

    /// Append an entry. A leaf is first wrapped in a top-level AND composite.
    pub fn append(&mut self, entry: PreconditionEntry) {
        if let Self::Leaf { .. } = self {
            let leaf = std::mem::take(self);
            *self = Self::Composite {
                mode: Mode::And,
                strategy: RunStrategy::Sequential,
                children: vec![leaf],
            };
        }
        if let Self::Composite { mode, children, .. } = self {
            children.push(Self::resolve(entry, *mode));
        }
    }

    /// Whether the container has nothing to check.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Leaf { .. } => false,
            Self::Composite { children, .. } => children.is_empty(),
        }
    }

    /// Evaluate the container.
    pub fn run<'a>(
        &'a self,
        store: &'a PreconditionStore,
        message: &'a Message,
        command: &'a Command,
        ctx: &'a PreconditionContext<'a>,
    ) -> BoxFuture<'a, PreconditionResult> {
        async move {
            match self {
                Self::Leaf { name, context } => {
                    let Some(precondition) = store.get(name) else {
                        return Err(UserError::new(
                            Identifier::PreconditionUnavailable,
                            format!("precondition `{name}` is not registered"),
                        ));
                    };
                    let scoped = PreconditionContext {
                        entry: context.as_ref(),
                        ..*ctx
                    };
                    precondition.run(message, command, &scoped).await
                }
                Self::Composite {
                    mode,
                    strategy,
                    children,
                } => match strategy {
                    RunStrategy::Sequential => {
                        run_sequential(*mode, children, store, message, command, ctx).await
                    }
                    RunStrategy::Parallel => {
                        let results = join_all(
                            children.iter().map(|c| c.run(store, message, command, ctx)),
                        )
                        .await;
                        select(*mode, results)
                    }
                },
            }
        }
        .boxed()
    }
}

async fn run_sequential(
    mode: Mode,
    children: &[PreconditionContainer],
    store: &PreconditionStore,
    message: &Message,
    command: &Command,
    ctx: &PreconditionContext<'_>,
) -> PreconditionResult {
    let mut last_failure = None;
    for child in children {
        match (mode, child.run(store, message, command, ctx).await) {
            (Mode::And, Err(e)) => return Err(e),
            (Mode::Or, Ok(())) => return Ok(()),
            (Mode::Or, Err(e)) => last_failure = Some(e),
            (Mode::And, Ok(())) => {}
        }
    }
    last_failure.map_or(Ok(()), Err)
}

/// Pick the result sequential evaluation would have produced.
///
/// AND: first failure in declared order. OR: first success, else the last failure.
fn select(mode: Mode, results: Vec<PreconditionResult>) -> PreconditionResult {
    match mode {
        Mode::And => results.into_iter().find(Result::is_err).unwrap_or(Ok(())),
        Mode::Or => {
            let mut last_failure = None;
            for result in results {
                match result {
                    Ok(()) => return Ok(()),
                    Err(e) => last_failure = Some(e),
                }
            }
            last_failure.map_or(Ok(()), Err)
        }
    }
}
