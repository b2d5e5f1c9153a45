//! Stateful argument cursor.
//!
//! [`Args`] walks the positional tokens of a [`ParsedArguments`] with an
//! explicit index. `pick` commits the index only on success, `peek` never
//! commits it, so no backtracking buffer is needed. Reading never moves the
//! cursor backwards; only [`Args::restore`] does.

use super::resolvers::ArgumentContext;
use super::store::ArgumentStore;
use crate::error::{Identifier, UserError};
use crate::message::Message;
use jinsoul_args::ParsedArguments;
use std::any::Any;
use std::sync::Arc;

/// Bounds for [`Args::repeat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatOptions {
    /// Fewer successes than this fail the whole call.
    pub min: usize,
    /// Stop after this many successes.
    pub max: Option<usize>,
}

impl Default for RepeatOptions {
    fn default() -> Self {
        Self { min: 1, max: None }
    }
}

impl RepeatOptions {
    pub fn new(min: usize, max: Option<usize>) -> Self {
        Self { min, max }
    }
}

/// Saved cursor position, see [`Args::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgsState(usize);

/// Cursor over the positional tokens of one command invocation.
pub struct Args {
    message: Arc<Message>,
    command: String,
    parsed: Arc<ParsedArguments>,
    resolvers: Arc<ArgumentStore>,
    position: usize,
}

impl Args {
    pub fn new(
        message: Arc<Message>,
        command: impl Into<String>,
        parsed: Arc<ParsedArguments>,
        resolvers: Arc<ArgumentStore>,
    ) -> Self {
        Self {
            message,
            command: command.into(),
            parsed,
            resolvers,
            position: 0,
        }
    }

    /// The parser output this cursor reads from.
    pub fn parsed(&self) -> &Arc<ParsedArguments> {
        &self.parsed
    }

    /// Index of the next unread positional token.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of unread positional tokens.
    pub fn remaining(&self) -> usize {
        self.parsed.positional().len().saturating_sub(self.position)
    }

    /// Whether every positional token has been consumed.
    pub fn finished(&self) -> bool {
        self.remaining() == 0
    }

    /// Consume the next raw token without resolving it.
    pub fn next(&mut self) -> Option<String> {
        let token = self.parsed.positional().get(self.position).cloned()?;
        self.position += 1;
        Some(token)
    }

    /// Consume and resolve the next token.
    ///
    /// The cursor advances only on success. Errors are
    /// [`Identifier::ArgsMissing`], [`Identifier::ArgsInvalidType`],
    /// [`Identifier::ArgsUnregisteredType`] or [`Identifier::ArgsTypeMismatch`].
    pub async fn pick<T: Any + Send>(&mut self, type_name: &str) -> Result<T, UserError> {
        let value = self.resolve_at(self.position, type_name).await?;
        self.position += 1;
        Ok(value)
    }

    /// Resolve the next token without consuming it, whatever the outcome.
    pub async fn peek<T: Any + Send>(&self, type_name: &str) -> Result<T, UserError> {
        self.resolve_at(self.position, type_name).await
    }

    /// Pick repeatedly until a pick fails or `max` values were collected.
    ///
    /// The cursor ends right after the last success. When fewer than `min`
    /// values were collected the error that stopped the loop is returned, or
    /// [`Identifier::ArgumentRepeatUnderflow`] if `max` stopped it first.
    pub async fn repeat<T: Any + Send>(&mut self, type_name: &str, options: RepeatOptions) -> Result<Vec<T>, UserError> {
        let mut values = Vec::new();
        let mut stopped_by = None;

        while options.max.is_none_or(|max| values.len() < max) {
            match self.pick::<T>(type_name).await {
                Ok(value) => values.push(value),
                Err(e) => {
                    stopped_by = Some(e);
                    break;
                }
            }
        }

        if values.len() >= options.min {
            return Ok(values);
        }

        Err(stopped_by.unwrap_or_else(|| {
            UserError::new(
                Identifier::ArgumentRepeatUnderflow,
                format!("expected at least {} `{type_name}` values, got {}", options.min, values.len()),
            )
        }))
    }

    /// All remaining tokens joined by single spaces. Consumes them; never fails.
    pub fn rest(&mut self) -> String {
        let rest = self.parsed.positional()[self.position.min(self.parsed.positional().len())..].join(" ");
        self.position = self.parsed.positional().len();
        rest
    }

    /// Whether a flag was given.
    pub fn flag(&self, name: &str) -> bool {
        self.parsed.flag(name)
    }

    /// Whether any of the flags was given.
    pub fn any_flag(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.parsed.flag(n))
    }

    /// Value of an option (last occurrence).
    pub fn option(&self, name: &str) -> Option<&str> {
        self.parsed.option(name)
    }

    /// Value of the first of `names` that was given.
    pub fn option_of(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|n| self.parsed.option(n))
    }

    /// Every value given for an option.
    pub fn options(&self, name: &str) -> &[String] {
        self.parsed.option_values(name)
    }

    /// Capture the cursor position.
    pub fn save(&self) -> ArgsState {
        ArgsState(self.position)
    }

    /// Return to a captured position.
    ///
    /// The one way to move the cursor backwards: the reading methods only
    /// ever advance it. Use it to retry an alternative parse from a known
    /// point.
    pub fn restore(&mut self, state: ArgsState) {
        self.position = state.0.min(self.parsed.positional().len());
    }

    async fn resolve_at<T: Any + Send>(&self, index: usize, type_name: &str) -> Result<T, UserError> {
        let Some(token) = self.parsed.positional().get(index) else {
            return Err(UserError::new(
                Identifier::ArgsMissing,
                format!("missing a `{type_name}` argument"),
            ));
        };

        let ctx = ArgumentContext {
            message: &self.message,
            command: &self.command,
            type_name,
        };
        let value = self.resolvers.resolve(token, &ctx).await?;

        value.downcast::<T>().map(|v| *v).map_err(|_| {
            UserError::new(
                Identifier::ArgsTypeMismatch,
                format!(
                    "`{type_name}` does not resolve to {}",
                    std::any::type_name::<T>()
                ),
            )
        })
    }
}
