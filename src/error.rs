//! Unified error handling for jinsoul.
//!
//! This module provides the error hierarchy shared by every stage of a
//! dispatch: user-facing failures with stable identifiers, command body
//! failures, transport failures, and registration errors.

use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Identifiers (stable machine-readable codes)
// ============================================================================

/// Stable identifier attached to every [`UserError`].
///
/// External preconditions and resolvers use [`Identifier::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// The argument cursor was exhausted.
    ArgsMissing,
    /// A resolver rejected the token.
    ArgsInvalidType,
    /// No resolver is registered under the requested type name.
    ArgsUnregisteredType,
    /// The resolver produced a value of a different Rust type than requested.
    ArgsTypeMismatch,
    /// `repeat` collected fewer values than its minimum.
    ArgumentRepeatUnderflow,
    /// The command may only run in a group chat.
    PreconditionGroupOnly,
    /// The command may only run in a private chat.
    PreconditionPrivateOnly,
    /// The command is disabled.
    PreconditionDisabled,
    /// A container references a precondition that is not registered.
    PreconditionUnavailable,
    /// The transport could not report the chat kind.
    PreconditionChatKindUnavailable,
    /// A precondition panicked while running.
    PreconditionPanicked,
    /// Any other identifier.
    Custom(Cow<'static, str>),
}

impl Identifier {
    /// Create a custom identifier.
    pub fn custom(code: impl Into<Cow<'static, str>>) -> Self {
        Self::Custom(code.into())
    }

    /// The identifier as a string code.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ArgsMissing => "argsMissing",
            Self::ArgsInvalidType => "argsInvalidType",
            Self::ArgsUnregisteredType => "argsUnregisteredType",
            Self::ArgsTypeMismatch => "argsTypeMismatch",
            Self::ArgumentRepeatUnderflow => "argumentRepeatUnderflow",
            Self::PreconditionGroupOnly => "preconditionGroupOnly",
            Self::PreconditionPrivateOnly => "preconditionPrivateOnly",
            Self::PreconditionDisabled => "preconditionDisabled",
            Self::PreconditionUnavailable => "preconditionUnavailable",
            Self::PreconditionChatKindUnavailable => "preconditionChatKindUnavailable",
            Self::PreconditionPanicked => "preconditionPanicked",
            Self::Custom(code) => code,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// User errors (preconditions, argument reading)
// ============================================================================

/// A recoverable, user-facing failure.
///
/// Produced by preconditions and argument reading. Reported through events
/// with its identifier and message; the core never replies on its own.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct UserError {
    /// Stable code, suitable for matching.
    pub identifier: Identifier,
    /// Human readable message.
    pub message: String,
    /// Optional structured detail (e.g. the failed token).
    pub context: Option<serde_json::Value>,
}

impl UserError {
    /// Create an error with a message.
    pub fn new(identifier: Identifier, message: impl Into<String>) -> Self {
        Self {
            identifier,
            message: message.into(),
            context: None,
        }
    }

    /// Attach structured detail.
    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Shorthand for comparing identifiers.
    pub fn is(&self, identifier: &Identifier) -> bool {
        &self.identifier == identifier
    }
}

// ============================================================================
// Transport errors
// ============================================================================

/// Failure reported by the chat transport.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("chat not found: {0}")]
    ChatNotFound(String),

    #[error("transport disconnected")]
    Disconnected,

    #[error("transport error: {0}")]
    Other(String),
}

// ============================================================================
// Command errors (command body)
// ============================================================================

/// Errors raised by a command body.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Argument reading or a user-level check failed.
    #[error(transparent)]
    User(#[from] UserError),

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("command failed: {0}")]
    Failed(#[from] anyhow::Error),

    /// The command body panicked; the payload message if it was a string.
    #[error("command panicked: {0}")]
    Panicked(String),
}

impl CommandError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::User(_) => "user_error",
            Self::Transport(_) => "transport_error",
            Self::Failed(_) => "failed",
            Self::Panicked(_) => "panicked",
        }
    }

    /// The user error, if this is one.
    pub fn as_user_error(&self) -> Option<&UserError> {
        match self {
            Self::User(e) => Some(e),
            _ => None,
        }
    }
}

// ============================================================================
// Registry errors (load time)
// ============================================================================

/// Errors raised while registering commands and preconditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("command name or alias `{name}` is already owned by `{owner}`")]
    NameTaken { name: String, owner: String },

    #[error("command `{0}` has an empty name")]
    EmptyName(String),

    #[error("command `{0}`: run_in was specified as an empty list")]
    EmptyRunIn(String),
}

impl RegistryError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NameTaken { .. } => "name_taken",
            Self::EmptyName(_) => "empty_name",
            Self::EmptyRunIn(_) => "empty_run_in",
        }
    }
}

/// Convert a caught panic payload into a message.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
