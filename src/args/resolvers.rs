//! Argument type resolvers.
//!
//! A resolver turns one raw token into a typed value. Resolvers are looked up
//! by name, so commands ask for `"number"` rather than a Rust type, and new
//! types are added by registering another resolver.

use crate::error::{Identifier, UserError};
use crate::message::Message;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::any::Any;

/// Type-erased resolved value. [`crate::args::Args`] downcasts it to the requested type.
pub type ArgumentValue = Box<dyn Any + Send>;

/// What a resolver can see besides the token.
#[derive(Debug, Clone, Copy)]
pub struct ArgumentContext<'a> {
    pub message: &'a Message,
    /// Primary name of the running command.
    pub command: &'a str,
    /// Name the resolver was requested under.
    pub type_name: &'a str,
}

/// Converts a token into a typed value.
#[async_trait]
pub trait ArgumentResolver: Send + Sync {
    /// Registry key, e.g. `"number"`.
    fn name(&self) -> &str;

    /// Resolve `token`, or reject it with a [`UserError`].
    async fn resolve(&self, token: &str, ctx: &ArgumentContext<'_>) -> Result<ArgumentValue, UserError>;
}

fn rejected(ctx: &ArgumentContext<'_>, token: &str, expected: &str) -> UserError {
    UserError::new(
        Identifier::ArgsInvalidType,
        format!("`{token}` is not a valid {expected}"),
    )
    .with_context(serde_json::json!({ "type": ctx.type_name, "token": token }))
}

/// `string`: the token verbatim (`String`).
pub struct StringArgument;

#[async_trait]
impl ArgumentResolver for StringArgument {
    fn name(&self) -> &str {
        "string"
    }

    async fn resolve(&self, token: &str, _ctx: &ArgumentContext<'_>) -> Result<ArgumentValue, UserError> {
        Ok(Box::new(token.to_string()))
    }
}

/// `number`: a finite decimal number (`f64`).
pub struct NumberArgument;

#[async_trait]
impl ArgumentResolver for NumberArgument {
    fn name(&self) -> &str {
        "number"
    }

    async fn resolve(&self, token: &str, ctx: &ArgumentContext<'_>) -> Result<ArgumentValue, UserError> {
        match token.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Box::new(n)),
            _ => Err(rejected(ctx, token, "number")),
        }
    }
}

/// `float`: same as `number`, kept as a separate name for readability.
pub struct FloatArgument;

#[async_trait]
impl ArgumentResolver for FloatArgument {
    fn name(&self) -> &str {
        "float"
    }

    async fn resolve(&self, token: &str, ctx: &ArgumentContext<'_>) -> Result<ArgumentValue, UserError> {
        NumberArgument.resolve(token, ctx).await
    }
}

/// `integer`: a whole number (`i64`).
pub struct IntegerArgument;

#[async_trait]
impl ArgumentResolver for IntegerArgument {
    fn name(&self) -> &str {
        "integer"
    }

    async fn resolve(&self, token: &str, ctx: &ArgumentContext<'_>) -> Result<ArgumentValue, UserError> {
        token
            .parse::<i64>()
            .map(|n| Box::new(n) as ArgumentValue)
            .map_err(|_| rejected(ctx, token, "integer"))
    }
}

/// `boolean`: `true/false`, `yes/no`, `on/off`, `1/0`, case-insensitive (`bool`).
pub struct BooleanArgument;

#[async_trait]
impl ArgumentResolver for BooleanArgument {
    fn name(&self) -> &str {
        "boolean"
    }

    async fn resolve(&self, token: &str, ctx: &ArgumentContext<'_>) -> Result<ArgumentValue, UserError> {
        match token.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Box::new(true)),
            "false" | "no" | "off" | "0" => Ok(Box::new(false)),
            _ => Err(rejected(ctx, token, "boolean")),
        }
    }
}

/// `date`: RFC 3339 timestamp or `YYYY-MM-DD` at midnight UTC (`DateTime<Utc>`).
pub struct DateArgument;

#[async_trait]
impl ArgumentResolver for DateArgument {
    fn name(&self) -> &str {
        "date"
    }

    async fn resolve(&self, token: &str, ctx: &ArgumentContext<'_>) -> Result<ArgumentValue, UserError> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(token) {
            return Ok(Box::new(ts.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(token, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| Box::new(dt.and_utc()) as ArgumentValue)
            .ok_or_else(|| rejected(ctx, token, "date"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn resolve<R: ArgumentResolver>(resolver: R, token: &str) -> Result<ArgumentValue, UserError> {
        let message = Message::chat("c", "a", "");
        let ctx = ArgumentContext {
            message: &message,
            command: "test",
            type_name: resolver.name(),
        };
        resolver.resolve(token, &ctx).await
    }

    #[tokio::test]
    async fn number_accepts_decimals_and_rejects_words() {
        let v = resolve(NumberArgument, "2.5").await.unwrap();
        assert_eq!(*v.downcast::<f64>().unwrap(), 2.5);
        let err = resolve(NumberArgument, "two").await.unwrap_err();
        assert!(err.is(&Identifier::ArgsInvalidType));
        assert!(resolve(NumberArgument, "inf").await.is_err());
    }

    #[tokio::test]
    async fn integer_rejects_fractions() {
        assert_eq!(*resolve(IntegerArgument, "-7").await.unwrap().downcast::<i64>().unwrap(), -7);
        assert!(resolve(IntegerArgument, "1.5").await.is_err());
    }

    #[tokio::test]
    async fn boolean_spellings() {
        for (token, expected) in [("Yes", true), ("off", false), ("1", true), ("FALSE", false)] {
            let v = resolve(BooleanArgument, token).await.unwrap();
            assert_eq!(*v.downcast::<bool>().unwrap(), expected, "token {token}");
        }
        assert!(resolve(BooleanArgument, "maybe").await.is_err());
    }

    #[tokio::test]
    async fn date_formats() {
        let v = resolve(DateArgument, "2024-02-29").await.unwrap();
        let dt = *v.downcast::<DateTime<Utc>>().unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-02-29T00:00:00+00:00");

        let v = resolve(DateArgument, "2024-01-01T10:00:00+02:00").await.unwrap();
        let dt = *v.downcast::<DateTime<Utc>>().unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-01T08:00:00+00:00");

        assert!(resolve(DateArgument, "2023-02-29").await.is_err());
    }

    #[tokio::test]
    async fn rejection_carries_token_context() {
        let err = resolve(IntegerArgument, "x").await.unwrap_err();
        let ctx = err.context.expect("context");
        assert_eq!(ctx["token"], "x");
        assert_eq!(ctx["type"], "integer");
    }
}
