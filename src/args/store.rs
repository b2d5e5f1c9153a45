//! Resolver registry.

use super::resolvers::{
    ArgumentContext, ArgumentResolver, ArgumentValue, BooleanArgument, DateArgument,
    FloatArgument, IntegerArgument, NumberArgument, StringArgument,
};
use crate::error::{Identifier, UserError};
use dashmap::DashMap;
use std::sync::Arc;

/// Name-keyed registry of argument resolvers.
pub struct ArgumentStore {
    resolvers: DashMap<String, Arc<dyn ArgumentResolver>>,
}

impl Default for ArgumentStore {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ArgumentStore {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            resolvers: DashMap::new(),
        }
    }

    /// A registry holding `string`, `number`, `float`, `integer`, `boolean` and `date`.
    pub fn with_builtins() -> Self {
        let store = Self::empty();
        store.register(StringArgument);
        store.register(NumberArgument);
        store.register(FloatArgument);
        store.register(IntegerArgument);
        store.register(BooleanArgument);
        store.register(DateArgument);
        store
    }

    /// Register a resolver under its own name, replacing any previous one.
    pub fn register<R: ArgumentResolver + 'static>(&self, resolver: R) {
        let name = resolver.name().to_string();
        tracing::debug!(resolver = %name, "Registered argument resolver");
        self.resolvers.insert(name, Arc::new(resolver));
    }

    /// Remove a resolver. Returns whether one was registered.
    pub fn remove(&self, name: &str) -> bool {
        self.resolvers.remove(name).is_some()
    }

    /// Look up a resolver.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ArgumentResolver>> {
        self.resolvers.get(name).map(|r| Arc::clone(r.value()))
    }

    /// Whether a resolver is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.resolvers.contains_key(name)
    }

    /// Resolve `token` with the resolver registered as `ctx.type_name`.
    ///
    /// Rejections are reported as [`Identifier::ArgsInvalidType`] whatever
    /// identifier the resolver used; the resolver's own identifier is kept in
    /// the error context under `"cause"`.
    pub async fn resolve(&self, token: &str, ctx: &ArgumentContext<'_>) -> Result<ArgumentValue, UserError> {
        // Clone out of the map so no shard lock is held across the await.
        let resolver = self.get(ctx.type_name).ok_or_else(|| {
            UserError::new(
                Identifier::ArgsUnregisteredType,
                format!("no argument type named `{}` is registered", ctx.type_name),
            )
        })?;

        resolver.resolve(token, ctx).await.map_err(|e| {
            if e.is(&Identifier::ArgsInvalidType) {
                return e;
            }
            UserError::new(Identifier::ArgsInvalidType, e.message).with_context(serde_json::json!({
                "type": ctx.type_name,
                "token": token,
                "cause": e.identifier.as_str(),
            }))
        })
    }
}
