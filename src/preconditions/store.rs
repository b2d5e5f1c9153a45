//! Precondition registry.
//!
//! Holds every precondition by name. Preconditions that declare a position
//! are also kept in the global list, ordered by ascending position; entries
//! with equal positions keep their registration order. Dispatches run the
//! global list from an immutable snapshot, so registrations made while a
//! dispatch is in flight only affect later dispatches.

use super::{Precondition, PreconditionContext, PreconditionResult};
use crate::commands::Command;
use crate::message::Message;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Default)]
pub struct PreconditionStore {
    named: DashMap<String, Arc<dyn Precondition>>,
    globals: RwLock<im::Vector<Arc<dyn Precondition>>>,
}

impl PreconditionStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the built-in preconditions.
    pub fn with_builtins() -> Self {
        let store = Self::new();
        for precondition in super::builtin::all() {
            store.register(precondition);
        }
        store
    }

    /// Register a precondition, replacing any previous one with the same name.
    pub fn register(&self, precondition: Arc<dyn Precondition>) {
        let name = precondition.name().to_string();
        let mut globals = self.globals.write();

        if let Some(index) = globals.iter().position(|p| p.name() == name) {
            globals.remove(index);
        }
        if let Some(position) = precondition.position() {
            let index = globals
                .iter()
                .position(|p| p.position().is_some_and(|existing| existing > position))
                .unwrap_or(globals.len());
            globals.insert(index, Arc::clone(&precondition));
            debug!(precondition = %name, position, index, "Global precondition inserted");
        }
        drop(globals);

        if self.named.insert(name.clone(), precondition).is_some() {
            info!(precondition = %name, "Precondition replaced");
        } else {
            info!(precondition = %name, "Precondition registered");
        }
    }

    /// Remove a precondition from the registry and the global list.
    pub fn remove(&self, name: &str) -> Option<Arc<dyn Precondition>> {
        let mut globals = self.globals.write();
        if let Some(index) = globals.iter().position(|p| p.name() == name) {
            globals.remove(index);
        }
        drop(globals);
        self.named.remove(name).map(|(_, p)| p)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Precondition>> {
        self.named.get(name).map(|p| Arc::clone(p.value()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    /// Remove everything.
    pub fn clear(&self) {
        self.globals.write().clear();
        self.named.clear();
    }

    /// Immutable view of the global list, in run order.
    pub fn snapshot(&self) -> im::Vector<Arc<dyn Precondition>> {
        self.globals.read().clone()
    }

    /// Names of the global list, in run order.
    pub fn global_names(&self) -> Vec<String> {
        self.globals.read().iter().map(|p| p.name().to_string()).collect()
    }

    /// Run the global list (AND, sequential) from a snapshot taken now.
    pub async fn run_globals(
        &self,
        message: &Message,
        command: &Command,
        ctx: &PreconditionContext<'_>,
    ) -> PreconditionResult {
        let snapshot = self.snapshot();
        let ctx = PreconditionContext { entry: None, ..*ctx };
        for precondition in snapshot.iter() {
            precondition.run(message, command, &ctx).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Named(&'static str, Option<i32>);

    #[async_trait]
    impl Precondition for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn position(&self) -> Option<i32> {
            self.1
        }

        async fn run(&self, _: &Message, _: &Command, _: &PreconditionContext<'_>) -> PreconditionResult {
            Ok(())
        }
    }

    #[test]
    fn globals_sorted_by_position_stable_on_ties() {
        let store = PreconditionStore::new();
        store.register(Arc::new(Named("late", Some(20))));
        store.register(Arc::new(Named("first", Some(5))));
        store.register(Arc::new(Named("tie-a", Some(10))));
        store.register(Arc::new(Named("tie-b", Some(10))));
        store.register(Arc::new(Named("local", None)));

        assert_eq!(store.global_names(), ["first", "tie-a", "tie-b", "late"]);
        assert!(store.contains("local"));
    }

    #[test]
    fn reregistering_moves_global_entry() {
        let store = PreconditionStore::new();
        store.register(Arc::new(Named("a", Some(1))));
        store.register(Arc::new(Named("b", Some(2))));
        store.register(Arc::new(Named("a", Some(3))));
        assert_eq!(store.global_names(), ["b", "a"]);

        store.register(Arc::new(Named("b", None)));
        assert_eq!(store.global_names(), ["a"]);
        assert!(store.contains("b"));
    }

    #[test]
    fn snapshot_is_isolated_from_later_registrations() {
        let store = PreconditionStore::new();
        store.register(Arc::new(Named("a", Some(1))));
        let snapshot = store.snapshot();
        store.register(Arc::new(Named("b", Some(0))));
        store.remove("a");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name(), "a");
        assert_eq!(store.global_names(), ["b"]);
    }

    #[test]
    fn builtins_registered() {
        let store = PreconditionStore::with_builtins();
        assert!(store.contains(super::super::builtin::GROUP_ONLY));
        assert!(store.contains(super::super::builtin::PRIVATE_ONLY));
        assert_eq!(store.global_names(), [super::super::builtin::ENABLED]);
        store.clear();
        assert!(store.snapshot().is_empty());
    }
}
