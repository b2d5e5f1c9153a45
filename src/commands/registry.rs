//! Command registry.
//!
//! The `CommandStore` maps primary names and aliases to commands. Every name
//! and alias resolves to exactly one command; registering a command whose
//! name or alias is owned by a different command is rejected.

use super::Command;
use crate::error::RegistryError;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Registry of commands, keyed by primary name and alias.
#[derive(Default)]
pub struct CommandStore {
    commands: DashMap<String, Arc<Command>>,
    aliases: DashMap<String, String>,
    /// Serializes registration so conflict checks and inserts are atomic.
    write_lock: Mutex<()>,
}

impl CommandStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command.
    ///
    /// Re-registering a command under the same primary name replaces it
    /// (aliases included).
    pub fn register(&self, command: Command) -> Result<Arc<Command>, RegistryError> {
        let _guard = self.write_lock.lock();
        let name = command.name().to_string();

        if let Some(owner) = self.aliases.get(&name) {
            return Err(RegistryError::NameTaken {
                name,
                owner: owner.value().clone(),
            });
        }
        for alias in command.aliases() {
            let owner = self
                .commands
                .get(alias)
                .map(|c| c.name().to_string())
                .or_else(|| self.aliases.get(alias).map(|o| o.value().clone()));
            if let Some(owner) = owner.filter(|o| *o != name) {
                return Err(RegistryError::NameTaken {
                    name: alias.clone(),
                    owner,
                });
            }
        }

        if let Some(previous) = self.commands.get(&name).map(|c| Arc::clone(c.value())) {
            for alias in previous.aliases() {
                self.aliases.remove(alias);
            }
        }

        let command = Arc::new(command);
        for alias in command.aliases() {
            self.aliases.insert(alias.clone(), name.clone());
        }
        self.commands.insert(name.clone(), Arc::clone(&command));

        info!(command = %name, aliases = ?command.aliases(), "Registered command");
        Ok(command)
    }

    /// Remove a command and its aliases by primary name.
    pub fn remove(&self, name: &str) -> Option<Arc<Command>> {
        let _guard = self.write_lock.lock();
        let (_, command) = self.commands.remove(name)?;
        for alias in command.aliases() {
            self.aliases.remove(alias);
        }
        info!(command = %name, "Removed command");
        Some(command)
    }

    /// Resolve a primary name or alias.
    pub fn get(&self, name_or_alias: &str) -> Option<Arc<Command>> {
        if let Some(command) = self.commands.get(name_or_alias) {
            return Some(Arc::clone(command.value()));
        }
        let primary = self.aliases.get(name_or_alias)?.value().clone();
        self.commands.get(&primary).map(|c| Arc::clone(c.value()))
    }

    pub fn contains(&self, name_or_alias: &str) -> bool {
        self.commands.contains_key(name_or_alias) || self.aliases.contains_key(name_or_alias)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Primary names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.iter().map(|c| c.key().clone()).collect();
        names.sort();
        names
    }
}
