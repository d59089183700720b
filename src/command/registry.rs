//! Command registry
//!
//! Thread-safe mapping from command name to (descriptor, handler).
//! Concurrent readers are permitted; writers are serialized by the lock.
//! All enumeration methods return snapshot copies so callers never iterate
//! while holding the lock.
//!
//! Iteration order is lexicographic by command name and stable for a given
//! snapshot; `all_trigger_phrases` and NLU/guided matching inherit it.

use super::descriptor::CommandDescriptor;
use super::CommandHandler;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

struct Entry {
    descriptor: CommandDescriptor,
    handler: Arc<dyn CommandHandler>,
}

/// Thread-safe store of registered commands
#[derive(Default)]
pub struct CommandRegistry {
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. Returns false when the name is empty or already
    /// registered; the existing entry is left intact.
    pub fn register(
        &self,
        descriptor: CommandDescriptor,
        handler: Arc<dyn CommandHandler>,
    ) -> bool {
        if descriptor.name.is_empty() {
            return false;
        }

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.contains_key(&descriptor.name) {
            return false;
        }

        debug!(command = %descriptor.name, "registered command");
        entries.insert(
            descriptor.name.clone(),
            Entry {
                descriptor,
                handler,
            },
        );
        true
    }

    /// Register a simple (parameterless) command from its trigger phrases
    pub fn register_simple<I, S>(
        &self,
        name: impl Into<String>,
        triggers: I,
        handler: Arc<dyn CommandHandler>,
    ) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let descriptor = CommandDescriptor::new(name.clone())
            .with_description(format!("Simple command: {name}"))
            .with_triggers(triggers);
        self.register(descriptor, handler)
    }

    /// Remove a command, dropping its handler. Returns false when absent.
    pub fn unregister(&self, name: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(name).is_some()
    }

    /// Look up a command's handler
    pub fn find_command(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(name).map(|e| Arc::clone(&e.handler))
    }

    /// Look up a command's descriptor (copied out of the lock)
    pub fn find_descriptor(&self, name: &str) -> Option<CommandDescriptor> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(name).map(|e| e.descriptor.clone())
    }

    /// Snapshot of all registered command names
    pub fn all_names(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.keys().cloned().collect()
    }

    /// Snapshot of all descriptors, in registry iteration order
    pub fn all_descriptors(&self) -> Vec<CommandDescriptor> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.values().map(|e| e.descriptor.clone()).collect()
    }

    /// True when any registered command has parameters
    pub fn has_parameterized_commands(&self) -> bool {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.values().any(|e| e.descriptor.is_parameterized())
    }

    /// Every trigger phrase of every command, flattened in registry
    /// iteration order. Duplicates across commands are preserved.
    pub fn all_trigger_phrases(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .values()
            .flat_map(|e| e.descriptor.trigger_phrases.iter().cloned())
            .collect()
    }

    /// Number of registered commands
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandContext, CommandResult};
    use crate::command::param::{ParamDescriptor, ParamType};

    fn noop() -> Arc<dyn CommandHandler> {
        Arc::new(|_: &CommandContext| CommandResult::Success)
    }

    #[test]
    fn duplicate_registration_fails_and_keeps_first() {
        let registry = CommandRegistry::new();
        let first = CommandDescriptor::new("show_help")
            .with_description("first")
            .with_triggers(["show help"]);
        let second = CommandDescriptor::new("show_help")
            .with_description("second")
            .with_triggers(["other"]);

        assert!(registry.register(first, noop()));
        assert!(!registry.register(second, noop()));
        assert_eq!(registry.find_descriptor("show_help").unwrap().description, "first");
    }

    #[test]
    fn empty_name_is_rejected() {
        let registry = CommandRegistry::new();
        assert!(!registry.register(CommandDescriptor::new(""), noop()));
        assert!(registry.is_empty());
    }

    #[test]
    fn unregister_drops_entry() {
        let registry = CommandRegistry::new();
        registry.register_simple("quit", ["quit"], noop());
        assert!(registry.unregister("quit"));
        assert!(!registry.unregister("quit"));
        assert!(registry.find_command("quit").is_none());
    }

    #[test]
    fn trigger_phrases_flatten_in_name_order_with_duplicates() {
        let registry = CommandRegistry::new();
        registry.register_simple("b_cmd", ["stop", "halt"], noop());
        registry.register_simple("a_cmd", ["go", "stop"], noop());

        assert_eq!(
            registry.all_trigger_phrases(),
            vec!["go", "stop", "stop", "halt"]
        );
    }

    #[test]
    fn detects_parameterized_commands() {
        let registry = CommandRegistry::new();
        registry.register_simple("help", ["help"], noop());
        assert!(!registry.has_parameterized_commands());

        let desc = CommandDescriptor::new("zoom_to")
            .with_triggers(["zoom to"])
            .with_parameter(ParamDescriptor::new("level", ParamType::Integer));
        registry.register(desc, noop());
        assert!(registry.has_parameterized_commands());
    }

    #[test]
    fn concurrent_reads_and_writes() {
        let registry = Arc::new(CommandRegistry::new());
        let mut handles = Vec::new();

        for i in 0..8 {
            let reg = Arc::clone(&registry);
            handles.push(std::thread::spawn(move || {
                let name = format!("cmd_{i}");
                assert!(reg.register_simple(name.clone(), [format!("trigger {i}")], Arc::new(
                    |_: &CommandContext| CommandResult::Success,
                )));
                for _ in 0..50 {
                    let _ = reg.all_descriptors();
                    let _ = reg.find_command(&name);
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(registry.len(), 8);
    }
}
