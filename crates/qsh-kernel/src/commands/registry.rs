//! Command registry: keyword to command lookup.

use std::collections::HashMap;
use std::sync::Arc;

use super::builtin::register_builtins;
use super::traits::{Command, CommandSchema};

/// Maps typed keywords (`\set`, `\quit`, ...) to commands.
///
/// Filled once at startup. Aliases live in the session, never here.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every builtin command.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_builtins(&mut registry);
        registry
    }

    /// Register a command under its own keyword. Returns the shared handle.
    pub fn register(&mut self, command: impl Command + 'static) -> Arc<dyn Command> {
        let command: Arc<dyn Command> = Arc::new(command);
        let keyword = command.schema().keyword();
        self.commands.insert(keyword, command.clone());
        command
    }

    /// Register an extra keyword for an existing command.
    pub fn register_keyword(&mut self, keyword: &str, command: Arc<dyn Command>) {
        self.commands.insert(keyword.to_lowercase(), command);
    }

    /// Look up a keyword, ignoring case.
    pub fn get(&self, keyword: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(&keyword.to_lowercase()).cloned()
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.commands.contains_key(&keyword.to_lowercase())
    }

    /// Registered keywords, sorted.
    pub fn keywords(&self) -> Vec<&str> {
        let mut keywords: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        keywords.sort_unstable();
        keywords
    }

    /// Schemas of every distinct command, sorted by name.
    pub fn schemas(&self) -> Vec<CommandSchema> {
        let mut schemas: Vec<CommandSchema> = Vec::new();
        for command in self.commands.values() {
            let schema = command.schema();
            if !schemas.iter().any(|s| s.name == schema.name) {
                schemas.push(schema);
            }
        }
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let registry = CommandRegistry::with_builtins();
        for keyword in [
            "\\alias", "\\unalias", "\\connect", "\\disconnect", "\\exit", "\\quit", "\\help",
            "\\set", "\\push", "\\pop", "\\unset", "\\echo", "\\version", "\\copyright", "\\source",
        ] {
            assert!(registry.contains(keyword), "missing {keyword}");
        }
    }

    #[test]
    fn test_lookup_ignores_case() {
        let registry = CommandRegistry::with_builtins();
        assert!(registry.get("\\SET").is_some());
        assert!(registry.get("\\Set").is_some());
        assert!(registry.get("\\nope").is_none());
    }

    #[test]
    fn test_quit_shares_exit() {
        let registry = CommandRegistry::with_builtins();
        let exit = registry.get("\\exit").unwrap();
        let quit = registry.get("\\quit").unwrap();
        assert_eq!(exit.name(), quit.name());
        assert_eq!(registry.schemas().iter().filter(|s| s.name == "EXIT").count(), 1);
    }
}
