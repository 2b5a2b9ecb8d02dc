//! Command aliases.
//!
//! An alias maps a name to a line of input. `\\name` at the start of a line
//! runs the stored text through the dispatcher as if it had been typed;
//! `\\name` as a command argument resolves to the text itself.

use std::collections::HashMap;

use crate::error::{ShellError, ShellResult};

/// Prefix that marks an alias reference.
pub const ALIAS_SIGIL: &str = "\\\\";

/// Name to replacement-text table.
#[derive(Debug, Clone, Default)]
pub struct AliasRegistry {
    aliases: HashMap<String, String>,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a new alias. Existing aliases are never overwritten.
    pub fn define(&mut self, name: impl Into<String>, text: impl Into<String>) -> ShellResult<()> {
        let name = name.into();
        if self.aliases.contains_key(&name) {
            return Err(ShellError::AliasAlreadyExists(name));
        }
        self.aliases.insert(name, text.into());
        Ok(())
    }

    /// Remove an alias. Returns false when it did not exist.
    pub fn remove(&mut self, name: &str) -> bool {
        self.aliases.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    /// All aliases, sorted by name.
    pub fn iter_sorted(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .aliases
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
