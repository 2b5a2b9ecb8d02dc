//! Core command traits and types.

use async_trait::async_trait;

use crate::error::{ShellError, ShellResult};

use super::context::ExecContext;

/// Inclusive bounds on a command's argument count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    /// `None` means unbounded.
    pub max: Option<usize>,
}

impl Arity {
    pub const fn exactly(n: usize) -> Self {
        Self { min: n, max: Some(n) }
    }

    pub const fn range(min: usize, max: usize) -> Self {
        Self { min, max: Some(max) }
    }

    pub const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    /// Check an argument count for `command`.
    pub fn check(&self, command: &str, got: usize) -> ShellResult<()> {
        if got < self.min {
            return Err(ShellError::TooFewArguments {
                command: command.to_string(),
                min: self.min,
                got,
            });
        }
        match self.max {
            Some(max) if got > max => Err(ShellError::TooManyArguments {
                command: command.to_string(),
                max,
                got,
            }),
            _ => Ok(()),
        }
    }
}

/// Schema describing a command's interface.
#[derive(Debug, Clone)]
pub struct CommandSchema {
    /// Command name, without the backslash.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Argument synopsis, e.g. `<name> <value>`.
    pub usage: String,
    /// Accepted argument count.
    pub arity: Arity,
    /// Whether double quotes group words into one argument.
    pub quoted_args: bool,
    /// Example invocations.
    pub examples: Vec<String>,
}

impl CommandSchema {
    /// Create a new command schema taking no arguments.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            usage: String::new(),
            arity: Arity::exactly(0),
            quoted_args: false,
            examples: Vec::new(),
        }
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }

    /// Let `"a b"` reach the command as a single argument.
    pub fn quoted_args(mut self) -> Self {
        self.quoted_args = true;
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    /// The keyword typed to run this command.
    pub fn keyword(&self) -> String {
        format!("\\{}", self.name.to_lowercase())
    }
}

/// A shell command.
#[async_trait]
pub trait Command: Send + Sync {
    /// The command's name (used for lookup).
    fn name(&self) -> &str;

    /// Get the command's schema.
    fn schema(&self) -> CommandSchema;

    /// Execute the command with already-counted arguments.
    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ShellResult<()>;

    fn min_args(&self) -> usize {
        self.schema().arity.min
    }

    fn max_args(&self) -> Option<usize> {
        self.schema().arity.max
    }

    /// Help text for this command.
    fn help(&self) -> String {
        crate::help::format_command_help(&self.schema())
    }
}
