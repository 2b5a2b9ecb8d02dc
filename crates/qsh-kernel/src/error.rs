//! Shell error kinds.
//!
//! Every command, the resolver, the dispatcher and the result stream report
//! failures as a [`ShellError`]. None of them is fatal on its own: the REPL
//! prints the error and reads the next line unless exit-on-error is set.

use thiserror::Error;

use qsh_types::LiteralError;

use crate::backend::BackendError;

/// Result type for shell operations.
pub type ShellResult<T> = Result<T, ShellError>;

/// Errors raised while dispatching a line.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("{command}: too few arguments (expected at least {min}, got {got})")]
    TooFewArguments {
        command: String,
        min: usize,
        got: usize,
    },

    #[error("{command}: too many arguments (expected at most {max}, got {got})")]
    TooManyArguments {
        command: String,
        max: usize,
        got: usize,
    },

    #[error("command {0} does not exist; use \\HELP for the list of shell commands")]
    UnknownCommand(String),

    #[error("alias {0} does not exist; use \\ALIAS to create a command alias")]
    UnknownAlias(String),

    #[error("alias {0} already exists")]
    AliasAlreadyExists(String),

    #[error("alias expansion loops back to {0}")]
    AliasCycle(String),

    #[error("{0}")]
    UnaliasFailed(String),

    #[error("{0} has no value; use \\SET or \\PUSH to give it one")]
    UnboundVariable(String),

    #[error("stack for {0} is empty")]
    EmptyStack(String),

    #[error("{0} is not a predefined session variable")]
    UnknownPredefined(String),

    #[error("invalid variable name {0:?}")]
    InvalidVariableName(String),

    #[error("credentials must be user:password pairs separated by commas, got {0:?}")]
    InvalidCredentials(String),

    #[error(transparent)]
    MalformedLiteral(#[from] LiteralError),

    #[error("unbalanced quotes in input")]
    UnbalancedQuote,

    #[error("not connected to any query service; use \\CONNECT to connect")]
    NotConnected,

    #[error("query failed: {0}")]
    BackendQuery(#[from] BackendError),

    #[error("result scan failed: {0}")]
    ResultScan(String),

    #[error("output write failed, envelope truncated: {0}")]
    OutputWrite(#[source] std::io::Error),

    #[error("cannot source {path}: {message}")]
    Source { path: String, message: String },
}

impl ShellError {
    /// Stable numeric code printed alongside the message.
    pub fn code(&self) -> u32 {
        match self {
            ShellError::TooFewArguments { .. } => 100,
            ShellError::TooManyArguments { .. } => 101,
            ShellError::UnknownCommand(_) => 102,
            ShellError::UnknownAlias(_) => 110,
            ShellError::AliasAlreadyExists(_) => 111,
            ShellError::AliasCycle(_) => 112,
            ShellError::UnaliasFailed(_) => 113,
            ShellError::UnboundVariable(_) => 120,
            ShellError::EmptyStack(_) => 121,
            ShellError::UnknownPredefined(_) => 122,
            ShellError::InvalidVariableName(_) => 123,
            ShellError::InvalidCredentials(_) => 124,
            ShellError::MalformedLiteral(_) => 130,
            ShellError::UnbalancedQuote => 131,
            ShellError::NotConnected => 140,
            ShellError::BackendQuery(_) => 141,
            ShellError::ResultScan(_) => 142,
            ShellError::OutputWrite(_) => 143,
            ShellError::Source { .. } => 150,
        }
    }
}
