//! qsh-kernel: the core of the qsh query shell.
//!
//! This crate provides:
//!
//! - **Variables**: four namespaces of value stacks and the token resolver
//! - **Aliases**: named lines of input, invoked with `\\name`
//! - **Commands**: the `Command` trait, registry, and builtin backslash commands
//! - **Dispatch**: line classification and argument splitting
//! - **Backend**: the query service traits, an HTTP backend and an in-memory one
//! - **Envelope**: rebuilding the JSON response envelope from a row cursor
//! - **Kernel**: the session owner that ties it together

pub mod aliases;
pub mod backend;
pub mod commands;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod help;
pub mod kernel;
pub mod session;
pub mod vars;

pub use backend::{
    BackendError, BackendResult, Connector, HttpBackend, HttpConnector, MemoryBackend,
    MemoryConnector, QueryBackend, RowCursor, VecCursor,
};
pub use error::{ShellError, ShellResult};
pub use kernel::{Kernel, KernelConfig, DEFAULT_ENGINE, SHELL_VERSION};
pub use session::Session;
pub use vars::Namespace;
