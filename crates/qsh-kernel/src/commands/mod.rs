//! Shell commands.
//!
//! Every backslash command is a [`Command`]. Commands are looked up in the
//! [`CommandRegistry`] by keyword and run against an [`ExecContext`].
//!
//! # Architecture
//!
//! ```text
//! CommandRegistry
//! ├── \ALIAS \UNALIAS               alias table
//! ├── \SET \PUSH \POP \UNSET        variable stacks
//! ├── \CONNECT \DISCONNECT \EXIT    session effects
//! └── \ECHO \HELP \VERSION ...      output only
//! ```

mod builtin;
mod context;
mod registry;
mod traits;

pub use builtin::register_builtins;
pub use context::ExecContext;
pub use registry::CommandRegistry;
pub use traits::{Arity, Command, CommandSchema};
