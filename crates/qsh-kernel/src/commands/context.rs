//! Execution context for commands.

use std::sync::Arc;

use crate::backend::QueryBackend;
use crate::session::Session;

use super::registry::CommandRegistry;

/// Execution context passed to commands.
///
/// Commands write what they print into `out`; the kernel forwards it to the
/// output sink once the command returns.
pub struct ExecContext {
    /// Variables, aliases and pending side effects.
    pub session: Session,
    /// Current connection, if any. Parameter writes are mirrored here.
    pub backend: Option<Arc<dyn QueryBackend>>,
    /// Command registry reference (for commands that describe other commands).
    pub commands: Arc<CommandRegistry>,
    /// Text printed by the running command.
    pub out: String,
    /// Version string reported by `\VERSION`.
    pub shell_version: String,
}

impl ExecContext {
    /// Create a disconnected context with a fresh session.
    pub fn new(commands: Arc<CommandRegistry>) -> Self {
        Self {
            session: Session::new(),
            backend: None,
            commands,
            out: String::new(),
            shell_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Create a context with a connection.
    pub fn with_backend(commands: Arc<CommandRegistry>, backend: Arc<dyn QueryBackend>) -> Self {
        Self {
            backend: Some(backend),
            ..Self::new(commands)
        }
    }

    /// Borrow the connection for parameter mirroring.
    pub fn params(&self) -> Option<&dyn QueryBackend> {
        self.backend.as_deref()
    }

    /// Append a line to the command's output.
    pub fn println(&mut self, line: impl AsRef<str>) {
        self.out.push_str(line.as_ref());
        self.out.push('\n');
    }

    /// Take everything printed so far.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.out)
    }
}
