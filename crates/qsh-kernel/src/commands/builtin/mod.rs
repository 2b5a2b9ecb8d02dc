//! Built-in shell commands.

mod alias;
mod connect;
mod echo;
mod exit;
mod help;
mod push;
mod set;
mod source;
mod unset;
mod version;

use super::CommandRegistry;

/// Register all built-in commands with the registry.
pub fn register_builtins(registry: &mut CommandRegistry) {
    registry.register(alias::Alias);
    registry.register(alias::Unalias);
    registry.register(connect::Connect);
    registry.register(connect::Disconnect);
    registry.register(echo::Echo);
    let exit = registry.register(exit::Exit);
    registry.register_keyword("\\quit", exit);
    registry.register(help::Help);
    registry.register(push::Push);
    registry.register(push::Pop);
    registry.register(set::Set);
    registry.register(source::Source);
    registry.register(unset::Unset);
    registry.register(version::Version);
    registry.register(version::Copyright);
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::backend::MemoryBackend;
    use crate::commands::{CommandRegistry, ExecContext};

    pub fn make_ctx() -> ExecContext {
        ExecContext::new(Arc::new(CommandRegistry::with_builtins()))
    }

    pub fn make_connected_ctx() -> (ExecContext, Arc<MemoryBackend>) {
        let backend = MemoryBackend::new();
        let ctx = ExecContext::with_backend(Arc::new(CommandRegistry::with_builtins()), backend.clone());
        (ctx, backend)
    }

    pub fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }
}
