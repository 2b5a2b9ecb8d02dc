//! UNSET: drop a variable entirely.

use async_trait::async_trait;

use crate::commands::{Arity, Command, CommandSchema, ExecContext};
use crate::error::ShellResult;
use crate::session::StackRemove;

/// Unset command: drain a variable's stack and forget it.
///
/// Predefined variables are drained but stay defined.
pub struct Unset;

#[async_trait]
impl Command for Unset {
    fn name(&self) -> &str {
        "UNSET"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("UNSET", "Delete a variable and every value on its stack.")
            .usage("<name>")
            .arity(Arity::exactly(1))
            .example("\\UNSET -$r;")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ShellResult<()> {
        ctx.session
            .pop_or_unset(&args[0], StackRemove::Unset, ctx.backend.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::builtin::testing::{args, make_connected_ctx, make_ctx};
    use crate::error::ShellError;
    use crate::session::StackWrite;
    use crate::vars::Namespace;

    #[tokio::test]
    async fn test_unset_drops_whole_stack() {
        let mut ctx = make_ctx();
        ctx.session.push_or_set("$x", "1", StackWrite::Push, None).unwrap();
        ctx.session.push_or_set("$x", "2", StackWrite::Push, None).unwrap();
        Unset.execute(&args(&["$x"]), &mut ctx).await.unwrap();
        assert!(ctx.session.vars.get(Namespace::UserVar, "x").is_none());
    }

    #[tokio::test]
    async fn test_unset_missing_variable() {
        let mut ctx = make_ctx();
        let err = Unset.execute(&args(&["$x"]), &mut ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::EmptyStack(_)));
    }

    #[tokio::test]
    async fn test_unset_clears_mirrored_parameter() {
        let (mut ctx, backend) = make_connected_ctx();
        ctx.session
            .push_or_set("-timeout", "\"1s\"", StackWrite::Set, ctx.backend.as_deref())
            .unwrap();
        assert!(backend.parameter("timeout").is_some());
        Unset.execute(&args(&["-timeout"]), &mut ctx).await.unwrap();
        assert!(backend.parameter("timeout").is_none());
    }
}
