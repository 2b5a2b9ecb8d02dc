//! PUSH / POP: grow and shrink variable stacks.

use async_trait::async_trait;

use crate::commands::{Arity, Command, CommandSchema, ExecContext};
use crate::error::ShellResult;
use crate::session::{StackRemove, StackWrite};

/// Push command.
///
/// - `\PUSH` duplicates the top of every variable
/// - `\PUSH name` duplicates the top of one variable
/// - `\PUSH name value` pushes a new value
pub struct Push;

#[async_trait]
impl Command for Push {
    fn name(&self) -> &str {
        "PUSH"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new(
            "PUSH",
            "Push a value onto a variable's stack. With one argument the current top is \
             copied; with none, every variable's top is copied.",
        )
        .usage("[<name> [<value>]]")
        .arity(Arity::range(0, 2))
        .quoted_args()
        .example("\\PUSH -$r 10;")
        .example("\\PUSH;")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ShellResult<()> {
        match args {
            [] => {
                let sweep = ctx.session.push_all(ctx.backend.as_deref());
                tracing::debug!(applied = sweep.applied, skipped = sweep.skipped, "push sweep");
                Ok(())
            }
            [target] => ctx.session.push_top(target, ctx.backend.as_deref()),
            [target, value, ..] => {
                ctx.session
                    .push_or_set(target, value, StackWrite::Push, ctx.backend.as_deref())
            }
        }
    }
}

/// Pop command.
///
/// - `\POP` pops every variable
/// - `\POP name` pops one variable
pub struct Pop;

#[async_trait]
impl Command for Pop {
    fn name(&self) -> &str {
        "POP"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new(
            "POP",
            "Pop the top value off a variable's stack. With no arguments every variable is popped.",
        )
        .usage("[<name>]")
        .arity(Arity::range(0, 1))
        .example("\\POP -$r;")
        .example("\\POP;")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ShellResult<()> {
        match args.first() {
            None => {
                let sweep = ctx.session.pop_all(ctx.backend.as_deref());
                tracing::debug!(applied = sweep.applied, skipped = sweep.skipped, "pop sweep");
                Ok(())
            }
            Some(target) => ctx
                .session
                .pop_or_unset(target, StackRemove::Pop, ctx.backend.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::builtin::testing::{args, make_connected_ctx, make_ctx};
    use crate::error::ShellError;
    use crate::vars::Namespace;
    use qsh_types::Value;

    #[tokio::test]
    async fn test_push_pop_restores_previous() {
        let mut ctx = make_ctx();
        Push.execute(&args(&["$x", "1"]), &mut ctx).await.unwrap();
        Push.execute(&args(&["$x", "2"]), &mut ctx).await.unwrap();
        Pop.execute(&args(&["$x"]), &mut ctx).await.unwrap();
        assert_eq!(ctx.session.vars.top(Namespace::UserVar, "x").unwrap(), &Value::from(1));
    }

    #[tokio::test]
    async fn test_pop_fresh_variable_is_empty_stack() {
        let mut ctx = make_ctx();
        let err = Pop.execute(&args(&["$fresh"]), &mut ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::EmptyStack(_)));
    }

    #[tokio::test]
    async fn test_push_one_arg_duplicates_top() {
        let mut ctx = make_ctx();
        Push.execute(&args(&["$x", "5"]), &mut ctx).await.unwrap();
        Push.execute(&args(&["$x"]), &mut ctx).await.unwrap();
        assert_eq!(ctx.session.vars.depth(Namespace::UserVar, "x"), 2);
    }

    #[tokio::test]
    async fn test_bulk_push_then_pop() {
        let mut ctx = make_ctx();
        Push.execute(&args(&["$x", "1"]), &mut ctx).await.unwrap();
        Push.execute(&args(&["-y", "2"]), &mut ctx).await.unwrap();
        Push.execute(&[], &mut ctx).await.unwrap();
        assert_eq!(ctx.session.vars.depth(Namespace::UserVar, "x"), 2);
        assert_eq!(ctx.session.vars.depth(Namespace::QueryParam, "y"), 2);
        assert_eq!(ctx.session.vars.depth(Namespace::Predefined, "histfile"), 2);

        Pop.execute(&[], &mut ctx).await.unwrap();
        assert_eq!(ctx.session.vars.depth(Namespace::UserVar, "x"), 1);
        assert_eq!(ctx.session.vars.depth(Namespace::Predefined, "histfile"), 1);
    }

    #[tokio::test]
    async fn test_bulk_pop_tolerates_empty_stacks() {
        let mut ctx = make_ctx();
        Push.execute(&args(&["$x", "1"]), &mut ctx).await.unwrap();
        Pop.execute(&[], &mut ctx).await.unwrap();
        // $x and every predefined variable are now empty; a second sweep still succeeds.
        Pop.execute(&[], &mut ctx).await.unwrap();
        assert_eq!(ctx.session.vars.depth(Namespace::UserVar, "x"), 0);
    }

    #[tokio::test]
    async fn test_bulk_pop_clears_emptied_parameters() {
        let (mut ctx, backend) = make_connected_ctx();
        Push.execute(&args(&["-$r", "1"]), &mut ctx).await.unwrap();
        Pop.execute(&[], &mut ctx).await.unwrap();
        assert_eq!(backend.parameter("$r"), None);
    }
}
