//! HELP: describe shell commands.

use async_trait::async_trait;

use crate::commands::{Arity, Command, CommandSchema, ExecContext};
use crate::error::{ShellError, ShellResult};
use crate::help::{format_command_help, format_command_list};

/// Help command: all commands, or the named ones.
pub struct Help;

#[async_trait]
impl Command for Help {
    fn name(&self) -> &str {
        "HELP"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("HELP", "Show help for all commands, or for the named commands.")
            .usage("[<command> ...]")
            .arity(Arity::at_least(0))
            .example("\\HELP;")
            .example("\\HELP SET ECHO;")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ShellResult<()> {
        if args.is_empty() {
            let text = format_command_list(&ctx.commands.schemas());
            ctx.out.push_str(&text);
            return Ok(());
        }

        let mut text = String::new();
        for arg in args {
            let keyword = if arg.starts_with('\\') {
                arg.clone()
            } else {
                format!("\\{arg}")
            };
            let command = ctx
                .commands
                .get(&keyword)
                .ok_or_else(|| ShellError::UnknownCommand(keyword.clone()))?;
            text.push_str(&format_command_help(&command.schema()));
        }
        ctx.out.push_str(&text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::builtin::testing::{args, make_ctx};

    #[tokio::test]
    async fn test_help_lists_every_command() {
        let mut ctx = make_ctx();
        Help.execute(&[], &mut ctx).await.unwrap();
        for name in ["\\ALIAS", "\\SET", "\\ECHO", "\\EXIT", "\\SOURCE"] {
            assert!(ctx.out.contains(name), "missing {name}");
        }
    }

    #[tokio::test]
    async fn test_help_named_with_or_without_backslash() {
        let mut ctx = make_ctx();
        Help.execute(&args(&["set", "\\ECHO"]), &mut ctx).await.unwrap();
        assert!(ctx.out.starts_with("\\SET"));
        assert!(ctx.out.contains("\\ECHO"));
        assert!(!ctx.out.contains("\\ALIAS"));
    }

    #[tokio::test]
    async fn test_help_unknown_name() {
        let mut ctx = make_ctx();
        let err = Help.execute(&args(&["set", "bogus"]), &mut ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::UnknownCommand(ref k) if k == "\\bogus"));
        assert!(ctx.out.is_empty());
    }
}
