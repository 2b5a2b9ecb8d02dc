//! EXIT / QUIT: leave the shell.

use async_trait::async_trait;

use crate::commands::{Command, CommandSchema, ExecContext};
use crate::error::ShellResult;

/// Exit command, also registered as `\QUIT`.
pub struct Exit;

#[async_trait]
impl Command for Exit {
    fn name(&self) -> &str {
        "EXIT"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("EXIT", "Exit the shell. \\QUIT does the same.")
            .example("\\EXIT;")
            .example("\\QUIT;")
    }

    async fn execute(&self, _args: &[String], ctx: &mut ExecContext) -> ShellResult<()> {
        ctx.session.effects.exit = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::builtin::testing::make_ctx;

    #[tokio::test]
    async fn test_exit_requests_termination() {
        let mut ctx = make_ctx();
        Exit.execute(&[], &mut ctx).await.unwrap();
        assert!(ctx.session.effects.exit);
    }
}
