//! SET: replace the top of a variable's stack.

use async_trait::async_trait;

use crate::commands::{Arity, Command, CommandSchema, ExecContext};
use crate::error::ShellResult;
use crate::session::StackWrite;

/// Set command: replace a variable's top value, creating the variable if it
/// has none.
pub struct Set;

#[async_trait]
impl Command for Set {
    fn name(&self) -> &str {
        "SET"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new(
            "SET",
            "Set the top value of a variable. -name is a query parameter, -$name a named \
             parameter, $name a session variable, and a bare name a predefined variable.",
        )
        .usage("<name> <value>")
        .arity(Arity::exactly(2))
        .quoted_args()
        .example("\\SET -timeout \"10s\";")
        .example("\\SET -$airport \"SJC\";")
        .example("\\SET -creds user:pass;")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ShellResult<()> {
        ctx.session
            .push_or_set(&args[0], &args[1], StackWrite::Set, ctx.backend.as_deref())
    }
}
