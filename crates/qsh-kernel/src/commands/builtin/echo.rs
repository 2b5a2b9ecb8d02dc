//! ECHO: print resolved values.

use async_trait::async_trait;

use qsh_types::value_to_bare_text;

use crate::commands::{Arity, Command, CommandSchema, ExecContext};
use crate::error::ShellResult;

/// Echo command: resolve each argument and print them space-separated.
///
/// Strings print without quotes; everything else prints as JSON.
pub struct Echo;

#[async_trait]
impl Command for Echo {
    fn name(&self) -> &str {
        "ECHO"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("ECHO", "Print the value of each argument: variables, aliases or literals.")
            .usage("<arg> ...")
            .arity(Arity::at_least(1))
            .quoted_args()
            .example("\\ECHO -$r $x histfile;")
            .example("\\ECHO \"hello world\";")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ShellResult<()> {
        let texts = args
            .iter()
            .map(|arg| ctx.session.resolve(arg).map(|v| value_to_bare_text(&v)))
            .collect::<ShellResult<Vec<_>>>()?;
        ctx.println(texts.join(" "));
        Ok(())
    }
}
