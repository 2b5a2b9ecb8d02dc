//! SOURCE: run statements from a file.

use std::path::PathBuf;

use async_trait::async_trait;

use qsh_types::value_to_bare_text;

use crate::commands::{Arity, Command, CommandSchema, ExecContext};
use crate::error::ShellResult;

/// Source command: queue a file of `;`-terminated input for the kernel.
pub struct Source;

#[async_trait]
impl Command for Source {
    fn name(&self) -> &str {
        "SOURCE"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("SOURCE", "Run the statements and commands in a file, in order.")
            .usage("<path>")
            .arity(Arity::exactly(1))
            .quoted_args()
            .example("\\SOURCE setup.sql;")
            .example("\\SOURCE \"my queries.sql\";")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ShellResult<()> {
        let path = match qsh_types::str_to_val(&args[0]) {
            Ok(value) => value_to_bare_text(&value),
            Err(_) => args[0].clone(),
        };
        ctx.session.effects.source = Some(PathBuf::from(path));
        Ok(())
    }
}
