//! CONNECT / DISCONNECT: switch the query service the shell talks to.

use async_trait::async_trait;

use crate::commands::{Arity, Command, CommandSchema, ExecContext};
use crate::error::ShellResult;

/// Connect command: record a new endpoint for the kernel to connect to.
pub struct Connect;

#[async_trait]
impl Command for Connect {
    fn name(&self) -> &str {
        "CONNECT"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("CONNECT", "Connect to a query service. Parameters are sent again after connecting.")
            .usage("<url>")
            .arity(Arity::exactly(1))
            .example("\\CONNECT http://localhost:8093;")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ShellResult<()> {
        ctx.session.effects.disconnect = false;
        ctx.session.effects.connect = Some(args[0].clone());
        Ok(())
    }
}

/// Disconnect command: drop the current connection.
pub struct Disconnect;

#[async_trait]
impl Command for Disconnect {
    fn name(&self) -> &str {
        "DISCONNECT"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("DISCONNECT", "Disconnect from the query service. Statements fail until \\CONNECT.")
            .example("\\DISCONNECT;")
    }

    async fn execute(&self, _args: &[String], ctx: &mut ExecContext) -> ShellResult<()> {
        ctx.session.effects.connect = None;
        ctx.session.effects.disconnect = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::builtin::testing::{args, make_ctx};

    #[tokio::test]
    async fn test_connect_records_endpoint() {
        let mut ctx = make_ctx();
        Connect.execute(&args(&["http://db:8093"]), &mut ctx).await.unwrap();
        assert_eq!(ctx.session.effects.connect.as_deref(), Some("http://db:8093"));
        assert!(!ctx.session.effects.disconnect);
    }

    #[tokio::test]
    async fn test_disconnect_overrides_pending_connect() {
        let mut ctx = make_ctx();
        Connect.execute(&args(&["http://db:8093"]), &mut ctx).await.unwrap();
        Disconnect.execute(&[], &mut ctx).await.unwrap();
        assert!(ctx.session.effects.connect.is_none());
        assert!(ctx.session.effects.disconnect);
    }
}
