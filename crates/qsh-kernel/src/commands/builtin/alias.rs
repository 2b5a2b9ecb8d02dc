//! ALIAS / UNALIAS: manage command aliases.

use async_trait::async_trait;

use crate::commands::{Arity, Command, CommandSchema, ExecContext};
use crate::error::{ShellError, ShellResult};

/// Alias command: list aliases, or define one.
///
/// - `\ALIAS` lists all aliases
/// - `\ALIAS name text...` defines `name`, joining the rest with spaces
pub struct Alias;

#[async_trait]
impl Command for Alias {
    fn name(&self) -> &str {
        "ALIAS"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("ALIAS", "List aliases, or create an alias for a line of input.")
            .usage("[<name> <command or statement>]")
            .arity(Arity::at_least(0))
            .example("\\ALIAS serverversion select version(), min_version();")
            .example("\\\\serverversion;")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ShellResult<()> {
        match args {
            [] => {
                list_aliases(ctx);
                Ok(())
            }
            [_] => Err(ShellError::TooFewArguments {
                command: "\\alias".to_string(),
                min: 2,
                got: 1,
            }),
            [name, rest @ ..] => {
                let text = strip_one_quote_layer(&rest.join(" "));
                ctx.session.aliases.define(name.as_str(), text)
            }
        }
    }
}

fn list_aliases(ctx: &mut ExecContext) {
    let entries: Vec<(String, String)> = ctx
        .session
        .aliases
        .iter_sorted()
        .into_iter()
        .map(|(name, text)| (name.to_string(), text.to_string()))
        .collect();
    let width = entries.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, text) in entries {
        ctx.println(format!("{name:<width$}  {text}"));
    }
}

fn strip_one_quote_layer(text: &str) -> String {
    if qsh_types::is_quoted(text.as_bytes()) {
        text[1..text.len() - 1].to_string()
    } else {
        text.to_string()
    }
}

/// Unalias command: remove aliases.
///
/// Every name is attempted; missing names are reported together.
pub struct Unalias;

#[async_trait]
impl Command for Unalias {
    fn name(&self) -> &str {
        "UNALIAS"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("UNALIAS", "Delete one or more aliases.")
            .usage("<name> ...")
            .arity(Arity::at_least(1))
            .example("\\UNALIAS serverversion tables;")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ShellResult<()> {
        let missing: Vec<String> = args
            .iter()
            .filter(|name| !ctx.session.aliases.remove(name))
            .map(|name| format!("alias {name} does not exist"))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ShellError::UnaliasFailed(missing.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::builtin::testing::{args, make_ctx};

    #[tokio::test]
    async fn test_alias_list_empty() {
        let mut ctx = make_ctx();
        Alias.execute(&[], &mut ctx).await.unwrap();
        assert!(ctx.out.is_empty());
    }

    #[tokio::test]
    async fn test_alias_define_joins_words() {
        let mut ctx = make_ctx();
        Alias.execute(&args(&["tables", "select", "*", "from", "system:keyspaces"]), &mut ctx).await.unwrap();
        assert_eq!(ctx.session.aliases.get("tables"), Some("select * from system:keyspaces"));
    }

    #[tokio::test]
    async fn test_alias_strips_surrounding_quotes() {
        let mut ctx = make_ctx();
        Alias.execute(&args(&["foo", "\"select", "1\""]), &mut ctx).await.unwrap();
        assert_eq!(ctx.session.aliases.get("foo"), Some("select 1"));
    }

    #[tokio::test]
    async fn test_alias_single_arg_is_too_few() {
        let mut ctx = make_ctx();
        let err = Alias.execute(&args(&["foo"]), &mut ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::TooFewArguments { .. }));
    }

    #[tokio::test]
    async fn test_alias_taken_name() {
        let mut ctx = make_ctx();
        Alias.execute(&args(&["a", "one"]), &mut ctx).await.unwrap();
        let err = Alias.execute(&args(&["a", "two"]), &mut ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::AliasAlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_alias_listing_is_sorted() {
        let mut ctx = make_ctx();
        Alias.execute(&args(&["bb", "two"]), &mut ctx).await.unwrap();
        Alias.execute(&args(&["a", "one"]), &mut ctx).await.unwrap();
        Alias.execute(&[], &mut ctx).await.unwrap();
        assert_eq!(ctx.out, "a   one\nbb  two\n");
    }

    #[tokio::test]
    async fn test_unalias_missing_leaves_table_alone() {
        let mut ctx = make_ctx();
        Alias.execute(&args(&["keep", "x"]), &mut ctx).await.unwrap();
        let err = Unalias.execute(&args(&["nonexistent"]), &mut ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::UnaliasFailed(ref m) if m.contains("nonexistent")));
        assert_eq!(ctx.session.aliases.len(), 1);
    }

    #[tokio::test]
    async fn test_unalias_accumulates_messages() {
        let mut ctx = make_ctx();
        Alias.execute(&args(&["a", "x"]), &mut ctx).await.unwrap();
        let err = Unalias.execute(&args(&["m1", "a", "m2"]), &mut ctx).await.unwrap_err();
        let ShellError::UnaliasFailed(message) = err else {
            panic!("expected UnaliasFailed");
        };
        assert!(message.contains("m1") && message.contains("m2"));
        assert!(!ctx.session.aliases.contains("a"));
    }
}
