//! Help text for shell commands, generated from command schemas.

use crate::commands::CommandSchema;

/// Format help for a single command.
pub fn format_command_help(schema: &CommandSchema) -> String {
    let mut output = String::new();

    let synopsis = if schema.usage.is_empty() {
        format!("\\{}", schema.name)
    } else {
        format!("\\{} {}", schema.name, schema.usage)
    };
    output.push_str(&synopsis);
    output.push('\n');
    output.push_str(&format!("    {}\n", schema.description));

    for example in &schema.examples {
        output.push_str(&format!("    e.g. {}\n", example));
    }

    output
}

/// Format help for a list of commands, separated by blank lines.
pub fn format_command_list(schemas: &[CommandSchema]) -> String {
    schemas
        .iter()
        .map(format_command_help)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Arity;

    #[test]
    fn test_command_help_layout() {
        let schema = CommandSchema::new("SET", "Set the top value of a variable.")
            .usage("<name> <value>")
            .arity(Arity::exactly(2))
            .example("\\SET -timeout \"10s\";");
        let help = format_command_help(&schema);
        assert_eq!(
            help,
            "\\SET <name> <value>\n    Set the top value of a variable.\n    e.g. \\SET -timeout \"10s\";\n"
        );
    }

    #[test]
    fn test_list_separates_commands() {
        let schemas = vec![CommandSchema::new("A", "first"), CommandSchema::new("B", "second")];
        assert_eq!(format_command_list(&schemas), "\\A\n    first\n\n\\B\n    second\n");
    }
}
