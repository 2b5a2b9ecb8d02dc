//! Terminal formatting for shell errors and the banner.

use std::io::IsTerminal;

use owo_colors::OwoColorize;
use qsh_kernel::ShellError;

/// Whether stderr should get ANSI colors.
///
/// Honors `NO_COLOR` and `TERM=dumb`, and never colors a redirected stream.
pub fn color_enabled() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
        return false;
    }
    std::io::stderr().is_terminal()
}

/// Format an error as `ERROR <code> : <message>`.
pub fn format_error(error: &ShellError, color: bool) -> String {
    let line = format!("ERROR {} : {}", error.code(), error);
    if color {
        line.red().to_string()
    } else {
        line
    }
}

/// Startup banner.
pub fn banner(version: &str, endpoint: Option<&str>) -> String {
    let connection = match endpoint {
        Some(endpoint) => format!("Connected to : {endpoint}"),
        None => "Not connected. Use \\CONNECT <url>; to connect.".to_string(),
    };
    format!(
        "qsh {version}\n{connection}\nType \\HELP; for commands, \\EXIT; to exit.\n\
         Statements end with ';'.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_plain() {
        let err = ShellError::UnboundVariable("-$r".to_string());
        let line = format_error(&err, false);
        assert!(line.starts_with("ERROR 120 : "), "{line}");
        assert!(line.contains("-$r"));
    }

    #[test]
    fn test_format_error_colored_keeps_text() {
        let err = ShellError::NotConnected;
        let line = format_error(&err, true);
        assert!(line.contains("ERROR 140 : "));
        assert!(line.starts_with("\u{1b}["));
    }

    #[test]
    fn test_banner_mentions_connection() {
        assert!(banner("0.1.0", Some("http://localhost:8093")).contains("http://localhost:8093"));
        assert!(banner("0.1.0", None).contains("\\CONNECT"));
    }
}
