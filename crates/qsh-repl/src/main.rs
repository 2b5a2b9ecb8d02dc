//! qsh CLI entry point.
//!
//! Usage:
//!   qsh                          # Interactive shell against the default engine
//!   qsh -e <url>                 # Connect somewhere else
//!   qsh -s '<statement>'         # Run one statement and exit
//!   qsh -f <file>                # Run a file of statements and exit

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use qsh_kernel::{HttpConnector, Kernel, SHELL_VERSION};
use qsh_repl::config::ShellConfig;
use qsh_repl::Repl;

fn main() -> ExitCode {
    // Respects RUST_LOG
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Default)]
struct Options {
    engine: Option<String>,
    no_engine: bool,
    credentials: Option<String>,
    script: Option<String>,
    file: Option<String>,
    pretty: bool,
    exit_on_error: bool,
    quiet: bool,
    help: bool,
    version: bool,
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if arg.starts_with("--") => (flag, Some(value.to_string())),
            _ => (arg.as_str(), None),
        };
        let mut value = |name: &str| -> Result<String> {
            match inline.clone() {
                Some(v) => Ok(v),
                None => iter
                    .next()
                    .cloned()
                    .with_context(|| format!("{name} requires a value")),
            }
        };

        match flag {
            "-e" | "--engine" => options.engine = Some(value("--engine")?),
            "--no-engine" => options.no_engine = true,
            "-c" | "--credentials" => options.credentials = Some(value("--credentials")?),
            "-s" | "--script" => options.script = Some(value("--script")?),
            "-f" | "--file" => options.file = Some(value("--file")?),
            "--pretty" => options.pretty = true,
            "--exit-on-error" => options.exit_on_error = true,
            "-q" | "--quiet" => options.quiet = true,
            "-h" | "--help" => options.help = true,
            "-v" | "--version" => options.version = true,
            unknown => bail!("Unknown option: {unknown}\nRun 'qsh --help' for usage."),
        }
    }

    if options.script.is_some() && options.file.is_some() {
        bail!("--script and --file cannot be used together");
    }
    Ok(options)
}

fn version_string() -> String {
    format!(
        "{} ({} {})",
        SHELL_VERSION,
        env!("QSH_GIT_HASH"),
        env!("QSH_BUILD_DATE")
    )
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().skip(1).collect();
    let options = parse_args(&args)?;

    if options.help {
        print_help();
        return Ok(ExitCode::SUCCESS);
    }
    if options.version {
        println!("qsh {}", version_string());
        return Ok(ExitCode::SUCCESS);
    }

    let mut settings = ShellConfig::load()?;
    if let Some(engine) = options.engine {
        settings.engine = engine;
        settings.no_engine = false;
    }
    if options.no_engine {
        settings.no_engine = true;
    }
    if options.credentials.is_some() {
        settings.credentials = options.credentials;
    }
    settings.pretty |= options.pretty;
    settings.exit_on_error |= options.exit_on_error;
    settings.quiet |= options.quiet;

    let mut connector = HttpConnector::new();
    if let Some(timeout) = settings.timeout() {
        connector = connector.with_timeout(timeout);
    }

    let config = settings.kernel_config().with_shell_version(version_string());
    let kernel = Kernel::new(config, Arc::new(connector))
        .map_err(|e| anyhow::anyhow!("ERROR {} : {}", e.code(), e))
        .context("Failed to start the shell")?;
    let repl = Repl::new(kernel)?;

    if let Some(statement) = options.script {
        return Ok(qsh_repl::run_batch(repl, &statement));
    }
    if let Some(path) = options.file {
        let script = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {path}"))?;
        return Ok(qsh_repl::run_batch(repl, &script));
    }

    qsh_repl::run(repl, settings.quiet)
}

fn print_help() {
    println!(
        r#"qsh {} - interactive query shell

Usage:
  qsh [OPTIONS]

Options:
  -e, --engine <url>           Query service to connect to (default: {})
      --no-engine              Start without connecting
  -c, --credentials <list>     Credentials as user:pass[,user:pass...]
  -s, --script <statement>     Run one statement and exit
  -f, --file <path>            Run a file of ;-terminated statements and exit
      --pretty                 Pretty-print results
      --exit-on-error          Stop at the first error with a failing status
  -q, --quiet                  Skip the startup banner
  -v, --version                Show version
  -h, --help                   Show this help

Settings may also come from {}.
Shell commands start with a backslash; type \HELP; inside the shell for the list.
"#,
        SHELL_VERSION,
        qsh_kernel::DEFAULT_ENGINE,
        ShellConfig::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "the qsh config directory".to_string()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_flags() {
        let options = parse_args(&args(&["-e", "http://db:8093", "--pretty", "-q"])).unwrap();
        assert_eq!(options.engine.as_deref(), Some("http://db:8093"));
        assert!(options.pretty);
        assert!(options.quiet);
        assert!(!options.exit_on_error);
    }

    #[test]
    fn test_parse_inline_values() {
        let options = parse_args(&args(&["--engine=http://db:8093", "--script=select 1;"])).unwrap();
        assert_eq!(options.engine.as_deref(), Some("http://db:8093"));
        assert_eq!(options.script.as_deref(), Some("select 1;"));
    }

    #[test]
    fn test_missing_value() {
        let err = parse_args(&args(&["--file"])).unwrap_err();
        assert!(err.to_string().contains("--file requires a value"));
    }

    #[test]
    fn test_unknown_option() {
        assert!(parse_args(&args(&["--bogus"])).is_err());
    }

    #[test]
    fn test_script_and_file_conflict() {
        assert!(parse_args(&args(&["-s", "select 1;", "-f", "x.sql"])).is_err());
    }
}
