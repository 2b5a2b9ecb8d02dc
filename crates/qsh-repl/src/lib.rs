//! qsh REPL: the interactive front end for the query shell kernel.
//!
//! The REPL handles:
//! - Assembling `;`-terminated statements that span several lines
//! - Running input through the Kernel on a current-thread tokio runtime
//! - Reporting errors as `ERROR <code> : <message>`
//! - Command history via rustyline, located by the `histfile` and
//!   `histsize` session variables

pub mod config;
pub mod format;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use tokio::runtime::Runtime;

use qsh_kernel::{Kernel, ShellError};
use qsh_types::Value;

/// Prompt shown when waiting for new input.
pub const PROMPT: &str = "qsh> ";

/// Prompt shown while a statement is still missing its `;`.
pub const CONTINUATION_PROMPT: &str = "   > ";

/// What happened to a line fed to the REPL.
#[derive(Debug)]
pub enum Feed {
    /// The line was buffered; the statement is not terminated yet.
    Pending,
    /// Buffered input ran. Holds every error it produced, in order.
    Ran(Vec<ShellError>),
}

impl Feed {
    /// Errors produced, if the input ran.
    pub fn errors(&self) -> &[ShellError] {
        match self {
            Feed::Pending => &[],
            Feed::Ran(errors) => errors,
        }
    }
}

/// REPL state: the kernel, its runtime, and any partial statement.
pub struct Repl {
    kernel: Kernel,
    runtime: Runtime,
    buffer: Vec<String>,
}

impl Repl {
    /// Create a REPL around a kernel.
    pub fn new(kernel: Kernel) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create tokio runtime")?;

        Ok(Self {
            kernel,
            runtime,
            buffer: Vec::new(),
        })
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Whether a statement is waiting for its terminator.
    pub fn is_pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Prompt for the next line.
    pub fn prompt(&self) -> &'static str {
        if self.is_pending() {
            CONTINUATION_PROMPT
        } else {
            PROMPT
        }
    }

    /// Whether the session asked to end.
    pub fn exit_requested(&self) -> bool {
        self.kernel.exit_requested()
    }

    /// Feed one line of typed input.
    ///
    /// Statements are buffered until a line ends with `;`, then the buffered
    /// lines run joined by spaces. A shell command typed on a fresh line runs
    /// immediately, terminator or not.
    pub fn process_line(&mut self, line: &str, sink: &mut dyn Write) -> Feed {
        let trimmed = line.trim();

        if self.buffer.is_empty() {
            if trimmed.is_empty() {
                return Feed::Ran(Vec::new());
            }
            if trimmed.starts_with('\\') {
                return Feed::Ran(self.run(trimmed, sink));
            }
        } else if trimmed.is_empty() {
            return Feed::Pending;
        }

        self.buffer.push(trimmed.to_string());
        if !trimmed.ends_with(';') {
            return Feed::Pending;
        }

        let input = std::mem::take(&mut self.buffer).join(" ");
        Feed::Ran(self.run(&input, sink))
    }

    /// Run a whole script of `;`-terminated input, reporting each error
    /// through `on_error` as it happens.
    pub fn run_script(
        &mut self,
        script: &str,
        sink: &mut dyn Write,
        on_error: &mut dyn FnMut(ShellError),
    ) {
        let result = self
            .runtime
            .block_on(self.kernel.execute_script(script, sink, on_error));
        if let Err(e) = result {
            on_error(e);
        }
        if let Err(e) = sink.flush() {
            on_error(ShellError::OutputWrite(e));
        }
    }

    /// Drop any partially typed statement.
    pub fn discard_pending(&mut self) {
        self.buffer.clear();
    }

    fn run(&mut self, input: &str, sink: &mut dyn Write) -> Vec<ShellError> {
        let mut errors = Vec::new();
        self.run_script(input, sink, &mut |e: ShellError| errors.push(e));
        errors
    }

    /// History file and size from the `histfile` and `histsize` variables.
    ///
    /// A relative `histfile` lives in the home directory.
    pub fn history_settings(&self) -> (Option<PathBuf>, usize) {
        let path = match self.kernel.predefined("histfile") {
            Some(Value::String(name)) if !name.is_empty() => {
                let name = PathBuf::from(name);
                if name.is_absolute() {
                    Some(name)
                } else {
                    directories::BaseDirs::new().map(|b| b.home_dir().join(name))
                }
            }
            _ => None,
        };
        let size = match self.kernel.predefined("histsize") {
            Some(Value::Number(n)) => n.as_u64().map(|n| n as usize),
            _ => None,
        };
        (path, size.unwrap_or(DEFAULT_HISTORY_SIZE))
    }
}

const DEFAULT_HISTORY_SIZE: usize = 50;

fn report(errors: &[ShellError], color: bool) {
    for error in errors {
        eprintln!("{}", format::format_error(error, color));
    }
}

/// Save REPL history to disk.
fn save_history(rl: &mut Editor<(), DefaultHistory>, history_path: &Option<PathBuf>) {
    if let Some(path) = history_path {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create history directory: {}", e);
            }
        }
        if let Err(e) = rl.save_history(path) {
            tracing::warn!("Failed to save history: {}", e);
        }
    }
}

/// Run the interactive loop until `\EXIT`, end of input, or a fatal error.
///
/// Fails the process only when exit-on-error stopped the session.
pub fn run(mut repl: Repl, quiet: bool) -> Result<ExitCode> {
    let color = format::color_enabled();

    if !quiet {
        let version = repl.kernel.config().shell_version.clone();
        print!("{}", format::banner(&version, repl.kernel.endpoint().as_deref()));
        println!();
    }

    let (history_path, history_size) = repl.history_settings();
    let config = Config::builder()
        .max_history_size(history_size)
        .context("Invalid history size")?
        .auto_add_history(false)
        .build();
    let mut rl: Editor<(), DefaultHistory> =
        Editor::with_config(config).context("Failed to create editor")?;

    if let Some(ref path) = history_path {
        if let Err(e) = rl.load_history(path) {
            // Nothing to load on first run
            let is_not_found = matches!(&e, ReadlineError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound);
            if !is_not_found {
                tracing::warn!("Failed to load history: {}", e);
            }
        }
    }

    let mut failed = false;
    loop {
        match rl.readline(repl.prompt()) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = rl.add_history_entry(line.as_str()) {
                        tracing::warn!("Failed to add history entry: {}", e);
                    }
                }

                let mut stdout = std::io::stdout().lock();
                let feed = repl.process_line(&line, &mut stdout);
                drop(stdout);
                report(feed.errors(), color);

                if repl.exit_requested() {
                    failed = !feed.errors().is_empty() && repl.kernel.config().exit_on_error;
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                repl.discard_pending();
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    save_history(&mut rl, &history_path);

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// Run a script non-interactively, printing output and errors as they come.
pub fn run_batch(mut repl: Repl, script: &str) -> ExitCode {
    let color = format::color_enabled();
    let mut failures = 0usize;
    let mut stdout = std::io::stdout();
    repl.run_script(script, &mut stdout, &mut |e: ShellError| {
        failures += 1;
        eprintln!("{}", format::format_error(&e, color));
    });

    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
