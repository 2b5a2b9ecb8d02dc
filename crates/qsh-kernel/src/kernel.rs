//! The Kernel: owns the session and runs input lines.
//!
//! One line at a time is classified, dispatched and fully completed before the
//! next one starts. Commands leave side effects in the session; the kernel
//! applies them right after each command returns:
//!
//! ```text
//! line ──▶ classify ──┬─ \\alias ──▶ expand, classify again
//!                     ├─ \COMMAND ──▶ Command::execute ──▶ apply effects
//!                     └─ statement ──▶ QueryBackend ──▶ envelope ──▶ sink
//! ```

use std::collections::VecDeque;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use qsh_types::Value;

use crate::backend::{Connector, QueryBackend};
use crate::commands::{CommandRegistry, ExecContext};
use crate::dispatch::{classify, split_args, split_statements, Line};
use crate::envelope::{reconstruct, EnvelopeOptions};
use crate::error::{ShellError, ShellResult};
use crate::session::{Effects, Session, StackWrite};
use crate::vars::Namespace;

/// Version of the shell kernel.
pub const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Query service the shell connects to unless told otherwise.
pub const DEFAULT_ENGINE: &str = "http://localhost:8093";

/// Configuration for kernel initialization.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Endpoint to connect to at startup. `None` starts disconnected.
    pub engine: Option<String>,

    /// Initial credentials, as `user:pass[,user:pass...]`.
    pub credentials: Option<String>,

    /// Pretty-print result envelopes.
    pub pretty: bool,

    /// Stop at the first error instead of reporting it and moving on.
    pub exit_on_error: bool,

    /// How many aliases may expand into one another for a single line.
    pub max_alias_depth: usize,

    /// How deeply `\SOURCE` files may source other files.
    pub max_source_depth: usize,

    /// Version string reported by `\VERSION`.
    pub shell_version: String,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            engine: Some(DEFAULT_ENGINE.to_string()),
            credentials: None,
            pretty: false,
            exit_on_error: false,
            max_alias_depth: 32,
            max_source_depth: 16,
            shell_version: SHELL_VERSION.to_string(),
        }
    }
}

impl KernelConfig {
    /// Create a config that starts disconnected.
    ///
    /// Useful for tests, or for scripts that `\CONNECT` themselves.
    pub fn offline() -> Self {
        Self {
            engine: None,
            ..Self::default()
        }
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn with_credentials(mut self, credentials: impl Into<String>) -> Self {
        self.credentials = Some(credentials.into());
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_exit_on_error(mut self, exit_on_error: bool) -> Self {
        self.exit_on_error = exit_on_error;
        self
    }

    pub fn with_shell_version(mut self, version: impl Into<String>) -> Self {
        self.shell_version = version.into();
        self
    }
}

/// A unit of input waiting to run.
#[derive(Debug)]
struct Pending {
    text: String,
    /// Number of `\SOURCE` files this came through.
    depth: usize,
}

/// The shell kernel.
pub struct Kernel {
    config: KernelConfig,
    connector: Arc<dyn Connector>,
    ctx: ExecContext,
    exit_requested: bool,
}

impl Kernel {
    /// Create a kernel, connecting to the configured engine if any.
    pub fn new(config: KernelConfig, connector: Arc<dyn Connector>) -> ShellResult<Self> {
        let mut ctx = ExecContext::new(Arc::new(CommandRegistry::with_builtins()));
        ctx.shell_version = config.shell_version.clone();

        let mut kernel = Self {
            config,
            connector,
            ctx,
            exit_requested: false,
        };

        if let Some(engine) = kernel.config.engine.clone() {
            kernel.connect(&engine)?;
        }
        if let Some(credentials) = kernel.config.credentials.clone() {
            // Quote the text so it is never read as a variable reference.
            let literal = serde_json::Value::String(credentials).to_string();
            kernel.ctx.session.push_or_set(
                "-creds",
                &literal,
                StackWrite::Set,
                kernel.ctx.backend.as_deref(),
            )?;
        }

        Ok(kernel)
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.ctx.session
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.ctx.commands
    }

    /// Whether a query service connection is open.
    pub fn is_connected(&self) -> bool {
        self.ctx.backend.is_some()
    }

    /// Endpoint of the current connection.
    pub fn endpoint(&self) -> Option<String> {
        self.ctx.backend.as_ref().map(|b| b.endpoint())
    }

    /// Whether `\EXIT` ran, or an error stopped an exit-on-error session.
    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Current value of a predefined session variable.
    pub fn predefined(&self, name: &str) -> Option<Value> {
        self.ctx.session.vars.top(Namespace::Predefined, name).ok().cloned()
    }

    /// Run one line of input, returning the first error it produced.
    ///
    /// A `\SOURCE` line runs the whole file before returning.
    pub async fn execute(&mut self, input: &str, sink: &mut dyn Write) -> ShellResult<()> {
        let mut errors = Vec::new();
        self.execute_streaming(input, sink, &mut |e: ShellError| errors.push(e)).await?;
        match errors.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Run one line of input, reporting each error through `on_error`.
    ///
    /// With exit-on-error set, the first error is returned instead and
    /// nothing after it runs.
    #[tracing::instrument(level = "info", skip(self, sink, on_error), fields(input_len = input.len()))]
    pub async fn execute_streaming(
        &mut self,
        input: &str,
        sink: &mut dyn Write,
        on_error: &mut dyn FnMut(ShellError),
    ) -> ShellResult<()> {
        let queue = VecDeque::from([Pending {
            text: input.to_string(),
            depth: 0,
        }]);
        self.run_queue(queue, sink, on_error).await
    }

    /// Run a script of `;`-terminated statements and commands in order.
    pub async fn execute_script(
        &mut self,
        script: &str,
        sink: &mut dyn Write,
        on_error: &mut dyn FnMut(ShellError),
    ) -> ShellResult<()> {
        let queue = split_statements(script)
            .into_iter()
            .map(|text| Pending { text, depth: 0 })
            .collect();
        self.run_queue(queue, sink, on_error).await
    }

    async fn run_queue(
        &mut self,
        mut queue: VecDeque<Pending>,
        sink: &mut dyn Write,
        on_error: &mut dyn FnMut(ShellError),
    ) -> ShellResult<()> {
        while let Some(pending) = queue.pop_front() {
            if self.exit_requested {
                break;
            }
            match self.run_one(&pending, sink).await {
                Ok(sourced) => {
                    for unit in sourced.into_iter().rev() {
                        queue.push_front(unit);
                    }
                }
                Err(e) if self.config.exit_on_error => {
                    self.exit_requested = true;
                    return Err(e);
                }
                Err(e) => on_error(e),
            }
        }
        Ok(())
    }

    /// Run a single unit, expanding aliases. Returns input read by `\SOURCE`.
    async fn run_one(&mut self, pending: &Pending, sink: &mut dyn Write) -> ShellResult<Vec<Pending>> {
        let mut text = pending.text.clone();
        let mut expanded: Vec<String> = Vec::new();

        loop {
            match classify(&text) {
                Line::Empty => return Ok(Vec::new()),
                Line::Alias(name) => {
                    if expanded.iter().any(|seen| seen == name)
                        || expanded.len() >= self.config.max_alias_depth
                    {
                        return Err(ShellError::AliasCycle(name.to_string()));
                    }
                    let replacement = self
                        .ctx
                        .session
                        .aliases
                        .get(name)
                        .ok_or_else(|| ShellError::UnknownAlias(name.to_string()))?
                        .to_string();
                    tracing::debug!(alias = %name, "expanding alias");
                    expanded.push(name.to_string());
                    text = replacement;
                }
                Line::Command { keyword, rest } => {
                    return self.run_command(&keyword, rest, pending.depth, sink).await;
                }
                Line::Statement(statement) => {
                    self.run_statement(statement, sink).await?;
                    return Ok(Vec::new());
                }
            }
        }
    }

    async fn run_command(
        &mut self,
        keyword: &str,
        rest: &str,
        depth: usize,
        sink: &mut dyn Write,
    ) -> ShellResult<Vec<Pending>> {
        let command = self
            .ctx
            .commands
            .get(keyword)
            .ok_or_else(|| ShellError::UnknownCommand(keyword.to_string()))?;
        let schema = command.schema();
        let args = split_args(rest, schema.quoted_args)?;
        schema.arity.check(keyword, args.len())?;

        tracing::debug!(command = %keyword, argc = args.len(), "running command");
        let result = command.execute(&args, &mut self.ctx).await;
        let output = self.ctx.take_output();
        let effects = std::mem::take(&mut self.ctx.session.effects);

        write_text(sink, &output)?;
        result?;
        self.apply_effects(effects, depth).await
    }

    async fn apply_effects(&mut self, effects: Effects, depth: usize) -> ShellResult<Vec<Pending>> {
        if effects.disconnect {
            if let Some(backend) = self.ctx.backend.take() {
                tracing::info!(endpoint = %backend.endpoint(), "disconnected");
            }
        }
        if let Some(endpoint) = &effects.connect {
            self.connect(endpoint)?;
        }
        if effects.exit {
            self.exit_requested = true;
        }
        match &effects.source {
            Some(path) => self.read_source(path, depth).await,
            None => Ok(Vec::new()),
        }
    }

    /// Replace the connection and send every parameter to the new backend.
    fn connect(&mut self, endpoint: &str) -> ShellResult<()> {
        let backend: Arc<dyn QueryBackend> = self.connector.connect(endpoint)?;
        self.ctx.session.mirror_all(Some(&*backend));
        self.ctx.backend = Some(backend);
        tracing::info!(endpoint, "connected");
        Ok(())
    }

    async fn read_source(&self, path: &Path, depth: usize) -> ShellResult<Vec<Pending>> {
        let source_error = |message: String| ShellError::Source {
            path: path.display().to_string(),
            message,
        };
        if depth >= self.config.max_source_depth {
            return Err(source_error(format!(
                "files nested more than {} deep",
                self.config.max_source_depth
            )));
        }

        let script = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| source_error(e.to_string()))?;
        let units: Vec<Pending> = split_statements(&script)
            .into_iter()
            .map(|text| Pending { text, depth: depth + 1 })
            .collect();
        tracing::debug!(path = %path.display(), statements = units.len(), "sourcing file");
        Ok(units)
    }

    async fn run_statement(&mut self, statement: &str, sink: &mut dyn Write) -> ShellResult<()> {
        let backend = self.ctx.backend.clone().ok_or(ShellError::NotConnected)?;
        let cursor = backend.execute(statement).await?;
        let options = EnvelopeOptions {
            pretty: self.config.pretty,
        };
        let summary = reconstruct(cursor, sink, options).await?;
        tracing::debug!(results = summary.results, status = ?summary.status, "statement complete");
        Ok(())
    }
}

fn write_text(sink: &mut dyn Write, text: &str) -> ShellResult<()> {
    if text.is_empty() {
        return Ok(());
    }
    sink.write_all(text.as_bytes()).map_err(ShellError::OutputWrite)
}
