//! Session state: variables, aliases and pending side effects.
//!
//! Commands mutate the session directly. Anything that reaches beyond it
//! (connecting, exiting, reading a file) is recorded in [`Effects`] and
//! carried out by the kernel after the command returns.

use std::path::PathBuf;

use qsh_types::{value_to_bare_text, value_to_text, Value};

use crate::aliases::AliasRegistry;
use crate::backend::QueryBackend;
use crate::error::{ShellError, ShellResult};
use crate::vars::{decode_sigil, resolve, Namespace, Sweep, VarStore};

/// Query parameter holding request credentials.
pub const CREDS_PARAM: &str = "creds";

/// Side effects requested by a command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects {
    /// Reconnect to this endpoint.
    pub connect: Option<String>,
    /// Drop the current connection.
    pub disconnect: bool,
    /// Stop reading input.
    pub exit: bool,
    /// Run the statements in this file.
    pub source: Option<PathBuf>,
}

impl Effects {
    pub fn is_empty(&self) -> bool {
        *self == Effects::default()
    }
}

/// How a value is written to a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackWrite {
    /// Replace the top, creating the variable when it has no value.
    Set,
    /// Add a new top.
    Push,
}

/// How a value is removed from a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackRemove {
    /// Drop the top.
    Pop,
    /// Drop the whole variable.
    Unset,
}

/// Everything a shell session owns.
#[derive(Debug, Default)]
pub struct Session {
    pub vars: VarStore,
    pub aliases: AliasRegistry,
    pub effects: Effects,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a token against this session's variables and aliases.
    pub fn resolve(&self, token: &str) -> ShellResult<Value> {
        resolve(token, &self.vars, &self.aliases)
    }

    /// Write `value_token` into the variable named by `target`.
    ///
    /// Query and named parameter writes are mirrored to `params`.
    pub fn push_or_set(
        &mut self,
        target: &str,
        value_token: &str,
        mode: StackWrite,
        params: Option<&dyn QueryBackend>,
    ) -> ShellResult<()> {
        let (ns, name) = decode_sigil(target)?;
        let value = self.resolve(value_token)?;
        if ns == Namespace::QueryParam && name == CREDS_PARAM {
            // Validate before storing so a bad entry leaves the stack alone.
            credentials_json(&value_to_bare_text(&value))?;
        }

        match mode {
            StackWrite::Set if self.vars.depth(ns, name) > 0 => self.vars.set_top(ns, name, value)?,
            StackWrite::Set | StackWrite::Push => self.vars.push(ns, name, value)?,
        }

        self.mirror(ns, name, params)
    }

    /// Duplicate a variable's current top.
    pub fn push_top(&mut self, target: &str, params: Option<&dyn QueryBackend>) -> ShellResult<()> {
        let (ns, name) = decode_sigil(target)?;
        let top = self.vars.top(ns, name)?.clone();
        self.vars.push(ns, name, top)?;
        self.mirror(ns, name, params)
    }

    /// Pop or unset the variable named by `target`.
    pub fn pop_or_unset(
        &mut self,
        target: &str,
        mode: StackRemove,
        params: Option<&dyn QueryBackend>,
    ) -> ShellResult<()> {
        let (ns, name) = decode_sigil(target)?;
        match mode {
            StackRemove::Pop => {
                self.vars.pop(ns, name)?;
            }
            StackRemove::Unset => self.vars.unset(ns, name)?,
        }
        self.mirror(ns, name, params)
    }

    /// Duplicate every variable's top.
    pub fn push_all(&mut self, params: Option<&dyn QueryBackend>) -> Sweep {
        let sweep = self.vars.push_all();
        self.mirror_all(params);
        sweep
    }

    /// Pop every variable.
    pub fn pop_all(&mut self, params: Option<&dyn QueryBackend>) -> Sweep {
        let sweep = self.vars.pop_all();
        self.mirror_all(params);
        sweep
    }

    /// Send every query and named parameter's current top to `params`.
    pub fn mirror_all(&self, params: Option<&dyn QueryBackend>) {
        for ns in [Namespace::QueryParam, Namespace::NamedParam] {
            for name in self.vars.names(ns) {
                if let Err(e) = self.mirror(ns, name, params) {
                    tracing::debug!(variable = %ns.display(name), error = %e, "parameter not mirrored");
                }
            }
        }
    }

    /// Bring the backend's copy of one parameter in line with its top.
    fn mirror(&self, ns: Namespace, name: &str, params: Option<&dyn QueryBackend>) -> ShellResult<()> {
        let Some(params) = params else {
            return Ok(());
        };
        if !ns.is_mirrored() {
            return Ok(());
        }

        let key = parameter_key(ns, name);
        match self.vars.top(ns, name) {
            Ok(value) => {
                let text = match ns {
                    Namespace::QueryParam if name == CREDS_PARAM => {
                        credentials_json(&value_to_bare_text(value))?
                    }
                    Namespace::QueryParam => value_to_bare_text(value),
                    _ => value_to_text(value),
                };
                tracing::debug!(key = %key, "mirroring parameter");
                params.set_parameter(&key, &text);
            }
            Err(_) => {
                tracing::debug!(key = %key, "clearing parameter");
                params.unset_parameter(&key);
            }
        }
        Ok(())
    }
}

/// Request parameter name for a mirrored variable.
///
/// Named parameters keep their `$` so statements can refer to them.
pub fn parameter_key(ns: Namespace, name: &str) -> String {
    match ns {
        Namespace::NamedParam => format!("${name}"),
        _ => name.to_string(),
    }
}

/// Turn `user:pass,user2:pass2` into the JSON list the query service expects.
pub fn credentials_json(text: &str) -> ShellResult<String> {
    let mut creds = Vec::new();
    for entry in text.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (user, pass) = entry
            .split_once(':')
            .ok_or_else(|| ShellError::InvalidCredentials(text.to_string()))?;
        creds.push(serde_json::json!({ "user": user, "pass": pass }));
    }
    if creds.is_empty() {
        return Err(ShellError::InvalidCredentials(text.to_string()));
    }
    Ok(serde_json::Value::Array(creds).to_string())
}
