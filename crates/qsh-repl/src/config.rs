//! Shell configuration file.
//!
//! Loaded from `<config_dir>/qsh/config.toml` (e.g. `~/.config/qsh/config.toml`).
//! Every field is optional. Command-line flags override what the file says.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use qsh_kernel::{KernelConfig, DEFAULT_ENGINE};

/// Settings read from the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Query service to connect to at startup.
    pub engine: String,

    /// Start without a connection.
    pub no_engine: bool,

    /// Credentials as `user:pass[,user:pass...]`.
    pub credentials: Option<String>,

    /// Pretty-print result envelopes.
    pub pretty: bool,

    /// Stop at the first error.
    pub exit_on_error: bool,

    /// Skip the startup banner.
    pub quiet: bool,

    /// Request timeout for the query service, in seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            engine: DEFAULT_ENGINE.to_string(),
            no_engine: false,
            credentials: None,
            pretty: false,
            exit_on_error: false,
            quiet: false,
            timeout_secs: None,
        }
    }
}

impl ShellConfig {
    /// Load configuration from the default path.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Get the default config file path.
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "qsh").context("Could not determine config directory")?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Request timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Kernel configuration for these settings.
    pub fn kernel_config(&self) -> KernelConfig {
        let mut config = KernelConfig::offline()
            .with_pretty(self.pretty)
            .with_exit_on_error(self.exit_on_error);
        if !self.no_engine {
            config = config.with_engine(self.engine.clone());
        }
        if let Some(credentials) = &self.credentials {
            config = config.with_credentials(credentials.clone());
        }
        config
    }
}
