//! Layered configuration for the agenda client.
//!
//! Precedence, later layers override earlier ones:
//! 1. Defaults (public playground service, fixed agenda)
//! 2. File config (`config.toml` in `$AGENDA_HOME`, default `~/.agenda`)
//! 3. Environment overrides (`AGENDA_*` variables)
//!
//! ```no_run
//! use agenda_core::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .with_env_prefix("AGENDA")
//!     .load()?;
//! # Ok::<(), agenda_core::config::ConfigError>(())
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://playground.4geeks.com/contact";
pub const DEFAULT_AGENDA: &str = "ana_martinez";
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error loading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid value for ${var}: '{value}' (expected: {expected})")]
    InvalidEnvValue {
        var: String,
        value: String,
        expected: String,
    },

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaConfig {
    /// Service root, without trailing slash.
    pub base_url: String,
    /// Agenda slug all contacts live under.
    pub agenda: String,
    /// Per-request timeout. `None` leaves the transport default.
    pub request_timeout: Option<Duration>,
}

impl Default for AgendaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            agenda: DEFAULT_AGENDA.to_string(),
            request_timeout: None,
        }
    }
}

impl AgendaConfig {
    /// Check the invariants the client relies on and normalise the URL.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        self.agenda = self.agenda.trim().to_string();
        if self.agenda.is_empty() {
            return Err(ConfigError::Validation("agenda must not be empty".to_string()));
        }
        Ok(self)
    }
}

/// `config.toml` contents. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    base_url: Option<String>,
    agenda: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Builder for layered configuration loading.
pub struct ConfigLoader {
    home: Option<PathBuf>,
    env_prefix: String,
    skip_file: bool,
    skip_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Home auto-detected, prefix `AGENDA`, all layers enabled.
    pub fn new() -> Self {
        Self {
            home: None,
            env_prefix: "AGENDA".to_string(),
            skip_file: false,
            skip_env: false,
        }
    }

    /// Directory holding `config.toml`. Defaults to `$AGENDA_HOME`, then
    /// `~/.agenda`.
    pub fn with_home(mut self, path: PathBuf) -> Self {
        self.home = Some(path);
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn skip_file_layer(mut self) -> Self {
        self.skip_file = true;
        self
    }

    pub fn skip_env_layer(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Merge all enabled layers and validate the result.
    pub fn load(self) -> Result<AgendaConfig, ConfigError> {
        let mut config = AgendaConfig::default();

        if !self.skip_file {
            let home = self.resolve_home()?;
            let file = Self::load_from_file(&home)?;
            Self::merge_file(&mut config, file);
        }

        if !self.skip_env {
            Self::apply_env_overrides(&mut config, &self.env_prefix)?;
        }

        config.validated()
    }

    fn resolve_home(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.home {
            return Ok(path.clone());
        }

        if let Ok(path) = env::var(format!("{}_HOME", self.env_prefix))
            && !path.trim().is_empty()
        {
            return Ok(PathBuf::from(path));
        }

        dirs::home_dir()
            .map(|home| home.join(".agenda"))
            .ok_or_else(|| ConfigError::Validation("cannot determine home directory".to_string()))
    }

    /// Read `config.toml` from `home`. A missing file yields empty config.
    fn load_from_file(home: &Path) -> Result<FileConfig, ConfigError> {
        let path = home.join(CONFIG_FILENAME);
        let contents = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("{} not found, using defaults", path.display());
                return Ok(FileConfig::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Ok(toml::from_str(&contents)?)
    }

    fn merge_file(config: &mut AgendaConfig, file: FileConfig) {
        if let Some(base_url) = file.base_url {
            config.base_url = base_url;
        }
        if let Some(agenda) = file.agenda {
            config.agenda = agenda;
        }
        if let Some(secs) = file.request_timeout_secs {
            config.request_timeout = timeout_from_secs(secs);
        }
    }

    /// Supported variables:
    /// - `{PREFIX}_BASE_URL`
    /// - `{PREFIX}_AGENDA`
    /// - `{PREFIX}_TIMEOUT_SECS` (`0` disables the timeout)
    pub fn apply_env_overrides(config: &mut AgendaConfig, prefix: &str) -> Result<(), ConfigError> {
        let base_url_var = format!("{prefix}_BASE_URL");
        if let Ok(value) = env::var(&base_url_var)
            && !value.trim().is_empty()
        {
            tracing::debug!("Applying env override: {base_url_var}={value}");
            config.base_url = value;
        }

        let agenda_var = format!("{prefix}_AGENDA");
        if let Ok(value) = env::var(&agenda_var)
            && !value.trim().is_empty()
        {
            tracing::debug!("Applying env override: {agenda_var}={value}");
            config.agenda = value;
        }

        let timeout_var = format!("{prefix}_TIMEOUT_SECS");
        if let Ok(value) = env::var(&timeout_var) {
            let secs = value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidEnvValue {
                    var: timeout_var.clone(),
                    value: value.clone(),
                    expected: "non-negative integer seconds".to_string(),
                })?;
            config.request_timeout = timeout_from_secs(secs);
        }

        Ok(())
    }
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then_some(Duration::from_secs(secs))
}
