//! Client configuration and loading.
//!
//! A config can be built in code or loaded from an optional TOML file with
//! `ASSISTANT_ENGINE_*` environment variables layered on top
//! (`ASSISTANT_ENGINE_POLL__MAX_RETRIES` for nested keys).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::polling::PollPolicy;
use crate::transport::TransportConfig;
use crate::{APP_NAME, env_prefix};

/// Connection settings for an [`crate::AssistantEngine`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the API, e.g. `https://assistant.example.com/api/v1`.
    pub api_url: String,

    /// Bearer token sent on every request.
    pub api_token: String,

    /// Inference credential sent as `x-llm-key`.
    pub llm_key: String,

    /// Optional basic-auth credentials placed in front of the bearer token.
    pub basic_auth: Option<String>,

    /// Per-request timeout in seconds. No timeout when unset.
    pub request_timeout_secs: Option<u64>,

    /// Task polling cadence.
    pub poll: PollConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_token: String::new(),
            llm_key: String::new(),
            basic_auth: None,
            request_timeout_secs: None,
            poll: PollConfig::default(),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("api_token", &"<redacted>")
            .field("llm_key", &"<redacted>")
            .field("basic_auth", &self.basic_auth.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("poll", &self.poll)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(
        api_url: impl Into<String>,
        api_token: impl Into<String>,
        llm_key: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            api_token: api_token.into(),
            llm_key: llm_key.into(),
            ..Self::default()
        }
    }

    /// Load configuration from the default config file and environment.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_config_path())
    }

    /// Load configuration from a TOML file (if it exists) and environment.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(
                config::File::new(&path.to_string_lossy(), config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(&env_prefix())
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: ClientConfig = settings.try_deserialize()?;
        config.expand_secrets()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME)
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(Error::Config("api_url must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig::new(&self.api_url, self.api_token.clone())
            .with_basic_auth(self.basic_auth.clone())
            .with_timeout(self.request_timeout_secs.map(Duration::from_secs))
    }

    /// Expand `$VAR` and `${VAR}` references in credential fields.
    fn expand_secrets(&mut self) -> Result<()> {
        self.api_token = expand_env("api_token", &self.api_token)?;
        self.llm_key = expand_env("llm_key", &self.llm_key)?;
        if let Some(basic) = &self.basic_auth {
            self.basic_auth = Some(expand_env("basic_auth", basic)?);
        }
        Ok(())
    }
}

fn expand_env(field: &str, value: &str) -> Result<String> {
    shellexpand::env(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| Error::Config(format!("Failed to expand {field}: {e}")))
}

/// Polling cadence in config-friendly units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds to wait between polls of a running task.
    pub interval_secs: u64,

    /// Running observations tolerated before giving up.
    pub max_retries: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 1,
            max_retries: 60,
        }
    }
}

impl PollConfig {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy::new(Duration::from_secs(self.interval_secs), self.max_retries)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
