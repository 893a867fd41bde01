use std::env;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::ConnectError;

/// Application configuration. Loaded from an optional TOML file with
/// `CONNECT_*` environment variables taking precedence, so a dev build can
/// point at a local mock server without touching any file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectConfig {
    /// Base URL all endpoint paths are appended to.
    pub base_url: String,
    /// Per-request timeout applied by the HTTP client.
    pub request_timeout_secs: u64,
    /// Seconds a user must wait before requesting another OTP.
    pub resend_cooldown_secs: u32,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.connect.example.com".to_string(),
            request_timeout_secs: 30,
            resend_cooldown_secs: 30,
        }
    }
}

impl ConnectConfig {
    /// Load configuration: defaults, then the TOML file if one is given,
    /// then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConnectError> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a TOML config file. Missing keys fall back to defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConnectError> {
        read_config_file(path).map_err(|e| ConnectError::Config(format!("{e:#}")))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = env::var("CONNECT_BASE_URL") {
            if !base_url.is_empty() {
                self.base_url = base_url;
            }
        }
        if let Some(secs) = parse_env_var("CONNECT_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = secs;
        }
        if let Some(secs) = parse_env_var("CONNECT_RESEND_COOLDOWN_SECS") {
            self.resend_cooldown_secs = secs;
        }
    }
}

fn read_config_file(path: &Path) -> anyhow::Result<ConnectConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

fn parse_env_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    match env::var(name) {
        Ok(value) => match value.parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                tracing::warn!("Ignoring unparseable {}={}", name, value);
                None
            }
        },
        Err(_) => None,
    }
}
