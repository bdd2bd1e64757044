use serde::Deserialize;

use crate::config::provider::Config;
use crate::transport::RuntimeOptions;
use crate::utils::constants::{
    DEFAULT_CREDENTIALS_PATH, DEFAULT_LOG_LEVEL, DEFAULT_METRICS_PATH, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
};

/// ================================
/// Full agent configuration
/// ================================
///
/// Without a `credential` block the agent resolves through the default chain.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AgentConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    pub credential: Option<Config>,
}

impl AgentConfig {
    /// Transport options: the credential block's own, else the global ones.
    pub fn runtime_options(&self) -> RuntimeOptions {
        match &self.credential {
            Some(credential) => credential.runtime_options(),
            None => self.settings.runtime.clone().unwrap_or_default(),
        }
    }
}

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SettingsConfig {
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub logging: Option<LoggingConfig>,
    pub runtime: Option<RuntimeOptions>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { path: default_metrics_path(), is_enabled: false }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: String,
    /// route serving the resolved credentials
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            credentials_path: default_credentials_path(),
        }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_LEVEL.to_owned(), LogFormat::Compact)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

fn default_metrics_path() -> String {
    DEFAULT_METRICS_PATH.to_string()
}

fn default_host() -> String {
    DEFAULT_SERVER_HOST.to_string()
}

fn default_port() -> String {
    DEFAULT_SERVER_PORT.to_string()
}

fn default_credentials_path() -> String {
    DEFAULT_CREDENTIALS_PATH.to_string()
}
