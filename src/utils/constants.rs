//! Shared constants for the agent binary

pub const DEFAULT_CONFIG_PATH: &str = "credentials-agent.yaml";
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
pub const DEFAULT_SERVER_PORT: &str = "8090";
pub const DEFAULT_CREDENTIALS_PATH: &str = "/credentials";
pub const DEFAULT_METRICS_PATH: &str = "/metrics";
