use std::{fs, path::Path};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, error};

use crate::config::settings::{AgentConfig, LoggingConfig};

/// Load agent config from a YAML file, expanding `${VAR}` / `${VAR:default}` first.
pub async fn file_to_config(path: &Path) -> Result<AgentConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read config file {}", path.display()))?;
    let expanded = expand_env_vars(&content)?;
    parse_config(expanded).await
}

pub async fn parse_config(content: String) -> Result<AgentConfig> {
    let mut agent_config: AgentConfig = serde_yaml::from_str(&content)
        .inspect_err(|e| error!("parse config error: {}", e))?;

    // Apply defaults
    if agent_config.settings.logging.is_none() {
        agent_config.settings.logging = Some(LoggingConfig::default());
    }

    debug!("validation config ...");
    if let Some(credential) = &agent_config.credential {
        // only the type tag here, the provider checks the rest when it is built
        credential.provider_config().context("invalid credential block")?;
    }

    Ok(agent_config)
}

pub fn expand_env_vars(input: &str) -> Result<String> {
    expand_with(input, |var| std::env::var(var).ok())
}

fn expand_with<F>(input: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}")?;
    Ok(re
        .replace_all(input, |caps: &regex::Captures| {
            let var = &caps[1];
            let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            lookup(var).unwrap_or_else(|| default.to_string())
        })
        .to_string())
}
