use std::path::Path;
use anyhow::{anyhow, Result};

use crate::config::loader::file_to_config;
use crate::config::settings::AgentConfig;

pub async fn run(config_path: &str) -> Result<AgentConfig> {
    let path = Path::new(config_path);
    file_to_config(path).await.map_err(|e| anyhow!("Invalid config format: {:#}", e))
}
