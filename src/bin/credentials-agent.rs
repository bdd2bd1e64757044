use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use credentials_agent::config::env::EnvSnapshot;
use credentials_agent::error::CredentialError;
use credentials_agent::observability::metrics::get_metrics;
use credentials_agent::providers::ProviderContext;
use credentials_agent::server;
use credentials_agent::server::credentials::CredentialsDocument;
use credentials_agent::transport::ReqwestTransport;
use credentials_agent::utils::config_loader;
use credentials_agent::utils::constants::DEFAULT_CONFIG_PATH;
use credentials_agent::utils::logging::{self, LogLevel};
use credentials_agent::Credential;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// Resolve credentials once, print them as JSON and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, start logging
    // -------------------------------

    let args = Args::parse();
    let agent_config = config_loader::run(&args.config).await?;
    logging::run(&agent_config, args.log_level).await?;

    // -------------------------------
    // 2. Build the credential handle
    // -------------------------------

    let ctx = ProviderContext::new(
        Arc::new(ReqwestTransport::new()?),
        agent_config.runtime_options(),
        EnvSnapshot::from_env(),
    );
    let credential = match Credential::with_parts(agent_config.credential.clone(), ctx, None) {
        Ok(credential) => credential,
        Err(e) => {
            if matches!(e, CredentialError::Validation(_)) {
                get_metrics().await.config_validation_errors.inc();
            }
            return Err(e).context("invalid credential configuration");
        }
    };
    info!(provider = credential.provider_name(), "credential provider ready");

    // -------------------------------
    // 3. One-shot mode
    // -------------------------------

    if args.once {
        let value = credential.get_credential().await?;
        println!("{}", serde_json::to_string_pretty(&CredentialsDocument::from(value))?);
        return Ok(());
    }

    // -------------------------------
    // 4. Serve credentials and metrics
    // -------------------------------

    info!("Service starting...");
    server::server::start(&agent_config.settings, credential).await
}
