use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::credential::CredentialValue;
use crate::config::provider::{EcsRamRoleConfig, OidcRoleArnConfig};
use crate::error::{CredentialError, Result};
use crate::observability::metrics::get_metrics;
use crate::providers::ecs_ram_role::EcsRamRoleProvider;
use crate::providers::env::EnvironmentProvider;
use crate::providers::oidc::OidcProvider;
use crate::providers::{CredentialsProvider, ProviderContext};

/// Ordered list of providers; the first success wins.
///
/// The chain keeps no memory of which provider answered last, so every request
/// walks the list from the top.
#[derive(Debug)]
pub struct ChainProvider {
    providers: Vec<Arc<dyn CredentialsProvider>>,
}

impl ChainProvider {
    pub const NAME: &'static str = "default";

    pub fn new(providers: Vec<Arc<dyn CredentialsProvider>>) -> Self {
        Self { providers }
    }

    /// Environment keys, environment OIDC, the optional CLI profile source,
    /// then the ECS metadata service, filtered by the snapshot's switches.
    pub fn default_chain(ctx: &ProviderContext, profile: Option<Arc<dyn CredentialsProvider>>) -> Result<Self> {
        let env = &ctx.env;
        let mut providers: Vec<Arc<dyn CredentialsProvider>> = vec![Arc::new(EnvironmentProvider::new(env))];

        if env.has_oidc() {
            providers.push(Arc::new(OidcProvider::new(&OidcRoleArnConfig::default(), ctx)?));
        }

        match profile {
            Some(profile) if !env.cli_profile_disabled => providers.push(profile),
            Some(_) => debug!("cli profile provider disabled by environment"),
            None => {}
        }

        if !env.ecs_metadata_disabled {
            let cfg = EcsRamRoleConfig {
                role_name: env.ecs_metadata_role.clone(),
                disable_imds_v1: env.imds_v1_disabled,
                ..Default::default()
            };
            providers.push(Arc::new(EcsRamRoleProvider::new(&cfg, ctx)));
        }

        Ok(Self::new(providers))
    }

    pub fn providers(&self) -> &[Arc<dyn CredentialsProvider>] {
        &self.providers
    }

    async fn resolve(&self, allow_stale: bool) -> Result<CredentialValue> {
        let metrics = get_metrics().await;
        let mut errors = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            let name = provider.provider_name();
            let result = if allow_stale {
                provider.get_credentials_or_stale().await
            } else {
                provider.get_credentials().await
            };
            match result {
                Ok(value) => {
                    metrics.chain_attempts.with_label_values(&[name, "success"]).inc();
                    debug!(provider = name, "chain resolved credentials");
                    return Ok(value);
                }
                Err(err) => {
                    metrics.chain_attempts.with_label_values(&[name, "failure"]).inc();
                    debug!(provider = name, "chain candidate failed: {}", err);
                    errors.push(err.to_string());
                }
            }
        }

        warn!(attempted = errors.len(), "no provider in the chain returned credentials");
        Err(CredentialError::ChainExhausted(errors))
    }
}

#[async_trait]
impl CredentialsProvider for ChainProvider {
    fn provider_name(&self) -> &str {
        Self::NAME
    }

    async fn get_credentials(&self) -> Result<CredentialValue> {
        self.resolve(false).await
    }

    async fn get_credentials_or_stale(&self) -> Result<CredentialValue> {
        self.resolve(true).await
    }
}
