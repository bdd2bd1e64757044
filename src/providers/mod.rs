//! Providers module
//!
//! Defines the credentials provider abstraction, one implementation per trust
//! source, and a factory that builds them from a validated configuration.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::credential::CredentialValue;
use crate::config::env::EnvSnapshot;
use crate::config::provider::ProviderConfig;
use crate::error::Result;
use crate::transport::{HttpTransport, RuntimeOptions};

pub mod chain;
pub mod credentials_uri;
pub mod ecs_ram_role;
pub mod env;
pub mod oidc;
pub mod ram_role_arn;
pub mod rsa_key_pair;
pub mod static_key;
pub mod sts;

use credentials_uri::CredentialsUriProvider;
use ecs_ram_role::EcsRamRoleProvider;
use oidc::OidcProvider;
use ram_role_arn::RamRoleArnProvider;
use rsa_key_pair::RsaKeyPairProvider;
use static_key::{BearerTokenProvider, StaticAkProvider, StaticStsProvider};

#[async_trait]
pub trait CredentialsProvider: Send + Sync + Debug {
    fn provider_name(&self) -> &str;

    /// Resolves credentials, refreshing when due. Refresh failures propagate.
    async fn get_credentials(&self) -> Result<CredentialValue>;

    /// Best-effort variant: a failed refresh may yield the previous credentials
    /// while their validity window is still open.
    async fn get_credentials_or_stale(&self) -> Result<CredentialValue> {
        self.get_credentials().await
    }
}

/// Collaborators shared by every provider built from one configuration.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    pub transport: Arc<dyn HttpTransport>,
    pub runtime: RuntimeOptions,
    pub env: EnvSnapshot,
}

impl ProviderContext {
    pub fn new(transport: Arc<dyn HttpTransport>, runtime: RuntimeOptions, env: EnvSnapshot) -> Self {
        Self { transport, runtime, env }
    }
}

/// Builds the provider for one trust source. Validation happens here, before any
/// network call.
pub fn build_provider(config: &ProviderConfig, ctx: &ProviderContext) -> Result<Arc<dyn CredentialsProvider>> {
    let provider: Arc<dyn CredentialsProvider> = match config {
        ProviderConfig::AccessKey(cfg) => Arc::new(StaticAkProvider::new(cfg)?),
        ProviderConfig::Sts(cfg) => Arc::new(StaticStsProvider::new(cfg)?),
        ProviderConfig::Bearer(cfg) => Arc::new(BearerTokenProvider::new(cfg)?),
        ProviderConfig::EcsRamRole(cfg) => Arc::new(EcsRamRoleProvider::new(cfg, ctx)),
        ProviderConfig::RamRoleArn(cfg) => Arc::new(RamRoleArnProvider::new(cfg, ctx)?),
        ProviderConfig::RsaKeyPair(cfg) => Arc::new(RsaKeyPairProvider::new(cfg, ctx)?),
        ProviderConfig::OidcRoleArn(cfg) => Arc::new(OidcProvider::new(cfg, ctx)?),
        ProviderConfig::CredentialsUri(cfg) => Arc::new(CredentialsUriProvider::new(cfg, ctx)?),
    };
    Ok(provider)
}
