//! Unified credential handle.
//!
//! [`Credential::get_credential`] always propagates refresh failures. The legacy
//! per-field accessors go through the providers' best-effort path and may return
//! the previous value when a refresh fails inside its validity window.

use std::sync::Arc;

use tracing::debug;

use crate::cache::credential::{CredentialType, CredentialValue};
use crate::config::env::EnvSnapshot;
use crate::config::provider::Config;
use crate::error::Result;
use crate::providers::chain::ChainProvider;
use crate::providers::{build_provider, CredentialsProvider, ProviderContext};
use crate::transport::reqwest_transport::ReqwestTransport;

#[derive(Debug, Clone)]
pub struct Credential {
    provider: Arc<dyn CredentialsProvider>,
    credential_type: CredentialType,
}

impl Credential {
    /// Builds the handle for `config`, or for the default chain when `config` is
    /// `None`. Reads the process environment and creates the HTTP client.
    pub fn new(config: Option<Config>) -> Result<Self> {
        let runtime = config.as_ref().map(Config::runtime_options).unwrap_or_default();
        let ctx = ProviderContext::new(Arc::new(ReqwestTransport::new()?), runtime, EnvSnapshot::from_env());
        Self::with_parts(config, ctx, None)
    }

    /// Same as [`Credential::new`] with explicit collaborators. `profile` is the
    /// CLI profile source slotted into the default chain.
    pub fn with_parts(
        config: Option<Config>,
        ctx: ProviderContext,
        profile: Option<Arc<dyn CredentialsProvider>>,
    ) -> Result<Self> {
        match config {
            Some(config) => {
                let provider_config = config.provider_config()?;
                let credential_type = provider_config.credential_type();
                debug!(%credential_type, "building credential provider");
                Ok(Self {
                    provider: build_provider(&provider_config, &ctx)?,
                    credential_type,
                })
            }
            None => {
                debug!("no configuration, using the default provider chain");
                Ok(Self::from_provider(
                    Arc::new(ChainProvider::default_chain(&ctx, profile)?),
                    CredentialType::Default,
                ))
            }
        }
    }

    pub fn from_provider(provider: Arc<dyn CredentialsProvider>, credential_type: CredentialType) -> Self {
        Self { provider, credential_type }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    pub async fn get_credential(&self) -> Result<CredentialValue> {
        let value = self.provider.get_credentials().await?;
        Ok(self.label(value))
    }

    pub async fn access_key_id(&self) -> Result<String> {
        Ok(self.legacy().await?.access_key_id)
    }

    pub async fn access_key_secret(&self) -> Result<String> {
        Ok(self.legacy().await?.access_key_secret)
    }

    pub async fn security_token(&self) -> Result<String> {
        Ok(self.legacy().await?.security_token)
    }

    pub async fn bearer_token(&self) -> Result<String> {
        Ok(self.legacy().await?.bearer_token)
    }

    pub fn credential_type(&self) -> CredentialType {
        self.credential_type
    }

    async fn legacy(&self) -> Result<CredentialValue> {
        let value = self.provider.get_credentials_or_stale().await?;
        Ok(self.label(value))
    }

    fn label(&self, value: CredentialValue) -> CredentialValue {
        if self.credential_type != CredentialType::Default {
            return value;
        }
        let name = format!("{}/{}", ChainProvider::NAME, value.provider_name);
        value.relabel(CredentialType::Default, name)
    }
}
