use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::credential::{CredentialType, CredentialValue};
use crate::cache::credential_cache::{CredentialCache, RefreshPolicy, SessionCredentials};
use crate::config::provider::{OidcRoleArnConfig, StsTarget};
use crate::config::validator::{
    optional, require, session_duration, OIDC_PROVIDER_ARN_EMPTY, OIDC_TOKEN_FILE_PATH_EMPTY, ROLE_ARN_EMPTY,
};
use crate::error::{CredentialError, Result};
use crate::providers::sts::{default_role_session_name, parse_assume_role_response, resolve_endpoint, StsCall};
use crate::providers::{CredentialsProvider, ProviderContext};
use crate::transport::{HttpTransport, RuntimeOptions};

/// Workload identity federation (`AssumeRoleWithOIDC`).
///
/// The token file is re-read on every refresh since the issuer rotates it in place.
/// Its contents are sent as read.
/// Missing fields fall back to the `ALIBABA_CLOUD_*` OIDC variables.
#[derive(Debug)]
pub struct OidcProvider {
    oidc_token_file_path: String,
    oidc_provider_arn: String,
    role_arn: String,
    role_session_name: String,
    duration_seconds: u64,
    policy: Option<String>,
    endpoint: String,
    transport: Arc<dyn HttpTransport>,
    runtime: RuntimeOptions,
    cache: CredentialCache,
}

impl OidcProvider {
    pub const NAME: &'static str = "oidc_role_arn";

    pub fn new(cfg: &OidcRoleArnConfig, ctx: &ProviderContext) -> Result<Self> {
        let env = &ctx.env;
        let or_env = |value: &Option<String>, fallback: &Option<String>| optional(value).or_else(|| fallback.clone());

        let oidc_token_file_path = require(
            &or_env(&cfg.oidc_token_file_path, &env.oidc_token_file),
            OIDC_TOKEN_FILE_PATH_EMPTY,
        )?;
        let oidc_provider_arn = require(
            &or_env(&cfg.oidc_provider_arn, &env.oidc_provider_arn),
            OIDC_PROVIDER_ARN_EMPTY,
        )?;
        let role_arn = require(&or_env(&cfg.role_arn, &env.role_arn), ROLE_ARN_EMPTY)?;
        let duration_seconds = session_duration(cfg.duration_seconds)?;

        let sts = StsTarget {
            endpoint: cfg.sts.endpoint.clone(),
            region_id: or_env(&cfg.sts.region_id, &env.sts_region),
        };

        Ok(Self {
            oidc_token_file_path,
            oidc_provider_arn,
            role_arn,
            role_session_name: or_env(&cfg.role_session_name, &env.role_session_name)
                .unwrap_or_else(default_role_session_name),
            duration_seconds,
            policy: optional(&cfg.policy),
            endpoint: resolve_endpoint(&sts),
            transport: ctx.transport.clone(),
            runtime: ctx.runtime.clone(),
            cache: CredentialCache::new(Self::NAME, RefreshPolicy::sts()),
        })
    }

    async fn read_token(&self) -> Result<String> {
        let token = tokio::fs::read_to_string(&self.oidc_token_file_path)
            .await
            .map_err(|err| {
                CredentialError::transport(format!(
                    "failed to read OIDC token file '{}': {}",
                    self.oidc_token_file_path, err
                ))
            })?;
        debug!(path = %self.oidc_token_file_path, "read oidc token");
        Ok(token)
    }

    async fn assume_role(&self) -> Result<SessionCredentials> {
        let token = self.read_token().await?;
        let body = StsCall::new("AssumeRoleWithOIDC")
            .param("RoleArn", self.role_arn.as_str())
            .param("OIDCProviderArn", self.oidc_provider_arn.as_str())
            .param("OIDCToken", token)
            .param("RoleSessionName", self.role_session_name.as_str())
            .param("DurationSeconds", self.duration_seconds.to_string())
            .optional_param("Policy", self.policy.as_deref())
            .send(self.transport.as_ref(), &self.runtime, &self.endpoint)
            .await?;
        parse_assume_role_response(&body, "oidc")
    }

    fn value(session: SessionCredentials) -> CredentialValue {
        session.into_value(CredentialType::OidcRoleArn, Self::NAME)
    }
}

#[async_trait]
impl CredentialsProvider for OidcProvider {
    fn provider_name(&self) -> &str {
        Self::NAME
    }

    async fn get_credentials(&self) -> Result<CredentialValue> {
        self.cache.get(|| self.assume_role()).await.map(Self::value)
    }

    async fn get_credentials_or_stale(&self) -> Result<CredentialValue> {
        self.cache.get_or_stale(|| self.assume_role()).await.map(Self::value)
    }
}
