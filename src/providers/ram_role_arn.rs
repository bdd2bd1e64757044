use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::credential::{CredentialType, CredentialValue};
use crate::cache::credential_cache::{CredentialCache, RefreshPolicy, SessionCredentials};
use crate::config::provider::RamRoleArnConfig;
use crate::config::validator::{
    optional, require, session_duration, ACCESS_KEY_ID_EMPTY, ACCESS_KEY_SECRET_EMPTY, ROLE_ARN_EMPTY,
};
use crate::error::Result;
use crate::providers::sts::{default_role_session_name, parse_assume_role_response, resolve_endpoint, StsCall};
use crate::providers::{CredentialsProvider, ProviderContext};
use crate::signer::AccessKeySigner;
use crate::transport::{HttpTransport, RuntimeOptions};

/// Assumes a RAM role with the caller's own access key (`AssumeRole`).
#[derive(Debug)]
pub struct RamRoleArnProvider {
    signer: AccessKeySigner,
    role_arn: String,
    role_session_name: String,
    duration_seconds: u64,
    policy: Option<String>,
    external_id: Option<String>,
    endpoint: String,
    transport: Arc<dyn HttpTransport>,
    runtime: RuntimeOptions,
    cache: CredentialCache,
}

impl RamRoleArnProvider {
    pub const NAME: &'static str = "ram_role_arn";

    pub fn new(cfg: &RamRoleArnConfig, ctx: &ProviderContext) -> Result<Self> {
        let access_key_id = require(&cfg.access_key_id, ACCESS_KEY_ID_EMPTY)?;
        let access_key_secret = require(&cfg.access_key_secret, ACCESS_KEY_SECRET_EMPTY)?;
        let role_arn = require(&cfg.role_arn, ROLE_ARN_EMPTY)?;
        let duration_seconds = session_duration(cfg.duration_seconds)?;

        Ok(Self {
            signer: AccessKeySigner::new(access_key_id, access_key_secret, optional(&cfg.security_token)),
            role_arn,
            role_session_name: optional(&cfg.role_session_name).unwrap_or_else(default_role_session_name),
            duration_seconds,
            policy: optional(&cfg.policy),
            external_id: optional(&cfg.external_id),
            endpoint: resolve_endpoint(&cfg.sts),
            transport: ctx.transport.clone(),
            runtime: ctx.runtime.clone(),
            cache: CredentialCache::new(Self::NAME, RefreshPolicy::sts()),
        })
    }

    async fn assume_role(&self) -> Result<SessionCredentials> {
        let body = StsCall::new("AssumeRole")
            .param("RoleArn", self.role_arn.as_str())
            .param("RoleSessionName", self.role_session_name.as_str())
            .param("DurationSeconds", self.duration_seconds.to_string())
            .optional_param("Policy", self.policy.as_deref())
            .optional_param("ExternalId", self.external_id.as_deref())
            .signed_by(&self.signer)
            .send(self.transport.as_ref(), &self.runtime, &self.endpoint)
            .await?;
        parse_assume_role_response(&body, "RoleArn")
    }

    fn value(session: SessionCredentials) -> CredentialValue {
        session.into_value(CredentialType::RamRoleArn, Self::NAME)
    }
}

#[async_trait]
impl CredentialsProvider for RamRoleArnProvider {
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
