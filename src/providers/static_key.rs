use async_trait::async_trait;

use crate::cache::credential::{CredentialType, CredentialValue};
use crate::config::provider::{AccessKeyConfig, BearerTokenConfig, StsTokenConfig};
use crate::config::validator::{
    require, ACCESS_KEY_ID_EMPTY, ACCESS_KEY_SECRET_EMPTY, BEARER_TOKEN_EMPTY, SECURITY_TOKEN_EMPTY,
};
use crate::error::Result;
use crate::providers::CredentialsProvider;

/// Long-lived access key pair.
#[derive(Debug, Clone)]
pub struct StaticAkProvider {
    value: CredentialValue,
}

impl StaticAkProvider {
    pub const NAME: &'static str = "static_ak";

    pub fn new(cfg: &AccessKeyConfig) -> Result<Self> {
        let access_key_id = require(&cfg.access_key_id, ACCESS_KEY_ID_EMPTY)?;
        let access_key_secret = require(&cfg.access_key_secret, ACCESS_KEY_SECRET_EMPTY)?;
        Ok(Self {
            value: CredentialValue::access_key(access_key_id, access_key_secret, CredentialType::AccessKey, Self::NAME),
        })
    }
}

#[async_trait]
impl CredentialsProvider for StaticAkProvider {
    fn provider_name(&self) -> &str {
        Self::NAME
    }

    async fn get_credentials(&self) -> Result<CredentialValue> {
        Ok(self.value.clone())
    }
}

/// Externally issued STS token, used as is until the caller replaces it.
#[derive(Debug, Clone)]
pub struct StaticStsProvider {
    value: CredentialValue,
}

impl StaticStsProvider {
    pub const NAME: &'static str = "static_sts";

    pub fn new(cfg: &StsTokenConfig) -> Result<Self> {
        let access_key_id = require(&cfg.access_key_id, ACCESS_KEY_ID_EMPTY)?;
        let access_key_secret = require(&cfg.access_key_secret, ACCESS_KEY_SECRET_EMPTY)?;
        let security_token = require(&cfg.security_token, SECURITY_TOKEN_EMPTY)?;
        Ok(Self {
            value: CredentialValue::access_key(access_key_id, access_key_secret, CredentialType::Sts, Self::NAME)
                .with_security_token(security_token),
        })
    }
}

#[async_trait]
impl CredentialsProvider for StaticStsProvider {
    fn provider_name(&self) -> &str {
        Self::NAME
    }

    async fn get_credentials(&self) -> Result<CredentialValue> {
        Ok(self.value.clone())
    }
}

#[derive(Debug, Clone)]
pub struct BearerTokenProvider {
    value: CredentialValue,
}

impl BearerTokenProvider {
    pub const NAME: &'static str = "bearer";

    pub fn new(cfg: &BearerTokenConfig) -> Result<Self> {
        let bearer_token = require(&cfg.bearer_token, BEARER_TOKEN_EMPTY)?;
        Ok(Self {
            value: CredentialValue::bearer(bearer_token, Self::NAME),
        })
    }
}

#[async_trait]
impl CredentialsProvider for BearerTokenProvider {
    fn provider_name(&self) -> &str {
        Self::NAME
    }

    async fn get_credentials(&self) -> Result<CredentialValue> {
        Ok(self.value.clone())
    }
}
