use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::cache::credential::{CredentialType, CredentialValue};
use crate::cache::credential_cache::{CredentialCache, RefreshPolicy, SessionCredentials};
use crate::config::provider::RsaKeyPairConfig;
use crate::config::validator::{key_pair_duration, require, PRIVATE_KEY_FILE_EMPTY, PUBLIC_KEY_ID_EMPTY};
use crate::error::{CredentialError, Result};
use crate::helpers::time::parse_expiration;
use crate::providers::sts::{missing_fields, resolve_endpoint, StsCall};
use crate::providers::{CredentialsProvider, ProviderContext};
use crate::signer::KeyPairSigner;
use crate::transport::{HttpTransport, RuntimeOptions};

#[derive(Debug, Deserialize)]
struct GenerateSessionAccessKeyResponse {
    #[serde(rename = "SessionAccessKey")]
    session_access_key: Option<SessionAccessKey>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct SessionAccessKey {
    session_access_key_id: Option<String>,
    session_access_key_secret: Option<String>,
    expiration: Option<String>,
}

/// Session access key issued against a registered public key
/// (`GenerateSessionAccessKey`). The result carries no security token.
#[derive(Debug)]
pub struct RsaKeyPairProvider {
    signer: KeyPairSigner,
    duration_seconds: u64,
    endpoint: String,
    transport: Arc<dyn HttpTransport>,
    runtime: RuntimeOptions,
    cache: CredentialCache,
}

impl RsaKeyPairProvider {
    pub const NAME: &'static str = "rsa_key_pair";

    pub fn new(cfg: &RsaKeyPairConfig, ctx: &ProviderContext) -> Result<Self> {
        let path = require(&cfg.private_key_file, PRIVATE_KEY_FILE_EMPTY)?;
        let private_key_pem = std::fs::read_to_string(&path).map_err(|err| {
            CredentialError::validation(format!(
                "InvalidPath: Can not open PrivateKeyFile, err is open {path}: {err}"
            ))
        })?;
        let public_key_id = require(&cfg.public_key_id, PUBLIC_KEY_ID_EMPTY)?;
        let duration_seconds = key_pair_duration(cfg.session_expiration)?;

        Ok(Self {
            signer: KeyPairSigner::new(public_key_id, private_key_pem),
            duration_seconds,
            endpoint: resolve_endpoint(&cfg.sts),
            transport: ctx.transport.clone(),
            runtime: ctx.runtime.clone(),
            cache: CredentialCache::new(Self::NAME, RefreshPolicy::sts()),
        })
    }

    async fn generate_session_access_key(&self) -> Result<SessionCredentials> {
        let body = StsCall::new("GenerateSessionAccessKey")
            .param("DurationSeconds", self.duration_seconds.to_string())
            .signed_by(&self.signer)
            .send(self.transport.as_ref(), &self.runtime, &self.endpoint)
            .await?;
        parse_session_access_key(&body)
    }

    fn value(session: SessionCredentials) -> CredentialValue {
        session.into_value(CredentialType::RsaKeyPair, Self::NAME)
    }
}

fn parse_session_access_key(body: &[u8]) -> Result<SessionCredentials> {
    let response: GenerateSessionAccessKeyResponse = serde_json::from_slice(body).map_err(|err| {
        CredentialError::protocol(format!("refresh KeyPair err, json.Unmarshal fail: {err}"))
    })?;
    let key = response
        .session_access_key
        .ok_or_else(|| CredentialError::protocol("refresh KeyPair err, fail to get SessionAccessKey"))?;

    let missing = missing_fields(&[
        ("SessionAccessKeyId", &key.session_access_key_id),
        ("SessionAccessKeySecret", &key.session_access_key_secret),
        ("Expiration", &key.expiration),
    ]);
    if !missing.is_empty() {
        return Err(CredentialError::protocol(format!(
            "refresh KeyPair err, fail to get SessionAccessKey, missing {}",
            missing.join(", ")
        )));
    }

    let expiration = parse_expiration(key.expiration.as_deref().unwrap_or_default())
        .map_err(|err| err.context("refresh KeyPair err"))?;
    Ok(SessionCredentials {
        access_key_id: key.session_access_key_id.unwrap_or_default(),
        access_key_secret: key.session_access_key_secret.unwrap_or_default(),
        security_token: String::new(),
        expiration,
    })
}

#[async_trait]
impl CredentialsProvider for RsaKeyPairProvider {
    fn provider_name(&self) -> &str {
        Self::NAME
    }

    async fn get_credentials(&self) -> Result<CredentialValue> {
        self.cache.get(|| self.generate_session_access_key()).await.map(Self::value)
    }

    async fn get_credentials_or_stale(&self) -> Result<CredentialValue> {
        self.cache
            .get_or_stale(|| self.generate_session_access_key())
            .await
            .map(Self::value)
    }
}
