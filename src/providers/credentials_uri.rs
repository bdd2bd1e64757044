use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use serde::Deserialize;

use crate::cache::credential::{CredentialType, CredentialValue};
use crate::cache::credential_cache::{CredentialCache, RefreshPolicy, SessionCredentials};
use crate::config::provider::CredentialsUriConfig;
use crate::config::validator::{require, URL_EMPTY};
use crate::error::{CredentialError, Result};
use crate::helpers::time::parse_expiration;
use crate::providers::sts::missing_fields;
use crate::providers::{CredentialsProvider, ProviderContext};
use crate::transport::{HttpRequest, HttpTransport, RuntimeOptions};

/// Document served by a credentials URI. The agent's own credentials route
/// renders the same shape.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct UriCredentials {
    code: Option<String>,
    access_key_id: Option<String>,
    access_key_secret: Option<String>,
    security_token: Option<String>,
    expiration: Option<String>,
}

/// Credentials fetched from a local or sidecar HTTP endpoint.
#[derive(Debug)]
pub struct CredentialsUriProvider {
    url: String,
    transport: Arc<dyn HttpTransport>,
    runtime: RuntimeOptions,
    cache: CredentialCache,
}

impl CredentialsUriProvider {
    pub const NAME: &'static str = "credentials_uri";

    pub fn new(cfg: &CredentialsUriConfig, ctx: &ProviderContext) -> Result<Self> {
        let url = require(&cfg.url, URL_EMPTY)?;
        Ok(Self {
            url,
            transport: ctx.transport.clone(),
            runtime: ctx.runtime.clone(),
            cache: CredentialCache::new(Self::NAME, RefreshPolicy::sts()),
        })
    }

    async fn fetch(&self) -> Result<SessionCredentials> {
        let request = HttpRequest::new(Method::GET, self.url.as_str()).runtime(&self.runtime);
        let response = self.transport.send(request).await.map_err(|err| {
            err.context(&format!("get credentials from {} failed with error", self.url))
        })?;
        if !response.is_success() {
            return Err(CredentialError::protocol(format!(
                "get credentials from {} failed, status code {}, body: {}",
                self.url,
                response.status,
                response.text()
            )));
        }
        parse_uri_credentials(&response.body)
    }

    fn value(session: SessionCredentials) -> CredentialValue {
        session.into_value(CredentialType::CredentialsUri, Self::NAME)
    }
}

fn parse_uri_credentials(body: &[u8]) -> Result<SessionCredentials> {
    let credentials: UriCredentials = serde_json::from_slice(body).map_err(|err| {
        CredentialError::protocol(format!("get credentials from uri err, json.Unmarshal fail: {err}"))
    })?;
    if credentials.code.as_deref() != Some("Success") {
        return Err(CredentialError::protocol(
            "get credentials from uri err, Code is not Success",
        ));
    }

    let missing = missing_fields(&[
        ("AccessKeyId", &credentials.access_key_id),
        ("AccessKeySecret", &credentials.access_key_secret),
        ("SecurityToken", &credentials.security_token),
        ("Expiration", &credentials.expiration),
    ]);
    if !missing.is_empty() {
        return Err(CredentialError::protocol(format!(
            "get credentials from uri err, missing {}",
            missing.join(", ")
        )));
    }

    let expiration = parse_expiration(credentials.expiration.as_deref().unwrap_or_default())?;
    Ok(SessionCredentials {
        access_key_id: credentials.access_key_id.unwrap_or_default(),
        access_key_secret: credentials.access_key_secret.unwrap_or_default(),
        security_token: credentials.security_token.unwrap_or_default(),
        expiration,
    })
}

#[async_trait]
impl CredentialsProvider for CredentialsUriProvider {
    fn provider_name(&self) -> &str {
        Self::NAME
    }

    async fn get_credentials(&self) -> Result<CredentialValue> {
        self.cache.get(|| self.fetch()).await.map(Self::value)
    }

    async fn get_credentials_or_stale(&self) -> Result<CredentialValue> {
        self.cache.get_or_stale(|| self.fetch()).await.map(Self::value)
    }
}
