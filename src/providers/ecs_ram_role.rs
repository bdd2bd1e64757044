use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cache::credential::{CredentialType, CredentialValue};
use crate::cache::credential_cache::{CredentialCache, RefreshPolicy, SessionCredentials};
use crate::config::provider::EcsRamRoleConfig;
use crate::config::validator::optional;
use crate::error::{CredentialError, Result};
use crate::helpers::time::{now_i64, parse_expiration};
use crate::providers::sts::missing_fields;
use crate::providers::{CredentialsProvider, ProviderContext};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, RuntimeOptions};

pub const DEFAULT_METADATA_ENDPOINT: &str = "http://100.100.100.200";
pub const DEFAULT_METADATA_TOKEN_TTL_SECONDS: u64 = 21600;

const TOKEN_PATH: &str = "/latest/api/token";
const SECURITY_CREDENTIALS_PATH: &str = "/latest/meta-data/ram/security-credentials/";
const TOKEN_HEADER: &str = "X-aliyun-ecs-metadata-token";
const TOKEN_TTL_HEADER: &str = "X-aliyun-ecs-metadata-token-ttl-seconds";

const REFRESH_ERR: &str = "refresh Ecs sts token err";
const TOKEN_ERR: &str = "Failed to get token from ECS Metadata Service";

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct EcsSecurityCredentials {
    code: Option<String>,
    access_key_id: Option<String>,
    access_key_secret: Option<String>,
    security_token: Option<String>,
    expiration: Option<String>,
}

#[derive(Debug, Clone)]
struct MetadataToken {
    value: String,
    /// unix seconds after which a new token is requested
    stale_at: i64,
}

/// Role credentials of the ECS instance, read from the instance metadata service.
///
/// With IMDSv2 enabled (or IMDSv1 disabled) every metadata call carries a
/// session token, which is cached for its TTL. A role name discovered from the
/// metadata service is kept for the life of the provider.
#[derive(Debug)]
pub struct EcsRamRoleProvider {
    endpoint: String,
    imds_v2: bool,
    token_ttl_seconds: u64,
    role_name: Mutex<Option<String>>,
    token: Mutex<Option<MetadataToken>>,
    transport: Arc<dyn HttpTransport>,
    runtime: RuntimeOptions,
    cache: CredentialCache,
}

impl EcsRamRoleProvider {
    pub const NAME: &'static str = "ecs_ram_role";

    pub fn new(cfg: &EcsRamRoleConfig, ctx: &ProviderContext) -> Self {
        let endpoint = optional(&cfg.metadata_endpoint)
            .unwrap_or_else(|| DEFAULT_METADATA_ENDPOINT.to_owned())
            .trim_end_matches('/')
            .to_owned();

        Self {
            endpoint,
            imds_v2: cfg.enable_imds_v2 || cfg.disable_imds_v1,
            token_ttl_seconds: cfg
                .metadata_token_duration
                .filter(|d| *d > 0)
                .unwrap_or(DEFAULT_METADATA_TOKEN_TTL_SECONDS),
            role_name: Mutex::new(optional(&cfg.role_name)),
            token: Mutex::new(None),
            transport: ctx.transport.clone(),
            runtime: ctx.runtime.clone(),
            cache: CredentialCache::new(Self::NAME, RefreshPolicy::fractional(cfg.in_advance_scale)),
        }
    }

    async fn metadata_token(&self) -> Result<String> {
        let mut slot = self.token.lock().await;
        if let Some(token) = slot.as_ref().filter(|t| now_i64() < t.stale_at) {
            return Ok(token.value.clone());
        }

        let issued_at = now_i64();
        let request = HttpRequest::new(Method::PUT, format!("{}{}", self.endpoint, TOKEN_PATH))
            .header(TOKEN_TTL_HEADER, self.token_ttl_seconds.to_string())
            .runtime(&self.runtime);
        let response = self.expect_success(request).await?;

        let token = MetadataToken {
            value: response.text(),
            stale_at: issued_at.saturating_add(i64::try_from(self.token_ttl_seconds).unwrap_or(i64::MAX)),
        };
        debug!(ttl = self.token_ttl_seconds, "obtained metadata token");
        *slot = Some(token.clone());
        Ok(token.value)
    }

    async fn role_name(&self, token: Option<&str>) -> Result<String> {
        let mut slot = self.role_name.lock().await;
        if let Some(name) = slot.as_ref() {
            return Ok(name.clone());
        }

        let request = self.metadata_get(SECURITY_CREDENTIALS_PATH.to_owned(), token);
        let name = self.expect_success(request).await?.text().trim().to_owned();
        if name.is_empty() {
            return Err(CredentialError::protocol("no role attached to the instance"));
        }
        info!(role = %name, "discovered ecs ram role");
        *slot = Some(name.clone());
        Ok(name)
    }

    fn metadata_get(&self, path: String, token: Option<&str>) -> HttpRequest {
        let request = HttpRequest::new(Method::GET, format!("{}{}", self.endpoint, path)).runtime(&self.runtime);
        match token {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        }
    }

    async fn expect_success(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(CredentialError::protocol(format!(
                "unexpected status {}: {}",
                response.status,
                response.text()
            )));
        }
        Ok(response)
    }

    async fn fetch_role_credentials(&self) -> Result<SessionCredentials> {
        let token = if self.imds_v2 {
            Some(self.metadata_token().await.map_err(|err| err.context(TOKEN_ERR))?)
        } else {
            None
        };

        let role = self
            .role_name(token.as_deref())
            .await
            .map_err(|err| err.context(REFRESH_ERR))?;
        let request = self.metadata_get(format!("{SECURITY_CREDENTIALS_PATH}{role}"), token.as_deref());
        let response = self
            .expect_success(request)
            .await
            .map_err(|err| err.context(REFRESH_ERR))?;

        parse_security_credentials(&response.body)
    }

    fn value(session: SessionCredentials) -> CredentialValue {
        session.into_value(CredentialType::EcsRamRole, Self::NAME)
    }
}

fn parse_security_credentials(body: &[u8]) -> Result<SessionCredentials> {
    let credentials: EcsSecurityCredentials = serde_json::from_slice(body).map_err(|err| {
        CredentialError::protocol(format!("{REFRESH_ERR}: Json Unmarshal fail: {err}"))
    })?;
    if credentials.code.as_deref() != Some("Success") {
        return Err(CredentialError::protocol(format!("{REFRESH_ERR}: Code is not Success")));
    }

    let missing = missing_fields(&[
        ("AccessKeyId", &credentials.access_key_id),
        ("AccessKeySecret", &credentials.access_key_secret),
        ("SecurityToken", &credentials.security_token),
        ("Expiration", &credentials.expiration),
    ]);
    if !missing.is_empty() {
        return Err(CredentialError::protocol(format!(
            "{REFRESH_ERR}: missing {}",
            missing.join(", ")
        )));
    }

    let expiration = parse_expiration(credentials.expiration.as_deref().unwrap_or_default())
        .map_err(|err| err.context(REFRESH_ERR))?;
    Ok(SessionCredentials {
        access_key_id: credentials.access_key_id.unwrap_or_default(),
        access_key_secret: credentials.access_key_secret.unwrap_or_default(),
        security_token: credentials.security_token.unwrap_or_default(),
        expiration,
    })
}

#[async_trait]
impl CredentialsProvider for EcsRamRoleProvider {
    fn provider_name(&self) -> &str {
        Self::NAME
    }

    async fn get_credentials(&self) -> Result<CredentialValue> {
        self.cache.get(|| self.fetch_role_credentials()).await.map(Self::value)
    }

    async fn get_credentials_or_stale(&self) -> Result<CredentialValue> {
        self.cache
            .get_or_stale(|| self.fetch_role_credentials())
            .await
            .map(Self::value)
    }
}
