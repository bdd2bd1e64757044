//! Shared protocol of the STS delegation family (AssumeRole, AssumeRoleWithOIDC,
//! GenerateSessionAccessKey): query/body assembly, optional signing, the POST
//! itself and the `Credentials` envelope.

use std::collections::BTreeMap;

use http::Method;
use serde::Deserialize;
use tracing::debug;

use crate::cache::credential_cache::SessionCredentials;
use crate::config::provider::StsTarget;
use crate::error::{CredentialError, Result};
use crate::helpers::time::{iso8601_timestamp, now_micros, parse_expiration};
use crate::signer::{sign_request, url_formed, RequestSigner};
use crate::transport::{HttpRequest, HttpTransport, RuntimeOptions};

pub const STS_API_VERSION: &str = "2015-04-01";
pub const DEFAULT_STS_ENDPOINT: &str = "sts.aliyuncs.com";

/// Explicit endpoint wins; otherwise the regional endpoint, otherwise the global one.
pub fn resolve_endpoint(target: &StsTarget) -> String {
    match (
        target.endpoint.as_deref().filter(|e| !e.is_empty()),
        target.region_id.as_deref().filter(|r| !r.is_empty()),
    ) {
        (Some(endpoint), _) => endpoint.to_owned(),
        (None, Some(region)) => format!("sts.{region}.aliyuncs.com"),
        (None, None) => DEFAULT_STS_ENDPOINT.to_owned(),
    }
}

pub fn default_role_session_name() -> String {
    format!("credentials-rs-{}", now_micros())
}

/// One STS action ready to be sent.
#[derive(Debug)]
pub struct StsCall<'a> {
    pub action: &'static str,
    pub body: BTreeMap<String, String>,
    pub signer: Option<&'a dyn RequestSigner>,
}

impl<'a> StsCall<'a> {
    pub fn new(action: &'static str) -> Self {
        Self { action, body: BTreeMap::new(), signer: None }
    }

    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.body.insert(key.to_owned(), value.into());
        self
    }

    pub fn optional_param(self, key: &str, value: Option<&str>) -> Self {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    pub fn signed_by(mut self, signer: &'a dyn RequestSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    /// POSTs the call and returns the raw body of a `200 OK` answer.
    pub async fn send(
        self,
        transport: &dyn HttpTransport,
        runtime: &RuntimeOptions,
        endpoint: &str,
    ) -> Result<Vec<u8>> {
        let mut query = BTreeMap::new();
        query.insert("Version".to_string(), STS_API_VERSION.to_string());
        query.insert("Action".to_string(), self.action.to_string());
        query.insert("Format".to_string(), "JSON".to_string());
        query.insert("Timestamp".to_string(), iso8601_timestamp());

        if let Some(signer) = self.signer {
            sign_request(signer, Method::POST.as_str(), &mut query, &self.body)?;
        }

        let url = format!("https://{}/?{}", endpoint, url_formed(&query));
        debug!(action = self.action, endpoint, "calling sts");
        let request = HttpRequest::new(Method::POST, url)
            .header("Accept-Encoding", "identity")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(url_formed(&self.body))
            .runtime(runtime);

        let response = transport.send(request).await?;
        if response.status != 200 {
            return Err(CredentialError::protocol(format!(
                "get session token failed: {}",
                response.text()
            )));
        }
        Ok(response.body)
    }
}

#[derive(Debug, Deserialize)]
struct AssumeRoleResponse {
    #[serde(rename = "Credentials")]
    credentials: Option<AssumedCredentials>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct AssumedCredentials {
    access_key_id: Option<String>,
    access_key_secret: Option<String>,
    security_token: Option<String>,
    expiration: Option<String>,
}

/// Parses the `Credentials` envelope shared by AssumeRole and AssumeRoleWithOIDC.
/// `label` names the flow in error messages.
pub fn parse_assume_role_response(body: &[u8], label: &str) -> Result<SessionCredentials> {
    let response: AssumeRoleResponse = serde_json::from_slice(body).map_err(|err| {
        CredentialError::protocol(format!("get {label} sts token err, json.Unmarshal fail: {err}"))
    })?;
    let credentials = response.credentials.ok_or_else(|| {
        CredentialError::protocol(format!("get {label} sts token err, fail to get credentials"))
    })?;

    let fields = [
        ("AccessKeyId", &credentials.access_key_id),
        ("AccessKeySecret", &credentials.access_key_secret),
        ("SecurityToken", &credentials.security_token),
        ("Expiration", &credentials.expiration),
    ];
    let missing = missing_fields(&fields);
    if !missing.is_empty() {
        return Err(CredentialError::protocol(format!(
            "refresh {label} sts token err, fail to get credentials, missing {}",
            missing.join(", ")
        )));
    }

    let expiration = parse_expiration(credentials.expiration.as_deref().unwrap_or_default())
        .map_err(|err| err.context(&format!("refresh {label} sts token err")))?;

    Ok(SessionCredentials {
        access_key_id: credentials.access_key_id.unwrap_or_default(),
        access_key_secret: credentials.access_key_secret.unwrap_or_default(),
        security_token: credentials.security_token.unwrap_or_default(),
        expiration,
    })
}

/// Names of the fields that are absent or empty.
pub fn missing_fields(fields: &[(&'static str, &Option<String>)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, value)| value.as_deref().map_or(true, str::is_empty))
        .map(|(name, _)| *name)
        .collect()
}
