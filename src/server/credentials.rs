use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cache::credential::CredentialValue;
use crate::credential::Credential;
use crate::helpers::time::format_expiration;
use crate::observability::metrics::get_metrics;
use crate::server::server::AppState;

static SUCCESS: &str = "Success";
static FAILED: &str = "Failed";

/// Body of the credentials route, in the shape a credentials-URI client reads.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CredentialsDocument {
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub access_key_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub access_key_secret: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub security_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
}

impl From<CredentialValue> for CredentialsDocument {
    fn from(value: CredentialValue) -> Self {
        Self {
            code: SUCCESS,
            message: None,
            access_key_id: value.access_key_id,
            access_key_secret: value.access_key_secret,
            security_token: value.security_token,
            expiration: value.expiration.as_ref().map(format_expiration),
        }
    }
}

impl CredentialsDocument {
    fn failed(message: String) -> Self {
        Self {
            code: FAILED,
            message: Some(message),
            access_key_id: String::new(),
            access_key_secret: String::new(),
            security_token: String::new(),
            expiration: None,
        }
    }
}

#[derive(Clone)]
pub struct CredentialsState {
    credential: Credential,
}

impl CredentialsState {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    pub fn router(&self, path: &str) -> Router<AppState> {
        let path = if path.starts_with('/') { path.to_owned() } else { format!("/{}", path) };
        debug!("served path: {}", path);
        Router::new().route(&path, get(handle_credentials))
    }
}

async fn handle_credentials(State(state): State<AppState>) -> Response {
    let metrics = get_metrics().await;
    let start = Instant::now();

    let response = match state.credentials_state.credential.get_credential().await {
        Ok(value) => {
            metrics.credential_requests.with_label_values(&[SUCCESS]).inc();
            debug!(provider = %value.provider_name, "served credentials");
            (StatusCode::OK, Json(CredentialsDocument::from(value))).into_response()
        }
        Err(e) => {
            metrics.credential_requests.with_label_values(&[FAILED]).inc();
            warn!("unable to serve credentials: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(CredentialsDocument::failed(e.to_string())),
            )
                .into_response()
        }
    };
    debug!(elapsed_ms = start.elapsed().as_millis() as u64, "credentials request done");
    response
}
