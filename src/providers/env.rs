use async_trait::async_trait;

use crate::cache::credential::{CredentialType, CredentialValue};
use crate::config::env::{EnvSnapshot, ENV_ACCESS_KEY_ID, ENV_ACCESS_KEY_SECRET};
use crate::error::{CredentialError, Result};
use crate::providers::CredentialsProvider;

/// Static keys taken from the `ALIBABA_CLOUD_ACCESS_KEY_*` variables.
///
/// Missing variables are only reported when credentials are requested, so the
/// provider can sit in a chain on hosts where they are not set.
#[derive(Debug, Clone)]
pub struct EnvironmentProvider {
    access_key_id: Option<String>,
    access_key_secret: Option<String>,
    security_token: Option<String>,
}

impl EnvironmentProvider {
    pub const NAME: &'static str = "env";

    pub fn new(env: &EnvSnapshot) -> Self {
        Self {
            access_key_id: env.access_key_id.clone(),
            access_key_secret: env.access_key_secret.clone(),
            security_token: env.security_token.clone(),
        }
    }
}

#[async_trait]
impl CredentialsProvider for EnvironmentProvider {
    fn provider_name(&self) -> &str {
        Self::NAME
    }

    async fn get_credentials(&self) -> Result<CredentialValue> {
        let missing = |name: &str, var: &str| {
            CredentialError::validation(format!(
                "unable to get credentials from environment variables, {name} must be specified via environment variable ({var})"
            ))
        };
        let access_key_id = self
            .access_key_id
            .clone()
            .ok_or_else(|| missing("Access key ID", ENV_ACCESS_KEY_ID))?;
        let access_key_secret = self
            .access_key_secret
            .clone()
            .ok_or_else(|| missing("Access key secret", ENV_ACCESS_KEY_SECRET))?;

        let value = match &self.security_token {
            Some(token) => CredentialValue::access_key(access_key_id, access_key_secret, CredentialType::Sts, Self::NAME)
                .with_security_token(token.as_str()),
            None => CredentialValue::access_key(access_key_id, access_key_secret, CredentialType::AccessKey, Self::NAME),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_first_missing_variable() {
        let provider = EnvironmentProvider::new(&EnvSnapshot::default());
        let err = provider.get_credentials().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "unable to get credentials from environment variables, Access key ID must be specified via environment variable (ALIBABA_CLOUD_ACCESS_KEY_ID)"
        );

        let provider = EnvironmentProvider::new(&EnvSnapshot {
            access_key_id: Some("id".into()),
            ..Default::default()
        });
        let err = provider.get_credentials().await.unwrap_err();
        assert!(err.to_string().contains("(ALIBABA_CLOUD_ACCESS_KEY_SECRET)"));
    }

    #[tokio::test]
    async fn security_token_makes_it_sts() {
        let provider = EnvironmentProvider::new(&EnvSnapshot {
            access_key_id: Some("id".into()),
            access_key_secret: Some("secret".into()),
            security_token: Some("token".into()),
            ..Default::default()
        });
        let value = provider.get_credentials().await.unwrap();
        assert_eq!(value.credential_type, CredentialType::Sts);
        assert_eq!(value.security_token, "token");
        assert_eq!(value.provider_name, "env");
    }
}
