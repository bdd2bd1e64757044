use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CredentialError;

/// Kind of credential handed back to callers, rendered as its wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialType {
    AccessKey,
    Sts,
    Bearer,
    EcsRamRole,
    RamRoleArn,
    RsaKeyPair,
    OidcRoleArn,
    CredentialsUri,
    /// Resolved through the default provider chain.
    Default,
}

impl CredentialType {
    /// Tags accepted in a provider configuration, in the order they are reported.
    pub const CONFIGURABLE: [CredentialType; 8] = [
        CredentialType::AccessKey,
        CredentialType::Sts,
        CredentialType::Bearer,
        CredentialType::EcsRamRole,
        CredentialType::RamRoleArn,
        CredentialType::RsaKeyPair,
        CredentialType::OidcRoleArn,
        CredentialType::CredentialsUri,
    ];

    pub fn invalid_type_error() -> CredentialError {
        let supported: Vec<&str> = Self::CONFIGURABLE.iter().map(|t| t.as_str()).collect();
        CredentialError::validation(format!("invalid type option, support: {}", supported.join(", ")))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialType::AccessKey => "access_key",
            CredentialType::Sts => "sts",
            CredentialType::Bearer => "bearer",
            CredentialType::EcsRamRole => "ecs_ram_role",
            CredentialType::RamRoleArn => "ram_role_arn",
            CredentialType::RsaKeyPair => "rsa_key_pair",
            CredentialType::OidcRoleArn => "oidc_role_arn",
            CredentialType::CredentialsUri => "credentials_uri",
            CredentialType::Default => "default",
        }
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialType {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::CONFIGURABLE
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(Self::invalid_type_error)
    }
}

/// Immutable result of a successful resolution.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct CredentialValue {
    pub access_key_id: String,
    pub access_key_secret: String,
    /// Empty when not applicable.
    pub security_token: String,
    /// Empty when not applicable.
    pub bearer_token: String,
    pub credential_type: CredentialType,
    pub provider_name: String,
    /// Known only for refreshable sources.
    pub expiration: Option<DateTime<Utc>>,
}

impl CredentialValue {
    pub fn access_key(
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
        credential_type: CredentialType,
        provider_name: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            security_token: String::new(),
            bearer_token: String::new(),
            credential_type,
            provider_name: provider_name.into(),
            expiration: None,
        }
    }

    pub fn with_security_token(mut self, security_token: impl Into<String>) -> Self {
        self.security_token = security_token.into();
        self
    }

    pub fn with_expiration(mut self, expiration: Option<DateTime<Utc>>) -> Self {
        self.expiration = expiration;
        self
    }

    pub fn bearer(bearer_token: impl Into<String>, provider_name: impl Into<String>) -> Self {
        Self {
            access_key_id: String::new(),
            access_key_secret: String::new(),
            security_token: String::new(),
            bearer_token: bearer_token.into(),
            credential_type: CredentialType::Bearer,
            provider_name: provider_name.into(),
            expiration: None,
        }
    }

    /// Re-labels a value produced by an inner provider, e.g. behind the default chain.
    pub fn relabel(mut self, credential_type: CredentialType, provider_name: String) -> Self {
        self.credential_type = credential_type;
        self.provider_name = provider_name;
        self
    }
}

impl fmt::Debug for CredentialValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let blank = "********";
        f.debug_struct("CredentialValue")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &blank)
            .field("security_token", &blank)
            .field("bearer_token", &blank)
            .field("credential_type", &self.credential_type)
            .field("provider_name", &self.provider_name)
            .field("expiration", &self.expiration)
            .finish()
    }
}
