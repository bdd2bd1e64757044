use serde::Deserialize;

use crate::cache::credential::CredentialType;
use crate::error::Result;
use crate::transport::RuntimeOptions;

/// ================================
/// Flat credential configuration
/// ================================
///
/// Every field is optional; which ones matter depends on `type`. Setters consume
/// and return the builder so calls can be chained.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(rename = "type")]
    pub credential_type: Option<String>,
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
    pub security_token: Option<String>,
    pub bearer_token: Option<String>,

    pub role_arn: Option<String>,
    pub role_session_name: Option<String>,
    /// Requested STS session duration, seconds.
    pub role_session_expiration: Option<u64>,
    pub policy: Option<String>,
    pub external_id: Option<String>,
    pub sts_endpoint: Option<String>,
    pub sts_region_id: Option<String>,

    pub oidc_provider_arn: Option<String>,
    pub oidc_token_file_path: Option<String>,

    pub role_name: Option<String>,
    pub enable_imds_v2: Option<bool>,
    pub disable_imds_v1: Option<bool>,
    pub metadata_token_duration: Option<u64>,
    pub metadata_endpoint: Option<String>,

    pub url: Option<String>,

    pub public_key_id: Option<String>,
    pub private_key_file: Option<String>,
    /// Key-pair session duration, seconds.
    pub session_expiration: Option<u64>,
    pub host: Option<String>,

    /// Read timeout, milliseconds.
    pub timeout: Option<u64>,
    /// Connect timeout, milliseconds.
    pub connect_timeout: Option<u64>,
    pub proxy: Option<String>,

    pub in_advance_scale: Option<f64>,
}

macro_rules! setter {
    ($name:ident, $field:ident, String) => {
        pub fn $name(mut self, value: impl Into<String>) -> Self {
            self.$field = Some(value.into());
            self
        }
    };
    ($name:ident, $field:ident, $ty:ty) => {
        pub fn $name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    setter!(with_type, credential_type, String);
    setter!(with_access_key_id, access_key_id, String);
    setter!(with_access_key_secret, access_key_secret, String);
    setter!(with_security_token, security_token, String);
    setter!(with_bearer_token, bearer_token, String);
    setter!(with_role_arn, role_arn, String);
    setter!(with_role_session_name, role_session_name, String);
    setter!(with_role_session_expiration, role_session_expiration, u64);
    setter!(with_policy, policy, String);
    setter!(with_external_id, external_id, String);
    setter!(with_sts_endpoint, sts_endpoint, String);
    setter!(with_sts_region_id, sts_region_id, String);
    setter!(with_oidc_provider_arn, oidc_provider_arn, String);
    setter!(with_oidc_token_file_path, oidc_token_file_path, String);
    setter!(with_role_name, role_name, String);
    setter!(with_enable_imds_v2, enable_imds_v2, bool);
    setter!(with_disable_imds_v1, disable_imds_v1, bool);
    setter!(with_metadata_token_duration, metadata_token_duration, u64);
    setter!(with_metadata_endpoint, metadata_endpoint, String);
    setter!(with_url, url, String);
    setter!(with_public_key_id, public_key_id, String);
    setter!(with_private_key_file, private_key_file, String);
    setter!(with_session_expiration, session_expiration, u64);
    setter!(with_host, host, String);
    setter!(with_timeout, timeout, u64);
    setter!(with_connect_timeout, connect_timeout, u64);
    setter!(with_proxy, proxy, String);
    setter!(with_in_advance_scale, in_advance_scale, f64);

    pub fn runtime_options(&self) -> RuntimeOptions {
        let defaults = RuntimeOptions::default();
        RuntimeOptions {
            connect_timeout_ms: self.connect_timeout.unwrap_or(defaults.connect_timeout_ms),
            read_timeout_ms: self.timeout.unwrap_or(defaults.read_timeout_ms),
            proxy: self.proxy.clone().filter(|p| !p.is_empty()),
        }
    }

    /// Dispatches on the type tag. An unknown or missing tag lists every supported one.
    pub fn provider_config(&self) -> Result<ProviderConfig> {
        let tag = self.credential_type.as_deref().unwrap_or_default();
        let config = match tag.parse::<CredentialType>()? {
            CredentialType::AccessKey => ProviderConfig::AccessKey(AccessKeyConfig {
                access_key_id: self.access_key_id.clone(),
                access_key_secret: self.access_key_secret.clone(),
            }),
            CredentialType::Sts => ProviderConfig::Sts(StsTokenConfig {
                access_key_id: self.access_key_id.clone(),
                access_key_secret: self.access_key_secret.clone(),
                security_token: self.security_token.clone(),
            }),
            CredentialType::Bearer => ProviderConfig::Bearer(BearerTokenConfig {
                bearer_token: self.bearer_token.clone(),
            }),
            CredentialType::EcsRamRole => ProviderConfig::EcsRamRole(EcsRamRoleConfig {
                role_name: self.role_name.clone(),
                enable_imds_v2: self.enable_imds_v2.unwrap_or(false),
                disable_imds_v1: self.disable_imds_v1.unwrap_or(false),
                metadata_token_duration: self.metadata_token_duration,
                metadata_endpoint: self.metadata_endpoint.clone(),
                in_advance_scale: self.in_advance_scale,
            }),
            CredentialType::RamRoleArn => ProviderConfig::RamRoleArn(RamRoleArnConfig {
                access_key_id: self.access_key_id.clone(),
                access_key_secret: self.access_key_secret.clone(),
                security_token: self.security_token.clone(),
                role_arn: self.role_arn.clone(),
                role_session_name: self.role_session_name.clone(),
                duration_seconds: self.role_session_expiration,
                policy: self.policy.clone(),
                external_id: self.external_id.clone(),
                sts: self.sts_target(),
            }),
            CredentialType::RsaKeyPair => ProviderConfig::RsaKeyPair(RsaKeyPairConfig {
                private_key_file: self.private_key_file.clone(),
                public_key_id: self.public_key_id.clone(),
                session_expiration: self.session_expiration,
                sts: StsTarget {
                    endpoint: self.sts_endpoint.clone().or_else(|| self.host.clone()),
                    region_id: self.sts_region_id.clone(),
                },
            }),
            CredentialType::OidcRoleArn => ProviderConfig::OidcRoleArn(OidcRoleArnConfig {
                oidc_token_file_path: self.oidc_token_file_path.clone(),
                oidc_provider_arn: self.oidc_provider_arn.clone(),
                role_arn: self.role_arn.clone(),
                role_session_name: self.role_session_name.clone(),
                duration_seconds: self.role_session_expiration,
                policy: self.policy.clone(),
                sts: self.sts_target(),
            }),
            CredentialType::CredentialsUri => ProviderConfig::CredentialsUri(CredentialsUriConfig {
                url: self.url.clone(),
            }),
            CredentialType::Default => return Err(CredentialType::invalid_type_error()),
        };
        Ok(config)
    }

    fn sts_target(&self) -> StsTarget {
        StsTarget {
            endpoint: self.sts_endpoint.clone(),
            region_id: self.sts_region_id.clone(),
        }
    }
}

/// ================================
/// Per-source configuration
/// ================================
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    AccessKey(AccessKeyConfig),
    Sts(StsTokenConfig),
    Bearer(BearerTokenConfig),
    EcsRamRole(EcsRamRoleConfig),
    RamRoleArn(RamRoleArnConfig),
    RsaKeyPair(RsaKeyPairConfig),
    OidcRoleArn(OidcRoleArnConfig),
    CredentialsUri(CredentialsUriConfig),
}

impl ProviderConfig {
    pub fn credential_type(&self) -> CredentialType {
        match self {
            ProviderConfig::AccessKey(_) => CredentialType::AccessKey,
            ProviderConfig::Sts(_) => CredentialType::Sts,
            ProviderConfig::Bearer(_) => CredentialType::Bearer,
            ProviderConfig::EcsRamRole(_) => CredentialType::EcsRamRole,
            ProviderConfig::RamRoleArn(_) => CredentialType::RamRoleArn,
            ProviderConfig::RsaKeyPair(_) => CredentialType::RsaKeyPair,
            ProviderConfig::OidcRoleArn(_) => CredentialType::OidcRoleArn,
            ProviderConfig::CredentialsUri(_) => CredentialType::CredentialsUri,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessKeyConfig {
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StsTokenConfig {
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
    pub security_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BearerTokenConfig {
    pub bearer_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EcsRamRoleConfig {
    /// Discovered from the metadata service when absent.
    pub role_name: Option<String>,
    pub enable_imds_v2: bool,
    pub disable_imds_v1: bool,
    /// Metadata token TTL, seconds.
    pub metadata_token_duration: Option<u64>,
    /// Base URL of the metadata service.
    pub metadata_endpoint: Option<String>,
    pub in_advance_scale: Option<f64>,
}

/// Where STS calls are sent: explicit endpoint, else derived from the region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StsTarget {
    pub endpoint: Option<String>,
    pub region_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RamRoleArnConfig {
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
    /// Caller's own STS token, when the caller is itself a temporary identity.
    pub security_token: Option<String>,
    pub role_arn: Option<String>,
    pub role_session_name: Option<String>,
    pub duration_seconds: Option<u64>,
    pub policy: Option<String>,
    pub external_id: Option<String>,
    pub sts: StsTarget,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RsaKeyPairConfig {
    pub private_key_file: Option<String>,
    pub public_key_id: Option<String>,
    pub session_expiration: Option<u64>,
    pub sts: StsTarget,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OidcRoleArnConfig {
    pub oidc_token_file_path: Option<String>,
    pub oidc_provider_arn: Option<String>,
    pub role_arn: Option<String>,
    pub role_session_name: Option<String>,
    pub duration_seconds: Option<u64>,
    pub policy: Option<String>,
    pub sts: StsTarget,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialsUriConfig {
    pub url: Option<String>,
}
