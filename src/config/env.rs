//! Environment variables consumed by the default chain and by OIDC fallbacks.
//!
//! The process environment is read once, at the boundary, into an [`EnvSnapshot`]
//! that is then passed around explicitly.

pub const ENV_ACCESS_KEY_ID: &str = "ALIBABA_CLOUD_ACCESS_KEY_ID";
pub const ENV_ACCESS_KEY_SECRET: &str = "ALIBABA_CLOUD_ACCESS_KEY_SECRET";
pub const ENV_SECURITY_TOKEN: &str = "ALIBABA_CLOUD_SECURITY_TOKEN";
pub const ENV_OIDC_TOKEN_FILE: &str = "ALIBABA_CLOUD_OIDC_TOKEN_FILE";
pub const ENV_OIDC_PROVIDER_ARN: &str = "ALIBABA_CLOUD_OIDC_PROVIDER_ARN";
pub const ENV_ROLE_ARN: &str = "ALIBABA_CLOUD_ROLE_ARN";
pub const ENV_ROLE_SESSION_NAME: &str = "ALIBABA_CLOUD_ROLE_SESSION_NAME";
pub const ENV_STS_REGION: &str = "ALIBABA_CLOUD_STS_REGION";
pub const ENV_ECS_METADATA: &str = "ALIBABA_CLOUD_ECS_METADATA";
pub const ENV_ECS_METADATA_DISABLED: &str = "ALIBABA_CLOUD_ECS_METADATA_DISABLED";
pub const ENV_IMDSV1_DISABLED: &str = "ALIBABA_CLOUD_IMDSV1_DISABLED";
pub const ENV_CLI_PROFILE_DISABLED: &str = "ALIBABA_CLOUD_CLI_PROFILE_DISABLED";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
    pub security_token: Option<String>,
    pub oidc_token_file: Option<String>,
    pub oidc_provider_arn: Option<String>,
    pub role_arn: Option<String>,
    pub role_session_name: Option<String>,
    pub sts_region: Option<String>,
    pub ecs_metadata_role: Option<String>,
    pub ecs_metadata_disabled: bool,
    pub imds_v1_disabled: bool,
    pub cli_profile_disabled: bool,
}

impl EnvSnapshot {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a snapshot from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let flag = |key: &str| {
            value(key)
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false)
        };

        Self {
            access_key_id: value(ENV_ACCESS_KEY_ID),
            access_key_secret: value(ENV_ACCESS_KEY_SECRET),
            security_token: value(ENV_SECURITY_TOKEN),
            oidc_token_file: value(ENV_OIDC_TOKEN_FILE),
            oidc_provider_arn: value(ENV_OIDC_PROVIDER_ARN),
            role_arn: value(ENV_ROLE_ARN),
            role_session_name: value(ENV_ROLE_SESSION_NAME),
            sts_region: value(ENV_STS_REGION),
            ecs_metadata_role: value(ENV_ECS_METADATA),
            ecs_metadata_disabled: flag(ENV_ECS_METADATA_DISABLED),
            imds_v1_disabled: flag(ENV_IMDSV1_DISABLED),
            cli_profile_disabled: flag(ENV_CLI_PROFILE_DISABLED),
        }
    }

    /// True when all three OIDC federation variables are present.
    pub fn has_oidc(&self) -> bool {
        self.oidc_token_file.is_some() && self.oidc_provider_arn.is_some() && self.role_arn.is_some()
    }
}
