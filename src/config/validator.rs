//! Construction-time validation of provider configurations.
//!
//! Each provider checks its required fields in a fixed order and reports only the
//! first failure. Callers match these messages verbatim:
//!
//! | type            | order                                                          |
//! |-----------------|----------------------------------------------------------------|
//! | access_key      | access key id, access key secret                               |
//! | sts             | access key id, access key secret, security token               |
//! | ram_role_arn    | access key id, access key secret, role ARN, session duration   |
//! | rsa_key_pair    | private key file, key file readable, public key id, duration   |
//! | bearer          | bearer token                                                   |
//! | oidc_role_arn   | token file path, provider ARN, role ARN, session duration      |
//! | credentials_uri | url                                                            |
//! | ecs_ram_role    | nothing required                                               |
//!
//! Nothing here touches the network.

use crate::error::{CredentialError, Result};

pub const ACCESS_KEY_ID_EMPTY: &str = "the access key id is empty";
pub const ACCESS_KEY_SECRET_EMPTY: &str = "the access key secret is empty";
pub const SECURITY_TOKEN_EMPTY: &str = "the security token is empty";
pub const ROLE_ARN_EMPTY: &str = "the RoleArn is empty";
pub const PRIVATE_KEY_FILE_EMPTY: &str = "PrivateKeyFile cannot be empty";
pub const PUBLIC_KEY_ID_EMPTY: &str = "PublicKeyId cannot be empty";
pub const BEARER_TOKEN_EMPTY: &str = "BearerToken cannot be empty";
pub const OIDC_TOKEN_FILE_PATH_EMPTY: &str = "the OIDCTokenFilePath is empty";
pub const OIDC_PROVIDER_ARN_EMPTY: &str = "the OIDCProviderARN is empty";
pub const URL_EMPTY: &str = "the url is empty";
pub const SESSION_DURATION_OUT_OF_RANGE: &str =
    "the Assume Role session duration should be in the range of 15min - max duration seconds";
pub const KEY_PAIR_DURATION_OUT_OF_RANGE: &str =
    "[InvalidParam]:Key Pair session duration should be in the range of 15min - 1Hr";

pub const DEFAULT_DURATION_SECONDS: u64 = 3600;
pub const MIN_DURATION_SECONDS: u64 = 900;
pub const MAX_KEY_PAIR_DURATION_SECONDS: u64 = 3600;

/// Returns the value when present and non-empty, else a validation error.
pub fn require(value: &Option<String>, message: &str) -> Result<String> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v.to_owned()),
        _ => Err(CredentialError::validation(message)),
    }
}

/// Keeps only non-empty optional values.
pub fn optional(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.is_empty())
}

/// STS assume-role duration: 3600 by default, at least 900.
pub fn session_duration(value: Option<u64>) -> Result<u64> {
    let duration = value.filter(|d| *d != 0).unwrap_or(DEFAULT_DURATION_SECONDS);
    if duration < MIN_DURATION_SECONDS {
        return Err(CredentialError::validation(SESSION_DURATION_OUT_OF_RANGE));
    }
    Ok(duration)
}

/// Key-pair session duration: 3600 by default, within 900..=3600.
pub fn key_pair_duration(value: Option<u64>) -> Result<u64> {
    let duration = value.filter(|d| *d != 0).unwrap_or(DEFAULT_DURATION_SECONDS);
    if !(MIN_DURATION_SECONDS..=MAX_KEY_PAIR_DURATION_SECONDS).contains(&duration) {
        return Err(CredentialError::validation(KEY_PAIR_DURATION_OUT_OF_RANGE));
    }
    Ok(duration)
}
