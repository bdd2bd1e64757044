//! # Credentials Agent Library
//!
//! Resolves cloud credentials from static keys, STS delegation (RAM role ARN,
//! OIDC federation, RSA key pair), the ECS instance metadata service or a
//! credentials URI, and caches refreshable ones until shortly before expiry.
//!
//! Modules:
//! - `credential`: unified handle over one provider or the default chain
//! - `providers`: one provider per trust source, plus the chain resolver
//! - `cache`: credential values and the expiration-aware cache
//! - `config`: flat provider configuration, validation, agent settings
//! - `signer`: RPC request signing (HMAC-SHA1, SHA256withRSA)
//! - `transport`: HTTP collaborator
//! - `server`: agent HTTP surface

pub mod cache;
pub mod config;
pub mod credential;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod providers;
pub mod server;
pub mod signer;
pub mod tests;
pub mod transport;
pub mod utils;

pub use crate::cache::credential::{CredentialType, CredentialValue};
pub use crate::config::provider::Config;
pub use crate::credential::Credential;
pub use crate::error::{CredentialError, Result};
