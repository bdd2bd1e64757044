//! RPC-style request signing for STS calls.
//!
//! Both signers share the same canonicalisation: every query and body parameter is
//! percent-encoded (RFC 3986), sorted by key and joined; the string to sign is
//! `METHOD&%2F&<encoded canonical query>`.

use std::collections::BTreeMap;
use std::fmt::Debug;

use uuid::Uuid;

use crate::error::Result;

pub mod hmac_sha1;
pub mod rsa_sha256;

pub use hmac_sha1::AccessKeySigner;
pub use rsa_sha256::KeyPairSigner;

pub const SIGNATURE_VERSION: &str = "1.0";

/// Signs the canonical string of an RPC request on behalf of one identity.
pub trait RequestSigner: Send + Sync + Debug {
    /// Value of the `SignatureMethod` parameter.
    fn signature_method(&self) -> &'static str;

    /// Value of the `SignatureType` parameter, when the scheme needs one.
    fn signature_type(&self) -> Option<&'static str> {
        None
    }

    fn access_key_id(&self) -> &str;

    fn security_token(&self) -> Option<&str> {
        None
    }

    /// Returns the base64 signature of `string_to_sign`.
    fn sign(&self, string_to_sign: &str) -> Result<String>;
}

pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// `k=v&k=v` with both sides percent-encoded, keys in lexical order.
pub fn url_formed(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn string_to_sign(method: &str, params: &BTreeMap<String, String>) -> String {
    format!("{}&{}&{}", method, percent_encode("/"), percent_encode(&url_formed(params)))
}

/// Adds the signature parameters to `query` and signs over `query` and `body` together.
pub fn sign_request(
    signer: &dyn RequestSigner,
    method: &str,
    query: &mut BTreeMap<String, String>,
    body: &BTreeMap<String, String>,
) -> Result<()> {
    query.insert("SignatureMethod".into(), signer.signature_method().into());
    query.insert("SignatureVersion".into(), SIGNATURE_VERSION.into());
    query.insert("SignatureNonce".into(), Uuid::new_v4().to_string());
    query.insert("AccessKeyId".into(), signer.access_key_id().into());
    if let Some(signature_type) = signer.signature_type() {
        query.insert("SignatureType".into(), signature_type.into());
    }
    if let Some(token) = signer.security_token().filter(|t| !t.is_empty()) {
        query.insert("SecurityToken".into(), token.into());
    }

    let mut signed = query.clone();
    signed.extend(body.iter().map(|(k, v)| (k.clone(), v.clone())));
    let signature = signer.sign(&string_to_sign(method, &signed))?;
    query.insert("Signature".into(), signature);
    Ok(())
}
