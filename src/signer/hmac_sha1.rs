use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::{CredentialError, Result};
use crate::signer::RequestSigner;

type HmacSha1 = Hmac<Sha1>;

/// Classic access-key signature (`HMAC-SHA1`, key = `secret&`).
#[derive(Clone)]
pub struct AccessKeySigner {
    access_key_id: String,
    access_key_secret: String,
    security_token: Option<String>,
}

impl AccessKeySigner {
    pub fn new(
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
        security_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            security_token,
        }
    }
}

impl fmt::Debug for AccessKeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessKeySigner")
            .field("access_key_id", &self.access_key_id)
            .finish_non_exhaustive()
    }
}

impl RequestSigner for AccessKeySigner {
    fn signature_method(&self) -> &'static str {
        "HMAC-SHA1"
    }

    fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    fn security_token(&self) -> Option<&str> {
        self.security_token.as_deref()
    }

    fn sign(&self, string_to_sign: &str) -> Result<String> {
        let key = format!("{}&", self.access_key_secret);
        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|err| CredentialError::protocol(format!("invalid signing key: {err}")))?;
        mac.update(string_to_sign.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_published_rpc_signature() {
        let signer = AccessKeySigner::new("testid", "testsecret", None);
        let string_to_sign = "GET&%2F&AccessKeyId%3Dtestid%26Action%3DDescribeRegions%26Format%3DXML%26SignatureMethod%3DHMAC-SHA1%26SignatureNonce%3D3ee8c1b8-83d3-44af-a94f-4e0ad82fd6cf%26SignatureVersion%3D1.0%26Timestamp%3D2016-02-23T12%253A46%253A24Z%26Version%3D2014-05-26";
        assert_eq!(signer.sign(string_to_sign).unwrap(), "OLeaidS1JvxuMvnyHOwuJ+uX5qY=");
    }

    #[test]
    fn debug_hides_secret() {
        let signer = AccessKeySigner::new("id", "hidden-secret", None);
        assert!(!format!("{signer:?}").contains("hidden-secret"));
    }
}
