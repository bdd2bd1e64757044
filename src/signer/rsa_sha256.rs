use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha2::Sha256;

use crate::error::{CredentialError, Result};
use crate::signer::RequestSigner;

/// Key-pair signature (`SHA256withRSA`, `SignatureType=PRIVATEKEY`).
///
/// The PEM is kept as read from disk and only parsed when signing, so a
/// malformed key surfaces as a refresh error rather than at construction.
#[derive(Clone)]
pub struct KeyPairSigner {
    public_key_id: String,
    private_key_pem: String,
}

impl KeyPairSigner {
    pub fn new(public_key_id: impl Into<String>, private_key_pem: impl Into<String>) -> Self {
        Self {
            public_key_id: public_key_id.into(),
            private_key_pem: private_key_pem.into(),
        }
    }

    fn private_key(&self) -> Result<RsaPrivateKey> {
        let pem = self.private_key_pem.trim();
        RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|err| CredentialError::protocol(format!("invalid private key: {err}")))
    }
}

impl fmt::Debug for KeyPairSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPairSigner")
            .field("public_key_id", &self.public_key_id)
            .finish_non_exhaustive()
    }
}

impl RequestSigner for KeyPairSigner {
    fn signature_method(&self) -> &'static str {
        "SHA256withRSA"
    }

    fn signature_type(&self) -> Option<&'static str> {
        Some("PRIVATEKEY")
    }

    fn access_key_id(&self) -> &str {
        &self.public_key_id
    }

    fn sign(&self, string_to_sign: &str) -> Result<String> {
        let signing_key = SigningKey::<Sha256>::new(self.private_key()?);
        let signature = signing_key
            .try_sign(string_to_sign.as_bytes())
            .map_err(|err| CredentialError::protocol(format!("rsa signing failed: {err}")))?;
        Ok(STANDARD.encode(signature.to_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PKCS8_KEY: &str = include_str!("testdata/key_pair_pkcs8.pem");
    const PKCS1_KEY: &str = include_str!("testdata/key_pair_pkcs1.pem");
    const MESSAGE: &str = "POST&%2F&Action%3DGenerateSessionAccessKey";
    const EXPECTED: &str = "MbQTtiSYSacB8LbseU3yVu6sijtY0YVynUflUU887s3XezKxKWSl4lwLds9sAnHI6C3q1dWT5BhWeXEpwqVP6uYLGVz+MzR02dqwixbaDjjh8vyN6KDvx10L/sJ//URlaIArr7dq9MEz805Uf4Kr5UQFwujNduVwwlFCWhNruNo=";

    #[test]
    fn signs_with_pkcs8_and_pkcs1_keys() {
        for pem in [PKCS8_KEY, PKCS1_KEY] {
            let signer = KeyPairSigner::new("KP-id", pem);
            assert_eq!(signer.sign(MESSAGE).unwrap(), EXPECTED);
        }
    }

    #[test]
    fn malformed_key_fails_at_signing_time() {
        let signer = KeyPairSigner::new("KP-id", "----\nthis is privatekey");
        let err = signer.sign(MESSAGE).unwrap_err();
        assert!(err.to_string().starts_with("invalid private key"));
    }
}
