//! Signed URL issuance.
//!
//! Held by the operator-side issuance tool, not by the gateway itself; the
//! gateway only verifies. The signature is RSA PKCS#1 v1.5 over the SHA-1
//! digest of the canonical policy bytes, as the legacy scheme mandates.

use std::path::Path;
use std::time::Duration;

use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha1::Sha1;

use crate::signing::policy::PolicyDocument;
use crate::signing::token::SignedAccessToken;
use crate::signing::{unix_now, SignError};

/// Issues time-limited signed access tokens for resource URLs.
pub struct UrlSigner {
    signing_key: SigningKey<Sha1>,
    key_pair_id: String,
}

impl UrlSigner {
    pub fn new(private_key: RsaPrivateKey, key_pair_id: impl Into<String>) -> Self {
        Self {
            signing_key: SigningKey::new(private_key),
            key_pair_id: key_pair_id.into(),
        }
    }

    /// Load the private key from a PKCS#8 PEM file.
    pub fn from_pem_file(
        path: impl AsRef<Path>,
        key_pair_id: impl Into<String>,
    ) -> Result<Self, SignError> {
        let private_key = RsaPrivateKey::read_pkcs8_pem_file(path)?;
        Ok(Self::new(private_key, key_pair_id))
    }

    pub fn key_pair_id(&self) -> &str {
        &self.key_pair_id
    }

    /// Issue a token expiring `ttl` from now. An expiry beyond the epoch
    /// range saturates rather than wrapping.
    pub fn sign(&self, resource_url: &str, ttl: Duration) -> Result<SignedAccessToken, SignError> {
        if ttl.is_zero() {
            return Err(SignError::InvalidTtl);
        }
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        self.sign_until(resource_url, unix_now().saturating_add(ttl_secs))
    }

    /// Issue a token with an explicit expiry instant.
    pub fn sign_until(
        &self,
        resource_url: &str,
        expires_at: i64,
    ) -> Result<SignedAccessToken, SignError> {
        let canonical = PolicyDocument::new(resource_url, expires_at).canonical_json()?;
        let signature = self.signing_key.sign(canonical.as_bytes()).to_vec();
        Ok(SignedAccessToken::new(
            resource_url,
            expires_at,
            &self.key_pair_id,
            signature,
        ))
    }

    /// Convenience: issue a token and render the full signed URL.
    pub fn signed_url(&self, resource_url: &str, ttl: Duration) -> Result<String, SignError> {
        self.sign(resource_url, ttl)?.signed_url()
    }
}
