//! Token verification.
//!
//! # Responsibilities
//! - Hold the trusted key set, addressed by key pair id
//! - Recompute and verify the canonical policy signature
//! - Enforce expiry (exclusive upper bound) with an optional skew grace
//! - Match the token's embedded resource against the requested resource
//!
//! # Design Decisions
//! - Verification tries only the key named by the presented Key-Pair-Id,
//!   never the whole set (rotation keeps several keys valid at once)
//! - CPU-only: no I/O on the verification path
//! - Failure kinds stay internal; callers map every kind to one denial

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use serde::{Deserialize, Serialize};
use sha1::Sha1;

use crate::config::schema::SigningConfig;
use crate::signing::policy::PolicyDocument;
use crate::signing::token::WireToken;
use crate::signing::{unix_now, AuthError};

/// Error raised while loading a public key into the trusted set.
#[derive(Debug, thiserror::Error)]
#[error("failed to load public key {path:?}: {source}")]
pub struct KeyLoadError {
    pub path: String,
    #[source]
    pub source: rsa::pkcs8::spki::Error,
}

/// How a token's embedded resource is matched against the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceMatchMode {
    /// Token resource must equal the requested resource byte-for-byte.
    #[default]
    Exact,
    /// Token resource must be a prefix of the requested resource.
    Prefix,
}

/// Currently-valid public keys, addressed by key pair id.
#[derive(Default)]
pub struct TrustedKeySet {
    keys: HashMap<String, VerifyingKey<Sha1>>,
}

impl fmt::Debug for TrustedKeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustedKeySet")
            .field("key_pair_ids", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TrustedKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key_pair_id: impl Into<String>, public_key: RsaPublicKey) {
        self.keys
            .insert(key_pair_id.into(), VerifyingKey::new(public_key));
    }

    /// Load a SubjectPublicKeyInfo PEM file into the set.
    pub fn insert_pem_file(
        &mut self,
        key_pair_id: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<(), KeyLoadError> {
        let path = path.as_ref();
        let public_key =
            RsaPublicKey::read_public_key_pem_file(path).map_err(|source| KeyLoadError {
                path: path.display().to_string(),
                source,
            })?;
        self.insert(key_pair_id, public_key);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn verifying_key(&self, key_pair_id: &str) -> Option<&VerifyingKey<Sha1>> {
        self.keys.get(key_pair_id)
    }
}

/// Verifies presented tokens against the trusted key set.
#[derive(Debug)]
pub struct TokenVerifier {
    keys: TrustedKeySet,
    clock_skew: Duration,
    match_mode: ResourceMatchMode,
}

impl TokenVerifier {
    pub fn new(keys: TrustedKeySet, clock_skew: Duration, match_mode: ResourceMatchMode) -> Self {
        Self {
            keys,
            clock_skew,
            match_mode,
        }
    }

    /// Load the trusted key files named by the configuration and build the
    /// verifier. Runs once at startup; a missing or malformed key file
    /// refuses startup.
    pub fn from_config(config: &SigningConfig) -> Result<Self, KeyLoadError> {
        let mut keys = TrustedKeySet::new();
        for entry in &config.trusted_keys {
            keys.insert_pem_file(&entry.key_pair_id, &entry.public_key_path)?;
        }
        Ok(Self::new(
            keys,
            Duration::from_secs(config.clock_skew_secs),
            config.resource_match,
        ))
    }

    /// Verify a presented token for the requested resource against the
    /// current wall clock.
    pub fn verify(&self, wire: &WireToken, resource: &str) -> Result<(), AuthError> {
        self.verify_at(wire, resource, unix_now())
    }

    /// Verification core with an explicit clock, exercised directly by the
    /// expiry-boundary tests.
    pub fn verify_at(&self, wire: &WireToken, resource: &str, now: i64) -> Result<(), AuthError> {
        let key = self
            .keys
            .verifying_key(&wire.key_pair_id)
            .ok_or_else(|| AuthError::UnknownKey {
                key_pair_id: wire.key_pair_id.clone(),
            })?;

        let token = wire.decode()?;

        // The signature is checked against bytes recomputed from the decoded
        // fields, so any mutation of either field invalidates it.
        let canonical = PolicyDocument::new(token.resource_url(), token.expires_at())
            .canonical_json()
            .map_err(|_| AuthError::Malformed)?;
        let signature =
            Signature::try_from(token.signature()).map_err(|_| AuthError::BadSignature)?;
        key.verify(canonical.as_bytes(), &signature)
            .map_err(|_| AuthError::BadSignature)?;

        // Exclusive upper bound: a token expiring exactly now is dead.
        // Saturate so an extreme expiry cannot wrap into the past.
        let skew = i64::try_from(self.clock_skew.as_secs()).unwrap_or(i64::MAX);
        let deadline = token.expires_at().saturating_add(skew);
        if now >= deadline {
            return Err(AuthError::Expired {
                expires_at: token.expires_at(),
                now,
            });
        }

        let matched = match self.match_mode {
            ResourceMatchMode::Exact => resource == token.resource_url(),
            ResourceMatchMode::Prefix => resource.starts_with(token.resource_url()),
        };
        if !matched {
            return Err(AuthError::ResourceMismatch);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::signer::UrlSigner;
    use crate::signing::test_keys::test_private_key;
    use rsa::traits::PublicKeyParts as _;

    const RESOURCE: &str = "https://cdn.example.com/private/report.pdf";

    fn signer() -> UrlSigner {
        UrlSigner::new(test_private_key().clone(), "K1")
    }

    fn verifier(skew_secs: u64, mode: ResourceMatchMode) -> TokenVerifier {
        let mut keys = TrustedKeySet::new();
        keys.insert("K1", test_private_key().to_public_key());
        TokenVerifier::new(keys, Duration::from_secs(skew_secs), mode)
    }

    #[test]
    fn test_round_trip_verifies() {
        let token = signer().sign(RESOURCE, Duration::from_secs(300)).unwrap();
        let wire = token.encode().unwrap();
        let verifier = verifier(0, ResourceMatchMode::Exact);
        assert!(verifier.verify(&wire, RESOURCE).is_ok());
        // No hidden single-use state: a second check agrees with the first.
        assert!(verifier.verify(&wire, RESOURCE).is_ok());
    }

    #[test]
    fn test_unknown_key() {
        let mut wire = signer()
            .sign(RESOURCE, Duration::from_secs(300))
            .unwrap()
            .encode()
            .unwrap();
        wire.key_pair_id = "K9".to_string();
        let err = verifier(0, ResourceMatchMode::Exact)
            .verify(&wire, RESOURCE)
            .unwrap_err();
        assert!(matches!(err, AuthError::UnknownKey { key_pair_id } if key_pair_id == "K9"));
    }

    #[test]
    fn test_tampered_policy_fails() {
        let wire = signer()
            .sign(RESOURCE, Duration::from_secs(300))
            .unwrap()
            .encode()
            .unwrap();
        let verifier = verifier(0, ResourceMatchMode::Exact);
        // Flip one bit in every position of the encoded policy; each
        // mutation must be rejected as either malformed or a bad signature.
        let bytes = wire.policy.as_bytes();
        for i in 0..bytes.len() {
            let mut corrupted = bytes.to_vec();
            corrupted[i] ^= 0x01;
            let Ok(policy) = String::from_utf8(corrupted) else {
                continue;
            };
            let tampered = WireToken {
                policy,
                ..wire.clone()
            };
            if tampered == wire {
                continue;
            }
            assert!(matches!(
                tampered.decode().and_then(|_| {
                    verifier.verify(&tampered, RESOURCE)
                }),
                Err(AuthError::Malformed) | Err(AuthError::BadSignature)
            ));
        }
    }

    #[test]
    fn test_tampered_signature_fails() {
        let mut wire = signer()
            .sign(RESOURCE, Duration::from_secs(300))
            .unwrap()
            .encode()
            .unwrap();
        let mut chars: Vec<char> = wire.signature.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        wire.signature = chars.into_iter().collect();
        let err = verifier(0, ResourceMatchMode::Exact)
            .verify(&wire, RESOURCE)
            .unwrap_err();
        assert!(matches!(err, AuthError::BadSignature));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let token = signer().sign_until(RESOURCE, 1_000_000).unwrap();
        let wire = token.encode().unwrap();
        let verifier = verifier(0, ResourceMatchMode::Exact);

        // One second before expiry: accepted.
        assert!(verifier.verify_at(&wire, RESOURCE, 999_999).is_ok());
        // Exactly at expiry: rejected.
        assert!(matches!(
            verifier.verify_at(&wire, RESOURCE, 1_000_000),
            Err(AuthError::Expired { .. })
        ));
        // One second after: rejected.
        assert!(matches!(
            verifier.verify_at(&wire, RESOURCE, 1_000_001),
            Err(AuthError::Expired { .. })
        ));
    }

    #[test]
    fn test_clock_skew_grace_widens_expiry() {
        let token = signer().sign_until(RESOURCE, 1_000_000).unwrap();
        let wire = token.encode().unwrap();
        let verifier = verifier(30, ResourceMatchMode::Exact);

        assert!(verifier.verify_at(&wire, RESOURCE, 1_000_029).is_ok());
        assert!(matches!(
            verifier.verify_at(&wire, RESOURCE, 1_000_030),
            Err(AuthError::Expired { .. })
        ));
    }

    #[test]
    fn test_extreme_expiry_does_not_wrap() {
        // Skew pushing the deadline past the epoch range must saturate, not
        // wrap into the past and falsely expire the token.
        let token = signer().sign_until(RESOURCE, i64::MAX).unwrap();
        let wire = token.encode().unwrap();
        let verifier = verifier(30, ResourceMatchMode::Exact);
        assert!(verifier.verify_at(&wire, RESOURCE, 1_000_000).is_ok());
        assert!(matches!(
            verifier.verify_at(&wire, RESOURCE, i64::MAX),
            Err(AuthError::Expired { .. })
        ));
    }

    #[test]
    fn test_resource_mismatch() {
        let token = signer().sign(RESOURCE, Duration::from_secs(300)).unwrap();
        let wire = token.encode().unwrap();
        let err = verifier(0, ResourceMatchMode::Exact)
            .verify(&wire, "https://cdn.example.com/private/other.pdf")
            .unwrap_err();
        assert!(matches!(err, AuthError::ResourceMismatch));
    }

    #[test]
    fn test_prefix_match_mode() {
        let token = signer()
            .sign("https://cdn.example.com/private/", Duration::from_secs(300))
            .unwrap();
        let wire = token.encode().unwrap();
        let verifier = verifier(0, ResourceMatchMode::Prefix);
        assert!(verifier.verify(&wire, RESOURCE).is_ok());
        assert!(matches!(
            verifier.verify(&wire, "https://cdn.example.com/public/logo.png"),
            Err(AuthError::ResourceMismatch)
        ));
    }

    #[test]
    fn test_rotation_key_selected_by_id_only() {
        // Two valid keys; the verifier must use exactly the presented id.
        let old_key = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let mut keys = TrustedKeySet::new();
        keys.insert("K1", test_private_key().to_public_key());
        keys.insert("K0", old_key.to_public_key());
        assert_eq!(keys.len(), 2);
        let verifier = TokenVerifier::new(
            keys,
            Duration::ZERO,
            ResourceMatchMode::Exact,
        );

        // Token signed by K1's private key but presented as K0 must fail
        // even though K1 would accept it.
        let mut wire = signer()
            .sign(RESOURCE, Duration::from_secs(300))
            .unwrap()
            .encode()
            .unwrap();
        wire.key_pair_id = "K0".to_string();
        assert!(matches!(
            verifier.verify(&wire, RESOURCE),
            Err(AuthError::BadSignature)
        ));

        // Sanity: keys differ.
        assert_ne!(old_key.to_public_key().n(), test_private_key().to_public_key().n());
    }
}
