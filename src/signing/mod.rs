//! Signed access tokens.
//!
//! # Data Flow
//! ```text
//! Issuance (operator side):
//!     resource URL + TTL
//!     → policy.rs (canonical policy document, byte-exact)
//!     → signer.rs (RSA-SHA1 over the canonical bytes)
//!     → token.rs (base64url wire encoding, no padding)
//!
//! Verification (per request):
//!     Policy / Signature / Key-Pair-Id query parameters
//!     → token.rs (decode)
//!     → verifier.rs (key lookup, signature, expiry, resource match)
//! ```
//!
//! # Design Decisions
//! - The signature covers exactly the canonical policy bytes; the verifier
//!   recomputes them from decoded fields rather than trusting the wire copy
//! - Every verification failure is logged with its specific kind but maps
//!   to the same uniform client-facing denial
//! - SHA-1 is mandated by the legacy signing scheme this format is
//!   compatible with

use std::time::SystemTime;

use thiserror::Error;

pub mod policy;
pub mod signer;
pub mod token;
pub mod verifier;

pub use policy::PolicyDocument;
pub use signer::UrlSigner;
pub use token::{SignedAccessToken, WireToken};
pub use verifier::{KeyLoadError, ResourceMatchMode, TokenVerifier, TrustedKeySet};

/// Error raised while issuing a signed URL.
#[derive(Debug, Error)]
pub enum SignError {
    #[error("ttl must be positive")]
    InvalidTtl,
    #[error("failed to load private key: {0}")]
    Key(#[from] rsa::pkcs8::Error),
    #[error("failed to canonicalize policy document: {0}")]
    Canonicalize(#[from] serde_json::Error),
    #[error("resource is not a valid URL: {0}")]
    InvalidResource(#[from] url::ParseError),
}

/// Error raised while verifying a presented token.
///
/// All variants map to the same uniform client-facing denial; the variant
/// only ever reaches internal diagnostics.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no trusted key for key pair id {key_pair_id:?}")]
    UnknownKey { key_pair_id: String },
    #[error("malformed token")]
    Malformed,
    #[error("signature does not match policy document")]
    BadSignature,
    #[error("token expired at {expires_at} (now {now})")]
    Expired { expires_at: i64, now: i64 },
    #[error("token resource does not cover the requested resource")]
    ResourceMismatch,
    /// Verification could not be carried out at all (the verification task
    /// failed). Deliberately indistinguishable from a bad token client-side.
    #[error("verification unavailable")]
    Unavailable,
}

impl AuthError {
    /// Stable label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::UnknownKey { .. } => "unknown_key",
            AuthError::Malformed => "malformed",
            AuthError::BadSignature => "bad_signature",
            AuthError::Expired { .. } => "expired",
            AuthError::ResourceMismatch => "resource_mismatch",
            AuthError::Unavailable => "unavailable",
        }
    }
}

/// Seconds since the Unix epoch.
pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels_are_stable() {
        // These labels feed structured log queries; renaming one is a
        // breaking change for dashboards.
        assert_eq!(
            AuthError::UnknownKey {
                key_pair_id: "K1".to_string()
            }
            .kind(),
            "unknown_key"
        );
        assert_eq!(AuthError::Malformed.kind(), "malformed");
        assert_eq!(AuthError::BadSignature.kind(), "bad_signature");
        assert_eq!(
            AuthError::Expired {
                expires_at: 1,
                now: 2
            }
            .kind(),
            "expired"
        );
        assert_eq!(AuthError::ResourceMismatch.kind(), "resource_mismatch");
        assert_eq!(AuthError::Unavailable.kind(), "unavailable");
    }
}
