//! Token wire format.
//!
//! A signed access token travels as three query parameters: `Policy`
//! (base64url canonical policy document), `Signature` (base64url raw RSA
//! signature), and `Key-Pair-Id` (opaque key identifier). base64url here
//! is always unpadded.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use url::Url;

use crate::signing::policy::PolicyDocument;
use crate::signing::{AuthError, SignError};

pub const POLICY_PARAM: &str = "Policy";
pub const SIGNATURE_PARAM: &str = "Signature";
pub const KEY_PAIR_ID_PARAM: &str = "Key-Pair-Id";

/// A decoded, time-limited access grant over one resource URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAccessToken {
    resource_url: String,
    expires_at: i64,
    key_pair_id: String,
    signature: Vec<u8>,
}

impl SignedAccessToken {
    pub fn new(
        resource_url: impl Into<String>,
        expires_at: i64,
        key_pair_id: impl Into<String>,
        signature: Vec<u8>,
    ) -> Self {
        Self {
            resource_url: resource_url.into(),
            expires_at,
            key_pair_id: key_pair_id.into(),
            signature,
        }
    }

    pub fn resource_url(&self) -> &str {
        &self.resource_url
    }

    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    pub fn key_pair_id(&self) -> &str {
        &self.key_pair_id
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Encode for transport.
    pub fn encode(&self) -> Result<WireToken, serde_json::Error> {
        let policy = PolicyDocument::new(&self.resource_url, self.expires_at).canonical_json()?;
        Ok(WireToken {
            policy: URL_SAFE_NO_PAD.encode(policy.as_bytes()),
            signature: URL_SAFE_NO_PAD.encode(&self.signature),
            key_pair_id: self.key_pair_id.clone(),
        })
    }

    /// The token's resource URL with the wire parameters appended.
    pub fn signed_url(&self) -> Result<String, SignError> {
        let wire = self.encode()?;
        let mut url = Url::parse(&self.resource_url)?;
        for (name, value) in wire.query_pairs() {
            url.query_pairs_mut().append_pair(name, value);
        }
        Ok(url.into())
    }
}

/// The encoded triple carried in the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireToken {
    pub policy: String,
    pub signature: String,
    pub key_pair_id: String,
}

impl WireToken {
    /// Extract the token parameters from a raw query string. Returns `None`
    /// when any of the three parameters is absent.
    pub fn from_query(query: &str) -> Option<Self> {
        let mut policy = None;
        let mut signature = None;
        let mut key_pair_id = None;
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match name.as_ref() {
                POLICY_PARAM => policy = Some(value.into_owned()),
                SIGNATURE_PARAM => signature = Some(value.into_owned()),
                KEY_PAIR_ID_PARAM => key_pair_id = Some(value.into_owned()),
                _ => {}
            }
        }
        Some(Self {
            policy: policy?,
            signature: signature?,
            key_pair_id: key_pair_id?,
        })
    }

    pub fn query_pairs(&self) -> [(&'static str, &str); 3] {
        [
            (POLICY_PARAM, self.policy.as_str()),
            (SIGNATURE_PARAM, self.signature.as_str()),
            (KEY_PAIR_ID_PARAM, self.key_pair_id.as_str()),
        ]
    }

    /// Decode the wire form back into a token. Any decoding failure is
    /// uniformly malformed; the caller never learns which layer broke.
    pub fn decode(&self) -> Result<SignedAccessToken, AuthError> {
        let policy_bytes = URL_SAFE_NO_PAD
            .decode(&self.policy)
            .map_err(|_| AuthError::Malformed)?;
        let document =
            PolicyDocument::from_json(&policy_bytes).map_err(|_| AuthError::Malformed)?;
        let resource = document.resource().ok_or(AuthError::Malformed)?;
        let expires_at = document.expires_at().ok_or(AuthError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(&self.signature)
            .map_err(|_| AuthError::Malformed)?;
        Ok(SignedAccessToken::new(
            resource,
            expires_at,
            &self.key_pair_id,
            signature,
        ))
    }
}
