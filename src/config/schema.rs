//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! gateway. All types derive Serde traits for deserialization from config
//! files.

use serde::{Deserialize, Serialize};

use crate::http::fallback::LoginAudience;
use crate::routing::{HttpsPolicy, OriginId};
use crate::signing::ResourceMatchMode;

/// Root configuration for the edge gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream origin addresses.
    pub origins: OriginsConfig,

    /// Named cache policies referenced by behaviors.
    pub cache_policies: Vec<CachePolicyConfig>,

    /// Ordered behavior rules. Declaration order encodes priority.
    pub behaviors: Vec<BehaviorConfig>,

    /// The catch-all behavior.
    pub default_behavior: DefaultBehaviorConfig,

    /// Signed-URL verification settings.
    pub signing: SigningConfig,

    /// Error-response remapping settings.
    pub error_pages: ErrorPagesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            origins: OriginsConfig::default(),
            cache_policies: vec![CachePolicyConfig {
                name: "default".to_string(),
                min_ttl_secs: 0,
                default_ttl_secs: 60,
                max_ttl_secs: 3600,
            }],
            behaviors: Vec::new(),
            default_behavior: DefaultBehaviorConfig::default(),
            signing: SigningConfig::default(),
            error_pages: ErrorPagesConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl EdgeConfig {
    pub fn cache_policy(&self, name: &str) -> Option<&CachePolicyConfig> {
        self.cache_policies.iter().find(|p| p.name == name)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream origin addresses, one per origin id.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginsConfig {
    /// Website origin address (e.g., "127.0.0.1:3000").
    pub website_address: String,

    /// Login origin address.
    pub login_address: String,
}

impl Default for OriginsConfig {
    fn default() -> Self {
        Self {
            website_address: "127.0.0.1:3000".to_string(),
            login_address: "127.0.0.1:3001".to_string(),
        }
    }
}

/// A named cache policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CachePolicyConfig {
    /// Name behaviors use to reference this policy.
    pub name: String,

    /// Minimum freshness in seconds.
    #[serde(default)]
    pub min_ttl_secs: u64,

    /// Freshness applied when the origin gives no hint.
    pub default_ttl_secs: u64,

    /// Upper bound on freshness.
    pub max_ttl_secs: u64,
}

/// One behavior rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BehaviorConfig {
    /// Path pattern: exact, or a literal prefix with a trailing `*`.
    pub pattern: String,

    /// Which origin serves matching requests.
    pub origin: OriginId,

    /// Name of the cache policy to attach.
    pub cache_policy: String,

    /// Gate matching requests behind a signed access token.
    #[serde(default)]
    pub require_signed_token: bool,

    /// Transport-security requirement.
    #[serde(default = "default_https_policy")]
    pub https: HttpsPolicy,
}

fn default_https_policy() -> HttpsPolicy {
    HttpsPolicy::RedirectToHttps
}

/// The catch-all behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DefaultBehaviorConfig {
    pub origin: OriginId,
    pub cache_policy: String,
    pub require_signed_token: bool,
    pub https: HttpsPolicy,
}

impl Default for DefaultBehaviorConfig {
    fn default() -> Self {
        Self {
            origin: OriginId::Website,
            cache_policy: "default".to_string(),
            require_signed_token: false,
            https: HttpsPolicy::RedirectToHttps,
        }
    }
}

/// A trusted public key, provisioned and rotated externally.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrustedKeyConfig {
    /// Opaque key identifier presented in the `Key-Pair-Id` parameter.
    pub key_pair_id: String,

    /// Path to the SubjectPublicKeyInfo PEM file.
    pub public_key_path: String,
}

/// Signed-URL verification settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Currently-valid public keys. Several may be valid at once during
    /// rotation.
    pub trusted_keys: Vec<TrustedKeyConfig>,

    /// Grace window tolerated between issuer and verifier clocks.
    pub clock_skew_secs: u64,

    /// How a token's resource is matched against the request.
    pub resource_match: ResourceMatchMode,

    /// Bound on simultaneously running signature verifications.
    pub max_concurrent_verifications: usize,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            trusted_keys: Vec::new(),
            clock_skew_secs: 0,
            resource_match: ResourceMatchMode::Exact,
            max_concurrent_verifications: 64,
        }
    }
}

/// Error-response remapping settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ErrorPagesConfig {
    /// Which login entry point denied callers land on.
    pub login_audience: LoginAudience,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON logs instead of the pretty format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
