//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (behaviors reference existing policies)
//! - Validate TTL bound ordering
//! - Detect duplicate exact patterns
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), errors>
//! - Runs before config is accepted into the system
//! - Shadowed (unreachable) rules are not errors; the table builder lints
//!   them so they can be logged once the subscriber is installed

use std::collections::HashSet;
use std::time::Duration;

use thiserror::Error;

use crate::cache::{CachePolicy, InvalidPolicy};
use crate::config::schema::EdgeConfig;
use crate::routing::{PathPattern, PatternError};

/// One semantic problem with a configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("behavior {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: PatternError,
    },
    #[error("duplicate exact pattern {0:?} (ambiguous priority)")]
    DuplicateExactPattern(String),
    #[error("cache policy {name:?}: {source}")]
    InvalidTtlBounds { name: String, source: InvalidPolicy },
    #[error("cache policy {0:?} is defined more than once")]
    DuplicateCachePolicy(String),
    #[error("{referrer} references unknown cache policy {name:?}")]
    UnknownCachePolicy { referrer: String, name: String },
    #[error("trusted key {0:?} is listed more than once")]
    DuplicateKeyPairId(String),
    #[error("behaviors require signed tokens but no trusted keys are configured")]
    NoTrustedKeys,
}

/// Validate a parsed configuration. `Err` carries every error found.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut policy_names = HashSet::new();
    for policy in &config.cache_policies {
        if !policy_names.insert(policy.name.as_str()) {
            errors.push(ValidationError::DuplicateCachePolicy(policy.name.clone()));
        }
        if let Err(source) = CachePolicy::new(
            Duration::from_secs(policy.min_ttl_secs),
            Duration::from_secs(policy.default_ttl_secs),
            Duration::from_secs(policy.max_ttl_secs),
        ) {
            errors.push(ValidationError::InvalidTtlBounds {
                name: policy.name.clone(),
                source,
            });
        }
    }

    let mut parsed: Vec<PathPattern> = Vec::new();
    for behavior in &config.behaviors {
        if config.cache_policy(&behavior.cache_policy).is_none() {
            errors.push(ValidationError::UnknownCachePolicy {
                referrer: format!("behavior {:?}", behavior.pattern),
                name: behavior.cache_policy.clone(),
            });
        }
        match PathPattern::parse(&behavior.pattern) {
            Ok(pattern) => {
                for earlier in &parsed {
                    if pattern.is_exact()
                        && earlier.is_exact()
                        && earlier.literal() == pattern.literal()
                    {
                        errors.push(ValidationError::DuplicateExactPattern(
                            pattern.as_str().to_string(),
                        ));
                    }
                }
                parsed.push(pattern);
            }
            Err(source) => errors.push(ValidationError::InvalidPattern {
                pattern: behavior.pattern.clone(),
                source,
            }),
        }
    }

    if config.cache_policy(&config.default_behavior.cache_policy).is_none() {
        errors.push(ValidationError::UnknownCachePolicy {
            referrer: "default behavior".to_string(),
            name: config.default_behavior.cache_policy.clone(),
        });
    }

    let mut key_ids = HashSet::new();
    for key in &config.signing.trusted_keys {
        if !key_ids.insert(key.key_pair_id.as_str()) {
            errors.push(ValidationError::DuplicateKeyPairId(key.key_pair_id.clone()));
        }
    }

    let signing_required = config.default_behavior.require_signed_token
        || config.behaviors.iter().any(|b| b.require_signed_token);
    if signing_required && config.signing.trusted_keys.is_empty() {
        errors.push(ValidationError::NoTrustedKeys);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{BehaviorConfig, CachePolicyConfig, TrustedKeyConfig};
    use crate::routing::{HttpsPolicy, OriginId};

    fn behavior(pattern: &str) -> BehaviorConfig {
        BehaviorConfig {
            pattern: pattern.to_string(),
            origin: OriginId::Website,
            cache_policy: "default".to_string(),
            require_signed_token: false,
            https: HttpsPolicy::RedirectToHttps,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&EdgeConfig::default()).is_ok());
    }

    #[test]
    fn test_all_errors_reported_at_once() {
        let mut config = EdgeConfig::default();
        config.cache_policies.push(CachePolicyConfig {
            name: "broken".to_string(),
            min_ttl_secs: 100,
            default_ttl_secs: 10,
            max_ttl_secs: 1000,
        });
        config.behaviors.push(behavior("no-slash"));
        let mut dangling = behavior("/a/*");
        dangling.cache_policy = "missing".to_string();
        config.behaviors.push(dangling);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_duplicate_exact_pattern_is_error() {
        let mut config = EdgeConfig::default();
        config.behaviors.push(behavior("/login.html"));
        config.behaviors.push(behavior("/login.html"));
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::DuplicateExactPattern(p)] if p == "/login.html"
        ));
    }

    #[test]
    fn test_shadowed_rules_are_not_errors() {
        // Unreachable rules are the table builder's lint, not a config
        // error; the config must still be accepted.
        let mut config = EdgeConfig::default();
        config.behaviors.push(behavior("/js/*"));
        config.behaviors.push(behavior("/js/chunk-vendors*"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_signing_without_keys_is_error() {
        let mut config = EdgeConfig::default();
        let mut gated = behavior("/private/*");
        gated.require_signed_token = true;
        config.behaviors.push(gated);
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors.as_slice(), [ValidationError::NoTrustedKeys]));
    }

    #[test]
    fn test_signing_with_keys_is_ok() {
        let mut config = EdgeConfig::default();
        let mut gated = behavior("/private/*");
        gated.require_signed_token = true;
        config.behaviors.push(gated);
        config.signing.trusted_keys.push(TrustedKeyConfig {
            key_pair_id: "K1".to_string(),
            public_key_path: "/etc/edge-gateway/k1.pem".to_string(),
        });
        assert!(validate_config(&config).is_ok());
    }
}
