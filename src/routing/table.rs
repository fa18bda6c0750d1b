//! Behavior table construction.
//!
//! # Responsibilities
//! - Store the ordered list of behaviors plus the single default
//! - Reject ambiguous configurations at build time (duplicate exact
//!   patterns, missing default)
//! - Surface unreachable rules as build-time warnings
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Declaration order encodes priority; the table never reorders
//! - Cache policies are shared by reference across behaviors (Arc)

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::{CachePolicy, InvalidPolicy};
use crate::config::schema::EdgeConfig;
use crate::routing::pattern::{PathPattern, PatternError};

/// Identifies the backing content source for a behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginId {
    Website,
    Login,
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginId::Website => write!(f, "website"),
            OriginId::Login => write!(f, "login"),
        }
    }
}

/// Transport-security requirement for a behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HttpsPolicy {
    /// Answer plaintext requests with a permanent redirect to HTTPS.
    RedirectToHttps,
    /// Reject plaintext requests outright.
    HttpsOnly,
}

/// A single path-pattern rule.
#[derive(Debug, Clone)]
pub struct Behavior {
    pub pattern: PathPattern,
    pub origin: OriginId,
    pub cache_policy: Arc<CachePolicy>,
    pub require_signed_token: bool,
    pub https: HttpsPolicy,
}

/// Error raised while building a [`BehaviorTable`].
#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    InvalidPattern(#[from] PatternError),
    #[error("duplicate exact pattern {0:?} (ambiguous priority)")]
    DuplicatePattern(String),
    #[error("no default behavior configured")]
    MissingDefault,
    #[error(transparent)]
    InvalidPolicy(#[from] InvalidPolicy),
    #[error("{referrer} references unknown cache policy {name:?}")]
    UnknownCachePolicy { referrer: String, name: String },
}

/// Warning emitted by the build-time unreachable-rule lint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowedRule {
    pub earlier: String,
    pub later: String,
}

impl fmt::Display for ShadowedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "behavior {:?} is unreachable: every path it matches is claimed first by {:?}",
            self.later, self.earlier
        )
    }
}

/// Builder for [`BehaviorTable`]. Fails fast on misconfiguration so that
/// nothing invalid reaches request handling.
#[derive(Debug, Default)]
pub struct BehaviorTableBuilder {
    behaviors: Vec<Behavior>,
    default: Option<Behavior>,
    warnings: Vec<ShadowedRule>,
}

impl BehaviorTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. Order of calls encodes priority: the first structural
    /// match in insertion order wins at resolution time, so narrower rules
    /// must be added before the broader rules they specialize.
    pub fn add_behavior(
        &mut self,
        pattern: &str,
        origin: OriginId,
        cache_policy: Arc<CachePolicy>,
        require_signed_token: bool,
        https: HttpsPolicy,
    ) -> Result<&mut Self, TableError> {
        let pattern = PathPattern::parse(pattern)?;

        for earlier in &self.behaviors {
            if pattern.is_exact()
                && earlier.pattern.is_exact()
                && earlier.pattern.literal() == pattern.literal()
            {
                return Err(TableError::DuplicatePattern(pattern.as_str().to_string()));
            }
            if pattern.shadowed_by(&earlier.pattern) {
                self.warnings.push(ShadowedRule {
                    earlier: earlier.pattern.as_str().to_string(),
                    later: pattern.as_str().to_string(),
                });
            }
        }

        self.behaviors.push(Behavior {
            pattern,
            origin,
            cache_policy,
            require_signed_token,
            https,
        });
        Ok(self)
    }

    /// Set the catch-all behavior. Exactly one default must exist before
    /// the table can be built.
    pub fn set_default(
        &mut self,
        origin: OriginId,
        cache_policy: Arc<CachePolicy>,
        require_signed_token: bool,
        https: HttpsPolicy,
    ) -> &mut Self {
        // The parse of a literal catch-all cannot fail.
        let pattern = PathPattern::parse("/*").unwrap_or_else(|_| unreachable!());
        self.default = Some(Behavior {
            pattern,
            origin,
            cache_policy,
            require_signed_token,
            https,
        });
        self
    }

    pub fn build(self) -> Result<(BehaviorTable, Vec<ShadowedRule>), TableError> {
        let default = self.default.ok_or(TableError::MissingDefault)?;
        Ok((
            BehaviorTable {
                behaviors: self.behaviors,
                default,
            },
            self.warnings,
        ))
    }
}

/// Ordered collection of behaviors plus the catch-all default.
///
/// Built once at startup and shared read-only across request tasks.
#[derive(Debug)]
pub struct BehaviorTable {
    pub(crate) behaviors: Vec<Behavior>,
    pub(crate) default: Behavior,
}

impl BehaviorTable {
    pub fn builder() -> BehaviorTableBuilder {
        BehaviorTableBuilder::new()
    }

    /// Compile the table from a validated configuration. Cache policies are
    /// constructed once and shared by reference across behaviors.
    pub fn from_config(config: &EdgeConfig) -> Result<(Self, Vec<ShadowedRule>), TableError> {
        let mut policies: HashMap<&str, Arc<CachePolicy>> = HashMap::new();
        for policy in &config.cache_policies {
            let compiled = CachePolicy::new(
                Duration::from_secs(policy.min_ttl_secs),
                Duration::from_secs(policy.default_ttl_secs),
                Duration::from_secs(policy.max_ttl_secs),
            )?;
            policies.insert(policy.name.as_str(), Arc::new(compiled));
        }
        let lookup = |referrer: String, name: &str| {
            policies
                .get(name)
                .cloned()
                .ok_or_else(|| TableError::UnknownCachePolicy {
                    referrer,
                    name: name.to_string(),
                })
        };

        let mut builder = BehaviorTableBuilder::new();
        for behavior in &config.behaviors {
            let policy = lookup(
                format!("behavior {:?}", behavior.pattern),
                &behavior.cache_policy,
            )?;
            builder.add_behavior(
                &behavior.pattern,
                behavior.origin,
                policy,
                behavior.require_signed_token,
                behavior.https,
            )?;
        }
        let default = &config.default_behavior;
        builder.set_default(
            default.origin,
            lookup("default behavior".to_string(), &default.cache_policy)?,
            default.require_signed_token,
            default.https,
        );
        builder.build()
    }

    pub fn default_behavior(&self) -> &Behavior {
        &self.default
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn policy() -> Arc<CachePolicy> {
        Arc::new(
            CachePolicy::new(
                Duration::ZERO,
                Duration::from_secs(60),
                Duration::from_secs(3600),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_duplicate_exact_rejected() {
        let mut builder = BehaviorTable::builder();
        builder
            .add_behavior("/login.html", OriginId::Login, policy(), false, HttpsPolicy::RedirectToHttps)
            .unwrap();
        let err = builder
            .add_behavior("/login.html", OriginId::Login, policy(), false, HttpsPolicy::RedirectToHttps)
            .unwrap_err();
        assert!(matches!(err, TableError::DuplicatePattern(p) if p == "/login.html"));
    }

    #[test]
    fn test_missing_default_rejected() {
        let mut builder = BehaviorTable::builder();
        builder
            .add_behavior("/js/*", OriginId::Website, policy(), false, HttpsPolicy::RedirectToHttps)
            .unwrap();
        assert!(matches!(builder.build(), Err(TableError::MissingDefault)));
    }

    #[test]
    fn test_shadowed_rule_warns() {
        let mut builder = BehaviorTable::builder();
        builder
            .add_behavior("/js/*", OriginId::Website, policy(), false, HttpsPolicy::RedirectToHttps)
            .unwrap();
        builder
            .add_behavior("/js/chunk-vendors*", OriginId::Website, policy(), false, HttpsPolicy::RedirectToHttps)
            .unwrap();
        builder.set_default(OriginId::Website, policy(), false, HttpsPolicy::RedirectToHttps);

        let (_, warnings) = builder.build().unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].earlier, "/js/*");
        assert_eq!(warnings[0].later, "/js/chunk-vendors*");
    }

    #[test]
    fn test_specific_before_broad_is_clean() {
        let mut builder = BehaviorTable::builder();
        builder
            .add_behavior("/js/chunk-vendors*", OriginId::Website, policy(), false, HttpsPolicy::RedirectToHttps)
            .unwrap();
        builder
            .add_behavior("/js/*", OriginId::Website, policy(), false, HttpsPolicy::RedirectToHttps)
            .unwrap();
        builder.set_default(OriginId::Website, policy(), false, HttpsPolicy::RedirectToHttps);

        let (table, warnings) = builder.build().unwrap();
        assert!(warnings.is_empty());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_from_config_shares_policies() {
        use crate::config::schema::{BehaviorConfig, EdgeConfig};

        let mut config = EdgeConfig::default();
        config.behaviors.push(BehaviorConfig {
            pattern: "/a/*".to_string(),
            origin: OriginId::Website,
            cache_policy: "default".to_string(),
            require_signed_token: false,
            https: HttpsPolicy::RedirectToHttps,
        });
        config.behaviors.push(BehaviorConfig {
            pattern: "/b/*".to_string(),
            origin: OriginId::Website,
            cache_policy: "default".to_string(),
            require_signed_token: false,
            https: HttpsPolicy::RedirectToHttps,
        });

        let (table, warnings) = BehaviorTable::from_config(&config).unwrap();
        assert!(warnings.is_empty());
        // Same named policy resolves to the same shared allocation.
        assert!(Arc::ptr_eq(
            &table.behaviors[0].cache_policy,
            &table.behaviors[1].cache_policy
        ));
    }

    #[test]
    fn test_from_config_rejects_dangling_policy() {
        use crate::config::schema::{BehaviorConfig, EdgeConfig};

        let mut config = EdgeConfig::default();
        config.behaviors.push(BehaviorConfig {
            pattern: "/a/*".to_string(),
            origin: OriginId::Website,
            cache_policy: "missing".to_string(),
            require_signed_token: false,
            https: HttpsPolicy::RedirectToHttps,
        });
        assert!(matches!(
            BehaviorTable::from_config(&config),
            Err(TableError::UnknownCachePolicy { .. })
        ));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut builder = BehaviorTable::builder();
        let err = builder
            .add_behavior("/a/*/b", OriginId::Website, policy(), false, HttpsPolicy::HttpsOnly)
            .unwrap_err();
        assert!(matches!(err, TableError::InvalidPattern(_)));
    }
}
