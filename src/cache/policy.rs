//! Cache policy value objects.
//!
//! # Responsibilities
//! - Hold min/default/max freshness bounds for a resolved behavior
//! - Validate bound ordering at construction time
//! - Derive an effective max-age for a response ("most restrictive wins")
//!
//! # Design Decisions
//! - Immutable after construction; shared across behaviors via Arc
//! - Construction failure is a config error, surfaced at startup
//! - Origin freshness hints can only tighten, never loosen, the default

use std::time::Duration;
use thiserror::Error;

/// Error returned when TTL bounds are out of order.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid cache policy: min={min:?} default={default:?} max={max:?} (expected min <= default <= max)")]
pub struct InvalidPolicy {
    pub min: Duration,
    pub default: Duration,
    pub max: Duration,
}

/// Freshness bounds attached to a behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    min_ttl: Duration,
    default_ttl: Duration,
    max_ttl: Duration,
}

impl CachePolicy {
    /// Create a policy, enforcing `min_ttl <= default_ttl <= max_ttl`.
    pub fn new(
        min_ttl: Duration,
        default_ttl: Duration,
        max_ttl: Duration,
    ) -> Result<Self, InvalidPolicy> {
        if min_ttl > default_ttl || default_ttl > max_ttl {
            return Err(InvalidPolicy {
                min: min_ttl,
                default: default_ttl,
                max: max_ttl,
            });
        }
        Ok(Self {
            min_ttl,
            default_ttl,
            max_ttl,
        })
    }

    pub fn min_ttl(&self) -> Duration {
        self.min_ttl
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn max_ttl(&self) -> Duration {
        self.max_ttl
    }

    /// Effective freshness for a response.
    ///
    /// Starts from `default_ttl`, takes the smaller of that and the origin's
    /// own hint when one is present, then clamps into `[min_ttl, max_ttl]`.
    pub fn effective_max_age(&self, origin_hint: Option<Duration>) -> Duration {
        let base = match origin_hint {
            Some(hint) => self.default_ttl.min(hint),
            None => self.default_ttl,
        };
        base.clamp(self.min_ttl, self.max_ttl)
    }

    /// `Cache-Control` header value for a response under this policy.
    pub fn cache_control(&self, origin_hint: Option<Duration>) -> String {
        format!("max-age={}", self.effective_max_age(origin_hint).as_secs())
    }
}

/// Parse the `max-age` directive out of a `Cache-Control` header value.
pub fn max_age_hint(cache_control: &str) -> Option<Duration> {
    cache_control
        .split(',')
        .map(str::trim)
        .find_map(|directive| directive.strip_prefix("max-age="))
        .and_then(|secs| secs.parse::<u64>().ok())
        .map(Duration::from_secs)
}
