//! Path pattern matching.
//!
//! # Responsibilities
//! - Parse patterns: exact paths or a single trailing wildcard (`prefix*`)
//! - Match normalized request paths (case-sensitive)
//! - Detect shadowing between patterns for the build-time lint
//!
//! # Design Decisions
//! - No regex to guarantee O(n) matching
//! - Mid-string wildcards are rejected at parse time
//! - Query strings and fragments are stripped before matching

use thiserror::Error;

/// Error returned for a malformed pattern.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,
    #[error("pattern {0:?} must start with '/'")]
    MissingLeadingSlash(String),
    #[error("pattern {0:?} contains a wildcard before the final position")]
    EmbeddedWildcard(String),
}

/// A path pattern: either an exact path or a literal prefix with a
/// trailing wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    prefix_len: usize,
    wildcard: bool,
}

impl PathPattern {
    /// Parse a pattern string.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if raw.is_empty() {
            return Err(PatternError::Empty);
        }
        if !raw.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(raw.to_string()));
        }
        let wildcard = raw.ends_with('*');
        let literal = if wildcard { &raw[..raw.len() - 1] } else { raw };
        if literal.contains('*') {
            return Err(PatternError::EmbeddedWildcard(raw.to_string()));
        }
        Ok(Self {
            raw: raw.to_string(),
            prefix_len: literal.len(),
            wildcard,
        })
    }

    /// The pattern exactly as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Literal prefix (full path for exact patterns).
    pub fn literal(&self) -> &str {
        &self.raw[..self.prefix_len]
    }

    pub fn is_exact(&self) -> bool {
        !self.wildcard
    }

    /// Test a normalized path against this pattern.
    pub fn matches(&self, path: &str) -> bool {
        if self.wildcard {
            path.starts_with(self.literal())
        } else {
            path == self.literal()
        }
    }

    /// True when every path this pattern can match is already covered by
    /// `earlier`. Used by the unreachable-rule lint: a shadowed pattern can
    /// never win a first-match-wins scan.
    pub fn shadowed_by(&self, earlier: &PathPattern) -> bool {
        if earlier.wildcard {
            self.literal().starts_with(earlier.literal())
        } else {
            self.is_exact() && self.literal() == earlier.literal()
        }
    }
}

/// Normalize a request path for matching: ensure a leading `/` and strip
/// any query string or fragment.
pub fn normalize_path(path: &str) -> String {
    let end = path
        .find(|c| c == '?' || c == '#')
        .unwrap_or(path.len());
    let trimmed = &path[..end];
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_pattern() {
        let pattern = PathPattern::parse("/index.html").unwrap();
        assert!(pattern.is_exact());
        assert!(pattern.matches("/index.html"));
        assert!(!pattern.matches("/index.html.bak"));
        assert!(!pattern.matches("/other"));
    }

    #[test]
    fn test_wildcard_pattern() {
        let pattern = PathPattern::parse("/js/*").unwrap();
        assert!(!pattern.is_exact());
        assert!(pattern.matches("/js/app.js"));
        assert!(pattern.matches("/js/"));
        assert!(!pattern.matches("/css/app.css"));
    }

    #[test]
    fn test_bare_prefix_wildcard() {
        // `prefix*` without a separator matches sibling names too.
        let pattern = PathPattern::parse("/js/chunk-vendors*").unwrap();
        assert!(pattern.matches("/js/chunk-vendors.abc123.js"));
        assert!(pattern.matches("/js/chunk-vendors/app.js"));
        assert!(!pattern.matches("/js/app.js"));
    }

    #[test]
    fn test_catch_all() {
        let pattern = PathPattern::parse("/*").unwrap();
        assert!(pattern.matches("/"));
        assert!(pattern.matches("/anything/at/all"));
    }

    #[test]
    fn test_rejects_embedded_wildcard() {
        assert_eq!(
            PathPattern::parse("/js/*/vendor"),
            Err(PatternError::EmbeddedWildcard("/js/*/vendor".to_string()))
        );
    }

    #[test]
    fn test_rejects_missing_slash() {
        assert!(matches!(
            PathPattern::parse("js/*"),
            Err(PatternError::MissingLeadingSlash(_))
        ));
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(PathPattern::parse(""), Err(PatternError::Empty));
    }

    #[test]
    fn test_shadowing() {
        let broad = PathPattern::parse("/js/*").unwrap();
        let narrow = PathPattern::parse("/js/chunk-vendors*").unwrap();
        let exact = PathPattern::parse("/js/app.js").unwrap();
        let other = PathPattern::parse("/css/*").unwrap();

        assert!(narrow.shadowed_by(&broad));
        assert!(exact.shadowed_by(&broad));
        assert!(!other.shadowed_by(&broad));
        // An exact rule only shadows an identical exact rule.
        assert!(!broad.shadowed_by(&exact));
        assert!(!narrow.shadowed_by(&exact));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/a/b?x=1"), "/a/b");
        assert_eq!(normalize_path("/a/b#frag"), "/a/b");
        assert_eq!(normalize_path("a/b"), "/a/b");
        assert_eq!(normalize_path("/"), "/");
    }
}
